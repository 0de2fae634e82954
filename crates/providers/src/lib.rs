//! Language-model providers for Amino Chat.
//!
//! All providers implement the `aminochat_core::Provider` trait.
//! [`build_from_config`] picks the backend and wraps it in the call timeout.

pub mod builder;
pub mod fallback;
pub mod gemini;

pub use builder::{build_chain, build_from_config};
pub use fallback::FallbackProvider;
pub use gemini::GeminiProvider;
