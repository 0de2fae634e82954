//! # Amino Chat Core
//!
//! Domain types, traits, and error definitions for the Amino hospital chat
//! assistant. This crate has **zero framework dependencies**: it defines the
//! domain model that the other crates implement against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator of the chat pipeline is a trait here:
//! - [`AnswerStore`] reads canned answers from the knowledge table
//! - [`Provider`] generates text with a language model
//!
//! Implementations live in `aminochat-store` and `aminochat-providers`, and are
//! constructed once at startup and passed into the pipeline explicitly.

pub mod answer;
pub mod category;
pub mod error;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use answer::{AnswerRecord, AnswerSet, AnswerStore, FaqEntry};
pub use category::{Category, UnknownCategory};
pub use error::{Error, ProviderError, Result, StoreError};
pub use provider::{Generation, GenerationRequest, Provider};
