//! # Amino Chat pipeline
//!
//! Keyword classification, answer resolution (canned or generated) and
//! HTML formatting of the final reply.

pub mod classifier;
pub mod formatter;
pub mod resolver;
pub mod service;

pub use classifier::{Classification, classify, explain};
pub use formatter::format;
pub use resolver::{Decision, Resolution, ResolutionPolicy, Resolver};
pub use service::{ChatReply, ChatService};
