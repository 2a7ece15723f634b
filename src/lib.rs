//! Email triage: zero-shot classification, keyword overrides and reply
//! suggestion for Portuguese-language email.

pub mod assistant;
pub mod config;
pub mod error;
pub mod llm;
pub mod nlp;
pub mod reply;

pub use assistant::{EmailAssistant, ProcessOutcome};
pub use error::{Error, Result};
