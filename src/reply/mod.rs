//! Reply suggestion.
//!
//! A classified `(category, intent)` pair selects a template, which is filled
//! from a `ReplyContext` and optionally rewritten by a chat model.

pub mod refiner;
pub mod responder;
pub mod templates;

pub use refiner::ReplyRefiner;
pub use responder::{ReplySource, Responder, SuggestedReply};
pub use templates::ReplyContext;
