//! Email classification.
//!
//! Raw text flows through:
//! 1. `normalize()`: stopword filtering, model input only
//! 2. `ZeroShotClassifier::score()`: category query, then intent query
//! 3. `OverrideEngine::apply()`: keyword rules over the original text
//!
//! `EmailClassifier::classify_email()` ties these together and never fails.

pub mod classifier;
pub mod hf;
pub mod labels;
pub mod normalize;
pub mod pipeline;
pub mod rules;

pub use classifier::{ClassifierHandle, ClassifierLoader, ScoredLabels, ZeroShotClassifier};
pub use labels::{Category, Intent, LabelSet};
pub use pipeline::{ClassificationResult, EmailClassifier};
pub use rules::{OverrideEngine, OverrideRule, Verdict};
