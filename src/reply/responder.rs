//! Reply suggestion: template lookup, placeholder fill, optional refinement.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::nlp::labels::{Category, Intent};
use crate::reply::refiner::ReplyRefiner;
use crate::reply::templates::{FALLBACK_TEMPLATE, ReplyContext, fill, template_for};

/// Where the suggested reply text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplySource {
    #[serde(rename = "template")]
    Template,
    #[serde(rename = "openai+template")]
    OpenAiTemplate,
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::OpenAiTemplate => "openai+template",
        }
    }
}

impl fmt::Display for ReplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedReply {
    pub reply: String,
    pub source: ReplySource,
}

/// Builds reply suggestions. Never fails.
#[derive(Default)]
pub struct Responder {
    refiner: Option<ReplyRefiner>,
}

impl Responder {
    /// Template-only responder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refiner(refiner: ReplyRefiner) -> Self {
        Self {
            refiner: Some(refiner),
        }
    }

    pub fn refines(&self) -> bool {
        self.refiner.is_some()
    }

    /// Suggest a reply for a classified email.
    ///
    /// `category` and `intent` are the labels produced by classification.
    /// A pair with no dedicated template gets a generic reply naming the
    /// intent. Refinement runs only when a refiner is configured, and any
    /// refinement failure falls back to the filled template.
    pub async fn suggest_reply(
        &self,
        category: &str,
        intent: &str,
        ctx: &ReplyContext,
    ) -> SuggestedReply {
        let filled = render(category, intent, ctx);

        let Some(refiner) = &self.refiner else {
            return SuggestedReply {
                reply: filled,
                source: ReplySource::Template,
            };
        };

        match refiner.refine(&filled).await {
            Ok(reply) => SuggestedReply {
                reply,
                source: ReplySource::OpenAiTemplate,
            },
            Err(e) => {
                warn!(
                    model = refiner.model_name(),
                    error = %e,
                    "Reply refinement failed, using template"
                );
                SuggestedReply {
                    reply: filled,
                    source: ReplySource::Template,
                }
            }
        }
    }
}

fn render(category: &str, intent: &str, ctx: &ReplyContext) -> String {
    let template = Category::from_label(category)
        .zip(Intent::from_label(intent))
        .and_then(|(c, i)| template_for(c, i));

    let template = template.unwrap_or_else(|| {
        debug!(category, intent, "No template for pair, using fallback");
        FALLBACK_TEMPLATE
    });

    let mut values = ctx.resolve();
    values.insert("intent".to_string(), intent.to_string());

    match fill(template, &values) {
        Ok(text) => text,
        Err(e) => {
            debug!(category, intent, error = %e, "Template left unfilled");
            template.to_string()
        }
    }
}
