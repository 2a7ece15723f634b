//! Post-model override rules.
//!
//! The zero-shot model is general-purpose and misreads short business
//! phrases (a "thank you" closing ranked as an open request, promotions
//! ranked as information requests). These rules run after scoring, in a fixed
//! order, each one able to replace the model's category and intent:
//!
//! 1. Keyword groups: status → scheduling → approval → budget → follow-up →
//!    invitation → notification. First matching group wins.
//! 2. Gratitude consistency: a gratitude intent is never actionable.
//! 3. Gratitude intensity: ≥2 gratitude keywords, or ≥1 gratitude plus ≥1
//!    resolution keyword.
//! 4. Promotional: ≥2 spam keywords, or any promotional pattern.
//!
//! Later rules overwrite earlier ones, so promotional detection has the final
//! say. Every rule reads the original text lower-cased, never the normalized
//! text. Keyword counts are the number of distinct list entries present.
//!
//! Thresholds and lists are empirically tuned; texts with two incidental
//! trigger words get flagged, which is accepted.

use regex::Regex;
use tracing::debug;

use crate::nlp::labels::{Category, Intent};

/// Minimum spam keyword hits for the promotional override.
pub const SPAM_KEYWORD_THRESHOLD: usize = 2;

/// Gratitude hits that force the gratitude override on their own.
pub const GRATITUDE_KEYWORD_THRESHOLD: usize = 2;

/// A category/intent pair, before or after overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub category: Category,
    pub intent: Intent,
}

impl Verdict {
    pub fn new(category: Category, intent: Intent) -> Self {
        Self { category, intent }
    }
}

/// One keyword group of the reclassification rule.
#[derive(Debug, Clone)]
pub struct KeywordGroup {
    /// Short name for logging.
    pub name: &'static str,
    pub keywords: Vec<&'static str>,
    pub intent: Intent,
    pub category: Category,
}

impl KeywordGroup {
    pub fn matches(&self, text_lower: &str) -> bool {
        self.keywords.iter().any(|kw| text_lower.contains(kw))
    }
}

/// A single override stage.
#[derive(Debug, Clone)]
pub enum OverrideRule {
    /// First matching group replaces both intent and category.
    KeywordGroups(Vec<KeywordGroup>),
    /// Gratitude intents force the non-actionable category.
    GratitudeConsistency,
    /// Strong thanks, or thanks for a resolved problem, is gratitude.
    GratitudeIntensity {
        gratitude: Vec<&'static str>,
        resolution: Vec<&'static str>,
    },
    /// Promotional mail, by keyword count or phrase pattern.
    Promotional {
        keywords: Vec<&'static str>,
        patterns: Vec<Regex>,
    },
}

impl OverrideRule {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeywordGroups(_) => "keyword_groups",
            Self::GratitudeConsistency => "gratitude_consistency",
            Self::GratitudeIntensity { .. } => "gratitude_intensity",
            Self::Promotional { .. } => "promotional",
        }
    }

    /// Evaluate against lower-cased original text and the current verdict.
    ///
    /// Returns the replacement verdict, or `None` when the rule does not fire.
    pub fn evaluate(&self, text_lower: &str, current: Verdict) -> Option<Verdict> {
        match self {
            Self::KeywordGroups(groups) => {
                let group = groups.iter().find(|g| g.matches(text_lower))?;
                debug!(group = group.name, "Keyword group matched");
                Some(Verdict::new(group.category, group.intent))
            }
            Self::GratitudeConsistency => {
                if current.intent.is_gratitude() && current.category != Category::Unproductive {
                    Some(Verdict::new(Category::Unproductive, current.intent))
                } else {
                    None
                }
            }
            Self::GratitudeIntensity {
                gratitude,
                resolution,
            } => {
                let thanks = count_keywords(text_lower, gratitude);
                let resolved = count_keywords(text_lower, resolution);
                if thanks >= GRATITUDE_KEYWORD_THRESHOLD || (thanks >= 1 && resolved >= 1) {
                    debug!(thanks, resolved, "Gratitude intensity override");
                    Some(Verdict::new(Category::Unproductive, Intent::Gratitude))
                } else {
                    None
                }
            }
            Self::Promotional { keywords, patterns } => {
                let hits = count_keywords(text_lower, keywords);
                let pattern_hit = patterns.iter().any(|p| p.is_match(text_lower));
                if hits >= SPAM_KEYWORD_THRESHOLD || pattern_hit {
                    debug!(hits, pattern_hit, "Promotional override");
                    Some(Verdict::new(Category::Unproductive, Intent::SpamMarketing))
                } else {
                    None
                }
            }
        }
    }
}

/// Number of distinct keywords that occur in `text_lower`.
pub fn count_keywords(text_lower: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| text_lower.contains(*kw)).count()
}

/// Ordered override cascade.
pub struct OverrideEngine {
    rules: Vec<OverrideRule>,
}

impl OverrideEngine {
    /// The production rule set, in priority order.
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                OverrideRule::KeywordGroups(default_keyword_groups()),
                OverrideRule::GratitudeConsistency,
                OverrideRule::GratitudeIntensity {
                    gratitude: GRATITUDE_KEYWORDS.to_vec(),
                    resolution: RESOLUTION_KEYWORDS.to_vec(),
                },
                OverrideRule::Promotional {
                    keywords: SPAM_KEYWORDS.to_vec(),
                    patterns: promotional_patterns(),
                },
            ],
        }
    }

    /// No overrides: the model verdict passes through untouched.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Run every rule in order over the original (not normalized) text.
    pub fn apply(&self, original_text: &str, model: Verdict) -> Verdict {
        let text_lower = original_text.to_lowercase();
        self.rules.iter().fold(model, |current, rule| {
            match rule.evaluate(&text_lower, current) {
                Some(next) => {
                    debug!(
                        rule = rule.name(),
                        from_category = %current.category,
                        from_intent = %current.intent,
                        to_category = %next.category,
                        to_intent = %next.intent,
                        "Override applied"
                    );
                    next
                }
                None => current,
            }
        })
    }
}

impl Default for OverrideEngine {
    fn default() -> Self {
        Self::default_rules()
    }
}

// ── Keyword lists ───────────────────────────────────────────────────

const STATUS_KEYWORDS: &[&str] = &[
    "status",
    "andamento",
    "acompanhamento",
    "atualização sobre",
    "em que pé",
    "previsão de conclusão",
    "progresso",
];

const SCHEDULING_KEYWORDS: &[&str] = &[
    "agendar",
    "agendamento",
    "reunião",
    "remarcar",
    "marcar uma",
    "disponibilidade",
    "horário disponível",
];

const APPROVAL_KEYWORDS: &[&str] = &[
    "aprovação",
    "aprovar",
    "aprove",
    "autorização",
    "autorizar",
    "autorize",
    "de acordo para prosseguir",
];

const BUDGET_KEYWORDS: &[&str] = &[
    "orçamento",
    "proposta",
    "cotação",
    "quanto custa",
    "tabela de preços",
];

const FOLLOW_UP_KEYWORDS: &[&str] = &[
    "follow-up",
    "follow up",
    "pendência",
    "pendente",
    "cobrança",
    "ainda não recebi",
    "sem retorno",
    "aguardando retorno",
];

const INVITATION_KEYWORDS: &[&str] = &[
    "convite",
    "convidamos",
    "convidá-lo",
    "workshop",
    "webinar",
    "treinamento",
    "palestra",
    "inscrições abertas",
];

const NOTIFICATION_KEYWORDS: &[&str] = &[
    "notificação automática",
    "mensagem automática",
    "e-mail automático",
    "email automático",
    "não responda",
    "senha alterada",
    "redefinição de senha",
    "alerta de segurança",
];

const GRATITUDE_KEYWORDS: &[&str] = &[
    "obrigado",
    "obrigada",
    "agradeço",
    "agradecemos",
    "agradecimento",
    "parabéns",
    "grato",
    "grata",
    "gratidão",
];

const RESOLUTION_KEYWORDS: &[&str] = &[
    "resolvido",
    "resolvida",
    "solucionado",
    "solucionada",
    "funcionou",
    "deu certo",
    "problema sanado",
];

const SPAM_KEYWORDS: &[&str] = &[
    "oferta",
    "desconto",
    "promoção",
    "clique aqui",
    "não perca",
    "limitada",
    "imperdível",
    "apenas hoje",
    "corra",
    "vagas limitadas",
    "grátis",
    "ganhe",
    "prêmio",
    "sorteio",
    "urgente",
    "liquidação",
    "aproveite",
    "cupom",
];

fn default_keyword_groups() -> Vec<KeywordGroup> {
    vec![
        KeywordGroup {
            name: "status",
            keywords: STATUS_KEYWORDS.to_vec(),
            intent: Intent::StatusRequest,
            category: Category::Productive,
        },
        KeywordGroup {
            name: "scheduling",
            keywords: SCHEDULING_KEYWORDS.to_vec(),
            intent: Intent::MeetingScheduling,
            category: Category::Productive,
        },
        KeywordGroup {
            name: "approval",
            keywords: APPROVAL_KEYWORDS.to_vec(),
            intent: Intent::ApprovalRequest,
            category: Category::Productive,
        },
        KeywordGroup {
            name: "budget",
            keywords: BUDGET_KEYWORDS.to_vec(),
            intent: Intent::QuoteRequest,
            category: Category::Productive,
        },
        KeywordGroup {
            name: "follow_up",
            keywords: FOLLOW_UP_KEYWORDS.to_vec(),
            intent: Intent::FollowUp,
            category: Category::Productive,
        },
        KeywordGroup {
            name: "invitation",
            keywords: INVITATION_KEYWORDS.to_vec(),
            intent: Intent::EventInvitation,
            category: Category::Unproductive,
        },
        KeywordGroup {
            name: "notification",
            keywords: NOTIFICATION_KEYWORDS.to_vec(),
            intent: Intent::SystemNotification,
            category: Category::Unproductive,
        },
    ]
}

fn promotional_patterns() -> Vec<Regex> {
    [
        // "12 computadores por 1", "3 por apenas 1"
        r"\b\d+\s+(?:\w+\s+){0,2}por\s+(?:apenas\s+)?1\b",
        // "50% de desconto", "30% off"
        r"\b\d{1,3}\s*%\s*(?:de\s+)?(?:desconto|off)\b",
        // "leve 3 pague 2"
        r"\bleve\s+\d+\s*,?\s*pague\s+\d+\b",
        // "levando só hoje", "aproveite, somente hoje"
        r"\b(?:levando|leve|aproveite|compre|promoção|oferta)\b[^.!?]*\b(?:s[óo]|somente)\s+hoje\b",
    ]
    .into_iter()
    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid promotional pattern {p}: {e}")))
    .collect()
}
