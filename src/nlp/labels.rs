//! Category and intent label spaces.
//!
//! The Portuguese label strings are the wire format: they are what the
//! zero-shot model scores against, what the template table is keyed by, and
//! what callers see in a `ClassificationResult`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Candidate phrase for the actionable category.
pub const CATEGORY_ACTIONABLE_LABEL: &str = "Email produtivo que requer ação";

/// Candidate phrase for the non-actionable category.
pub const CATEGORY_NON_ACTIONABLE_LABEL: &str = "Email improdutivo sem necessidade de ação";

/// Characteristic fragment of the actionable phrase. A winning raw label
/// containing it maps to `Category::Productive`.
const ACTIONABLE_MARKER: &str = "produtivo que requer";

/// Binary productivity classification (plus the failure sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// "Produtivo": the email requires an action.
    Productive,
    /// "Improdutivo": no action needed.
    Unproductive,
    /// "Erro": classification could not run.
    Error,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Productive => "Produtivo",
            Self::Unproductive => "Improdutivo",
            Self::Error => "Erro",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Produtivo" => Some(Self::Productive),
            "Improdutivo" => Some(Self::Unproductive),
            "Erro" => Some(Self::Error),
            _ => None,
        }
    }

    /// Map the model's winning raw category phrase onto a category.
    pub fn from_model_label(raw: &str) -> Self {
        if raw.contains(ACTIONABLE_MARKER) {
            Self::Productive
        } else {
            Self::Unproductive
        }
    }
}

/// Fine-grained purpose of an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    StatusRequest,
    InformationRequest,
    DocumentSubmission,
    TechnicalSupport,
    MeetingScheduling,
    ApprovalRequest,
    FollowUp,
    QuoteRequest,
    Gratitude,
    InformativeNotice,
    SmallTalk,
    SpamMarketing,
    SystemNotification,
    EventInvitation,
    /// Sentinel for a failed classification; never a model candidate.
    ProcessingError,
}

impl Intent {
    /// Every intent the model is asked to score, in candidate order.
    pub const CANDIDATES: [Intent; 14] = [
        Intent::StatusRequest,
        Intent::InformationRequest,
        Intent::DocumentSubmission,
        Intent::TechnicalSupport,
        Intent::MeetingScheduling,
        Intent::ApprovalRequest,
        Intent::FollowUp,
        Intent::QuoteRequest,
        Intent::Gratitude,
        Intent::InformativeNotice,
        Intent::SmallTalk,
        Intent::SpamMarketing,
        Intent::SystemNotification,
        Intent::EventInvitation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::StatusRequest => "Solicitação de status ou acompanhamento",
            Self::InformationRequest => "Pedido de informações ou esclarecimentos",
            Self::DocumentSubmission => "Envio de documentos ou arquivos importantes",
            Self::TechnicalSupport => "Dúvida técnica ou solicitação de suporte",
            Self::MeetingScheduling => "Agendamento de reunião ou compromisso",
            Self::ApprovalRequest => "Aprovação ou autorização necessária",
            Self::FollowUp => "Cobrança ou follow-up de pendências",
            Self::QuoteRequest => "Solicitação de orçamento ou proposta",
            Self::Gratitude => "Agradecimento ou felicitação",
            Self::InformativeNotice => "Confirmação ou comunicado informativo",
            Self::SmallTalk => "Conversa informal ou social",
            Self::SpamMarketing => "Spam ou marketing",
            Self::SystemNotification => "Notificação automática do sistema",
            Self::EventInvitation => "Convite para evento ou treinamento",
            Self::ProcessingError => "Erro no processamento",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        if label == Self::ProcessingError.label() {
            return Some(Self::ProcessingError);
        }
        Self::CANDIDATES.into_iter().find(|i| i.label() == label)
    }

    /// The category this intent implies.
    pub fn category(self) -> Category {
        match self {
            Self::StatusRequest
            | Self::InformationRequest
            | Self::DocumentSubmission
            | Self::TechnicalSupport
            | Self::MeetingScheduling
            | Self::ApprovalRequest
            | Self::FollowUp
            | Self::QuoteRequest => Category::Productive,
            Self::Gratitude
            | Self::InformativeNotice
            | Self::SmallTalk
            | Self::SpamMarketing
            | Self::SystemNotification
            | Self::EventInvitation => Category::Unproductive,
            Self::ProcessingError => Category::Error,
        }
    }

    /// Whether the label reads as gratitude or acknowledgement.
    pub fn is_gratitude(self) -> bool {
        let label = self.label().to_lowercase();
        label.contains("agradecimento") || label.contains("felicitação")
    }
}

macro_rules! label_serde {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::from_label(&raw).ok_or_else(|| {
                    serde::de::Error::custom(format!(concat!("unknown ", $what, ": '{}'"), raw))
                })
            }
        }
    };
}

label_serde!(Category, "category");
label_serde!(Intent, "intent");

/// An ordered set of candidate labels for one zero-shot query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<&'static str>,
}

impl LabelSet {
    /// The two-label productivity set.
    pub fn categories() -> Self {
        Self {
            labels: vec![CATEGORY_ACTIONABLE_LABEL, CATEGORY_NON_ACTIONABLE_LABEL],
        }
    }

    /// The full intent candidate set.
    pub fn intents() -> Self {
        Self {
            labels: Intent::CANDIDATES.iter().map(|i| i.label()).collect(),
        }
    }

    pub fn as_slice(&self) -> &[&'static str] {
        &self.labels
    }
}
