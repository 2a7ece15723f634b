//! Reply templates and placeholder filling.
//!
//! Templates are keyed by `(Category, Intent)` and use `{name}` placeholders
//! (`{{` and `}}` for literal braces). Placeholder values come from a
//! `ReplyContext` layered over fixed defaults.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::nlp::labels::{Category, Intent};

/// Default missing-information prompts for technical questions.
pub const DEFAULT_MISSING_INFO: [&str; 3] = ["ambiente", "passos para reproduzir", "prints/logs"];

/// Per-request placeholder values. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyContext {
    /// Recipient name (`{nome}`).
    #[serde(default, rename = "nome")]
    pub recipient_name: Option<String>,
    /// Ticket/contract reference (`{referencia}`).
    #[serde(default, rename = "referencia")]
    pub reference_id: Option<String>,
    /// Current processing status (`{status_atual}`).
    #[serde(default, rename = "status_atual")]
    pub current_status: Option<String>,
    /// Expected response window (`{sla}`).
    #[serde(default)]
    pub sla: Option<String>,
    /// Attached file names (`{arquivos}`).
    #[serde(default, rename = "arquivos")]
    pub attachments: Vec<String>,
    /// Information still needed from the sender (`{perguntas_faltantes}`).
    #[serde(default, rename = "perguntas_faltantes")]
    pub missing_info: Vec<String>,
    /// Any other placeholder, e.g. `evento`.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ReplyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipient_name(mut self, name: impl Into<String>) -> Self {
        self.recipient_name = Some(name.into());
        self
    }

    pub fn with_reference_id(mut self, reference: impl Into<String>) -> Self {
        self.reference_id = Some(reference.into());
        self
    }

    pub fn with_current_status(mut self, status: impl Into<String>) -> Self {
        self.current_status = Some(status.into());
        self
    }

    pub fn with_sla(mut self, sla: impl Into<String>) -> Self {
        self.sla = Some(sla.into());
        self
    }

    pub fn with_attachment(mut self, name: impl Into<String>) -> Self {
        self.attachments.push(name.into());
        self
    }

    pub fn with_missing_info(mut self, item: impl Into<String>) -> Self {
        self.missing_info.push(item.into());
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Defaults overlaid with every non-empty context value.
    pub fn resolve(&self) -> HashMap<String, String> {
        let mut values = default_values();

        let mut set = |key: &str, value: Option<String>| {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                values.insert(key.to_string(), v);
            }
        };

        set("nome", self.recipient_name.clone());
        set("referencia", self.reference_id.clone());
        set("status_atual", self.current_status.clone());
        set("sla", self.sla.clone());
        set("arquivos", join_list(&self.attachments));
        set("perguntas_faltantes", join_list(&self.missing_info));
        for (key, value) in &self.extra {
            set(key, Some(value.clone()));
        }

        values
    }
}

fn default_values() -> HashMap<String, String> {
    HashMap::from([
        ("nome".to_string(), String::new()),
        ("referencia".to_string(), "(ID não informado)".to_string()),
        ("status_atual".to_string(), "em análise".to_string()),
        ("sla".to_string(), Utc::now().format("%d/%m/%Y").to_string()),
        ("arquivos".to_string(), "(não especificado)".to_string()),
        (
            "perguntas_faltantes".to_string(),
            join_list(&DEFAULT_MISSING_INFO).unwrap_or_default(),
        ),
    ])
}

/// "a", "a e b", "a, b e c". `None` when nothing non-empty remains.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> Option<String> {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect();

    match items.as_slice() {
        [] => None,
        [only] => Some(only.to_string()),
        [head @ .., last] => Some(format!("{} e {}", head.join(", "), last)),
    }
}

/// Substitute `{name}` placeholders.
///
/// Values are inserted verbatim and never re-scanned. An unknown placeholder
/// or a stray brace is an error; callers fall back to the raw template.
pub fn fill(template: &str, values: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if rest[pos..].starts_with('}') {
            if !after.starts_with('}') {
                return Err(TemplateError::UnbalancedBrace(offset + pos));
            }
            out.push('}');
            rest = &after[1..];
            offset += pos + 2;
            continue;
        }

        if after.starts_with('{') {
            out.push('{');
            rest = &after[1..];
            offset += pos + 2;
            continue;
        }

        let end = after
            .find('}')
            .ok_or(TemplateError::UnbalancedBrace(offset + pos))?;
        let key = &after[..end];
        if key.contains('{') {
            return Err(TemplateError::UnbalancedBrace(offset + pos));
        }
        let value = values
            .get(key)
            .ok_or_else(|| TemplateError::MissingKey(key.to_string()))?;
        out.push_str(value);

        rest = &after[end + 1..];
        offset += pos + end + 2;
    }

    out.push_str(rest);
    Ok(out)
}

/// Generic reply for pairs with no dedicated template.
pub const FALLBACK_TEMPLATE: &str = "Assunto: Retorno da sua mensagem\n\n\
    Olá. Recebemos seu contato referente a '{intent}'. Em breve retornaremos.\n\n\
    Atenciosamente, Equipe";

/// Template for a `(category, intent)` pair, if one exists.
pub fn template_for(category: Category, intent: Intent) -> Option<&'static str> {
    use Category::{Productive, Unproductive};

    let template = match (category, intent) {
        (Productive, Intent::StatusRequest) => {
            "Assunto: Atualização do seu atendimento\n\n\
             Olá, {nome}, tudo bem?\n\n\
             Localizamos sua solicitação {referencia}. No momento, ela está em '{status_atual}'.\n\
             Previsão de próxima atualização: {sla}.\n\n\
             Se houver qualquer novo documento ou informação, por gentileza responda a este e-mail.\n\n\
             Atenciosamente,\nEquipe de Suporte"
        }
        (Productive, Intent::InformationRequest) => {
            "Assunto: Informações solicitadas\n\n\
             Olá, {nome}. Recebemos sua solicitação de informações.\n\
             Estamos levantando os dados necessários e retornaremos até {sla}.\n\n\
             Caso precise de algo mais específico, por favor detalhe sua necessidade.\n\n\
             Atenciosamente,\nEquipe de Suporte"
        }
        (Productive, Intent::DocumentSubmission) => {
            "Assunto: Documentos recebidos com sucesso\n\n\
             Olá, {nome}. Confirmamos o recebimento do(s) arquivo(s): {arquivos}.\n\
             Encaminhamos para análise e retornamos até {sla}.\n\n\
             Atenciosamente,\nEquipe de Suporte"
        }
        (Productive, Intent::TechnicalSupport) => {
            "Assunto: Retorno sobre sua dúvida técnica\n\n\
             Olá, {nome}. Obrigado por nos contatar.\n\
             Para agilizar, poderia informar: {perguntas_faltantes}?\n\
             Assim que recebermos, seguimos com a solução. Prazo estimado: {sla}.\n\n\
             Atenciosamente,\nEquipe de Suporte"
        }
        (Productive, Intent::MeetingScheduling) => {
            "Assunto: Confirmação de agendamento\n\n\
             Olá, {nome}. Recebemos sua solicitação de agendamento.\n\
             Verificaremos a disponibilidade e confirmaremos até {sla}.\n\n\
             Por favor, informe se há alguma preferência de horário ou pauta específica.\n\n\
             Atenciosamente,\nEquipe"
        }
        (Productive, Intent::ApprovalRequest) => {
            "Assunto: Solicitação em análise para aprovação\n\n\
             Olá, {nome}. Recebemos sua solicitação de aprovação/autorização.\n\
             Encaminhamos para o setor responsável. Prazo de retorno: {sla}.\n\n\
             Manteremos você informado sobre o andamento.\n\n\
             Atenciosamente,\nEquipe de Suporte"
        }
        (Productive, Intent::FollowUp) => {
            "Assunto: Acompanhamento da sua solicitação\n\n\
             Olá, {nome}. Recebemos seu follow-up sobre {referencia}.\n\
             Verificaremos o status atual e retornaremos com uma atualização até {sla}.\n\n\
             Agradecemos sua paciência e acompanhamento.\n\n\
             Atenciosamente,\nEquipe de Suporte"
        }
        (Productive, Intent::QuoteRequest) => {
            "Assunto: Solicitação de orçamento recebida\n\n\
             Olá, {nome}. Recebemos sua solicitação de orçamento/proposta.\n\
             Nossa equipe comercial analisará os requisitos e retornará até {sla}.\n\n\
             Caso precise de esclarecimentos adicionais, estaremos à disposição.\n\n\
             Atenciosamente,\nEquipe Comercial"
        }
        (Unproductive, Intent::Gratitude) => {
            "Assunto: Agradecemos a sua mensagem\n\n\
             Olá, {nome}! Muito obrigado pela sua mensagem.\n\
             Ficamos à disposição caso precise de algo.\n\n\
             Abraços,\nEquipe"
        }
        (Unproductive, Intent::InformativeNotice) => {
            "Assunto: Confirmação de recebimento\n\n\
             Olá, {nome}. Confirmamos o recebimento da sua mensagem informativa.\n\
             Agradecemos por nos manter atualizados.\n\n\
             Atenciosamente,\nEquipe"
        }
        (Unproductive, Intent::SmallTalk) => {
            "Assunto: Retorno da sua mensagem\n\n\
             Olá, {nome}! Obrigado pela mensagem.\n\
             Ficamos à disposição para assuntos relacionados ao suporte.\n\n\
             Abraços,\nEquipe"
        }
        (Unproductive, Intent::SpamMarketing) => {
            "Assunto: Confirmação de recebimento\n\n\
             Olá. Sua mensagem foi recebida. Caso necessite suporte, por favor descreva o assunto \
             e um identificador (ex.: nº de contrato/atendimento).\n\n\
             Atenciosamente,\nEquipe"
        }
        (Unproductive, Intent::SystemNotification) => {
            "Assunto: Notificação recebida\n\n\
             Olá. Recebemos sua notificação automática.\n\
             Caso seja necessária alguma ação de nossa parte, por favor entre em contato.\n\n\
             Atenciosamente,\nEquipe de Suporte"
        }
        (Unproductive, Intent::EventInvitation) => {
            "Assunto: Agradecemos o convite\n\n\
             Olá, {nome}. Agradecemos pelo convite para {evento}.\n\
             Verificaremos a disponibilidade e retornaremos em breve.\n\n\
             Atenciosamente,\nEquipe"
        }
        _ => return None,
    };
    Some(template)
}
