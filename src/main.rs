use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use email_triage::EmailAssistant;
use email_triage::config::max_text_chars_from_env;
use email_triage::reply::ReplyContext;

const DEFAULT_SLA: &str = "2 dias úteis";

#[derive(Parser)]
#[command(name = "email-triage")]
#[command(about = "Classify an email and suggest a reply")]
struct Args {
    /// Email text (reads --file or stdin when absent)
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Plain-text file with the email body
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// Recipient name for the reply
    #[arg(long)]
    name: Option<String>,

    /// Ticket or contract reference
    #[arg(long)]
    reference: Option<String>,

    /// Current status of the request
    #[arg(long)]
    status: Option<String>,

    /// Expected response window
    #[arg(long, default_value = DEFAULT_SLA)]
    sla: String,

    /// Attached file name (repeatable)
    #[arg(long = "attachment")]
    attachments: Vec<String>,

    /// Event name for invitation replies
    #[arg(long)]
    event: Option<String>,

    /// Information still needed from the sender (repeatable)
    #[arg(long = "missing-info")]
    missing_info: Vec<String>,
}

impl Args {
    fn read_text(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()));
        }
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    }

    fn reply_context(&self) -> ReplyContext {
        let mut ctx = ReplyContext::new().with_sla(&self.sla);
        if let Some(name) = &self.name {
            ctx = ctx.with_recipient_name(name);
        }
        if let Some(reference) = &self.reference {
            ctx = ctx.with_reference_id(reference);
        }
        if let Some(status) = &self.status {
            ctx = ctx.with_current_status(status);
        }
        if let Some(event) = &self.event {
            ctx = ctx.with_value("evento", event);
        }
        for item in &self.missing_info {
            ctx = ctx.with_missing_info(item);
        }

        ctx.attachments = self.attachments.clone();
        if ctx.attachments.is_empty() {
            let file_name = self
                .file
                .as_deref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned());
            ctx.attachments.extend(file_name);
        }
        ctx
    }
}

/// Cap at `max_chars` characters, never splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let raw = args.read_text()?;
    if raw.trim().is_empty() {
        bail!("Email text is empty");
    }
    let text = truncate_chars(&raw, max_text_chars_from_env());

    let assistant = EmailAssistant::from_env().context("Failed to configure email triage")?;
    let outcome = assistant.process(text, &args.reply_context()).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn file_name_becomes_default_attachment() {
        let args = Args::parse_from(["email-triage", "--file", "/tmp/pedido.txt"]);
        let ctx = args.reply_context();
        assert_eq!(ctx.attachments, vec!["pedido.txt"]);
        assert_eq!(ctx.sla.as_deref(), Some(DEFAULT_SLA));
    }

    #[test]
    fn explicit_attachments_win_over_file_name() {
        let args = Args::parse_from([
            "email-triage",
            "--file",
            "corpo.txt",
            "--attachment",
            "a.pdf",
            "--attachment",
            "b.pdf",
            "--event",
            "Workshop",
        ]);
        let ctx = args.reply_context();
        assert_eq!(ctx.attachments, vec!["a.pdf", "b.pdf"]);
        assert_eq!(ctx.extra.get("evento").map(String::as_str), Some("Workshop"));
    }

    #[test]
    fn missing_info_flags_fill_the_question_list() {
        let args = Args::parse_from([
            "email-triage",
            "--text",
            "O sistema não abre",
            "--missing-info",
            "versão do navegador",
            "--missing-info",
            "horário do erro",
        ]);
        let resolved = args.reply_context().resolve();
        assert_eq!(
            resolved["perguntas_faltantes"],
            "versão do navegador e horário do erro"
        );
    }

    #[test]
    fn text_and_file_conflict() {
        let parsed = Args::try_parse_from(["email-triage", "--text", "oi", "--file", "x.txt"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn reads_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("email.txt");
        std::fs::write(&path, "Qual o status do chamado?").unwrap();
        let args = Args::parse_from(["email-triage", "--file", path.to_str().unwrap()]);
        assert_eq!(args.read_text().unwrap(), "Qual o status do chamado?");
    }
}
