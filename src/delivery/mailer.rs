use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::delivery::{Mailer, OutgoingMail};
use crate::error::AppError;

const IMPLICIT_TLS_PORT: u16 = 465;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    /// STARTTLS on any port except 465, which speaks TLS from the start.
    pub fn new(config: SmtpConfig) -> Result<Self, AppError> {
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self {
            transport,
            from: config.from.parse()?,
            to: config.to.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        let message = build_message(self.from.clone(), self.to.clone(), mail)?;
        self.transport.send(message).await?;
        tracing::info!("Email sent to {}", self.to);
        Ok(())
    }
}

/// HTML body, plus the spreadsheet as a second part when there is one.
pub fn build_message(from: Mailbox, to: Mailbox, mail: OutgoingMail) -> Result<Message, AppError> {
    let builder = Message::builder().from(from).to(to).subject(mail.subject);
    let body = SinglePart::html(mail.html);

    let message = match mail.attachment {
        Some(artifact) => {
            let content_type = ContentType::parse(&artifact.content_type).map_err(|e| {
                AppError::Delivery(format!(
                    "Bad attachment content type '{}': {e}",
                    artifact.content_type
                ))
            })?;
            let attachment = Attachment::new(artifact.file_name).body(artifact.bytes, content_type);
            builder.multipart(MultiPart::mixed().singlepart(body).singlepart(attachment))?
        }
        None => builder.singlepart(body)?,
    };
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::PersistedArtifact;
    use crate::digest::reporter::XLSX_CONTENT_TYPE;
    use std::path::PathBuf;

    fn mailbox(addr: &str) -> Mailbox {
        addr.parse().unwrap()
    }

    fn mail(attachment: Option<PersistedArtifact>) -> OutgoingMail {
        OutgoingMail {
            subject: "Psychology Jobs Report - 10/17/2026".to_string(),
            html: "<h2>Daily Psychology Jobs Report</h2>".to_string(),
            attachment,
        }
    }

    #[test]
    fn message_without_attachment_is_single_part() {
        let message = build_message(
            mailbox("me@example.com"),
            mailbox("you@example.com"),
            mail(None),
        )
        .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("Subject: Psychology Jobs Report - 10/17/2026"));
        assert!(raw.contains("text/html"));
        assert!(!raw.contains("attachment"));
    }

    #[test]
    fn message_with_attachment_is_multipart() {
        let artifact = PersistedArtifact {
            path: PathBuf::from("psych_jobs_20261017.xlsx"),
            file_name: "psych_jobs_20261017.xlsx".to_string(),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            bytes: b"PK\x03\x04".to_vec(),
        };
        let message = build_message(
            mailbox("me@example.com"),
            mailbox("you@example.com"),
            mail(Some(artifact)),
        )
        .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("attachment"));
        assert!(raw.contains("psych_jobs_20261017.xlsx"));
    }

    #[test]
    fn rejects_bad_content_type() {
        let artifact = PersistedArtifact {
            path: PathBuf::from("x"),
            file_name: "x".to_string(),
            content_type: "not a type".to_string(),
            bytes: vec![],
        };
        let err = build_message(
            mailbox("me@example.com"),
            mailbox("you@example.com"),
            mail(Some(artifact)),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
    }
}
