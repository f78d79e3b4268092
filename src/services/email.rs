use crate::config::email::{portal_url, EmailConfig};
use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Details the reminder mail needs; kept separate from the entity so the
/// reminder job can format dates once per event.
pub struct ReminderMail<'a> {
    pub recipient_name: &'a str,
    pub event_id: i32,
    pub event_title: &'a str,
    pub location: &'a str,
    pub starts_at: &'a str,
}

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
    portal_url: String,
}

impl EmailService {
    /// Mail is skipped, not failed, when SMTP is not configured.
    pub fn from_env() -> Self {
        let Some(cfg) = EmailConfig::from_env() else {
            return Self::disabled();
        };

        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        match AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build())
        {
            Ok(transport) => Self {
                transport: Some(transport),
                from_address: Some(cfg.from_address),
                portal_url: cfg.portal_url,
            },
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport: {e}");
                Self {
                    portal_url: cfg.portal_url,
                    ..Self::disabled()
                }
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: None,
            portal_url: portal_url(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send_event_reminder(&self, to: &str, mail: &ReminderMail<'_>) -> Result<()> {
        let subject = format!("Pengingat: {} besok", mail.event_title);
        let body = reminder_body(&self.portal_url, mail);
        self.send_email(to, &subject, &body).await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let (Some(transport), Some(from_address)) = (&self.transport, &self.from_address) else {
            tracing::debug!("SMTP not configured, skipping email to {to}");
            return Ok(());
        };

        let from_mailbox: Mailbox =
            from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", from_address, e)
                })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        tracing::info!("Email sent to {to}: {subject}");
        Ok(())
    }
}

fn reminder_body(portal_url: &str, mail: &ReminderMail<'_>) -> String {
    format!(
        "Halo {name},\n\n\
         Ini pengingat bahwa acara \"{title}\" akan berlangsung besok.\n\n\
         Waktu  : {when}\n\
         Tempat : {place}\n\n\
         Detail acara: {portal}/events/{id}\n\n\
         Sampai jumpa!",
        name = mail.recipient_name,
        title = mail.event_title,
        when = mail.starts_at,
        place = mail.location,
        portal = portal_url,
        id = mail.event_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_links_to_event_page() {
        let body = reminder_body(
            "https://alumni.example.org",
            &ReminderMail {
                recipient_name: "Sari",
                event_id: 12,
                event_title: "Reuni Akbar",
                location: "Aula Utama",
                starts_at: "2030-06-01 18:00 UTC",
            },
        );
        assert!(body.starts_with("Halo Sari,"));
        assert!(body.contains("\"Reuni Akbar\""));
        assert!(body.contains("https://alumni.example.org/events/12"));
    }

    #[tokio::test]
    async fn disabled_service_skips_silently() {
        let service = EmailService::disabled();
        assert!(!service.is_configured());
        let mail = ReminderMail {
            recipient_name: "Sari",
            event_id: 1,
            event_title: "Reuni",
            location: "Aula",
            starts_at: "besok",
        };
        assert!(service
            .send_event_reminder("sari@example.org", &mail)
            .await
            .is_ok());
    }
}
