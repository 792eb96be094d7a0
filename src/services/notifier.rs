use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::AppConfig;
use crate::errors::MonitorError;
use crate::models::Alert;

/// Outbound alert delivery.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), MonitorError>;
}

/// Email delivery over STARTTLS submission. One attempt per alert, no retry.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

fn mailbox(raw: &str) -> Result<Mailbox, MonitorError> {
    raw.parse()
        .map_err(|e| MonitorError::Config(format!("bad email address {raw:?}: {e}")))
}

impl EmailNotifier {
    /// Returns `None` when no mail host or recipient is configured.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, MonitorError> {
        let (Some(host), Some(recipient)) = (&config.smtp_host, &config.alert_recipient) else {
            return Ok(None);
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        let to = mailbox(recipient)?;
        // Relay logins such as `apikey` are not addresses; send as the recipient then.
        let from = match config.smtp_user.as_deref().map(str::parse::<Mailbox>) {
            Some(Ok(user)) => user,
            Some(Err(_)) => {
                tracing::debug!("SMTP_USER is not an email address; using recipient as sender");
                to.clone()
            }
            None => to.clone(),
        };

        Ok(Some(Self {
            transport: builder.build(),
            from,
            to,
        }))
    }

    pub fn build_message(&self, alert: &Alert) -> Result<Message, MonitorError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body())?;
        Ok(message)
    }
}

#[async_trait]
impl AlertNotifier for EmailNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        let message = self.build_message(alert)?;
        let resp = self.transport.send(message).await?;
        if !resp.is_positive() {
            return Err(MonitorError::Delivery(format!(
                "SMTP server answered {}",
                resp.code()
            )));
        }
        tracing::info!(
            wallet = %alert.wallet,
            reason = alert.reason.as_str(),
            "Alert email sent"
        );
        Ok(())
    }
}
