use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use once_cell::sync::OnceCell;
use secrecy::ExposeSecret;
use service_core::error::AppError;

use crate::config::EmailConfig;

pub const RESET_SUBJECT: &str = "CYACC Admin Password Reset";
pub const PASSWORD_UPDATED_SUBJECT: &str = "CYACC Admin Password Updated";
pub const PASSWORD_CHANGED_SUBJECT: &str = "CYACC Admin Password Changed";

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Mail the reset link. An error here means the user never receives it.
    async fn send_password_reset_email(&self, to_email: &str, reset_link: &str)
        -> Result<(), AppError>;

    /// Notice after a password reset was completed.
    async fn send_password_updated_email(&self, to_email: &str) -> Result<(), AppError>;

    /// Notice after a signed-in user changed their password.
    async fn send_password_changed_email(&self, to_email: &str) -> Result<(), AppError>;
}

/// SMTP mailer. The transport is built on the first send and shared by all
/// clones of the service.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    mailer: Arc<OnceCell<SmtpTransport>>,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            config: Arc::new(config.clone()),
            mailer: Arc::new(OnceCell::new()),
        }
    }

    fn transport(&self) -> Result<&SmtpTransport, AppError> {
        self.mailer.get_or_try_init(|| {
            let creds = Credentials::new(
                self.config.user.clone(),
                self.config.password.expose_secret().clone(),
            );

            let mailer = SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::EmailError(e.to_string()))?
                .credentials(creds)
                .port(587)
                .timeout(Some(Duration::from_secs(10)))
                .build();

            tracing::info!(host = %self.config.smtp_host, "SMTP transport initialized");
            Ok(mailer)
        })
    }

    fn sender(&self) -> Result<Mailbox, AppError> {
        format!("\"{}\" <{}>", self.config.from_name, self.config.user)
            .parse()
            .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: String,
        html_body: String,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.sender()?)
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        // SMTP I/O is blocking
        let mailer = self.transport()?.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, subject = %subject, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

fn reset_bodies(reset_link: &str) -> (String, String) {
    let plain = [
        "You recently requested to reset your CYACC Admin password.",
        "If this was you, click the link below to reset your password:",
        reset_link,
        "",
        "This link will expire in 1 hour.",
        "",
        "If you did not request a password reset, please ignore this email.",
    ]
    .join("\n");

    let html = format!(
        r#"<p>You recently requested to reset your CYACC Admin password.</p>
<p>If this was you, click the link below to reset your password:</p>
<p><a href="{}" target="_blank" rel="noopener noreferrer">Reset your password</a></p>
<p>This link will expire in 1 hour.</p>
<p>If you did not request a password reset, you can safely ignore this email.</p>"#,
        reset_link
    );

    (plain, html)
}

fn notice_bodies(action: &str) -> (String, String) {
    let line = format!("Your CYACC Admin password has been {} successfully.", action);
    let html = format!("<p>{}</p>", line);
    (line, html)
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_link: &str,
    ) -> Result<(), AppError> {
        let (plain, html) = reset_bodies(reset_link);
        self.send_email(to_email, RESET_SUBJECT, plain, html).await
    }

    async fn send_password_updated_email(&self, to_email: &str) -> Result<(), AppError> {
        let (plain, html) = notice_bodies("updated");
        self.send_email(to_email, PASSWORD_UPDATED_SUBJECT, plain, html)
            .await
    }

    async fn send_password_changed_email(&self, to_email: &str) -> Result<(), AppError> {
        let (plain, html) = notice_bodies("changed");
        self.send_email(to_email, PASSWORD_CHANGED_SUBJECT, plain, html)
            .await
    }
}

/// A mail captured by [`MockEmailService`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory mailer for tests.
#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, to: &str, subject: &str, body: String) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::EmailError("mock transport failure".to_string()));
        }

        self.sent
            .lock()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Mock mailer mutex poisoned: {}", e))
            })?
            .push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body,
            });
        Ok(())
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_link: &str,
    ) -> Result<(), AppError> {
        let (plain, _) = reset_bodies(reset_link);
        self.record(to_email, RESET_SUBJECT, plain)
    }

    async fn send_password_updated_email(&self, to_email: &str) -> Result<(), AppError> {
        let (plain, _) = notice_bodies("updated");
        self.record(to_email, PASSWORD_UPDATED_SUBJECT, plain)
    }

    async fn send_password_changed_email(&self, to_email: &str) -> Result<(), AppError> {
        let (plain, _) = notice_bodies("changed");
        self.record(to_email, PASSWORD_CHANGED_SUBJECT, plain)
    }
}
