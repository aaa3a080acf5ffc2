use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;
use crate::services::error::ServiceError;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct SmtpEmailSender {
    mailer: SmtpTransport,
    from_email: String,
    code_ttl_minutes: u64,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig, code_ttl: Duration) -> Result<Self, ServiceError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| ServiceError::Email(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP email sender initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
            code_ttl_minutes: (code_ttl.as_secs() / 60).max(1),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: String,
        html_body: String,
    ) -> Result<(), ServiceError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| ServiceError::Email(e.to_string()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| ServiceError::Email(e.to_string()))?)
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
            )
            .map_err(|e| ServiceError::Email(e.to_string()))?;

        // SmtpTransport is blocking.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(ServiceError::Email(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), ServiceError> {
        let html_body = format!(
            r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Your verification code</h2>
        <p style="font-size: 24px; letter-spacing: 4px;"><strong>{}</strong></p>
        <p style="color: #666; font-size: 12px;">
            The code expires in {} minutes. If you didn't request it, please ignore this email.
        </p>
    </body>
</html>"###,
            code, self.code_ttl_minutes
        );

        let plain_body = format!(
            "Your verification code is {}\n\nThe code expires in {} minutes. If you didn't request it, please ignore this email.",
            code, self.code_ttl_minutes
        );

        self.send_email(to_email, "Your verification code", plain_body, html_body)
            .await
    }
}

/// Records every code it is asked to send.
#[derive(Default)]
pub struct MockEmailSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: std::sync::atomic::AtomicBool,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Most recent code sent to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(to, _)| to.eq_ignore_ascii_case(email))
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), ServiceError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ServiceError::Email("mock sender failure".to_string()));
        }
        self.sent
            .lock()
            .map_err(|e| ServiceError::Email(format!("Mock email mutex poisoned: {}", e)))?
            .push((to_email.to_string(), code.to_string()));
        Ok(())
    }
}
