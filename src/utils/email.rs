use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::instrument;

use practia_core::AppError;

use crate::config::email::EmailConfig;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, recovery_token))]
    pub async fn send_password_recovery(
        &self,
        to_email: &str,
        to_name: &str,
        recovery_token: &str,
    ) -> Result<(), AppError> {
        let reset_link = format!(
            "{}/reset-password?token={}",
            self.config.frontend_url, recovery_token
        );

        let text_body = format!(
            "Hi {},\n\n\
             You requested to reset your password.\n\n\
             Open the link below to choose a new one:\n\
             {}\n\n\
             The link expires in 1 hour. If you didn't request this, you can\n\
             ignore this email.\n\n\
             Practia Team",
            to_name, reset_link
        );
        let html_body = format!(
            "<p>Hi {},</p>\
             <p>You requested to reset your password.</p>\
             <p><a href=\"{}\">Choose a new password</a></p>\
             <p>The link expires in 1 hour. If you didn't request this, you \
             can ignore this email.</p>\
             <p>Practia Team</p>",
            to_name, reset_link
        );

        self.send_email(to_email, "Password reset", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, invite_token))]
    pub async fn send_invitation(
        &self,
        to_email: &str,
        invite_token: &str,
    ) -> Result<(), AppError> {
        let invite_link = format!(
            "{}/invitations/accept?token={}",
            self.config.frontend_url, invite_token
        );

        let text_body = format!(
            "Hello,\n\n\
             You have been invited to join Practia.\n\n\
             Open the link below to set up your account:\n\
             {}\n\n\
             The invitation expires in 7 days.\n\n\
             Practia Team",
            invite_link
        );
        let html_body = format!(
            "<p>Hello,</p>\
             <p>You have been invited to join Practia.</p>\
             <p><a href=\"{}\">Set up your account</a></p>\
             <p>The invitation expires in 7 days.</p>\
             <p>Practia Team</p>",
            invite_link
        );

        self.send_email(to_email, "You're invited to Practia", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, text_body, html_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::info!(to = to_email, subject, "email disabled, skipping send");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let message = Message::builder()
            .from(from.parse().map_err(|e| {
                AppError::internal(anyhow::anyhow!("invalid from address: {e}"))
            })?)
            .to(to_email.parse().map_err(|e| {
                AppError::internal(anyhow::anyhow!("invalid recipient address: {e}"))
            })?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal(anyhow::anyhow!("failed to build email: {e}")))?;

        let credentials = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let mailer = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| AppError::internal(anyhow::anyhow!("smtp relay setup failed: {e}")))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        mailer
            .send(&message)
            .map_err(|e| AppError::internal(anyhow::anyhow!("failed to send email: {e}")))?;

        tracing::info!(to = to_email, subject, "email sent");
        Ok(())
    }
}
