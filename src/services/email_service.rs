use serde::Serialize;

use crate::config::BrevoConfig;

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    text_content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Transactional email through the Brevo HTTP API.
#[derive(Clone)]
pub struct BrevoMailer {
    client: reqwest::Client,
    config: BrevoConfig,
}

impl BrevoMailer {
    pub fn new(config: BrevoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn send_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        subject: &str,
        text: String,
    ) -> Result<(), EmailError> {
        let body = build_body(&self.config, to_email, to_name, subject, text);

        let resp = self
            .client
            .post(BREVO_SEND_URL)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(EmailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn build_body(
    config: &BrevoConfig,
    to_email: &str,
    to_name: Option<&str>,
    subject: &str,
    text: String,
) -> BrevoSendEmailBody {
    BrevoSendEmailBody {
        sender: BrevoEmailAddress {
            email: config.sender_email.clone(),
            name: config.sender_name.clone(),
        },
        to: vec![BrevoEmailAddress {
            email: to_email.to_string(),
            name: to_name.map(|s| s.to_string()),
        }],
        subject: subject.to_string(),
        text_content: text,
    }
}
