//! Support-inbox notifications through the Postmark email API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{status_error, ClientError, Notifier, SupportMessage};
use crate::config::EmailSettings;

const POSTMARK_API_URL: &str = "https://api.postmarkapp.com/email";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkEmail<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkResponse {
    message_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostmarkNotifier {
    client: Client,
    server_token: String,
    from: String,
    to: String,
}

impl PostmarkNotifier {
    pub fn new(client: Client, settings: &EmailSettings) -> Self {
        Self {
            client,
            server_token: settings.server_token.clone(),
            from: settings.from.clone(),
            to: settings.support_inbox.clone(),
        }
    }
}

#[async_trait]
impl Notifier for PostmarkNotifier {
    async fn send(&self, message: &SupportMessage) -> Result<(), ClientError> {
        let body = PostmarkEmail {
            from: &self.from,
            to: &self.to,
            reply_to: message.reply_to.as_deref().unwrap_or(&self.from),
            subject: &message.subject,
            html_body: &message.html_body,
            text_body: &message.text_body,
        };

        let response = self
            .client
            .post(POSTMARK_API_URL)
            .header("Accept", "application/json")
            .header("X-Postmark-Server-Token", &self.server_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let sent: PostmarkResponse = response.json().await?;
        debug!("Support notification accepted: {:?}", sent.message_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_postmark_field_names() {
        let email = PostmarkEmail {
            from: "noreply@example.com",
            to: "support@example.com",
            reply_to: "jane@example.com",
            subject: "Refund Request",
            html_body: "<p>hi</p>",
            text_body: "hi",
        };
        let value = serde_json::to_value(&email).unwrap();
        assert_eq!(value["From"], "noreply@example.com");
        assert_eq!(value["ReplyTo"], "jane@example.com");
        assert_eq!(value["HtmlBody"], "<p>hi</p>");
        assert_eq!(value["TextBody"], "hi");
    }
}
