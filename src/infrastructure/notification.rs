//! Notification channels
//!
//! Delivery is fire-and-forget: failures are logged and never reach the run.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use crate::domain::services::Notifier;
use crate::infrastructure::config::SmsConfig;

/// Writes the message to the log output
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, message: &str) {
        info!(target: "notification", "📣 {}", message);
    }

    fn channel_name(&self) -> &'static str {
        "console"
    }
}

/// Sends the message as an SMS through a Twilio-style REST endpoint
#[derive(Debug, Clone)]
pub struct SmsNotifier {
    client: Client,
    config: SmsConfig,
}

impl SmsNotifier {
    pub fn new(config: SmsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    async fn deliver(&self, message: &str) -> Result<(), reqwest::Error> {
        self.client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", self.config.to.as_str()),
                ("From", self.config.from.as_str()),
                ("Body", message),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    async fn send(&self, message: &str) {
        match self.deliver(message).await {
            Ok(()) => info!("📱 SMS notification sent to {}", self.config.to),
            Err(e) => error!("SMS notification failed: {}", e),
        }
    }

    fn channel_name(&self) -> &'static str {
        "sms"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn sms_config(api_base: String) -> SmsConfig {
        SmsConfig {
            api_base,
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            from: "+15550000".into(),
            to: "+15551111".into(),
        }
    }

    #[tokio::test]
    async fn sms_posts_form_to_messages_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("To".into(), "+15551111".into()),
                Matcher::UrlEncoded("Body".into(), "done".into()),
            ]))
            .with_status(201)
            .create_async()
            .await;

        let notifier = SmsNotifier::new(sms_config(server.url())).unwrap();
        notifier.send("done").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sms_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let notifier = SmsNotifier::new(sms_config(server.url())).unwrap();
        notifier.send("done").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn console_notifier_never_fails() {
        ConsoleNotifier.send("Scraping completed.").await;
        assert_eq!(ConsoleNotifier.channel_name(), "console");
    }
}
