use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;

const WHATSAPP_PREFIX: &str = "whatsapp:+";

/// Sends WhatsApp messages through the Twilio Messages API.
pub struct TwilioWhatsAppProvider {
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

impl TwilioWhatsAppProvider {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self {
            account_sid,
            auth_token,
            from_number,
            client: reqwest::Client::new(),
        }
    }

    fn check_config(&self, to: &str) -> anyhow::Result<()> {
        let missing: Vec<&str> = [
            ("TWILIO_ACCOUNT_SID", self.account_sid.as_str()),
            ("TWILIO_AUTH_TOKEN", self.auth_token.as_str()),
            ("TWILIO_WHATSAPP_SENDER_NUMBER", self.from_number.as_str()),
            ("OWNER_WHATSAPP_RECIPIENT_NUMBER", to),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            anyhow::bail!("Twilio configuration incomplete, missing: {}", missing.join(", "));
        }

        if !is_whatsapp_number(&self.from_number) || !is_whatsapp_number(to) {
            anyhow::bail!("WhatsApp numbers must look like {WHATSAPP_PREFIX}12345678900");
        }

        Ok(())
    }
}

pub fn is_whatsapp_number(number: &str) -> bool {
    number
        .strip_prefix(WHATSAPP_PREFIX)
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[async_trait]
impl MessagingProvider for TwilioWhatsAppProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.check_config(to)?;

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        self.client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", &self.from_number), ("Body", body)])
            .send()
            .await
            .context("failed to send Twilio WhatsApp message")?
            .error_for_status()
            .context("Twilio API returned error")?;

        Ok(())
    }
}
