//! Prefilled chat message used to hand a quoted exchange to a human operator.

use super::format::format_amount;
use super::pricing::Direction;
use anyhow::{Context, Result};
use reqwest::Url;

const CHAT_BASE_URL: &str = "https://wa.me";

#[derive(Debug, Clone, PartialEq)]
pub struct HandoffMessage {
    text: String,
}

impl HandoffMessage {
    pub fn new(
        direction: Direction,
        amount: f64,
        formatted_output: &str,
        contact_name: &str,
    ) -> Self {
        let (from, to) = direction.legs();
        let text = format!(
            "Hello {contact_name},\nI want to exchange:\n\nFrom: {from} {}\nTo: {to} {formatted_output}\n\nPlease confirm.",
            format_amount(amount)
        );
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Chat link that opens a conversation with `phone`, message prefilled.
    pub fn link(&self, phone: &str) -> Result<Url> {
        let phone: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if phone.is_empty() {
            anyhow::bail!("Handoff phone number has no digits");
        }
        Url::parse_with_params(&format!("{CHAT_BASE_URL}/{phone}"), &[("text", &self.text)])
            .context("Failed to build handoff link")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text() {
        let message = HandoffMessage::new(Direction::TzsToIdr, 260_000.0, "1,502,780", "Egi");
        assert_eq!(
            message.text(),
            "Hello Egi,\nI want to exchange:\n\nFrom: TZS 260,000\nTo: IDR 1,502,780\n\nPlease confirm."
        );
    }

    #[test]
    fn test_link_encodes_message() {
        let message = HandoffMessage::new(Direction::IdrToTzs, 1_000_000.0, "150,000", "Egi");
        let link = message.link("+62 812-3515-8460").unwrap();

        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/6281235158460");
        let (key, value) = link.query_pairs().next().unwrap();
        assert_eq!(key, "text");
        assert_eq!(value, message.text());
    }

    #[test]
    fn test_link_requires_phone_digits() {
        let message = HandoffMessage::new(Direction::TzsToIdr, 1.0, "0", "Egi");
        assert!(message.link("n/a").is_err());
    }
}
