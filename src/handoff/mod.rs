//! Chat deep-link handoff.
//!
//! After the intake accepts a submission, the visitor is sent to a chat app
//! with a message summarizing what they just submitted. The link is built from
//! a fixed template and opened best-effort; nothing is read back.

use thiserror::Error;

use crate::config::ChatConfig;
use crate::form::{DraftRecord, Field};

/// Fields in the order they appear in the chat message.
const TEMPLATE_FIELDS: [Field; 5] = [
    Field::Name,
    Field::Phone,
    Field::Email,
    Field::Subject,
    Field::Message,
];

/// Builds chat deep links for a fixed recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHandoff {
    base_url: String,
    recipient: String,
    greeting: String,
}

impl ChatHandoff {
    pub fn new(
        base_url: impl AsRef<str>,
        recipient: impl AsRef<str>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_string(),
            recipient: recipient
                .as_ref()
                .chars()
                .filter(char::is_ascii_digit)
                .collect(),
            greeting: greeting.into(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        let recipient = std::env::var("DEEPVISION_CONTACT_CHAT_RECIPIENT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| config.recipient.clone());
        Self::new(&config.base_url, recipient, config.greeting.clone())
    }

    /// The plain-text message, before encoding.
    pub fn message(&self, draft: &DraftRecord) -> String {
        let mut text = String::new();
        let greeting = self.greeting.trim();
        if !greeting.is_empty() {
            text.push_str(greeting);
            text.push_str("\n\n");
        }
        let lines = TEMPLATE_FIELDS
            .iter()
            .map(|field| format!("{}: {}", field.label(), draft.get(*field).trim()))
            .collect::<Vec<_>>();
        text.push_str(&lines.join("\n"));
        text
    }

    pub fn url(&self, draft: &DraftRecord) -> String {
        format!(
            "{}/{}?text={}",
            self.base_url,
            self.recipient,
            urlencoding::encode(&self.message(draft))
        )
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("could not open chat link: {0}")]
    Open(#[from] std::io::Error),
}

/// Opens a built deep link somewhere the visitor can see it.
pub trait LinkLauncher: Send + Sync {
    fn launch(&self, url: &str) -> Result<(), LaunchError>;
}

/// Opens links in the system browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserLauncher;

impl LinkLauncher for BrowserLauncher {
    fn launch(&self, url: &str) -> Result<(), LaunchError> {
        open::that(url)?;
        Ok(())
    }
}

/// Leaves opening to whoever receives the attempt report (the web page).
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredLauncher;

impl LinkLauncher for DeferredLauncher {
    fn launch(&self, _url: &str) -> Result<(), LaunchError> {
        Ok(())
    }
}

impl<L: LinkLauncher + ?Sized> LinkLauncher for Box<L> {
    fn launch(&self, url: &str) -> Result<(), LaunchError> {
        (**self).launch(url)
    }
}
