use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::currency::CurrencyCode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported language `{0}` (expected en|hi)")]
pub struct UnsupportedLanguage(pub String);

impl Language {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        let primary = normalized.split('-').next().unwrap_or_default();
        match primary {
            "en" => Ok(Self::En),
            "hi" => Ok(Self::Hi),
            _ => Err(UnsupportedLanguage(value.trim().to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub language: Language,
    pub currency: CurrencyCode,
}

impl DisplayPreferences {
    pub fn new(language: Language, currency: CurrencyCode) -> Self {
        Self { language, currency }
    }

    pub fn with_currency(self, currency: CurrencyCode) -> Self {
        Self { currency, ..self }
    }

    pub fn with_language(self, language: Language) -> Self {
        Self { language, ..self }
    }
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self { language: Language::En, currency: CurrencyCode::Inr }
    }
}

/// Owner of the session's display preferences. Only the store can change them;
/// everything else holds a [`PreferenceReader`].
#[derive(Debug)]
pub struct PreferenceStore {
    sender: watch::Sender<DisplayPreferences>,
}

impl PreferenceStore {
    pub fn new(initial: DisplayPreferences) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self { sender }
    }

    pub fn reader(&self) -> PreferenceReader {
        PreferenceReader { receiver: self.sender.subscribe() }
    }

    pub fn current(&self) -> DisplayPreferences {
        *self.sender.borrow()
    }

    pub fn set(&self, preferences: DisplayPreferences) {
        let previous = self.sender.send_replace(preferences);
        if previous != preferences {
            info!(
                event_name = "preferences.updated",
                language = preferences.language.tag(),
                currency = preferences.currency.code(),
                "display preferences updated"
            );
        }
    }

    pub fn set_currency(&self, currency: CurrencyCode) {
        self.set(self.current().with_currency(currency));
    }

    pub fn set_language(&self, language: Language) {
        self.set(self.current().with_language(language));
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(DisplayPreferences::default())
    }
}

#[derive(Clone, Debug)]
pub struct PreferenceReader {
    receiver: watch::Receiver<DisplayPreferences>,
}

impl PreferenceReader {
    pub fn current(&self) -> DisplayPreferences {
        *self.receiver.borrow()
    }

    /// Waits for the next update. Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<DisplayPreferences> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }
}
