//! Output languages.

use serde::{Deserialize, Serialize};

/// Data file written when multi-language output is disabled.
pub const DEFAULT_DATA_FILE: &str = "site-data.json";

/// One language the site is exported in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language code (e.g. `en`, `fr`).
    pub code: String,

    /// Display name.
    pub name: String,

    /// Routing prefix; empty for the default language.
    pub path: String,

    /// File name of this language's data document.
    pub file_name: String,

    /// Whether this is the default language.
    pub is_default: bool,

    /// Whether multi-language output is enabled for this run.
    pub multilingual: bool,
}

impl Language {
    /// The single language used when no languages are configured.
    pub fn monolingual() -> Self {
        Self {
            code: "en".to_string(),
            name: "English".to_string(),
            path: String::new(),
            file_name: DEFAULT_DATA_FILE.to_string(),
            is_default: true,
            multilingual: false,
        }
    }

    /// Code passed to the content store; `None` when multi-language output
    /// is disabled.
    pub fn store_code(&self) -> Option<&str> {
        self.multilingual.then_some(self.code.as_str())
    }

    /// Data file name for a language code.
    pub fn data_file_for(code: &str) -> String {
        format!("site-data_{code}.json")
    }
}
