use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;
use reqwest::Url;

use super::errors::StoreError;

const LEGACY_STORE_HOST: &str = "chrome.google.com";
const STORE_HOST: &str = "chromewebstore.google.com";

fn extension_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Chrome encodes the key hash in the letters a-p, 32 of them.
    PATTERN.get_or_init(|| Regex::new(r"^[a-p]{32}$").unwrap())
}

/// A validated Chrome extension identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionId(String);

impl ExtensionId {
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        if !extension_id_pattern().is_match(value) {
            return Err(StoreError::InvalidExtensionId(value.to_string()));
        }

        Ok(ExtensionId(value.to_string()))
    }

    /// Accepts either a bare ID or a Web Store detail page URL.
    pub fn resolve(input: &str) -> Result<Self, StoreError> {
        let input = input.trim();

        if input.contains("://") {
            parse_store_url(input)
        } else {
            Self::parse(input)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExtensionId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the extension ID from a Web Store detail page URL.
///
/// Both the legacy `chrome.google.com/webstore/detail/<slug>/<id>` form and
/// the current `chromewebstore.google.com/detail/<slug>/<id>` form are
/// accepted.
pub fn parse_store_url(url: &str) -> Result<ExtensionId, StoreError> {
    let invalid = || StoreError::InvalidStoreUrl(url.to_string());

    let parsed = Url::parse(url).map_err(|_| invalid())?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    let id = match (parsed.host_str(), segments.as_slice()) {
        (Some(LEGACY_STORE_HOST), ["webstore", "detail", _, id]) => id,
        (Some(STORE_HOST), ["detail", _, id]) => id,
        _ => return Err(invalid()),
    };

    ExtensionId::parse(id)
}
