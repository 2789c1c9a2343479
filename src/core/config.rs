//! Explicit configuration handed to the controller and backend at construction.

use crate::i18n::Locale;
use anyhow::Context;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct FormConfig {
    pub base_url: Url,
    pub locale: Locale,
}

impl FormConfig {
    pub fn new(base_url: &str, locale: Locale) -> anyhow::Result<Self> {
        Ok(Self { base_url: parse_base_url(base_url)?, locale })
    }
}

/// Parses the base URL and forces a trailing slash so relative joins append
/// to the path instead of replacing its last segment.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid base url: {raw}"))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("base url must be an http(s) url: {raw}");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Absolute URL of a service endpoint, e.g. `api/download`.
pub fn endpoint(base: &Url, path: &str) -> anyhow::Result<Url> {
    base.join(path.trim_start_matches('/'))
        .with_context(|| format!("join {path} onto {base}"))
}
