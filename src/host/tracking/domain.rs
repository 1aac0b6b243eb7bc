use std::{fmt::Display, sync::Arc};

use url::Url;

/// Hostname of a web page. The unit time is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(Arc<str>);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the hostname of web pages. Browser internal pages, files, extension pages and
/// anything unparsable have no domain.
pub fn resolve_domain(raw_url: &str) -> Option<Domain> {
    let url = Url::parse(raw_url).ok()?;
    if !url.scheme().starts_with("http") {
        return None;
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(Domain(host.into())),
        _ => None,
    }
}
