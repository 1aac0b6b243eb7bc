use url::Url;

pub const DEFAULT_FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";
const FAVICON_SIZE: u32 = 32;

/// Builds favicon lookup urls. Icons are never stored, every domain is looked up through a
/// favicon service by its synthetic `https://<domain>` origin.
#[derive(Debug, Clone)]
pub struct FaviconService {
    base: Url,
    size: u32,
}

impl FaviconService {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            size: FAVICON_SIZE,
        }
    }

    pub fn lookup_url(&self, domain: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("pageUrl", &format!("https://{domain}"))
            .append_pair("size", &self.size.to_string());
        url
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{FaviconService, DEFAULT_FAVICON_SERVICE};

    #[test]
    fn test_lookup_url_encodes_origin() {
        let service = FaviconService::new(Url::parse(DEFAULT_FAVICON_SERVICE).unwrap());
        let url = service.lookup_url("docs.rs");

        assert_eq!(
            url.as_str(),
            "https://www.google.com/s2/favicons?pageUrl=https%3A%2F%2Fdocs.rs&size=32"
        );
    }

    #[test]
    fn test_lookup_url_keeps_service_query() {
        let service = FaviconService::new(Url::parse("http://localhost:9000/icon?theme=dark").unwrap());

        assert_eq!(
            service.lookup_url("a.com").as_str(),
            "http://localhost:9000/icon?theme=dark&pageUrl=https%3A%2F%2Fa.com&size=32"
        );
    }
}
