//! Resource addressing with cache-busting.

use rand::random;

/// Resource path of the dataset document, relative to the report root.
pub const DATASET_PATH: &str = "json/metrics.json";

/// One addressed fetch. Every request carries a fresh random token; remote
/// transports append it as a `?v=` query parameter to defeat caches, while
/// filesystem sources resolve the bare path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    path: String,
    token: String,
}

impl ResourceRequest {
    /// Request for the report dataset document.
    #[must_use]
    pub fn dataset() -> Self {
        Self::new(DATASET_PATH.to_owned())
    }

    /// Request for one metric's history series, named by its sanitized
    /// `stable_metric_id`.
    #[must_use]
    pub fn history(history_id: &str) -> Self {
        Self::new(format!("json/{history_id}.txt"))
    }

    fn new(path: String) -> Self {
        Self {
            path,
            token: format!("{:016x}", random::<u64>()),
        }
    }

    /// Resource path relative to the report root, without the token.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Cache-busted URL under `base` for remote transports.
    #[must_use]
    pub fn url(&self, base: &str) -> String {
        format!("{}/{}?v={}", base.trim_end_matches('/'), self.path, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_request_names_the_metrics_document() {
        assert_eq!(ResourceRequest::dataset().path(), "json/metrics.json");
    }

    #[test]
    fn history_request_embeds_the_sanitized_id() {
        let request = ResourceRequest::history("ProductUnitTests_Product_X");
        assert_eq!(request.path(), "json/ProductUnitTests_Product_X.txt");
    }

    #[test]
    fn url_appends_the_token_as_a_query_parameter() {
        let request = ResourceRequest::dataset();
        let url = request.url("https://reports.example.org/quality/");
        assert!(url.starts_with("https://reports.example.org/quality/json/metrics.json?v="));
        assert_eq!(url.matches('?').count(), 1);
    }

    #[test]
    fn each_request_gets_its_own_token() {
        let a = ResourceRequest::dataset();
        let b = ResourceRequest::dataset();
        assert_eq!(a.path(), b.path());
        assert_ne!(a.url("x"), b.url("x"));
    }
}
