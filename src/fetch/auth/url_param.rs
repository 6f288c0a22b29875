use std::fmt;

use crate::fetch::client::HttpClient;
use async_trait::async_trait;

/// Appends an API key to every request URL as a query parameter.
///
/// OpenWeatherMap takes its key as `appid`.
pub struct UrlParam<C> {
    inner: C,
    param_name: String,
    key: String,
}

impl<C> UrlParam<C> {
    pub fn new(inner: C, param_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            inner,
            param_name: param_name.into(),
            key: key.into(),
        }
    }
}

impl<C> fmt::Debug for UrlParam<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlParam")
            .field("param_name", &self.param_name)
            .field("key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_debug_hides_key() {
        let client = UrlParam::new(BasicClient::new(), "appid", "secret-key");
        let shown = format!("{client:?}");
        assert!(shown.contains("appid"));
        assert!(!shown.contains("secret-key"));
    }
}
