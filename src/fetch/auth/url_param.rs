use crate::fetch::client::HttpClient;
use async_trait::async_trait;

/// Appends the telemetry API key to every request as a query parameter.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub key: String,
}

impl<C: HttpClient> UrlParam<C> {
    /// Sends the key as `key=<value>`, the telemetry API's default.
    pub fn key(inner: C, key: impl Into<String>) -> Self {
        Self {
            inner,
            param_name: "key".to_string(),
            key: key.into(),
        }
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
    use std::sync::Arc;

    #[test]
    fn test_key_constructor_uses_key_param() {
        let client = UrlParam::key(Arc::new(BasicClient::new()), "s3cret");
        assert_eq!(client.param_name, "key");
        assert_eq!(client.key, "s3cret");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let client = UrlParam::key(BasicClient::new(), "s3cret");
        let req = reqwest::Request::new(
            reqwest::Method::GET,
            "http://127.0.0.1:9/v1/vehicles".parse().unwrap(),
        );
        assert!(client.execute(req).await.is_err());
    }
}
