use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends a prepared request. Auth wrappers layer on top of a base client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Lets the telemetry and weather clients share one connection pool.
#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
