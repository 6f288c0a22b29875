use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared requests. Credential decorators wrap an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
