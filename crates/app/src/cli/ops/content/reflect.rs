use quill_daemon::http_server::api::client::ApiError;
use quill_daemon::http_server::api::v0::content::ReflectRequest;

#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to format response: {0}")]
    Format(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for ReflectRequest {
    type Error = ReflectError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = &ctx.client;
        let response = client.call(self.clone()).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }
}
