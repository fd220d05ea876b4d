use clap::Args;

use common::prelude::build_info;
use quill_daemon::http_server::api::client::ApiError;

#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Also ask the running server for its version
    #[arg(long)]
    pub server: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Version {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let local = build_info().to_string();
        if !self.server {
            return Ok(local);
        }

        let url = ctx.client.endpoint("/_status/version")?;
        let remote: serde_json::Value = ctx.client.send(ctx.client.http_client().get(url)).await?;
        let remote_version = remote
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        Ok(format!(
            "client: {}\nserver: {} ({})",
            local,
            remote_version,
            ctx.client.base_url()
        ))
    }
}
