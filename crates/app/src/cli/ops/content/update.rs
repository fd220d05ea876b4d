use clap::Args;

use quill_daemon::http_server::api::client::ApiError;
use quill_daemon::http_server::api::v0::content::UpdateRequest;

use super::parse_assignment;

#[derive(Args, Debug, Clone)]
pub struct Update {
    /// Content path of the node to update
    pub path: String,

    /// Property assignment as key=<json>, repeatable
    #[arg(long = "set", value_parser = parse_assignment, required = true)]
    pub set: Vec<(String, serde_json::Value)>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Update {
    type Error = UpdateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = &ctx.client;
        let request = UpdateRequest {
            path: self.path.clone(),
            updates: self.set.iter().cloned().collect(),
        };
        let response = client.call(request).await?;

        let saved = self.set.len() - response.unsaved.len().min(self.set.len());
        let mut lines = vec![format!("Updated {} ({} saved)", self.path, saved)];
        for key in &response.unsaved {
            let reason = response
                .errors
                .get(key)
                .map(String::as_str)
                .unwrap_or("not saved");
            lines.push(format!("  {}: {}", key, reason));
        }
        Ok(lines.join("\n"))
    }
}
