use clap::Args;

use quill_daemon::http_server::api::client::ApiError;
use quill_daemon::state::AppState;

/// Check the local config and check the configured server.
#[derive(Args, Debug, Clone)]
pub struct Health;

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = std::convert::Infallible;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                let content_dir = state.content_dir();
                lines.push(format!("  directory:    {}", state.quill_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                match state.load_secret() {
                    Ok(_) => lines.push("  secret.key:   OK".to_string()),
                    Err(e) => lines.push(format!("  secret.key:   {}", e)),
                }
                if content_dir.is_dir() {
                    lines.push(format!("  content:      {}", content_dir.display()));
                } else {
                    lines.push(format!("  content:      MISSING ({})", content_dir.display()));
                }
                lines.push(format!("  api_port:     {}", state.config.api_port));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Check the running server
        lines.push(String::new());
        lines.push(format!("Server ({}):", ctx.client.base_url()));
        for check in ["livez", "readyz"] {
            let report = match ctx.client.endpoint(&format!("/_status/{}", check)) {
                Ok(url) => match ctx
                    .client
                    .send::<serde_json::Value>(ctx.client.http_client().get(url))
                    .await
                {
                    Ok(body) => match body.get("nodes") {
                        Some(nodes) => format!("OK ({} nodes)", nodes),
                        None => "OK".to_string(),
                    },
                    Err(ApiError::Transport(_)) => "NOT REACHABLE".to_string(),
                    Err(e) => format!("UNHEALTHY ({})", e),
                },
                Err(e) => format!("BAD URL ({})", e),
            };
            lines.push(format!("  {:<8}{}", format!("{}:", check), report));
        }

        Ok(lines.join("\n"))
    }
}
