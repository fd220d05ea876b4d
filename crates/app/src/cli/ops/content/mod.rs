use clap::{Args, Subcommand};

pub mod create;
pub mod reflect;
pub mod types;
pub mod update;

use crate::cli::op::Op;
use quill_daemon::http_server::api::v0::content::{ReflectRequest, TypesRequest};

crate::command_enum! {
    (Types, TypesRequest),
    (Reflect, ReflectRequest),
    (Update, update::Update),
    (Create, create::Create),
}

pub type ContentCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Content {
    #[command(subcommand)]
    pub command: ContentCommand,
}

#[async_trait::async_trait]
impl Op for Content {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Parse `key=<json>` into a property update. Values that are not valid
/// JSON are taken as plain strings.
pub fn parse_assignment(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in {:?}", raw));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
