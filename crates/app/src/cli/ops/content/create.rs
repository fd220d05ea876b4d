use std::path::PathBuf;

use clap::Args;
use reqwest::multipart::{Form, Part};

use common::edit::{ContentCreate, UploadedFile};
use quill_daemon::http_server::api::client::ApiError;
use quill_daemon::http_server::api::v0::content::upload::UploadResponse;
use quill_daemon::http_server::api::v0::content::{
    BeginRequest, CommitRequest, TRANSACTION_HEADER,
};

use super::parse_assignment;

/// Create a child node: begin, upload any files, then commit.
#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Content path of the parent node
    pub parent: String,

    /// Collection property of the parent that receives the child
    #[arg(long)]
    pub property: String,

    /// Type identifier of the new child, e.g. article
    #[arg(long = "type")]
    pub type_identifier: String,

    /// Slug of the new child
    #[arg(long)]
    pub slug: String,

    /// Initial property as key=<json>, repeatable
    #[arg(long = "set", value_parser = parse_assignment)]
    pub set: Vec<(String, serde_json::Value)>,

    /// File to upload into the new child's directory, repeatable
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Create {
    async fn upload(
        &self,
        ctx: &crate::cli::op::OpContext,
        transaction: &str,
    ) -> Result<Vec<UploadedFile>, CreateError> {
        let mut form = Form::new();
        for path in &self.files {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| CreateError::ReadFile {
                    path: path.clone(),
                    source,
                })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            form = form.part("file", Part::bytes(bytes).file_name(file_name));
        }

        let url = ctx.client.endpoint("/api/v0/content/create/upload")?;
        let request = ctx
            .client
            .http_client()
            .post(url)
            .header(TRANSACTION_HEADER, transaction)
            .multipart(form);
        let uploaded: UploadResponse = ctx.client.send(request).await?;
        Ok(uploaded.files)
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Create {
    type Error = CreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let client = &ctx.client;

        let begun = client
            .call(BeginRequest {
                parent: self.parent.clone(),
                create: ContentCreate {
                    property: self.property.clone(),
                    type_identifier: self.type_identifier.clone(),
                    slug: self.slug.clone(),
                    content: self.set.iter().cloned().collect(),
                },
            })
            .await?;

        let mut lines = Vec::new();
        if !self.files.is_empty() {
            for file in self.upload(ctx, &begun.transaction).await? {
                lines.push(format!(
                    "  uploaded {} ({}, {} bytes)",
                    file.file_name, file.mime_type, file.size
                ));
            }
        }

        let committed = client
            .call(CommitRequest {
                transaction: begun.transaction,
            })
            .await?;
        lines.insert(0, format!("Created {}", committed.path));

        Ok(lines.join("\n"))
    }
}
