mod cli;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, op::OpContext, Content, Health, Init, Serve, Version};

command_enum! {
    (Content, Content),
    (Health, Health),
    (Init, Init),
    (Serve, Serve),
    (Version, Version),
}

fn context(args: &Args) -> Result<OpContext, String> {
    let remote = cli::op::resolve_remote(args.remote.clone(), args.config_path.clone())
        .map_err(|e| format!("invalid remote URL: {}", e))?;
    OpContext::new(remote, args.config_path.clone())
        .map_err(|e| format!("cannot build API client: {}", e))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let ctx = match context(&args) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
