// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

use clap::{Parser, Subcommand};
use listly_core::config::Config;

#[derive(Parser)]
#[command(name = "listly", version, about = "Listly product-listing backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind.
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Print the resolved configuration with secrets redacted.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { host, port } => {
            let config = Config::from_env()?;
            listly_core::gateway::run_gateway(&host, port, config).await
        }
        Command::CheckConfig => {
            let config = Config::from_env()?;
            println!("identity project:  {}", config.identity_project);
            println!("api secret:        {}", redact(config.api_secret.as_deref()));
            println!("master secret:     {}", redact(config.master_secret.as_deref()));
            println!("ai api key:        {}", redact(config.ai_api_key.as_deref()));
            println!(
                "storage bucket:    {}",
                config.storage_bucket.as_deref().unwrap_or("(not set)")
            );
            println!("allow origin:      {}", config.allow_origin);
            Ok(())
        }
    }
}

fn redact(secret: Option<&str>) -> &'static str {
    match secret {
        Some(_) => "set",
        None => "NOT SET",
    }
}
