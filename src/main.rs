//! AgentMesh - multi-agent discovery, messaging, and MCP client core.

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod completion;
mod config;
mod error;
mod handler;
mod logging;
mod mcp;
mod protocol;
mod registry;
mod state;
mod store;
mod tools;

use cli::Commands;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let _guard = match logging::init() {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Parse command line arguments
    let args = Commands::parse();

    // Run the command
    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
