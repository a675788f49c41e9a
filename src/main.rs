// awsw - per-shell AWS SSO credential profiles

mod auth;
mod cli;
mod config;
mod directory;
mod env;
mod error;
mod expiry;
mod login;
mod models;
mod profile;
mod select;
mod session;
mod store;

use clap::Parser;

#[tokio::main]
async fn main() {
    // Parse CLI arguments first to get verbose flag
    let args = cli::Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // stdout is reserved for command output such as the export lines
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = cli::execute(args).await {
        println!("Error: {}", e);
        if e.is_auth() {
            eprintln!("Run 'awsw login --force' to authenticate again");
        }
        std::process::exit(1);
    }
}
