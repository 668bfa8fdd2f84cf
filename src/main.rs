//! fin-assistant - learning engine for the finance dashboard assistant
//!
//! Records question/response feedback, tracks adaptive patterns and serves
//! metrics over a CLI or an HTTP API.

use fin_assistant::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (WARN level by default, use RUST_LOG=info for debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into())
        )
        .init();

    cli::run().await
}
