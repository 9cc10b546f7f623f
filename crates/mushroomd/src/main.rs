use anyhow::{Context, Result};
use clap::Parser;
use mushroom_core::{
    bootstrap, init_tracing, LogFormat, ProcessRunner, TokioProcessRunner, METRICS,
};
use mushroomd::cli::{Cli, Commands, RuntimeArgs};
use mushroomd::{prompt_loop, ChatClient};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(LogFormat::from_json_flag(cli.json), level);

    match cli.command {
        Commands::Serve { runtime, listen } => cmd_serve(&runtime, listen).await,
        Commands::Provision { runtime } => cmd_provision(&runtime).await,
        Commands::Chat { url, timeout } => cmd_chat(&url, timeout).await,
    }
}

async fn cmd_serve(args: &RuntimeArgs, listen: SocketAddr) -> Result<()> {
    let config = args.resolve().context("invalid runtime configuration")?;
    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner::new());

    info!("Provisioning runtime");
    let runtime = bootstrap(&config, runner)
        .await
        .context("startup failed")?;
    info!(
        environment = %runtime.environment.root().display(),
        model_dir = %runtime.model.dir().display(),
        "Runtime provisioned"
    );

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    info!(address = %listener.local_addr()?, "Serving chat API");

    let gateway = runtime.gateway.clone();
    let shutdown = async move {
        shutdown_signal().await;
        gateway.close();
    };
    mushroomd::serve(listener, runtime.gateway, shutdown)
        .await
        .context("HTTP server failed")?;

    METRICS.flush();
    info!("Server has been stopped");
    Ok(())
}

async fn cmd_provision(args: &RuntimeArgs) -> Result<()> {
    let config = args.resolve().context("invalid runtime configuration")?;
    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner::new());

    let runtime = bootstrap(&config, runner)
        .await
        .context("provisioning failed")?;

    println!("{}", serde_json::to_string_pretty(&runtime.report)?);
    Ok(())
}

async fn cmd_chat(url: &str, timeout_secs: u64) -> Result<()> {
    let client = ChatClient::new(url, Duration::from_secs(timeout_secs))
        .context("failed to build HTTP client")?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let sent = prompt_loop(&client, stdin, &mut stdout).await?;

    info!(prompts = sent, "Chat session ended");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; serve until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
