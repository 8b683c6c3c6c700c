use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use tailchain_ledger::{Entry, LedgerStore};
use tailchain_server::{ChainServer, ServerConfig};
use tailchain_sync::{HttpRemote, Replicator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::cli::*;
use crate::config::CliConfig;
use crate::keys;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Keygen(args) => cmd_keygen(args),
        Command::Serve(args) => cmd_serve(&config, args).await,
        Command::Observe(args) => cmd_observe(&config, args).await,
        Command::Verify(args) => cmd_verify(&config, args).await,
    }
}

fn cmd_keygen(args: KeygenArgs) -> anyhow::Result<()> {
    let (_, public) = keys::generate(&args.out)?;
    println!("{} Generated Ed25519 key pair", "✓".green().bold());
    println!("  Secret: {}", args.out.display().to_string().yellow());
    println!("  Public: {}", public.display().to_string().cyan());
    Ok(())
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

async fn cmd_serve(config: &CliConfig, args: ServeArgs) -> anyhow::Result<()> {
    let key = keys::load_signing_key(&config.key(args.key)?)?;
    let bind_addr = config.listen(args.listen);
    let store = Arc::new(LedgerStore::with_signer(key));

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    let shutdown = CancellationToken::new();
    let server = ChainServer::new(ServerConfig { bind_addr }, Arc::clone(&store));
    let serving = tokio::spawn(server.serve_on(listener, shutdown.clone()));

    let stdin_done = CancellationToken::new();
    cancel_on_ctrl_c(stdin_done.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = stdin_done.cancelled() => break,
            line = lines.next_line() => line.context("reading stdin")?,
        };
        let Some(line) = line else { break };

        append_line(&store, &line, Utc::now());
    }

    let entries = store.entries()?;
    let chain: Vec<&Entry> = entries.iter().map(Arc::as_ref).collect();
    println!("{}", serde_json::to_string_pretty(&chain)?);

    shutdown.cancel();
    serving.await??;
    Ok(())
}

/// Append one input line. A rejected line is logged and skipped so that a
/// clock stepping backwards does not end the session.
fn append_line(store: &LedgerStore, line: &str, instant: DateTime<Utc>) -> Option<Arc<Entry>> {
    match store.append(line.trim().as_bytes(), instant, None) {
        Ok(entry) => {
            tracing::info!(height = entry.height(), hash = %entry.hash().short_hex(), "appended");
            Some(entry)
        }
        Err(err) => {
            tracing::warn!(error = %err, "skipping input line");
            None
        }
    }
}

async fn cmd_observe(config: &CliConfig, args: ObserveArgs) -> anyhow::Result<()> {
    let replicator = replicator(config, args.key, args.target)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let mut cursor = replicator.local().last()?.map(|entry| entry.hash());
    loop {
        let entry = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            step = replicator.step(cursor.as_ref()) => step?,
        };
        println!(
            "{} {}",
            format!("#{}", entry.height()).yellow(),
            String::from_utf8_lossy(entry.content())
        );
        cursor = Some(entry.hash());
    }
}

async fn cmd_verify(config: &CliConfig, args: VerifyArgs) -> anyhow::Result<()> {
    let replicator = replicator(config, args.key, args.target)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    replicator.run_until(args.count, &cancel).await?;
    let store = replicator.local();
    store.validate().context("replicated chain failed validation")?;

    println!(
        "{} Verified {} entries from {}",
        "✓".green().bold(),
        store.len()?.to_string().bold(),
        replicator.remote().base()
    );
    if let Some(tip) = store.last()? {
        println!("  Tip: {}", tip.hash().to_hex().yellow());
    }
    Ok(())
}

fn replicator(
    config: &CliConfig,
    key: Option<std::path::PathBuf>,
    target: Option<String>,
) -> anyhow::Result<Replicator<HttpRemote>> {
    let verifier = keys::load_verifying_key(&config.key(key)?)?;
    let remote = HttpRemote::with_config(&config.target(target)?, config.http())?;
    let local = Arc::new(LedgerStore::with_verifier(verifier));
    Ok(Replicator::new(remote, local))
}
