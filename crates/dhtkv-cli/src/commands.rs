use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use colored::Colorize;
use dhtkv_core::ConnectedStore;
use dhtkv_crypto::Identity;
use dhtkv_store::SyncStore;
use dhtkv_table::{ImmutableKeyer, Keyer, MemoryTable, MutableKeyer};
use serde_json::json;
use tokio::io::BufReader;

use crate::cli::*;
use crate::config::CliConfig;
use crate::identity;
use crate::session::{render_stats, Session};

/// How long the demo waits for a round of acknowledgements.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Keygen(args) => cmd_keygen(args, cli.format),
        Command::Session(args) => cmd_session(args, cli.format).await,
        Command::Demo(args) => cmd_demo(args, cli.format).await,
    }
}

fn cmd_keygen(args: KeygenArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (identity, created) = identity::load_or_create(&args.dir, &args.name, &args.salt)?;
    let path = identity::key_file(&args.dir, &args.name, &args.salt);
    match format {
        OutputFormat::Json => {
            let out = json!({
                "path": path.display().to_string(),
                "created": created,
                "public_key": identity.public().to_hex(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            let verb = if created { "Created" } else { "Loaded" };
            println!("{} {} identity key {}", "✓".green().bold(), verb, path.display().to_string().bold());
            println!("  Public key: {}", identity.public().to_hex().cyan());
        }
    }
    Ok(())
}

async fn cmd_session(args: SessionArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = CliConfig::load(args.config.as_deref())?;
    if let Some(nodes) = args.nodes {
        config.nodes = nodes;
    }
    if let Some(copies) = args.copies {
        config.store.default_copies = Some(copies);
    }
    if let Some(refresh) = args.refresh {
        config.store.refresh_interval = Duration::from_millis(refresh);
    }

    let keyer: Arc<dyn Keyer> = match &args.kname {
        Some(name) => {
            let (identity, _) = identity::load_or_create(&args.key_dir, name, &args.salt)?;
            println!("Owner {} ({})", name.bold(), identity.public().to_hex().cyan());
            Arc::new(MutableKeyer::new(identity))
        }
        None => Arc::new(ImmutableKeyer),
    };
    let table = Arc::new(MemoryTable::new(config.nodes, config.table.clone()));
    let ledger = Arc::new(SyncStore::new(Arc::clone(&keyer)));
    let store = ConnectedStore::with_config(table.clone(), keyer, ledger, config.store.clone());

    let keep_alive = Arc::new(store.keep_alive(config.store.refresh_interval));
    let runner = keep_alive.start();

    let mode = if args.kname.is_some() { "mutable" } else { "immutable" };
    println!(
        "{} nodes, {} items, re-publishing every {:?}. Type {} for commands.",
        config.nodes.to_string().bold(),
        mode,
        config.store.refresh_interval,
        "help".cyan()
    );

    let session = Session::new(store, table, config.store.default_copies, format);
    let result = session.run(BufReader::new(tokio::io::stdin())).await;

    keep_alive.stop();
    runner.await?;
    println!("Session ended with {} keys in the ledger.", session.store().keys().len());
    result
}

async fn cmd_demo(args: DemoArgs, format: OutputFormat) -> anyhow::Result<()> {
    let copies = Some(args.nodes);
    let table = Arc::new(MemoryTable::with_nodes(args.nodes));
    let keyer: Arc<dyn Keyer> = Arc::new(MutableKeyer::new(Identity::generate("alice", "demo-")));
    let ledger = Arc::new(SyncStore::new(Arc::clone(&keyer)));
    let store = ConnectedStore::new(table, keyer, ledger);

    let key = store.add("alice", "v1", copies).await?;
    println!("{} add alice = v1 → {}", "1.".bold(), key.short_hex().yellow());
    let settled = wait_for(|| {
        store
            .stat(&key)
            .is_some_and(|s| s.replication_count + s.errors.len() >= args.nodes)
    })
    .await;
    if !settled {
        bail!("add was not acknowledged within {SETTLE_TIMEOUT:?}");
    }
    if let Some(stat) = store.stat(&key) {
        println!(
            "   replicated {}/{} with {} errors",
            stat.replication_count,
            args.nodes,
            stat.errors.len()
        );
    }

    store.update("alice", "v2", copies).await?;
    if !wait_for(|| store.stat(&key).is_some_and(|s| s.last_seq == 1)).await {
        bail!("update was not acknowledged within {SETTLE_TIMEOUT:?}");
    }
    println!("{} update alice = v2 → seq 1", "2.".bold());

    let value = store.get(&key.to_hex(), None, None).await?;
    println!("{} get {} → {}", "3.".bold(), key.short_hex().yellow(), value.green());

    println!("\n{}", render_stats(&store, format)?);
    Ok(())
}

async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
