use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dynaform_core::{AttributeKind, Document, Schema, Value};
use dynaform_transaction::{
    key, CoordinatorConfig, MemoryStore, ModelRegistry, TransactionCoordinator, TransactionOptions,
    TransactionOutcome,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "txn-demo")]
#[command(about = "Runs a write and a read transaction against an in-memory store")]
struct Args {
    /// Hash key of the user to create and read back.
    #[arg(long, env = "TXN_DEMO_ID", default_value = "u1")]
    id: String,

    #[arg(long, env = "TXN_DEMO_NAME", default_value = "Ann")]
    name: String,

    /// Print the built requests instead of executing them.
    #[arg(long)]
    dry_run: bool,

    #[arg(long, help = "Emit logs as JSON")]
    log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

fn init_logging(json: bool, verbose: bool) {
    let fallback = if verbose {
        "dynaform_transaction=debug,info"
    } else {
        "dynaform_transaction=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .init();
    }
}

fn print_outcome(label: &str, outcome: &TransactionOutcome) -> anyhow::Result<()> {
    let rendered = match outcome {
        TransactionOutcome::Request(request) => serde_json::to_string_pretty(request)?,
        TransactionOutcome::Empty => "null".to_string(),
        TransactionOutcome::Items(documents) => {
            let names: Vec<_> = documents
                .iter()
                .map(|doc| doc.get("name").and_then(Value::as_str).unwrap_or_default())
                .collect();
            serde_json::to_string_pretty(&names)?
        }
    };
    println!("{label}: {rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json, args.verbose);

    let store = Arc::new(MemoryStore::new());
    store.create_table_activating("Users", "id", None, 2);

    let mut config = CoordinatorConfig::default();
    config.table_defaults.wait_for_active.frequency = std::time::Duration::from_millis(50);
    let coordinator = TransactionCoordinator::new(Arc::new(ModelRegistry::new()), store, config);
    let users = coordinator
        .register_model(
            "Users",
            Schema::new("id", AttributeKind::String)
                .with_attribute("name", AttributeKind::String, true),
        )
        .context("registering Users model")?;

    let options = if args.dry_run {
        TransactionOptions::new().returning_request()
    } else {
        TransactionOptions::new()
    };

    let document = Document::new("Users")
        .with("id", args.id.as_str())
        .with("name", args.name.as_str());
    let write = vec![users.transaction().create(&document, false)?];
    let outcome = coordinator.run(write, options).await?;
    print_outcome("write", &outcome)?;

    let read = vec![users.transaction().get(&key([("id", args.id.as_str())]))?];
    let outcome = coordinator.run(read, options).await?;
    print_outcome("read", &outcome)?;

    Ok(())
}
