use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use rajai_engine::config::Config;
use rajai_engine::ingest;
use rajai_engine::logging;
use rajai_engine::metrics;
use rajai_engine::server::{start_server, AppState};
use rajai_engine::snapshot::SnapshotHandle;

#[derive(Parser)]
#[command(name = "rajai_engine")]
#[command(about = "Neighborhood food-environment aggregation engine for Rio de Janeiro")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the snapshot and serve the HTTP API
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one aggregation pass and print the city-wide rollup
    Aggregate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            println!("🔄 Carregando tabelas e construindo snapshot...");
            // Both sources must load before the listener binds
            let snapshot = ingest::load_and_build(&config)?;
            info!(bairros = snapshot.summaries.len(), "snapshot inicial pronto");
            println!("✅ Snapshot pronto: {} bairros", snapshot.summaries.len());

            let port = port.unwrap_or(config.server.port);
            let state = Arc::new(AppState {
                snapshots: SnapshotHandle::new(snapshot),
                config,
            });
            start_server(state, port).await?;
        }
        Commands::Aggregate => {
            println!("⚙️  Executando agregação única...");
            let snapshot = ingest::load_and_build(&config)?;

            let mut total: i64 = 0;
            let mut per_grupo = std::collections::BTreeMap::new();
            for summary in snapshot.summaries.values() {
                for (grupo, count) in &summary.group_totals {
                    *per_grupo.entry(grupo.as_label()).or_insert(0i64) += count;
                    total += count;
                }
            }

            println!("\n📊 Rollup da cidade:");
            println!("   Bairros: {}", snapshot.summaries.len());
            println!("   Estabelecimentos: {}", total);
            for (grupo, count) in per_grupo {
                let pct = if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                println!("   {}: {} ({:.1}%)", grupo, count, pct);
            }
        }
    }
    Ok(())
}
