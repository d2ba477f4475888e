//! Buckled server: local extraction API and backup CLI for service records.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod routes;
mod state;

use buckled_core::BuckledConfig;
use buckled_store::ServiceStore;
use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("BUCKLED_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn open_store(config: &BuckledConfig) -> anyhow::Result<ServiceStore> {
    ServiceStore::open(&config.data_paths.db, &config.data_paths.session_cache_file)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "export" => {
                let config = BuckledConfig::from_env(resolve_data_dir())?;
                let store = open_store(&config)?;
                let target = match args.get(2) {
                    Some(path) => PathBuf::from(path),
                    None => cli::default_export_path(&config.data_paths.exports, chrono::Utc::now()),
                };
                let report = cli::export_to(&store, &target)?;
                cli::print_export(&report);
                return Ok(());
            }
            "import" => {
                let Some(source) = args.get(2) else {
                    eprintln!("Usage: buckled import <file>");
                    std::process::exit(1);
                };
                let config = BuckledConfig::from_env(resolve_data_dir())?;
                let store = open_store(&config)?;
                let summary = cli::import_from(&store, &PathBuf::from(source))?;
                cli::print_import(&summary);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("Buckled: automotive service records assistant");
                println!();
                println!("Usage: buckled [command]");
                println!();
                println!("Commands:");
                println!("  (none)           Start the server");
                println!("  export [file]    Write a JSON backup (default: data/exports/)");
                println!("  import <file>    Restore records from a JSON backup");
                println!("  help             Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'buckled help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = BuckledConfig::from_env(&data_dir)?;
    let port = config.port;
    let store = open_store(&config)?;

    let state = Arc::new(AppState::new(config, store)?);
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Buckled server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
