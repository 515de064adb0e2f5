use std::path::PathBuf;

use clap::Parser;
use formgate_server::{run, ServerConfig};

#[derive(Parser)]
#[command(name = "formgate-server")]
#[command(version, about = "Formgate form rendering and submission server")]
struct Cli {
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long)]
    forms_dir: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig {
        port: cli.port,
        forms_dir: cli.forms_dir.unwrap_or_else(ServerConfig::default_forms_dir),
        data_dir: cli.data_dir.unwrap_or_else(ServerConfig::default_data_dir),
    };
    run(config).await
}
