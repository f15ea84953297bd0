use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "crickpipe",
    version,
    about = "Ball-by-ball cricket ETL: raw scrape tables to enriched facts and aggregate stats"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Run(StageArgs),
    Normalize(StageArgs),
    Enrich(StageArgs),
    Aggregate(StageArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StageArgs {
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub match_id: Option<i64>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

impl StageArgs {
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_root.join("crickpipe.sqlite"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

impl StatusArgs {
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_root.join("crickpipe.sqlite"))
    }
}
