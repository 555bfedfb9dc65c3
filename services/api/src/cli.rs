use crate::demo::{run_demo, run_export, run_ranking, DemoArgs, ExportArgs, RankingArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mentorship::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Mentorship Cohorts",
    about = "Run the mentorship cohort service or produce rankings and exports from a snapshot",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the ranking for a program snapshot
    Ranking(RankingArgs),
    /// Write a CSV or XLSX export for a program snapshot
    Export(ExportArgs),
    /// Walk through approvals, a capacity refusal, and the reports on a synthetic program
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON program snapshot to load instead of PROGRAM_SEED_PATH
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Ranking(args) => run_ranking(args),
        Command::Export(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}
