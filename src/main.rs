use clap::Parser;
use rag_kb::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Pdf(args) => cli::pdf::run(args).await,
        Command::Kb(args) => cli::kb::run(args).await,
    }
}
