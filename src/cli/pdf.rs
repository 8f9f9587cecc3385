//! `pdf` command - print the documents extracted from a PDF

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::info;

use crate::domain::ingestion::LoadMode;

/// Arguments for the pdf command
#[derive(Args, Clone)]
pub struct PdfArgs {
    /// PDF file to load
    pub path: PathBuf,

    /// One document for the file or one per element (overrides config)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Print documents as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Single,
    Elements,
}

impl From<ModeArg> for LoadMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => LoadMode::Single,
            ModeArg::Elements => LoadMode::Elements,
        }
    }
}

pub async fn run(args: PdfArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap();

    if let Some(mode) = args.mode {
        config.partition.mode = mode.into();
    }

    let loader = crate::create_pdf_loader(&config)?;
    let docs = loader.load(&args.path).await?;

    info!(path = %args.path.display(), documents = docs.len(), "Loaded PDF");

    for doc in &docs {
        if args.json {
            println!("{}", serde_json::to_string(doc)?);
        } else {
            println!("{}\n", doc.page_content);
        }
    }

    Ok(())
}
