//! CLI module for rag-kb
//!
//! Provides subcommands:
//! - `pdf`: extract a PDF (native text plus OCR) into documents
//! - `kb`: manage and query one knowledge base

pub mod kb;
pub mod pdf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// rag-kb - knowledge base loading and vector store management
#[derive(Parser)]
#[command(name = "rag-kb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract text and OCR output from a PDF
    Pdf(pdf::PdfArgs),

    /// Run an operation on a knowledge base
    Kb(kb::KbArgs),
}

/// Load `.env` and configuration, then install logging
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Invalid configuration, using defaults: {}", e);
        AppConfig::default()
    });
    logging::init_logging(&config.logging);

    config
}
