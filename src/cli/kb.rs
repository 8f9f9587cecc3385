//! `kb` command - knowledge base lifecycle, file and search operations

use clap::{Args, Subcommand};
use tracing::info;

use crate::domain::knowledge_base::{KnowledgeBaseName, KnowledgeFile, VectorStoreType};
use crate::infrastructure::services::KnowledgeBaseManager;

/// Arguments for the kb command
#[derive(Args, Clone)]
pub struct KbArgs {
    /// Knowledge base name
    pub name: String,

    /// Vector store backend (overrides `kbs.default_vs_type`)
    #[arg(long)]
    pub vs: Option<VectorStoreType>,

    #[command(subcommand)]
    pub action: KbAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum KbAction {
    /// Create the knowledge base's collection
    Create,

    /// Remove the knowledge base and all of its vectors
    Drop,

    /// Remove all vectors, keeping the knowledge base
    Clear,

    /// Add files from the knowledge base's content directory
    Add { files: Vec<String> },

    /// Remove the vectors of files
    Delete { files: Vec<String> },

    /// Re-add files after removing their old vectors
    Update { files: Vec<String> },

    /// Search the knowledge base
    Search {
        query: String,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long)]
        score_threshold: Option<f32>,
    },
}

pub async fn run(args: KbArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let kb_name = KnowledgeBaseName::new(args.name)?;
    let manager = crate::create_manager(&config, kb_name.clone(), args.vs)?;

    let files = |names: &[String]| -> anyhow::Result<Vec<KnowledgeFile>> {
        names
            .iter()
            .map(|name| Ok(KnowledgeFile::new(name.as_str(), kb_name.clone(), &config.kbs.root_path)?))
            .collect()
    };

    match args.action {
        KbAction::Create => manager.create_kb().await?,
        KbAction::Drop => manager.drop_kb().await?,
        KbAction::Clear => manager.clear_vs().await?,
        KbAction::Add { files: names } => {
            for file in files(&names)? {
                let ids = manager.add_doc(&file).await?;
                println!("{}\t{} chunks", file.filename(), ids.len());
            }
        }
        KbAction::Delete { files: names } => {
            for file in files(&names)? {
                let removed = manager.delete_doc(&file).await?;
                println!("{}\t{} removed", file.filename(), removed);
            }
        }
        KbAction::Update { files: names } => {
            for file in files(&names)? {
                let ids = manager.update_doc(&file).await?;
                println!("{}\t{} chunks", file.filename(), ids.len());
            }
        }
        KbAction::Search {
            query,
            top_k,
            score_threshold,
        } => search(&manager, &query, top_k, score_threshold).await?,
    }

    info!(kb_name = %kb_name, "Done");
    Ok(())
}

async fn search(
    manager: &KnowledgeBaseManager,
    query: &str,
    top_k: Option<usize>,
    score_threshold: Option<f32>,
) -> anyhow::Result<()> {
    let results = manager.search_docs(query, top_k, score_threshold).await?;

    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }

    Ok(())
}
