//! Subject-vs-candidates comparison command.
//!
//! Resolves the subject and candidate qnodes, scores every candidate under
//! every configured embedding type, prints the table ranked by the active
//! sort key, and optionally writes the comparison as CSV.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tracing::{error, info, warn};

use kgsim_client::SearchApiClient;
use kgsim_core::{ComparisonSnapshot, EmbeddingType, SimilarityValue};

/// Arguments for the compare command.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Subject qnode all scores are relative to (e.g. Q42)
    pub subject: String,

    /// Candidate qnodes to score against the subject
    #[arg(required = true)]
    pub candidates: Vec<String>,

    /// Embedding type value used to order the table (default: first configured)
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Write the comparison CSV to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the CSV under its suggested name in the current directory
    #[arg(long)]
    pub csv: bool,

    /// Seconds to wait for all scores before printing what resolved
    #[arg(long, default_value = "60")]
    pub wait_secs: u64,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the compare command.
///
/// # Returns
///
/// Exit code:
/// - 0: Success (unresolved cells print and export as `--`)
/// - 1: Configuration failure, unknown sort key, or CSV write failure
pub async fn handle_compare(args: CompareArgs) -> i32 {
    let config = match super::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "failed to load configuration");
            return 1;
        }
    };
    let lookup = match SearchApiClient::new(config.api.clone()) {
        Ok(lookup) => lookup,
        Err(error) => {
            error!(%error, "failed to build search client");
            return 1;
        }
    };
    let session = match super::build_session(&config) {
        Ok(session) => session,
        Err(error) => {
            error!(%error, "failed to build session");
            return 1;
        }
    };

    if let Some(sort_by) = &args.sort_by {
        if let Err(error) = session.set_sort_key(sort_by).await {
            error!(%error, "invalid sort key");
            return 1;
        }
    }

    let subject = super::resolve_entity(&lookup, &args.subject).await;
    info!(subject = %subject.primary_label(), "comparing");
    if let Err(error) = session.set_subject(subject).await {
        error!(%error, "failed to set subject");
        return 1;
    }

    for qnode in &args.candidates {
        let entity = super::resolve_entity(&lookup, qnode).await;
        if let Err(error) = session.add_entity(entity).await {
            error!(%error, %qnode, "failed to add candidate");
            return 1;
        }
    }

    // Wait for every (node, type) cell, bounded by --wait-secs.
    let mut updates = session.comparison_updates();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.wait_secs);
    while !session
        .comparison_snapshot()
        .is_complete(session.embedding_types())
    {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                warn!("timed out waiting for scores; unresolved cells shown as --");
                break;
            }
        }
    }

    let snapshot = session.comparison_snapshot();
    print!("{}", render_table(&snapshot, session.embedding_types()));

    let output_path = match (&args.output, args.csv) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => {
            match session.export_csv() {
                Ok(export) => Some(PathBuf::from(export.filename)),
                Err(error) => {
                    error!(%error, "cannot export");
                    return 1;
                }
            }
        }
        (None, false) => None,
    };

    if let Some(path) = output_path {
        let export = match session.export_csv() {
            Ok(export) => export,
            Err(error) => {
                error!(%error, "cannot export");
                return 1;
            }
        };
        if let Err(error) = write_csv(&path, &export.content).await {
            error!(%error, path = %path.display(), "failed to write CSV");
            return 1;
        }
        info!(path = %path.display(), "wrote CSV");
    }

    0
}

/// Write a CSV payload to disk.
async fn write_csv(path: &Path, content: &str) -> std::io::Result<()> {
    tokio::fs::write(path, content.as_bytes()).await
}

/// Render the ranked comparison table.
fn render_table(snapshot: &ComparisonSnapshot, types: &[EmbeddingType]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<12}", "q2"));
    for embedding_type in types {
        out.push_str(&format!("{:>10}", embedding_type.label));
    }
    out.push_str("  label\n");

    for node in &snapshot.nodes {
        out.push_str(&format!("{:<12}", node.qnode()));
        for embedding_type in types {
            match node.cell(&embedding_type.value) {
                Some(SimilarityValue::Score(score)) => {
                    out.push_str(&format!("{:>10.4}", score));
                }
                _ => out.push_str(&format!("{:>10}", "--")),
            }
        }
        out.push_str(&format!("  {}\n", node.entity.primary_label()));
    }

    out
}
