//! Free-text entity search command.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::error;

use kgsim_core::{SearchSnapshot, SearchStatus};

/// Arguments for the search command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,

    /// Maximum number of results to print
    #[arg(long, default_value = "10")]
    pub limit: usize,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the search command.
///
/// # Returns
///
/// Exit code:
/// - 0: Success (including zero matches)
/// - 1: Configuration or endpoint failure
pub async fn handle_search(args: SearchArgs) -> i32 {
    let config = match super::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "failed to load configuration");
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

    let mut updates = session.search_updates();
    let baseline = session.search_snapshot().completions;

    if let Err(error) = session.set_query(&args.query).await {
        error!(%error, "failed to set query");
        return 1;
    }
    if let Err(error) = session.submit_query().await {
        error!(%error, "failed to submit query");
        return 1;
    }

    // Wait until the controller has applied a response to our query.
    let deadline =
        tokio::time::Instant::now() + Duration::from_secs(config.api.timeout_secs + 5);
    let snapshot = loop {
        let snapshot = session.search_snapshot();
        if snapshot.completions > baseline {
            break snapshot;
        }
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break session.search_snapshot();
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                error!("timed out waiting for the search endpoint");
                return 1;
            }
        }
    };

    if let SearchStatus::Failed(message) = &snapshot.status {
        error!(%message, "search unavailable");
        return 1;
    }

    print!("{}", render_results(&snapshot, args.limit));
    0
}

/// Render the ranked result listing.
fn render_results(snapshot: &SearchSnapshot, limit: usize) -> String {
    if snapshot.results.is_empty() {
        return format!("No matches for \"{}\"\n", snapshot.query);
    }

    let mut out = String::new();
    for (i, entity) in snapshot.results.iter().take(limit).enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, entity.primary_label()));
        out.push_str(&format!(
            "   Description: {}\n",
            entity.display_description()
        ));
        if let Some(alias) = entity.alias_line() {
            out.push_str(&format!("   Alias: {}\n", alias));
        }
        out.push_str(&format!("   {}\n", entity.browser_url()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgsim_core::Entity;

    fn snapshot_with(results: Vec<Entity>) -> SearchSnapshot {
        SearchSnapshot {
            query: "adams".to_string(),
            results,
            status: SearchStatus::Idle,
            completions: 1,
        }
    }

    #[test]
    fn test_render_empty_results() {
        let text = render_results(&snapshot_with(vec![]), 10);
        assert_eq!(text, "No matches for \"adams\"\n");
    }

    #[test]
    fn test_render_numbered_listing() {
        let entity = Entity {
            qnode: "Q42".to_string(),
            label: vec!["Douglas Adams".to_string()],
            description: vec!["English writer".to_string()],
            alias: vec!["DNA".to_string()],
            pagerank: 0.0,
            statements: 0,
            score: 1.0,
        };
        let text = render_results(&snapshot_with(vec![entity]), 10);
        assert!(text.starts_with("1. Douglas Adams (Q42)\n"));
        assert!(text.contains("   Description: English writer\n"));
        assert!(text.contains("   Alias: DNA\n"));
        assert!(text.contains("https://kgtk.isi.edu/browser/Q42"));
    }

    #[test]
    fn test_render_respects_limit() {
        let make = |qnode: &str| Entity {
            qnode: qnode.to_string(),
            label: vec![],
            description: vec![],
            alias: vec![],
            pagerank: 0.0,
            statements: 0,
            score: 1.0,
        };
        let text = render_results(&snapshot_with(vec![make("Q1"), make("Q2"), make("Q3")]), 2);
        assert!(text.contains("1. Q1"));
        assert!(text.contains("2. Q2"));
        assert!(!text.contains("3. Q3"));
    }
}
