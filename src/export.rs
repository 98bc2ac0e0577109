//! Export of approved content to the dataset hub.
//!
//! A push is read-only against the local store: it lists each stage's
//! approved set and uploads every file independently. One failed upload
//! never aborts the batch; it is counted and reported. Only a missing
//! repository target fails the operation as a whole.

use serde::Serialize;
use std::time::Duration;

use crate::config::HubConfig;
use crate::error::{Error, Result};
use crate::hub::DatasetHub;
use crate::models::{ItemStatus, Stage};
use crate::store::Store;

/// What to push: everything, or one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushScope {
    All,
    Stage(Stage),
}

impl PushScope {
    /// Parse the `type` field of push requests.
    pub fn from_request_type(s: &str) -> Option<PushScope> {
        if s == "all" {
            return Some(PushScope::All);
        }
        Stage::from_request_type(s).map(PushScope::Stage)
    }

    fn stages(self) -> Vec<Stage> {
        match self {
            PushScope::All => vec![Stage::Raw, Stage::Cleaned, Stage::Chunked],
            PushScope::Stage(stage) => vec![stage],
        }
    }
}

/// Per-stage upload outcome.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PushOutcome {
    pub uploaded: usize,
    pub failed: usize,
}

impl PushOutcome {
    fn absorb(&mut self, other: PushOutcome) {
        self.uploaded += other.uploaded;
        self.failed += other.failed;
    }
}

/// Outcome of a push call, per stage plus combined.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PushReport {
    pub raw: PushOutcome,
    pub cleaned: PushOutcome,
    pub chunked: PushOutcome,
    pub totals: PushOutcome,
}

fn repo_for(hub: &HubConfig, stage: Stage, override_repo: Option<&str>) -> Result<String> {
    if let Some(repo) = override_repo {
        if !repo.trim().is_empty() {
            return Ok(repo.trim().to_string());
        }
    }
    let configured = match stage {
        Stage::Raw => &hub.raw_repo,
        Stage::Cleaned => &hub.cleaned_repo,
        Stage::Chunked => &hub.chunked_repo,
    };
    configured
        .clone()
        .ok_or_else(|| Error::config(format!("No hub repository configured for the {stage} stage")))
}

/// Push every approved item in scope to the hub.
///
/// `override_repo` routes all stages to one repository, as when the
/// caller supplies a repo with the request. Each upload runs under the
/// configured timeout so a hanging remote call cannot stall the batch.
pub async fn push_all(
    store: &Store,
    hub_client: &dyn DatasetHub,
    hub: &HubConfig,
    scope: PushScope,
    override_repo: Option<&str>,
) -> Result<PushReport> {
    let timeout = Duration::from_secs(hub.push_timeout_secs);
    let mut report = PushReport::default();

    for stage in scope.stages() {
        let repo = repo_for(hub, stage, override_repo)?;
        let outcome = match stage {
            Stage::Raw | Stage::Cleaned => {
                push_stage_items(store, hub_client, &repo, stage, timeout).await?
            }
            Stage::Chunked => push_chunks(store, hub_client, &repo, timeout).await?,
        };
        match stage {
            Stage::Raw => report.raw = outcome,
            Stage::Cleaned => report.cleaned = outcome,
            Stage::Chunked => report.chunked = outcome,
        }
        report.totals.absorb(outcome);
    }

    tracing::info!(
        uploaded = report.totals.uploaded,
        failed = report.totals.failed,
        "push finished"
    );
    Ok(report)
}

async fn push_one(
    hub_client: &dyn DatasetHub,
    repo: &str,
    path: &str,
    content: &str,
    timeout: Duration,
) -> bool {
    match tokio::time::timeout(timeout, hub_client.push(repo, path, content)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(repo, path, error = %e, "push failed");
            false
        }
        Err(_) => {
            tracing::warn!(repo, path, timeout_secs = timeout.as_secs(), "push timed out");
            false
        }
    }
}

async fn push_stage_items(
    store: &Store,
    hub_client: &dyn DatasetHub,
    repo: &str,
    stage: Stage,
    timeout: Duration,
) -> Result<PushOutcome> {
    let mut outcome = PushOutcome::default();
    for meta in store.list_items(stage, ItemStatus::Approved)? {
        let Some(item) = store.get_item(stage, ItemStatus::Approved, &meta.filename)? else {
            continue;
        };
        let path = format!("{}/{}.txt", stage.dir_name(), meta.filename);
        if push_one(hub_client, repo, &path, &item.content, timeout).await {
            outcome.uploaded += 1;
        } else {
            outcome.failed += 1;
        }
    }
    Ok(outcome)
}

async fn push_chunks(
    store: &Store,
    hub_client: &dyn DatasetHub,
    repo: &str,
    timeout: Duration,
) -> Result<PushOutcome> {
    let mut outcome = PushOutcome::default();
    for (source_file, chunks) in store.list_chunk_sets(ItemStatus::Approved)? {
        for chunk in chunks {
            let path = format!("chunked/{source_file}/chunk_{:02}.json", chunk.chunk_index);
            let content = serde_json::to_string_pretty(&chunk)?;
            if push_one(hub_client, repo, &path, &content, timeout).await {
                outcome.uploaded += 1;
            } else {
                outcome.failed += 1;
            }
        }
    }
    Ok(outcome)
}
