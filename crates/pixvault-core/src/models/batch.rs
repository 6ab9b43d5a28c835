//! Per-entry outcomes and the aggregated result of one ingestion batch.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Not an image; never looked up or uploaded.
    Skipped,
    /// The catalog already had a URL for this identity.
    AlreadyPresent,
    /// Uploaded during this batch and recorded in the catalog.
    Uploaded,
    /// Lookup, read, upload or upsert failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    pub identity_key: String,
    /// Entry name as read from the archive or folder.
    pub name: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl EntryOutcome {
    pub fn skipped(identity_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(identity_key, name, EntryStatus::Skipped, None)
    }

    pub fn already_present(
        identity_key: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::new(
            identity_key,
            name,
            EntryStatus::AlreadyPresent,
            Some(url.into()),
        )
    }

    pub fn uploaded(
        identity_key: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::new(identity_key, name, EntryStatus::Uploaded, Some(url.into()))
    }

    pub fn failed(
        identity_key: impl Into<String>,
        name: impl Into<String>,
        error: &AppError,
    ) -> Self {
        let mut outcome = Self::new(identity_key, name, EntryStatus::Failed, None);
        outcome.error = Some(error.to_string());
        outcome.error_code = Some(error.error_code().to_string());
        outcome
    }

    fn new(
        identity_key: impl Into<String>,
        name: impl Into<String>,
        status: EntryStatus,
        url: Option<String>,
    ) -> Self {
        Self {
            identity_key: identity_key.into(),
            name: name.into(),
            status,
            url,
            error: None,
            error_code: None,
        }
    }

    /// Outcome reported for a later entry with the same identity as `self`.
    ///
    /// A resolved first occurrence makes the duplicate already present; a
    /// failure is repeated as-is.
    pub fn for_duplicate(&self, name: impl Into<String>) -> Self {
        let mut outcome = self.clone();
        outcome.name = name.into();
        if outcome.status == EntryStatus::Uploaded {
            outcome.status = EntryStatus::AlreadyPresent;
        }
        outcome
    }

    /// URL of an image that is resolvable after this batch.
    pub fn resolved_url(&self) -> Option<&str> {
        match self.status {
            EntryStatus::Uploaded | EntryStatus::AlreadyPresent => self.url.as_deref(),
            EntryStatus::Skipped | EntryStatus::Failed => None,
        }
    }
}

/// Counts per status for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub skipped: usize,
    pub already_present: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// Ordered outcomes of one ingestion run, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    outcomes: Vec<EntryOutcome>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: EntryOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[EntryOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<EntryOutcome> {
        self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// URLs of uploaded and already present entries, in order.
    pub fn urls(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.resolved_url().map(str::to_string))
            .collect()
    }

    pub fn summary(&self) -> BatchSummary {
        self.outcomes
            .iter()
            .fold(BatchSummary::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome.status {
                    EntryStatus::Skipped => summary.skipped += 1,
                    EntryStatus::AlreadyPresent => summary.already_present += 1,
                    EntryStatus::Uploaded => summary.uploaded += 1,
                    EntryStatus::Failed => summary.failed += 1,
                }
                summary
            })
    }
}
