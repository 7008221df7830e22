//! models/summary_model.rs
//! Contadores de la corrida.

use chrono::{DateTime, Utc};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub record_id: i64,
    pub isrc: String,
    pub detail: String,
    /// El panel pudo haber registrado la faixa aunque el estado no se
    /// escribió: requiere conciliación manual, no reintento automático.
    pub needs_reconciliation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalCause {
    pub kind: String,
    pub message: String,
}

impl From<&SyncError> for FatalCause {
    fn from(err: &SyncError) -> Self {
        FatalCause {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub worker_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub submitted_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub rejected_count: usize,
    pub failures: Vec<FailureDetail>,
    pub fatal: Option<FatalCause>,
}

impl RunSummary {
    pub fn new(worker_id: &str) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            submitted_count: 0,
            success_count: 0,
            failure_count: 0,
            rejected_count: 0,
            failures: vec![],
            fatal: None,
        }
    }

    pub fn record_success(&mut self) {
        self.submitted_count += 1;
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, failure: FailureDetail) {
        self.submitted_count += 1;
        self.failure_count += 1;
        self.failures.push(failure);
    }

    pub fn set_fatal(&mut self, err: &SyncError) {
        self.fatal = Some(FatalCause::from(err));
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn reconciliation_count(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.needs_reconciliation)
            .count()
    }
}
