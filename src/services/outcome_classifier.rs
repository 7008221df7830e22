//! services/outcome_classifier.rs
//! Clasificación pura del resultado de un intento. Sin red ni almacén.

use crate::models::outcome_model::{Outcome, OutcomeKind, RawAttemptResult};

/// Total sobre todas las variantes: solo la confirmación es éxito.
pub fn classify(result: &RawAttemptResult) -> OutcomeKind {
    match result {
        RawAttemptResult::Confirmed => OutcomeKind::Success,
        RawAttemptResult::ErrorBanner(_)
        | RawAttemptResult::Timeout
        | RawAttemptResult::EngineError(_) => OutcomeKind::Failure,
    }
}

pub fn to_outcome(record_id: i64, result: &RawAttemptResult) -> Outcome {
    Outcome {
        record_id,
        kind: classify(result),
        detail: result.detail(),
    }
}
