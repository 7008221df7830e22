//! tests/classifier_tests.rs

#[cfg(test)]
mod tests {
    use crate::models::outcome_model::{OutcomeKind, RawAttemptResult};
    use crate::services::outcome_classifier::{classify, to_outcome};

    fn all_variants() -> Vec<RawAttemptResult> {
        vec![
            RawAttemptResult::Confirmed,
            RawAttemptResult::ErrorBanner(Some("ISRC duplicado".to_string())),
            RawAttemptResult::ErrorBanner(None),
            RawAttemptResult::Timeout,
            RawAttemptResult::EngineError("websocket cerrado".to_string()),
        ]
    }

    #[test]
    fn only_confirmation_is_success() {
        let kinds: Vec<_> = all_variants().iter().map(classify).collect();
        assert_eq!(
            kinds,
            vec![
                OutcomeKind::Success,
                OutcomeKind::Failure,
                OutcomeKind::Failure,
                OutcomeKind::Failure,
                OutcomeKind::Failure,
            ]
        );
    }

    #[test]
    fn classification_is_deterministic() {
        for variant in all_variants() {
            assert_eq!(classify(&variant), classify(&variant.clone()));
        }
    }

    #[test]
    fn outcome_carries_detail_only_for_failures() {
        let ok = to_outcome(4, &RawAttemptResult::Confirmed);
        assert_eq!(ok.record_id, 4);
        assert_eq!(ok.detail, None);

        let timeout = to_outcome(5, &RawAttemptResult::Timeout);
        assert_eq!(timeout.kind, OutcomeKind::Failure);
        assert!(timeout.detail.unwrap().contains("timeout"));

        let banner = to_outcome(6, &RawAttemptResult::ErrorBanner(Some("ISRC duplicado".into())));
        assert_eq!(banner.detail.as_deref(), Some("banner de error: ISRC duplicado"));
    }
}
