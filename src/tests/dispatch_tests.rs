//! tests/dispatch_tests.rs

#[cfg(test)]
mod tests {
    use crate::services::dispatch_service::{plan_matrix, WorkerSlice, BATCH_SIZE, MAX_WORKERS};

    #[test]
    fn no_pending_means_no_workers() {
        let matrix = plan_matrix(0, BATCH_SIZE, MAX_WORKERS);
        assert!(matrix.include.is_empty());
        assert_eq!(serde_json::to_string(&matrix).unwrap(), r#"{"include":[]}"#);
    }

    #[test]
    fn partial_batch_gets_one_worker() {
        let matrix = plan_matrix(10, BATCH_SIZE, MAX_WORKERS);
        assert_eq!(
            matrix.include,
            vec![WorkerSlice {
                worker_id: 1,
                offset: 0,
                limit: 250
            }]
        );
    }

    #[test]
    fn slices_are_contiguous() {
        let matrix = plan_matrix(600, BATCH_SIZE, MAX_WORKERS);
        let offsets: Vec<_> = matrix.include.iter().map(|w| w.offset).collect();
        assert_eq!(offsets, vec![0, 250, 500]);
        let ids: Vec<_> = matrix.include.iter().map(|w| w.worker_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn workers_are_capped() {
        let matrix = plan_matrix(5000, BATCH_SIZE, MAX_WORKERS);
        assert_eq!(matrix.include.len(), 4);
        assert_eq!(matrix.include[3].offset, 750);
    }

    #[test]
    fn matrix_serializes_for_the_workflow() {
        let json = serde_json::to_string(&plan_matrix(1, 250, 4)).unwrap();
        assert_eq!(json, r#"{"include":[{"worker_id":1,"offset":0,"limit":250}]}"#);
    }
}
