//! tests/store_tests.rs
//! Validación de filas y piezas puras del cliente REST.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use crate::error::{SyncError, SyncResult};
    use crate::models::record_model::{RecordStatus, STATUS_FAILURE, STATUS_SUCCESS};
    use crate::services::record_store_service::{
        fetch_all_pages, parse_content_range_total, partition_rows, pending_filter,
        status_patch_body,
    };

    #[test]
    fn valid_rows_become_records_in_store_order() {
        let rows = vec![
            json!({"id": 10, "ISRC": "BRABC2400001", "ARTISTA": "Canção A", "TITULARES": "Editora X", "PAINEL_NEW": null}),
            json!({"id": 11, "ISRC": "BRABC2400002", "ARTISTA": "Canção B", "TITULARES": "Editora Y", "PAINEL_NEW": STATUS_FAILURE}),
        ];

        let batch = partition_rows(rows);

        assert!(batch.rejected.is_empty());
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].id, 10);
        assert_eq!(batch.records[0].status, RecordStatus::Pending);
        assert_eq!(batch.records[1].artista, "Canção B");
        assert_eq!(batch.records[1].status, RecordStatus::Failure);
    }

    #[test]
    fn incomplete_rows_are_rejected_with_reason() {
        let rows = vec![
            json!({"id": 1, "ISRC": "", "ARTISTA": "A", "TITULARES": "T"}),
            json!({"id": 2, "ISRC": "BR1", "ARTISTA": null, "TITULARES": "T"}),
            json!({"id": 3, "ISRC": "BR3", "ARTISTA": "C"}),
            json!({"ISRC": "BR4", "ARTISTA": "D", "TITULARES": "T"}),
            json!({"id": "cinco", "ISRC": "BR5", "ARTISTA": "E", "TITULARES": "T"}),
        ];

        let batch = partition_rows(rows);

        assert!(batch.records.is_empty());
        assert_eq!(batch.rejected.len(), 5);
        assert_eq!(batch.rejected[0].id, Some(1));
        assert!(batch.rejected[0].reason.contains("ISRC"));
        assert!(batch.rejected[1].reason.contains("ARTISTA"));
        assert!(batch.rejected[2].reason.contains("TITULARES"));
        assert_eq!(batch.rejected[3].id, None);
        assert_eq!(batch.rejected[4].id, None);
    }

    #[test]
    fn numeric_cells_are_accepted_as_text() {
        let rows = vec![json!({"id": 1, "ISRC": 2400123, "ARTISTA": "  Samba  ", "TITULARES": "T"})];

        let batch = partition_rows(rows);

        assert_eq!(batch.records[0].isrc, "2400123");
        assert_eq!(batch.records[0].artista, "Samba");
    }

    #[test]
    fn rows_already_successful_are_never_returned() {
        let rows = vec![
            json!({"id": 1, "ISRC": "BR1", "ARTISTA": "A", "TITULARES": "T", "PAINEL_NEW": STATUS_SUCCESS}),
            json!({"id": 2, "ISRC": "BR2", "ARTISTA": "B", "TITULARES": "T", "PAINEL_NEW": null}),
        ];

        let batch = partition_rows(rows);

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].id, 2);
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn filter_excludes_success_status() {
        assert_eq!(
            pending_filter(),
            "(PAINEL_NEW.is.null,PAINEL_NEW.neq.Cadastro OK)"
        );
    }

    #[test]
    fn patch_body_maps_status_and_optional_detail() {
        let ok = status_patch_body(RecordStatus::Success, None, None);
        assert_eq!(ok, json!({"PAINEL_NEW": "Cadastro OK"}));

        let failed = status_patch_body(RecordStatus::Failure, Some("timeout"), Some("DETALHE"));
        assert_eq!(
            failed,
            json!({"PAINEL_NEW": "Erro no Cadastro", "DETALHE": "timeout"})
        );

        let reset = status_patch_body(RecordStatus::Pending, None, Some("DETALHE"));
        assert_eq!(reset, json!({"PAINEL_NEW": null, "DETALHE": null}));
    }

    /// Tabla en memoria que, como PostgREST con `max-rows`, nunca
    /// devuelve más de `server_cap` filas por GET.
    fn table_pages(
        total: u64,
        server_cap: u64,
    ) -> (
        Arc<Mutex<Vec<(u64, u64)>>>,
        impl FnMut(u64, u64) -> std::future::Ready<SyncResult<Vec<Value>>>,
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let fetch = move |offset: u64, limit: u64| {
            seen.lock().unwrap().push((offset, limit));
            let end = total.min(offset + limit.min(server_cap));
            let rows = (offset..end).map(|id| json!({ "id": id })).collect();
            std::future::ready(Ok(rows))
        };
        (calls, fetch)
    }

    fn ids(rows: &[Value]) -> Vec<u64> {
        rows.iter().filter_map(|r| r["id"].as_u64()).collect()
    }

    #[tokio::test]
    async fn unsliced_fetch_reads_past_the_server_row_cap() {
        let (calls, fetch) = table_pages(2500, 1000);

        let rows = fetch_all_pages(0, None, 1000, fetch).await.unwrap();

        assert_eq!(rows.len(), 2500);
        assert_eq!(ids(&rows), (0..2500).collect::<Vec<_>>());
        assert_eq!(
            *calls.lock().unwrap(),
            vec![(0, 1000), (1000, 1000), (2000, 1000), (2500, 1000)]
        );
    }

    #[tokio::test]
    async fn server_cap_below_page_size_does_not_truncate() {
        let (_, fetch) = table_pages(1200, 500);

        let rows = fetch_all_pages(0, None, 1000, fetch).await.unwrap();

        assert_eq!(ids(&rows), (0..1200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn slice_stops_at_its_limit() {
        let (calls, fetch) = table_pages(5000, 1000);

        let rows = fetch_all_pages(250, Some(250), 1000, fetch).await.unwrap();

        assert_eq!(ids(&rows), (250..500).collect::<Vec<_>>());
        assert_eq!(*calls.lock().unwrap(), vec![(250, 250)]);
    }

    #[tokio::test]
    async fn failing_page_fails_the_whole_fetch() {
        let mut call = 0;
        let result = fetch_all_pages(0, None, 2, |offset, _| {
            call += 1;
            let page = if call == 1 {
                Ok(vec![json!({ "id": offset }), json!({ "id": offset + 1 })])
            } else {
                Err(SyncError::StoreUnavailable("502 Bad Gateway".to_string()))
            };
            std::future::ready(page)
        })
        .await;

        assert!(matches!(result, Err(SyncError::StoreUnavailable(_))));
    }

    #[test]
    fn content_range_total_is_parsed() {
        assert_eq!(parse_content_range_total("0-0/1234"), Some(1234));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total(" 0-0/7 "), Some(7));
        assert_eq!(parse_content_range_total("0-0/*"), None);
        assert_eq!(parse_content_range_total("sin barra"), None);
    }

    #[test]
    fn status_column_values_round_trip() {
        for status in [RecordStatus::Pending, RecordStatus::Success, RecordStatus::Failure] {
            assert_eq!(
                RecordStatus::from_column_value(status.as_column_value()),
                status
            );
        }
        assert_eq!(
            RecordStatus::from_column_value(Some("algo raro")),
            RecordStatus::Pending
        );
    }
}
