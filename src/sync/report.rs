use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

use crate::error::SyncError;
use crate::sync::api::{BatchStatus, ProgressState};
use crate::timefmt;

/// Per-table outcome of a completed refresh batch, localized and ready for
/// display. Rows keep the server's order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSyncRecord {
    pub table_name: String,
    pub last_update: String,
    pub table_sync_state: String,
    pub sql_sync_state: String,
}

/// Interpretation of a terminal batch document.
#[derive(Debug)]
pub enum SyncOutcome {
    Completed { tables: Vec<TableSyncRecord> },
    Failed { detail: Value },
    Ambiguous { state: String },
}

/// Classifies a terminal batch document.
///
/// Table records are extracted only under `success`; a failed batch yields
/// the full payload for diagnostics, and an unrecognized terminal state is
/// surfaced as ambiguous rather than being treated as either outcome.
pub fn classify(status: &BatchStatus, zone: Tz) -> Result<SyncOutcome, SyncError> {
    match &status.progress_state {
        ProgressState::Success => {
            let entries = status
                .operation_information
                .first()
                .and_then(|operation| operation.progress_detail.as_ref())
                .and_then(|detail| detail.tables_sync_status.as_ref())
                .ok_or_else(|| SyncError::Schema {
                    context: "batch status document".to_string(),
                    reason: "operationInformation[0].progressDetail.tablesSyncStatus missing"
                        .to_string(),
                })?;

            let mut tables = Vec::with_capacity(entries.len());
            for entry in entries {
                tables.push(TableSyncRecord {
                    table_name: entry.table_name.clone(),
                    last_update: timefmt::localize_utc_timestamp(
                        entry.last_successful_update.as_deref(),
                        zone,
                    )?,
                    table_sync_state: entry.table_sync_state.clone(),
                    sql_sync_state: entry.sql_sync_state.clone(),
                });
            }
            Ok(SyncOutcome::Completed { tables })
        }
        ProgressState::Failure => Ok(SyncOutcome::Failed {
            detail: serde_json::to_value(status).map_err(|err| SyncError::Schema {
                context: "batch status document".to_string(),
                reason: err.to_string(),
            })?,
        }),
        state => Ok(SyncOutcome::Ambiguous {
            state: state.as_str().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timefmt::parse_zone;

    fn madrid() -> Tz {
        parse_zone("Europe/Madrid").unwrap()
    }

    fn success_status(tables_json: &str) -> BatchStatus {
        serde_json::from_str(&format!(
            r#"{{
                "progressState": "success",
                "operationInformation": [
                    {{ "progressDetail": {{ "tablesSyncStatus": {tables_json} }} }}
                ]
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn success_yields_one_record_per_table_in_order() {
        let status = success_status(
            r#"[
                {"tableName":"Orders","lastSuccessfulUpdate":"2024-01-01T10:00:00.123","tableSyncState":"Completed","sqlSyncState":"Completed"},
                {"tableName":"Customers","tableSyncState":"NotRun","sqlSyncState":"NotRun"}
            ]"#,
        );

        let outcome = classify(&status, madrid()).unwrap();
        let SyncOutcome::Completed { tables } = outcome else {
            panic!("expected Completed");
        };
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].table_name, "Orders");
        assert_eq!(tables[0].last_update, "2024-01-01 11:00:00 CET");
        assert_eq!(tables[0].table_sync_state, "Completed");
        assert_eq!(tables[1].table_name, "Customers");
        assert_eq!(tables[1].last_update, "N/A");
    }

    #[test]
    fn success_with_no_tables_is_still_completed() {
        let status = success_status("[]");
        let outcome = classify(&status, madrid()).unwrap();
        assert!(matches!(outcome, SyncOutcome::Completed { tables } if tables.is_empty()));
    }

    #[test]
    fn success_missing_the_nested_chain_is_a_schema_error() {
        let status: BatchStatus = serde_json::from_str(
            r#"{"progressState":"success","operationInformation":[{}]}"#,
        )
        .unwrap();
        let err = classify(&status, madrid()).unwrap_err();
        assert!(matches!(err, SyncError::Schema { .. }));

        let status: BatchStatus = serde_json::from_str(r#"{"progressState":"success"}"#).unwrap();
        assert!(classify(&status, madrid()).is_err());
    }

    #[test]
    fn failure_carries_the_full_payload() {
        let status: BatchStatus = serde_json::from_str(
            r#"{"progressState":"failure","errorCode":"MetadataRefreshFailed"}"#,
        )
        .unwrap();
        let outcome = classify(&status, madrid()).unwrap();
        let SyncOutcome::Failed { detail } = outcome else {
            panic!("expected Failed");
        };
        assert_eq!(detail["progressState"], "failure");
        assert_eq!(detail["errorCode"], "MetadataRefreshFailed");
    }

    #[test]
    fn unrecognized_terminal_states_are_ambiguous() {
        let status: BatchStatus =
            serde_json::from_str(r#"{"progressState":"canceled"}"#).unwrap();
        let outcome = classify(&status, madrid()).unwrap();
        assert!(matches!(outcome, SyncOutcome::Ambiguous { state } if state == "canceled"));
    }

    #[test]
    fn malformed_table_timestamp_is_a_format_error() {
        let status = success_status(
            r#"[{"tableName":"Orders","lastSuccessfulUpdate":"not-a-date","tableSyncState":"Completed","sqlSyncState":"Completed"}]"#,
        );
        let err = classify(&status, madrid()).unwrap_err();
        assert!(matches!(err, SyncError::Timestamp { .. }));
    }
}
