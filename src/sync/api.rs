use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use urlencoding::encode;

use crate::error::SyncError;
use crate::http::ApiClient;

/// Workspace/lakehouse pair one sync run operates on. Supplied externally and
/// immutable for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub workspace_id: String,
    pub lakehouse_id: String,
}

/// Lifecycle marker of a refresh batch as reported by the server. States the
/// server introduces later deserialize into `Other` and round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressState {
    InProgress,
    Success,
    Failure,
    #[serde(untagged)]
    Other(String),
}

impl ProgressState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressState::InProgress)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProgressState::InProgress => "inProgress",
            ProgressState::Success => "success",
            ProgressState::Failure => "failure",
            ProgressState::Other(state) => state,
        }
    }
}

/// Accepted refresh submission: the batch id plus whatever initial state the
/// server reported (normally `inProgress`, but never assumed).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJob {
    pub batch_id: String,
    pub progress_state: ProgressState,
}

/// One status snapshot of a refresh batch. Fields we do not model are kept in
/// `extra` so failure diagnostics can carry the full terminal payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatus {
    pub progress_state: ProgressState,
    #[serde(default)]
    pub operation_information: Vec<OperationInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    #[serde(default)]
    pub progress_detail: Option<ProgressDetail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDetail {
    #[serde(default)]
    pub tables_sync_status: Option<Vec<TableSyncStatus>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-table entry of a completed batch, exactly as the server returned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSyncStatus {
    pub table_name: String,
    #[serde(default)]
    pub last_successful_update: Option<String>,
    pub table_sync_state: String,
    pub sql_sync_state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Lakehouse {
    #[serde(default)]
    properties: Option<LakehouseProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LakehouseProperties {
    #[serde(default)]
    sql_endpoint_properties: Option<SqlEndpointProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SqlEndpointProperties {
    #[serde(default)]
    id: Option<String>,
}

/// Resolves the SQL analytics endpoint bound to a lakehouse. One metadata
/// read, no side effects.
pub async fn fetch_sql_endpoint_id(
    client: &ApiClient,
    target: &SyncTarget,
) -> Result<String, SyncError> {
    let path = format!(
        "/v1/workspaces/{}/lakehouses/{}",
        encode(&target.workspace_id),
        encode(&target.lakehouse_id)
    );
    let lakehouse: Lakehouse = client.get(&path).await?;
    lakehouse
        .properties
        .and_then(|properties| properties.sql_endpoint_properties)
        .and_then(|endpoint| endpoint.id)
        .ok_or_else(|| SyncError::Schema {
            context: path,
            reason: "properties.sqlEndpointProperties.id missing from lakehouse metadata"
                .to_string(),
        })
}

/// Submits one metadata refresh command against the endpoint.
///
/// Not idempotent: every call starts a new billable batch, so callers must
/// not retry a submission whose outcome is unknown.
pub async fn initiate_sync(
    client: &ApiClient,
    sql_endpoint_id: &str,
) -> Result<SyncJob, SyncError> {
    let path = format!("/v1.0/myorg/lhdatamarts/{}", encode(sql_endpoint_id));
    let body = serde_json::json!({ "commands": [{ "$type": "MetadataRefreshCommand" }] });
    client.post(&path, &body).await
}

/// Reads the current batch document. Safe to repeat.
pub async fn fetch_batch_status(
    client: &ApiClient,
    sql_endpoint_id: &str,
    batch_id: &str,
) -> Result<BatchStatus, SyncError> {
    let path = format!(
        "/v1.0/myorg/lhdatamarts/{}/batches/{}",
        encode(sql_endpoint_id),
        encode(batch_id)
    );
    client.get(&path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_state_accepts_unknown_strings() {
        let state: ProgressState = serde_json::from_str("\"inProgress\"").unwrap();
        assert_eq!(state, ProgressState::InProgress);
        assert!(!state.is_terminal());

        let state: ProgressState = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(state, ProgressState::Other("canceled".to_string()));
        assert!(state.is_terminal());
        assert_eq!(state.as_str(), "canceled");
    }

    #[test]
    fn batch_status_keeps_unmodeled_fields() {
        let status: BatchStatus = serde_json::from_str(
            r#"{
                "progressState": "failure",
                "errorCode": "MetadataRefreshThrottled",
                "operationInformation": []
            }"#,
        )
        .unwrap();
        assert_eq!(status.progress_state, ProgressState::Failure);
        assert_eq!(
            status.extra.get("errorCode").and_then(|v| v.as_str()),
            Some("MetadataRefreshThrottled")
        );

        let round_tripped = serde_json::to_value(&status).unwrap();
        assert_eq!(round_tripped["errorCode"], "MetadataRefreshThrottled");
    }

    #[test]
    fn sync_job_requires_batch_id_and_state() {
        let job: SyncJob =
            serde_json::from_str(r#"{"batchId":"b1","progressState":"inProgress"}"#).unwrap();
        assert_eq!(job.batch_id, "b1");
        assert_eq!(job.progress_state, ProgressState::InProgress);

        assert!(serde_json::from_str::<SyncJob>(r#"{"batchId":"b1"}"#).is_err());
        assert!(serde_json::from_str::<SyncJob>(r#"{"progressState":"success"}"#).is_err());
    }

    #[test]
    fn lakehouse_endpoint_id_requires_the_full_nested_chain() {
        let lakehouse: Lakehouse = serde_json::from_str(
            r#"{"properties":{"sqlEndpointProperties":{"id":"ep-1"}}}"#,
        )
        .unwrap();
        let id = lakehouse
            .properties
            .and_then(|properties| properties.sql_endpoint_properties)
            .and_then(|endpoint| endpoint.id);
        assert_eq!(id.as_deref(), Some("ep-1"));

        // A lakehouse without a provisioned endpoint omits the nested object.
        let lakehouse: Lakehouse =
            serde_json::from_str(r#"{"properties":{"oneLakeTablesPath":"..."}}"#).unwrap();
        let id = lakehouse
            .properties
            .and_then(|properties| properties.sql_endpoint_properties)
            .and_then(|endpoint| endpoint.id);
        assert!(id.is_none());
    }

    #[test]
    fn table_entries_tolerate_missing_last_update_only() {
        let entry: TableSyncStatus = serde_json::from_str(
            r#"{"tableName":"Orders","tableSyncState":"Completed","sqlSyncState":"Completed"}"#,
        )
        .unwrap();
        assert_eq!(entry.table_name, "Orders");
        assert!(entry.last_successful_update.is_none());

        assert!(serde_json::from_str::<TableSyncStatus>(
            r#"{"tableSyncState":"Completed","sqlSyncState":"Completed"}"#
        )
        .is_err());
    }
}
