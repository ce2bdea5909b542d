//! Purpose: Data lineage lookups (`/api/2.0/lineage-tracking/*`).
//! Exports: `LineageApi`, `TableLineage`, `LineageEdge`, `ColumnLineage`, `LineageColumn`,
//! entity info types.
//! Invariants: Lineage payloads use camelCase keys for entity blocks; they are kept verbatim.
#![allow(clippy::result_large_err)]

use crate::api::client::{ApiResult, DatabricksClient, Endpoint};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LineageTableInfo {
    pub name: String,
    #[serde(default)]
    pub catalog_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    /// Service-formatted, e.g. `2023-04-18 06:21:00.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NotebookInfo {
    pub workspace_id: i64,
    pub notebook_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub workspace_id: i64,
    pub job_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueryInfo {
    pub workspace_id: i64,
    pub query_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_timestamp: Option<String>,
}

/// One upstream or downstream neighbour; usually exactly one block is set.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LineageEdge {
    #[serde(rename = "tableInfo", default, skip_serializing_if = "Option::is_none")]
    pub table_info: Option<LineageTableInfo>,
    #[serde(rename = "notebookInfos", default, skip_serializing_if = "Vec::is_empty")]
    pub notebook_infos: Vec<NotebookInfo>,
    #[serde(rename = "jobInfos", default, skip_serializing_if = "Vec::is_empty")]
    pub job_infos: Vec<JobInfo>,
    #[serde(rename = "queryInfos", default, skip_serializing_if = "Vec::is_empty")]
    pub query_infos: Vec<QueryInfo>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TableLineage {
    #[serde(default)]
    pub upstreams: Vec<LineageEdge>,
    #[serde(default)]
    pub downstreams: Vec<LineageEdge>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LineageColumn {
    pub name: String,
    #[serde(default)]
    pub catalog_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnLineage {
    #[serde(default)]
    pub upstream_cols: Vec<LineageColumn>,
    #[serde(default)]
    pub downstream_cols: Vec<LineageColumn>,
}

pub struct LineageApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> LineageApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    /// `include_entity_lineage` adds notebooks, jobs and queries to the edges.
    pub fn table_lineage(
        &self,
        table_name: &str,
        include_entity_lineage: bool,
    ) -> ApiResult<TableLineage> {
        let endpoint = Endpoint::new("/api/2.0/lineage-tracking/table-lineage")
            .query("table_name", table_name)
            .query_flag("include_entity_lineage", include_entity_lineage);
        self.client.get(endpoint)
    }

    pub fn column_lineage(&self, table_name: &str, column_name: &str) -> ApiResult<ColumnLineage> {
        let endpoint = Endpoint::new("/api/2.0/lineage-tracking/column-lineage")
            .query("table_name", table_name)
            .query("column_name", column_name);
        self.client.get(endpoint)
    }
}
