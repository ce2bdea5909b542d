//! Purpose: Cluster lifecycle wrappers (`/api/2.0/clusters/*`) and the `InitScriptInfo` union.
//! Exports: `ClustersApi`, `ClusterAttributes`, `ClusterInfo`, `ClusterState`, `InitScriptInfo`,
//! `ScriptDestination`, `AutoScale`, `DataSecurityMode`, event and request types.
//! Role: One call per method; `events` surfaces `next_page` without following it.
//! Invariants: Init-script arms are checked as `workspace`, `dbfs`, `abfss`, `volumes`.
#![allow(clippy::result_large_err)]

use super::client::{ApiResult, DatabricksClient, Endpoint};
use crate::core::epoch_ms;
use crate::core::union::{Arm, Discriminator, TaggedUnion, impl_union_serde};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScriptDestination {
    pub destination: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InitScriptInfo {
    Workspace(ScriptDestination),
    Dbfs(ScriptDestination),
    Abfss(ScriptDestination),
    Volumes(ScriptDestination),
}

impl InitScriptInfo {
    pub fn destination(&self) -> &str {
        match self {
            InitScriptInfo::Workspace(info)
            | InitScriptInfo::Dbfs(info)
            | InitScriptInfo::Abfss(info)
            | InitScriptInfo::Volumes(info) => &info.destination,
        }
    }
}

impl TaggedUnion for InitScriptInfo {
    const FAMILY: &'static str = "InitScriptInfo";
    const DISCRIMINATOR: Discriminator = Discriminator::Presence(&[
        Arm::nested("workspace"),
        Arm::nested("dbfs"),
        Arm::nested("abfss"),
        Arm::nested("volumes"),
    ]);

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self> {
        let destination: ScriptDestination = serde_json::from_value(payload)?;
        Ok(match tag {
            "workspace" => InitScriptInfo::Workspace(destination),
            "dbfs" => InitScriptInfo::Dbfs(destination),
            "abfss" => InitScriptInfo::Abfss(destination),
            _ => InitScriptInfo::Volumes(destination),
        })
    }

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>) {
        let (tag, destination) = match self {
            InitScriptInfo::Workspace(info) => ("workspace", info),
            InitScriptInfo::Dbfs(info) => ("dbfs", info),
            InitScriptInfo::Abfss(info) => ("abfss", info),
            InitScriptInfo::Volumes(info) => ("volumes", info),
        };
        (tag, serde_json::to_value(destination))
    }
}

impl_union_serde!(InitScriptInfo);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AutoScale {
    pub min_workers: u32,
    pub max_workers: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterState {
    Pending,
    Running,
    Restarting,
    Resizing,
    Terminating,
    Terminated,
    Error,
    Unknown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSecurityMode {
    None,
    SingleUser,
    UserIsolation,
    LegacyTableAcl,
    LegacyPassthrough,
    LegacySingleUser,
    LegacySingleUserStandard,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeEngine {
    Standard,
    Photon,
}

/// Settable cluster fields; the body of `create` and (with `cluster_id`) `edit`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub spark_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_node_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<AutoScale>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub spark_conf: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub spark_env_vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_public_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autotermination_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_elastic_disk: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_instance_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_policy_default_values: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_scripts: Vec<InitScriptInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_security_mode: Option<DataSecurityMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_engine: Option<RuntimeEngine>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerminationReason {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ClusterState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_message: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub terminated_time: Option<OffsetDateTime>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub last_restarted_time: Option<OffsetDateTime>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub last_state_loss_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_context_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jdbc_port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_memory_mb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_cores: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_source: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<TerminationReason>,
    #[serde(flatten)]
    pub attributes: ClusterAttributes,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditClusterRequest {
    pub cluster_id: String,
    #[serde(flatten)]
    pub attributes: ClusterAttributes,
}

/// Exactly one of `num_workers` or `autoscale` is expected by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResizeClusterRequest {
    pub cluster_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<AutoScale>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListOrder {
    Desc,
    Asc,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterEventsRequest {
    pub cluster_id: String,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<ListOrder>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterEvent {
    pub cluster_id: String,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// One page of events; `next_page` is the request for the following page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterEventsPage {
    #[serde(default)]
    pub events: Vec<ClusterEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<ClusterEventsRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SparkVersion {
    pub key: String,
    pub name: String,
}

#[derive(Serialize)]
struct ClusterIdBody<'a> {
    cluster_id: &'a str,
}

#[derive(Deserialize)]
struct ClusterIdEnvelope {
    cluster_id: String,
}

#[derive(Deserialize)]
struct ClustersEnvelope {
    #[serde(default)]
    clusters: Vec<ClusterInfo>,
}

#[derive(Deserialize)]
struct SparkVersionsEnvelope {
    #[serde(default)]
    versions: Vec<SparkVersion>,
}

pub struct ClustersApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> ClustersApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    /// Returns the new cluster id; the cluster is still `PENDING` at this point.
    pub fn create(&self, attributes: &ClusterAttributes) -> ApiResult<String> {
        let envelope: ClusterIdEnvelope = self
            .client
            .post(Endpoint::new("/api/2.0/clusters/create"), attributes)?;
        Ok(envelope.cluster_id)
    }

    pub fn edit(&self, request: &EditClusterRequest) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/clusters/edit"), request)
    }

    pub fn start(&self, cluster_id: &str) -> ApiResult<()> {
        self.cluster_action("start", cluster_id)
    }

    pub fn restart(&self, cluster_id: &str) -> ApiResult<()> {
        self.cluster_action("restart", cluster_id)
    }

    /// Terminates the cluster; its configuration is kept for 30 days.
    pub fn terminate(&self, cluster_id: &str) -> ApiResult<()> {
        self.cluster_action("delete", cluster_id)
    }

    pub fn permanent_delete(&self, cluster_id: &str) -> ApiResult<()> {
        self.cluster_action("permanent-delete", cluster_id)
    }

    pub fn pin(&self, cluster_id: &str) -> ApiResult<()> {
        self.cluster_action("pin", cluster_id)
    }

    pub fn unpin(&self, cluster_id: &str) -> ApiResult<()> {
        self.cluster_action("unpin", cluster_id)
    }

    pub fn resize(&self, request: &ResizeClusterRequest) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/clusters/resize"), request)
    }

    pub fn get(&self, cluster_id: &str) -> ApiResult<ClusterInfo> {
        self.client
            .get(Endpoint::new("/api/2.0/clusters/get").query("cluster_id", cluster_id))
    }

    pub fn list(&self) -> ApiResult<Vec<ClusterInfo>> {
        let envelope: ClustersEnvelope = self.client.get(Endpoint::new("/api/2.0/clusters/list"))?;
        Ok(envelope.clusters)
    }

    pub fn events(&self, request: &ClusterEventsRequest) -> ApiResult<ClusterEventsPage> {
        self.client
            .post(Endpoint::new("/api/2.0/clusters/events"), request)
    }

    pub fn spark_versions(&self) -> ApiResult<Vec<SparkVersion>> {
        let envelope: SparkVersionsEnvelope = self
            .client
            .get(Endpoint::new("/api/2.0/clusters/spark-versions"))?;
        Ok(envelope.versions)
    }

    fn cluster_action(&self, action: &str, cluster_id: &str) -> ApiResult<()> {
        let endpoint = Endpoint::new("/api/2.0/clusters").segment(action);
        self.client
            .post_unit(endpoint, &ClusterIdBody { cluster_id })
    }
}

#[cfg(test)]
mod tests {
    use super::{ClusterAttributes, ClusterInfo, ClusterState, InitScriptInfo, ScriptDestination};
    use serde_json::json;

    #[test]
    fn init_script_variants_nest_destination() {
        let cases = [
            ("workspace", "/Users/a@b.com/init.sh"),
            ("dbfs", "dbfs:/init/setup.sh"),
            ("abfss", "abfss://c@acct.dfs.core.windows.net/init.sh"),
            ("volumes", "/Volumes/main/default/scripts/init.sh"),
        ];
        for (key, destination) in cases {
            let wire = json!({ key: { "destination": destination } });
            let info: InitScriptInfo = serde_json::from_value(wire.clone()).expect("decode");
            assert_eq!(info.destination(), destination);
            assert_eq!(serde_json::to_value(&info).expect("encode"), wire);
        }
    }

    #[test]
    fn init_script_with_unknown_storage_is_rejected() {
        let err = serde_json::from_value::<InitScriptInfo>(json!({
            "gcs": {"destination": "gs://bucket/init.sh"}
        }))
        .expect_err("err");
        assert!(err.to_string().contains("no matching variant for InitScriptInfo"));
    }

    #[test]
    fn cluster_info_flattens_attributes_and_timestamps() {
        let info: ClusterInfo = serde_json::from_value(json!({
            "cluster_id": "1114-202840-mu1ql9xp",
            "cluster_name": "shared",
            "spark_version": "13.3.x-scala2.12",
            "node_type_id": "Standard_DS3_v2",
            "num_workers": 2,
            "state": "RUNNING",
            "start_time": 1666369196203i64,
            "init_scripts": [{"dbfs": {"destination": "dbfs:/init.sh"}}]
        }))
        .expect("decode");
        assert_eq!(info.state, Some(ClusterState::Running));
        assert_eq!(info.attributes.cluster_name.as_deref(), Some("shared"));
        assert_eq!(info.attributes.num_workers, Some(2));
        assert_eq!(
            info.attributes.init_scripts,
            vec![InitScriptInfo::Dbfs(ScriptDestination {
                destination: "dbfs:/init.sh".to_string()
            })]
        );
        assert_eq!(
            info.start_time.map(|t| t.unix_timestamp()),
            Some(1666369196)
        );
    }

    #[test]
    fn empty_attributes_only_carry_spark_version() {
        let attributes = ClusterAttributes {
            spark_version: "13.3.x-scala2.12".to_string(),
            ..ClusterAttributes::default()
        };
        assert_eq!(
            serde_json::to_value(&attributes).expect("encode"),
            json!({"spark_version": "13.3.x-scala2.12"})
        );
    }
}
