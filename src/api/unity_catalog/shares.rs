//! Purpose: Delta Sharing shares (`/api/2.1/unity-catalog/shares`) and their recipient grants.
//! Exports: `SharesApi`, `ShareInfo`, `SharedDataObject`, `SharedDataObjectType`,
//! `SharedDataObjectUpdate`, `SharedDataObjectUpdateAction`, `CreateShare`, `UpdateShare`.
//! Role: Object membership changes go through `update`; grants through `update_permissions`.
#![allow(clippy::result_large_err)]

use super::grants::{AssignmentsEnvelope, ChangesBody, PermissionsChange, PrivilegeAssignment};
use super::{ListOptions, Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::epoch_ms;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedDataObjectType {
    Table,
    Schema,
    View,
    MaterializedView,
    StreamingTable,
    Model,
    NotebookFile,
    Function,
    FeatureSpec,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PartitionValue {
    pub name: String,
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_property_key: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    #[serde(default)]
    pub values: Vec<PartitionValue>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SharedDataObject {
    /// Three-level name of the shared object, e.g. `main.sales.orders`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_object_type: Option<SharedDataObjectType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_as: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdf_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_data_sharing_status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Partition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub added_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShareInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<SharedDataObject>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedDataObjectUpdateAction {
    Add,
    Remove,
    Update,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SharedDataObjectUpdate {
    pub action: SharedDataObjectUpdateAction,
    pub data_object: SharedDataObject,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateShare {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateShare {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<SharedDataObjectUpdate>,
}

#[derive(Deserialize)]
struct SharesEnvelope {
    #[serde(default)]
    shares: Vec<ShareInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct SharesApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> SharesApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(&self, options: &ListOptions) -> ApiResult<Page<ShareInfo>> {
        let envelope: SharesEnvelope = self.client.get(options.apply(uc_endpoint("shares")))?;
        Ok(Page::new(envelope.shares, envelope.next_page_token))
    }

    pub fn get(&self, name: &str, include_shared_data: bool) -> ApiResult<ShareInfo> {
        self.client.get(
            uc_endpoint("shares")
                .segment(name)
                .query_flag("include_shared_data", include_shared_data),
        )
    }

    pub fn create(&self, request: &CreateShare) -> ApiResult<ShareInfo> {
        self.client.post(uc_endpoint("shares"), request)
    }

    pub fn update(&self, name: &str, request: &UpdateShare) -> ApiResult<ShareInfo> {
        self.client.patch(uc_endpoint("shares").segment(name), request)
    }

    pub fn delete(&self, name: &str) -> ApiResult<()> {
        self.client.delete_unit(uc_endpoint("shares").segment(name))
    }

    /// Recipients and their privileges on the share.
    pub fn permissions(&self, name: &str) -> ApiResult<Vec<PrivilegeAssignment>> {
        let envelope: AssignmentsEnvelope = self
            .client
            .get(uc_endpoint("shares").segment(name).segment("permissions"))?;
        Ok(envelope.privilege_assignments)
    }

    pub fn update_permissions(&self, name: &str, changes: &[PermissionsChange]) -> ApiResult<()> {
        self.client.patch_unit(
            uc_endpoint("shares").segment(name).segment("permissions"),
            &ChangesBody { changes },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{SharedDataObjectUpdate, SharedDataObjectUpdateAction, UpdateShare};
    use serde_json::json;

    #[test]
    fn update_body_carries_object_actions() {
        let update: UpdateShare = serde_json::from_value(json!({
            "updates": [{
                "action": "ADD",
                "data_object": {"name": "main.sales.orders", "data_object_type": "TABLE"}
            }]
        }))
        .expect("decode");
        let SharedDataObjectUpdate {
            action,
            data_object,
        } = &update.updates[0];
        assert_eq!(*action, SharedDataObjectUpdateAction::Add);
        assert_eq!(data_object.name, "main.sales.orders");
        assert_eq!(
            serde_json::to_value(&update).expect("encode"),
            json!({
                "updates": [{
                    "action": "ADD",
                    "data_object": {"name": "main.sales.orders", "data_object_type": "TABLE"}
                }]
            })
        );
    }
}
