//! Purpose: Unity Catalog catalogs (`/api/2.1/unity-catalog/catalogs`).
//! Exports: `CatalogsApi`, `CatalogInfo`, `CatalogType`, `IsolationMode`, `ProvisioningInfo`,
//! `ProvisioningState`, `CreateCatalog`, `UpdateCatalog`.
#![allow(clippy::result_large_err)]

use super::{ListOptions, Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::epoch_ms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogType {
    ManagedCatalog,
    DeltasharingCatalog,
    ForeignCatalog,
    SystemCatalog,
    InternalCatalog,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum IsolationMode {
    #[serde(rename = "ISOLATION_MODE_OPEN", alias = "OPEN")]
    Open,
    #[serde(rename = "ISOLATION_MODE_ISOLATED", alias = "ISOLATED")]
    Isolated,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningState {
    StateUnspecified,
    Provisioning,
    Active,
    Failed,
    Deleting,
    Updating,
    Degraded,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ProvisioningState>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_type: Option<CatalogType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolation_mode: Option<IsolationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_info: Option<ProvisioningInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metastore_id: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateCatalog {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolation_mode: Option<IsolationMode>,
}

#[derive(Deserialize)]
struct CatalogsEnvelope {
    #[serde(default)]
    catalogs: Vec<CatalogInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct CatalogsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> CatalogsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(&self, options: &ListOptions) -> ApiResult<Page<CatalogInfo>> {
        let envelope: CatalogsEnvelope = self.client.get(options.apply(uc_endpoint("catalogs")))?;
        Ok(Page::new(envelope.catalogs, envelope.next_page_token))
    }

    pub fn get(&self, name: &str) -> ApiResult<CatalogInfo> {
        self.client.get(uc_endpoint("catalogs").segment(name))
    }

    pub fn create(&self, request: &CreateCatalog) -> ApiResult<CatalogInfo> {
        self.client.post(uc_endpoint("catalogs"), request)
    }

    pub fn update(&self, name: &str, request: &UpdateCatalog) -> ApiResult<CatalogInfo> {
        self.client.patch(uc_endpoint("catalogs").segment(name), request)
    }

    /// `force` deletes a non-empty catalog.
    pub fn delete(&self, name: &str, force: bool) -> ApiResult<()> {
        self.client
            .delete_unit(uc_endpoint("catalogs").segment(name).query_flag("force", force))
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogInfo, CatalogType, IsolationMode, ProvisioningState};
    use serde_json::json;

    #[test]
    fn catalog_enums_use_service_spelling() {
        let info: CatalogInfo = serde_json::from_value(json!({
            "name": "main",
            "catalog_type": "MANAGED_CATALOG",
            "isolation_mode": "ISOLATION_MODE_OPEN",
            "provisioning_info": {"state": "STATE_UNSPECIFIED"},
            "created_at": 1666369196203i64
        }))
        .expect("decode");
        assert_eq!(info.catalog_type, Some(CatalogType::ManagedCatalog));
        assert_eq!(info.isolation_mode, Some(IsolationMode::Open));
        assert_eq!(
            info.provisioning_info.and_then(|p| p.state),
            Some(ProvisioningState::StateUnspecified)
        );
    }

    #[test]
    fn legacy_isolation_spelling_is_accepted() {
        let mode: IsolationMode = serde_json::from_value(json!("ISOLATED")).expect("decode");
        assert_eq!(mode, IsolationMode::Isolated);
        assert_eq!(
            serde_json::to_value(mode).expect("encode"),
            json!("ISOLATION_MODE_ISOLATED")
        );
    }
}
