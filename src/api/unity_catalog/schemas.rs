//! Purpose: Unity Catalog schemas (`/api/2.1/unity-catalog/schemas`).
//! Exports: `SchemasApi`, `SchemaInfo`, `CreateSchema`, `UpdateSchema`.
#![allow(clippy::result_large_err)]

use super::{ListOptions, Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::epoch_ms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub name: String,
    #[serde(default)]
    pub catalog_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
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
pub struct CreateSchema {
    pub name: String,
    pub catalog_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct SchemasEnvelope {
    #[serde(default)]
    schemas: Vec<SchemaInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct SchemasApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> SchemasApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(&self, catalog_name: &str, options: &ListOptions) -> ApiResult<Page<SchemaInfo>> {
        let endpoint = options.apply(uc_endpoint("schemas").query("catalog_name", catalog_name));
        let envelope: SchemasEnvelope = self.client.get(endpoint)?;
        Ok(Page::new(envelope.schemas, envelope.next_page_token))
    }

    /// `full_name` is `catalog.schema`.
    pub fn get(&self, full_name: &str) -> ApiResult<SchemaInfo> {
        self.client.get(uc_endpoint("schemas").segment(full_name))
    }

    pub fn create(&self, request: &CreateSchema) -> ApiResult<SchemaInfo> {
        self.client.post(uc_endpoint("schemas"), request)
    }

    pub fn update(&self, full_name: &str, request: &UpdateSchema) -> ApiResult<SchemaInfo> {
        self.client.patch(uc_endpoint("schemas").segment(full_name), request)
    }

    pub fn delete(&self, full_name: &str, force: bool) -> ApiResult<()> {
        self.client
            .delete_unit(uc_endpoint("schemas").segment(full_name).query_flag("force", force))
    }
}
