//! Purpose: Unity Catalog foreign connections (`/api/2.1/unity-catalog/connections`).
//! Exports: `ConnectionsApi`, `ConnectionInfo`, `ConnectionType`, `CreateConnection`,
//! `UpdateConnection`.
//! Invariants: Connection `options` may hold credentials; `Debug` output redacts their values.
#![allow(clippy::result_large_err)]

use super::catalogs::ProvisioningInfo;
use super::{ListOptions, Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::epoch_ms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    Mysql,
    Postgresql,
    Snowflake,
    Redshift,
    Sqldw,
    Sqlserver,
    Databricks,
    Bigquery,
    HiveMetastore,
}

#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_info: Option<ProvisioningInfo>,
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

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("name", &self.name)
            .field("connection_type", &self.connection_type)
            .field("options", &redacted_keys(&self.options))
            .field("owner", &self.owner)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateConnection {
    pub name: String,
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl fmt::Debug for CreateConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateConnection")
            .field("name", &self.name)
            .field("connection_type", &self.connection_type)
            .field("options", &redacted_keys(&self.options))
            .finish_non_exhaustive()
    }
}

/// `options` replaces the full option map, so it must be complete.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateConnection {
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl fmt::Debug for UpdateConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateConnection")
            .field("options", &redacted_keys(&self.options))
            .field("new_name", &self.new_name)
            .field("owner", &self.owner)
            .finish()
    }
}

fn redacted_keys(options: &BTreeMap<String, String>) -> BTreeMap<&str, &'static str> {
    options
        .keys()
        .map(|key| (key.as_str(), "<redacted>"))
        .collect()
}

#[derive(Deserialize)]
struct ConnectionsEnvelope {
    #[serde(default)]
    connections: Vec<ConnectionInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct ConnectionsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> ConnectionsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(&self, options: &ListOptions) -> ApiResult<Page<ConnectionInfo>> {
        let envelope: ConnectionsEnvelope =
            self.client.get(options.apply(uc_endpoint("connections")))?;
        Ok(Page::new(envelope.connections, envelope.next_page_token))
    }

    pub fn get(&self, name: &str) -> ApiResult<ConnectionInfo> {
        self.client.get(uc_endpoint("connections").segment(name))
    }

    pub fn create(&self, request: &CreateConnection) -> ApiResult<ConnectionInfo> {
        self.client.post(uc_endpoint("connections"), request)
    }

    pub fn update(&self, name: &str, request: &UpdateConnection) -> ApiResult<ConnectionInfo> {
        self.client.patch(uc_endpoint("connections").segment(name), request)
    }

    pub fn delete(&self, name: &str) -> ApiResult<()> {
        self.client.delete_unit(uc_endpoint("connections").segment(name))
    }
}
