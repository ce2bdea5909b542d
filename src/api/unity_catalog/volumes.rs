//! Purpose: Unity Catalog volumes (`/api/2.1/unity-catalog/volumes`).
//! Exports: `VolumesApi`, `VolumeInfo`, `VolumeType`, `CreateVolume`, `UpdateVolume`.
#![allow(clippy::result_large_err)]

use super::{ListOptions, Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::epoch_ms;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeType {
    Managed,
    External,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub name: String,
    #[serde(default)]
    pub catalog_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<VolumeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,
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

/// `storage_location` is required for `EXTERNAL` volumes and rejected for `MANAGED`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateVolume {
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub volume_type: VolumeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateVolume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Deserialize)]
struct VolumesEnvelope {
    #[serde(default)]
    volumes: Vec<VolumeInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct VolumesApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> VolumesApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(
        &self,
        catalog_name: &str,
        schema_name: &str,
        options: &ListOptions,
    ) -> ApiResult<Page<VolumeInfo>> {
        let endpoint = uc_endpoint("volumes")
            .query("catalog_name", catalog_name)
            .query("schema_name", schema_name);
        let envelope: VolumesEnvelope = self.client.get(options.apply(endpoint))?;
        Ok(Page::new(envelope.volumes, envelope.next_page_token))
    }

    pub fn get(&self, full_name: &str) -> ApiResult<VolumeInfo> {
        self.client.get(uc_endpoint("volumes").segment(full_name))
    }

    pub fn create(&self, request: &CreateVolume) -> ApiResult<VolumeInfo> {
        self.client.post(uc_endpoint("volumes"), request)
    }

    pub fn update(&self, full_name: &str, request: &UpdateVolume) -> ApiResult<VolumeInfo> {
        self.client.patch(uc_endpoint("volumes").segment(full_name), request)
    }

    pub fn delete(&self, full_name: &str) -> ApiResult<()> {
        self.client.delete_unit(uc_endpoint("volumes").segment(full_name))
    }
}
