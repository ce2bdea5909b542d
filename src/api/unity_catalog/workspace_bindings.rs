//! Purpose: Workspace bindings for isolated securables.
//! Exports: `WorkspaceBindingsApi`, `WorkspaceBinding`, `WorkspaceBindingType`,
//! `BindableSecurableType`.
//! Role: Legacy catalog workspace lists (`workspace-bindings/catalogs`) and typed bindings (`bindings`).
#![allow(clippy::result_large_err)]

use super::{Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindableSecurableType {
    Catalog,
    ExternalLocation,
    StorageCredential,
}

impl BindableSecurableType {
    pub fn as_str(self) -> &'static str {
        match self {
            BindableSecurableType::Catalog => "catalog",
            BindableSecurableType::ExternalLocation => "external_location",
            BindableSecurableType::StorageCredential => "storage_credential",
        }
    }
}

impl fmt::Display for BindableSecurableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindableSecurableType {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "catalog" => Ok(BindableSecurableType::Catalog),
            "external_location" => Ok(BindableSecurableType::ExternalLocation),
            "storage_credential" => Ok(BindableSecurableType::StorageCredential),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown bindable securable type: {raw}"))
                .with_hint("Expected one of: catalog, external_location, storage_credential.")),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum WorkspaceBindingType {
    #[serde(rename = "BINDING_TYPE_READ_WRITE")]
    ReadWrite,
    #[serde(rename = "BINDING_TYPE_READ_ONLY")]
    ReadOnly,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceBinding {
    pub workspace_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_type: Option<WorkspaceBindingType>,
}

#[derive(Serialize)]
struct CatalogWorkspacesBody<'a> {
    assign_workspaces: &'a [i64],
    unassign_workspaces: &'a [i64],
}

#[derive(Serialize)]
struct BindingsBody<'a> {
    add: &'a [WorkspaceBinding],
    remove: &'a [WorkspaceBinding],
}

#[derive(Deserialize)]
struct WorkspacesEnvelope {
    #[serde(default)]
    workspaces: Vec<i64>,
}

#[derive(Deserialize)]
struct BindingsEnvelope {
    #[serde(default)]
    bindings: Vec<WorkspaceBinding>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct WorkspaceBindingsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> WorkspaceBindingsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    /// Workspace ids a catalog is bound to.
    pub fn get_catalog_workspaces(&self, catalog: &str) -> ApiResult<Vec<i64>> {
        let envelope: WorkspacesEnvelope = self
            .client
            .get(uc_endpoint("workspace-bindings/catalogs").segment(catalog))?;
        Ok(envelope.workspaces)
    }

    pub fn update_catalog_workspaces(
        &self,
        catalog: &str,
        assign: &[i64],
        unassign: &[i64],
    ) -> ApiResult<Vec<i64>> {
        let body = CatalogWorkspacesBody {
            assign_workspaces: assign,
            unassign_workspaces: unassign,
        };
        let envelope: WorkspacesEnvelope = self
            .client
            .patch(uc_endpoint("workspace-bindings/catalogs").segment(catalog), &body)?;
        Ok(envelope.workspaces)
    }

    pub fn get_bindings(
        &self,
        securable_type: BindableSecurableType,
        name: &str,
    ) -> ApiResult<Page<WorkspaceBinding>> {
        let endpoint = uc_endpoint("bindings")
            .segment(securable_type.as_str())
            .segment(name);
        let envelope: BindingsEnvelope = self.client.get(endpoint)?;
        Ok(Page::new(envelope.bindings, envelope.next_page_token))
    }

    pub fn update_bindings(
        &self,
        securable_type: BindableSecurableType,
        name: &str,
        add: &[WorkspaceBinding],
        remove: &[WorkspaceBinding],
    ) -> ApiResult<Vec<WorkspaceBinding>> {
        let endpoint = uc_endpoint("bindings")
            .segment(securable_type.as_str())
            .segment(name);
        let envelope: BindingsEnvelope =
            self.client.patch(endpoint, &BindingsBody { add, remove })?;
        Ok(envelope.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::{BindableSecurableType, WorkspaceBinding, WorkspaceBindingType};
    use serde_json::json;

    #[test]
    fn binding_type_uses_prefixed_names() {
        let binding: WorkspaceBinding = serde_json::from_value(json!({
            "workspace_id": 1234567890123456i64,
            "binding_type": "BINDING_TYPE_READ_ONLY"
        }))
        .expect("decode");
        assert_eq!(binding.binding_type, Some(WorkspaceBindingType::ReadOnly));
        assert_eq!(
            serde_json::to_value(WorkspaceBindingType::ReadWrite).expect("encode"),
            json!("BINDING_TYPE_READ_WRITE")
        );
    }

    #[test]
    fn securable_type_accepts_dashes() {
        assert_eq!(
            "external-location".parse::<BindableSecurableType>().expect("parse"),
            BindableSecurableType::ExternalLocation
        );
        assert!("table".parse::<BindableSecurableType>().is_err());
    }
}
