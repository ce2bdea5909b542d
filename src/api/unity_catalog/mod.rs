//! Purpose: Unity Catalog governance wrappers (`/api/2.1/unity-catalog/*`) and lineage.
//! Exports: One `XxxApi` per securable family plus their models; `Page`, `ListOptions`.
//! Role: Shared list paging types and endpoint prefix for the submodules.
//! Invariants: `next_page_token` is surfaced as returned and never followed.
#![allow(clippy::result_large_err)]

pub mod catalogs;
pub mod connections;
pub mod grants;
pub mod lineage;
pub mod schemas;
pub mod shares;
pub mod storage_credentials;
pub mod tables;
pub mod volumes;
pub mod workspace_bindings;

pub use catalogs::{
    CatalogInfo, CatalogType, CatalogsApi, CreateCatalog, IsolationMode, ProvisioningInfo,
    ProvisioningState, UpdateCatalog,
};
pub use connections::{
    ConnectionInfo, ConnectionType, ConnectionsApi, CreateConnection, UpdateConnection,
};
pub use grants::{
    EffectivePrivilege, EffectivePrivilegeAssignment, GrantsApi, PermissionsChange, Privilege,
    PrivilegeAssignment, SecurableType,
};
pub use lineage::{
    ColumnLineage, LineageApi, LineageColumn, LineageEdge, LineageTableInfo, TableLineage,
};
pub use schemas::{CreateSchema, SchemaInfo, SchemasApi, UpdateSchema};
pub use shares::{
    CreateShare, ShareInfo, SharedDataObject, SharedDataObjectType, SharedDataObjectUpdate,
    SharedDataObjectUpdateAction, SharesApi, UpdateShare,
};
pub use storage_credentials::{
    AwsIamRole, AzureManagedIdentity, AzureServicePrincipal, CreateStorageCredential,
    DatabricksGcpServiceAccount, StorageCredentialInfo, StorageCredentialsApi,
    UpdateStorageCredential, ValidateStorageCredential, ValidationOutcome, ValidationReport,
    ValidationResult,
};
pub use tables::{
    ColumnInfo, DataSourceFormat, Dependency, DependencyList, TableConstraint, TableInfo,
    TableSummary, TableType, TablesApi,
};
pub use volumes::{CreateVolume, UpdateVolume, VolumeInfo, VolumeType, VolumesApi};
pub use workspace_bindings::{
    BindableSecurableType, WorkspaceBinding, WorkspaceBindingType, WorkspaceBindingsApi,
};

use super::client::Endpoint;
use serde::Serialize;

/// One page of a list call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        // The service sends "" on the last page.
        let next_page_token = next_page_token.filter(|token| !token.is_empty());
        Self {
            items,
            next_page_token,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
}

impl ListOptions {
    pub(crate) fn apply(&self, endpoint: Endpoint) -> Endpoint {
        endpoint
            .query_opt("max_results", self.max_results)
            .query_opt("page_token", self.page_token.as_deref())
    }
}

fn uc_endpoint(resource: &str) -> Endpoint {
    Endpoint::new(&format!("/api/2.1/unity-catalog/{resource}"))
}
