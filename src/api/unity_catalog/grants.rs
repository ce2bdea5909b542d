//! Purpose: Unity Catalog grants (`/api/2.1/unity-catalog/permissions` and `effective-permissions`).
//! Exports: `GrantsApi`, `SecurableType`, `Privilege`, `PrivilegeAssignment`,
//! `PermissionsChange`, `EffectivePrivilege`, `EffectivePrivilegeAssignment`.
//! Role: Privilege model shared with share permissions.
#![allow(clippy::result_large_err)]

use super::uc_endpoint;
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurableType {
    Catalog,
    Schema,
    Table,
    Function,
    Volume,
    ExternalLocation,
    StorageCredential,
    Share,
    Provider,
    Recipient,
    Connection,
    Metastore,
}

impl SecurableType {
    pub const ALL: [SecurableType; 12] = [
        SecurableType::Catalog,
        SecurableType::Schema,
        SecurableType::Table,
        SecurableType::Function,
        SecurableType::Volume,
        SecurableType::ExternalLocation,
        SecurableType::StorageCredential,
        SecurableType::Share,
        SecurableType::Provider,
        SecurableType::Recipient,
        SecurableType::Connection,
        SecurableType::Metastore,
    ];

    /// Path segment used by the grants endpoints.
    pub fn as_str(self) -> &'static str {
        match self {
            SecurableType::Catalog => "catalog",
            SecurableType::Schema => "schema",
            SecurableType::Table => "table",
            SecurableType::Function => "function",
            SecurableType::Volume => "volume",
            SecurableType::ExternalLocation => "external_location",
            SecurableType::StorageCredential => "storage_credential",
            SecurableType::Share => "share",
            SecurableType::Provider => "provider",
            SecurableType::Recipient => "recipient",
            SecurableType::Connection => "connection",
            SecurableType::Metastore => "metastore",
        }
    }
}

impl fmt::Display for SecurableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurableType {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        SecurableType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = SecurableType::ALL.iter().map(|k| k.as_str()).collect();
                Error::new(ErrorKind::Usage)
                    .with_message(format!("unknown securable type: {raw}"))
                    .with_hint(format!("Expected one of: {}.", known.join(", ")))
            })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Privilege {
    AllPrivileges,
    ApplyTag,
    Browse,
    CreateCatalog,
    CreateConnection,
    CreateExternalLocation,
    CreateExternalTable,
    CreateExternalVolume,
    CreateForeignCatalog,
    CreateFunction,
    CreateManagedStorage,
    CreateMaterializedView,
    CreateModel,
    CreateProvider,
    CreateRecipient,
    CreateSchema,
    CreateShare,
    CreateStorageCredential,
    CreateTable,
    CreateVolume,
    Execute,
    Manage,
    ManageAllowlist,
    Modify,
    ReadFiles,
    ReadPrivateFiles,
    ReadVolume,
    Refresh,
    Select,
    SetSharePermission,
    Usage,
    UseCatalog,
    UseConnection,
    UseMarketplaceAssets,
    UseProvider,
    UseRecipient,
    UseSchema,
    UseShare,
    WriteFiles,
    WritePrivateFiles,
    WriteVolume,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrivilegeAssignment {
    pub principal: String,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
}

/// One principal's delta; privileges in both lists are added then removed by the service.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PermissionsChange {
    pub principal: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<Privilege>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<Privilege>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EffectivePrivilege {
    pub privilege: Privilege,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from_type: Option<SecurableType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from_name: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EffectivePrivilegeAssignment {
    pub principal: String,
    #[serde(default)]
    pub privileges: Vec<EffectivePrivilege>,
}

#[derive(Serialize)]
pub(super) struct ChangesBody<'a> {
    pub(super) changes: &'a [PermissionsChange],
}

#[derive(Deserialize)]
pub(super) struct AssignmentsEnvelope {
    #[serde(default)]
    pub(super) privilege_assignments: Vec<PrivilegeAssignment>,
}

#[derive(Deserialize)]
struct EffectiveEnvelope {
    #[serde(default)]
    privilege_assignments: Vec<EffectivePrivilegeAssignment>,
}

pub struct GrantsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> GrantsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    /// Direct grants on the securable, optionally narrowed to one principal.
    pub fn get(
        &self,
        securable_type: SecurableType,
        full_name: &str,
        principal: Option<&str>,
    ) -> ApiResult<Vec<PrivilegeAssignment>> {
        let endpoint = uc_endpoint("permissions")
            .segment(securable_type.as_str())
            .segment(full_name)
            .query_opt("principal", principal);
        let envelope: AssignmentsEnvelope = self.client.get(endpoint)?;
        Ok(envelope.privilege_assignments)
    }

    /// Direct plus inherited grants.
    pub fn get_effective(
        &self,
        securable_type: SecurableType,
        full_name: &str,
        principal: Option<&str>,
    ) -> ApiResult<Vec<EffectivePrivilegeAssignment>> {
        let endpoint = uc_endpoint("effective-permissions")
            .segment(securable_type.as_str())
            .segment(full_name)
            .query_opt("principal", principal);
        let envelope: EffectiveEnvelope = self.client.get(endpoint)?;
        Ok(envelope.privilege_assignments)
    }

    pub fn update(
        &self,
        securable_type: SecurableType,
        full_name: &str,
        changes: &[PermissionsChange],
    ) -> ApiResult<Vec<PrivilegeAssignment>> {
        let endpoint = uc_endpoint("permissions")
            .segment(securable_type.as_str())
            .segment(full_name);
        let envelope: AssignmentsEnvelope =
            self.client.patch(endpoint, &ChangesBody { changes })?;
        Ok(envelope.privilege_assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::{EffectivePrivilegeAssignment, Privilege, SecurableType};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn securable_type_parses_cli_spellings() {
        assert_eq!(
            "storage-credential".parse::<SecurableType>().expect("parse"),
            SecurableType::StorageCredential
        );
        assert_eq!(
            "TABLE".parse::<SecurableType>().expect("parse"),
            SecurableType::Table
        );
        let err = "warehouse".parse::<SecurableType>().expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn effective_privileges_carry_inheritance() {
        let assignment: EffectivePrivilegeAssignment = serde_json::from_value(json!({
            "principal": "analysts",
            "privileges": [
                {"privilege": "SELECT", "inherited_from_type": "catalog", "inherited_from_name": "main"},
                {"privilege": "USE_SCHEMA"}
            ]
        }))
        .expect("decode");
        assert_eq!(assignment.privileges[0].privilege, Privilege::Select);
        assert_eq!(
            assignment.privileges[0].inherited_from_type,
            Some(SecurableType::Catalog)
        );
        assert_eq!(assignment.privileges[1].inherited_from_name, None);
    }
}
