//! Purpose: Secret scope, secret and ACL wrappers (`/api/2.0/secrets/*`).
//! Exports: `SecretsApi`, `SecretScope`, `AzureKeyVaultMetadata`, `ScopeBackendType`,
//! `SecretMetadata`, `AclItem`, `AclPermission`, request types.
//! Role: `SecretScope` is keyed by the value of `backend_type`, not by key presence.
//! Invariants: Encoding a scope always writes `backend_type`; secret values are never logged.
#![allow(clippy::result_large_err)]

use super::client::{ApiResult, DatabricksClient, Endpoint};
use crate::core::epoch_ms;
use crate::core::union::{Discriminator, TaggedUnion, impl_union_serde};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AzureKeyVaultMetadata {
    pub resource_id: String,
    pub dns_name: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SecretScope {
    Databricks {
        name: String,
    },
    AzureKeyVault {
        name: String,
        keyvault_metadata: AzureKeyVaultMetadata,
    },
}

impl SecretScope {
    pub fn name(&self) -> &str {
        match self {
            SecretScope::Databricks { name } | SecretScope::AzureKeyVault { name, .. } => name,
        }
    }

    pub fn backend_type(&self) -> ScopeBackendType {
        match self {
            SecretScope::Databricks { .. } => ScopeBackendType::Databricks,
            SecretScope::AzureKeyVault { .. } => ScopeBackendType::AzureKeyvault,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct DatabricksScopeWire {
    name: String,
}

#[derive(Serialize, Deserialize)]
struct AzureScopeWire {
    name: String,
    keyvault_metadata: AzureKeyVaultMetadata,
}

impl TaggedUnion for SecretScope {
    const FAMILY: &'static str = "SecretScope";
    const DISCRIMINATOR: Discriminator = Discriminator::FieldValue {
        field: "backend_type",
        tags: &["DATABRICKS", "AZURE_KEYVAULT"],
    };

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self> {
        if tag == "DATABRICKS" {
            let wire: DatabricksScopeWire = serde_json::from_value(payload)?;
            return Ok(SecretScope::Databricks { name: wire.name });
        }
        let wire: AzureScopeWire = serde_json::from_value(payload)?;
        Ok(SecretScope::AzureKeyVault {
            name: wire.name,
            keyvault_metadata: wire.keyvault_metadata,
        })
    }

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>) {
        match self {
            SecretScope::Databricks { name } => (
                "DATABRICKS",
                serde_json::to_value(DatabricksScopeWire { name: name.clone() }),
            ),
            SecretScope::AzureKeyVault {
                name,
                keyvault_metadata,
            } => (
                "AZURE_KEYVAULT",
                serde_json::to_value(AzureScopeWire {
                    name: name.clone(),
                    keyvault_metadata: keyvault_metadata.clone(),
                }),
            ),
        }
    }
}

impl_union_serde!(SecretScope);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeBackendType {
    Databricks,
    AzureKeyvault,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateScopeRequest {
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_manage_principal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_backend_type: Option<ScopeBackendType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_azure_keyvault: Option<AzureKeyVaultMetadata>,
}

/// Exactly one of `string_value` or `bytes_value` (base64) is expected.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PutSecretRequest {
    pub scope: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_value: Option<String>,
}

impl std::fmt::Debug for PutSecretRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutSecretRequest")
            .field("scope", &self.scope)
            .field("key", &self.key)
            .field("string_value", &self.string_value.as_ref().map(|_| "<redacted>"))
            .field("bytes_value", &self.bytes_value.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub key: String,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub last_updated_timestamp: Option<OffsetDateTime>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclPermission {
    Read,
    Write,
    Manage,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AclItem {
    pub principal: String,
    pub permission: AclPermission,
}

#[derive(Serialize)]
struct ScopeBody<'a> {
    scope: &'a str,
}

#[derive(Serialize)]
struct SecretKeyBody<'a> {
    scope: &'a str,
    key: &'a str,
}

#[derive(Serialize)]
struct PutAclBody<'a> {
    scope: &'a str,
    principal: &'a str,
    permission: AclPermission,
}

#[derive(Serialize)]
struct DeleteAclBody<'a> {
    scope: &'a str,
    principal: &'a str,
}

#[derive(Deserialize)]
struct ScopesEnvelope {
    #[serde(default)]
    scopes: Vec<SecretScope>,
}

#[derive(Deserialize)]
struct SecretsEnvelope {
    #[serde(default)]
    secrets: Vec<SecretMetadata>,
}

#[derive(Deserialize)]
struct AclsEnvelope {
    #[serde(default)]
    items: Vec<AclItem>,
}

pub struct SecretsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> SecretsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn create_scope(&self, request: &CreateScopeRequest) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/secrets/scopes/create"), request)
    }

    pub fn delete_scope(&self, scope: &str) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/secrets/scopes/delete"), &ScopeBody { scope })
    }

    pub fn list_scopes(&self) -> ApiResult<Vec<SecretScope>> {
        let envelope: ScopesEnvelope = self
            .client
            .get(Endpoint::new("/api/2.0/secrets/scopes/list"))?;
        Ok(envelope.scopes)
    }

    pub fn put_secret(&self, request: &PutSecretRequest) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/secrets/put"), request)
    }

    pub fn delete_secret(&self, scope: &str, key: &str) -> ApiResult<()> {
        self.client.post_unit(
            Endpoint::new("/api/2.0/secrets/delete"),
            &SecretKeyBody { scope, key },
        )
    }

    /// Metadata only; secret values are not readable through the REST API.
    pub fn list_secrets(&self, scope: &str) -> ApiResult<Vec<SecretMetadata>> {
        let envelope: SecretsEnvelope = self
            .client
            .get(Endpoint::new("/api/2.0/secrets/list").query("scope", scope))?;
        Ok(envelope.secrets)
    }

    pub fn put_acl(
        &self,
        scope: &str,
        principal: &str,
        permission: AclPermission,
    ) -> ApiResult<()> {
        self.client.post_unit(
            Endpoint::new("/api/2.0/secrets/acls/put"),
            &PutAclBody {
                scope,
                principal,
                permission,
            },
        )
    }

    pub fn delete_acl(&self, scope: &str, principal: &str) -> ApiResult<()> {
        self.client.post_unit(
            Endpoint::new("/api/2.0/secrets/acls/delete"),
            &DeleteAclBody { scope, principal },
        )
    }

    pub fn get_acl(&self, scope: &str, principal: &str) -> ApiResult<AclItem> {
        self.client.get(
            Endpoint::new("/api/2.0/secrets/acls/get")
                .query("scope", scope)
                .query("principal", principal),
        )
    }

    pub fn list_acls(&self, scope: &str) -> ApiResult<Vec<AclItem>> {
        let envelope: AclsEnvelope = self
            .client
            .get(Endpoint::new("/api/2.0/secrets/acls/list").query("scope", scope))?;
        Ok(envelope.items)
    }
}

#[cfg(test)]
mod tests {
    use super::{AzureKeyVaultMetadata, PutSecretRequest, ScopeBackendType, SecretScope};
    use serde_json::json;

    #[test]
    fn databricks_scope_is_selected_by_backend_value() {
        let wire = json!({"name": "my-scope", "backend_type": "DATABRICKS"});
        let scope: SecretScope = serde_json::from_value(wire.clone()).expect("decode");
        assert_eq!(
            scope,
            SecretScope::Databricks {
                name: "my-scope".to_string()
            }
        );
        assert_eq!(scope.backend_type(), ScopeBackendType::Databricks);
        assert_eq!(serde_json::to_value(&scope).expect("encode"), wire);
    }

    #[test]
    fn azure_scope_carries_keyvault_metadata() {
        let wire = json!({
            "name": "kv",
            "backend_type": "AZURE_KEYVAULT",
            "keyvault_metadata": {
                "resource_id": "/subscriptions/x/resourceGroups/rg/providers/Microsoft.KeyVault/vaults/v",
                "dns_name": "https://v.vault.azure.net/"
            }
        });
        let scope: SecretScope = serde_json::from_value(wire.clone()).expect("decode");
        match &scope {
            SecretScope::AzureKeyVault {
                keyvault_metadata: AzureKeyVaultMetadata { dns_name, .. },
                ..
            } => assert_eq!(dns_name, "https://v.vault.azure.net/"),
            other => panic!("unexpected scope {other:?}"),
        }
        assert_eq!(scope.name(), "kv");
        assert_eq!(serde_json::to_value(&scope).expect("encode"), wire);
    }

    #[test]
    fn unknown_backend_value_is_rejected() {
        let err = serde_json::from_value::<SecretScope>(json!({
            "name": "x",
            "backend_type": "AWS_SECRETS_MANAGER"
        }))
        .expect_err("err");
        assert!(err.to_string().contains("no matching variant for SecretScope"));
    }

    #[test]
    fn put_secret_debug_redacts_value() {
        let request = PutSecretRequest {
            scope: "s".to_string(),
            key: "k".to_string(),
            string_value: Some("hunter2".to_string()),
            bytes_value: None,
        };
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
