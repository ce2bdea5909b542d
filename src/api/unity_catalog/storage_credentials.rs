//! Purpose: Unity Catalog storage credentials (`/api/2.1/unity-catalog/storage-credentials`).
//! Exports: `StorageCredentialsApi`, `StorageCredentialInfo`, cloud identity types,
//! `CreateStorageCredential`, `UpdateStorageCredential`, `ValidateStorageCredential`,
//! `ValidationResult`, `ValidationOutcome`.
//! Invariants: At most one cloud identity block is expected per credential.
#![allow(clippy::result_large_err)]

use super::{ListOptions, Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::epoch_ms;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AwsIamRole {
    pub role_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unity_catalog_iam_arn: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AzureManagedIdentity {
    pub access_connector_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_identity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AzureServicePrincipal {
    pub directory_id: String,
    pub application_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
}

impl fmt::Debug for AzureServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureServicePrincipal")
            .field("directory_id", &self.directory_id)
            .field("application_id", &self.application_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DatabricksGcpServiceAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StorageCredentialInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_for_managed_storage: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_iam_role: Option<AwsIamRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_managed_identity: Option<AzureManagedIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_service_principal: Option<AzureServicePrincipal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databricks_gcp_service_account: Option<DatabricksGcpServiceAccount>,
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
pub struct CreateStorageCredential {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_iam_role: Option<AwsIamRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_managed_identity: Option<AzureManagedIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_service_principal: Option<AzureServicePrincipal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databricks_gcp_service_account: Option<DatabricksGcpServiceAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_validation: Option<bool>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateStorageCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_iam_role: Option<AwsIamRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_managed_identity: Option<AzureManagedIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_service_principal: Option<AzureServicePrincipal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databricks_gcp_service_account: Option<DatabricksGcpServiceAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_validation: Option<bool>,
}

/// Checks an existing credential (by name) or an inline identity against `url`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidateStorageCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_credential_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_iam_role: Option<AwsIamRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_managed_identity: Option<AzureManagedIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_service_principal: Option<AzureServicePrincipal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databricks_gcp_service_account: Option<DatabricksGcpServiceAccount>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationOperation {
    Read,
    Write,
    Delete,
    List,
    PathExists,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationOutcome {
    Pass,
    Fail,
    Skip,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<ValidationOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ValidationOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dir: Option<bool>,
    #[serde(default)]
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.results
            .iter()
            .all(|result| result.result != Some(ValidationOutcome::Fail))
    }
}

#[derive(Deserialize)]
struct CredentialsEnvelope {
    #[serde(default)]
    storage_credentials: Vec<StorageCredentialInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct StorageCredentialsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> StorageCredentialsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(&self, options: &ListOptions) -> ApiResult<Page<StorageCredentialInfo>> {
        let envelope: CredentialsEnvelope = self
            .client
            .get(options.apply(uc_endpoint("storage-credentials")))?;
        Ok(Page::new(
            envelope.storage_credentials,
            envelope.next_page_token,
        ))
    }

    pub fn get(&self, name: &str) -> ApiResult<StorageCredentialInfo> {
        self.client.get(uc_endpoint("storage-credentials").segment(name))
    }

    pub fn create(&self, request: &CreateStorageCredential) -> ApiResult<StorageCredentialInfo> {
        self.client.post(uc_endpoint("storage-credentials"), request)
    }

    pub fn update(
        &self,
        name: &str,
        request: &UpdateStorageCredential,
    ) -> ApiResult<StorageCredentialInfo> {
        self.client
            .patch(uc_endpoint("storage-credentials").segment(name), request)
    }

    /// `force` deletes even when external locations or tables still depend on it.
    pub fn delete(&self, name: &str, force: bool) -> ApiResult<()> {
        self.client.delete_unit(
            uc_endpoint("storage-credentials")
                .segment(name)
                .query_flag("force", force),
        )
    }

    pub fn validate(&self, request: &ValidateStorageCredential) -> ApiResult<ValidationReport> {
        self.client
            .post(uc_endpoint("validate-storage-credentials"), request)
    }
}

#[cfg(test)]
mod tests {
    use super::{AzureServicePrincipal, ValidationOutcome, ValidationReport};
    use serde_json::json;

    #[test]
    fn report_fails_when_any_operation_fails() {
        let report: ValidationReport = serde_json::from_value(json!({
            "is_dir": true,
            "results": [
                {"operation": "READ", "result": "PASS"},
                {"operation": "PATH_EXISTS", "result": "SKIP"},
                {"operation": "WRITE", "result": "FAIL", "message": "403 Forbidden"}
            ]
        }))
        .expect("decode");
        assert!(!report.passed());
        assert_eq!(report.results[2].result, Some(ValidationOutcome::Fail));
    }

    #[test]
    fn service_principal_secret_is_redacted_in_debug() {
        let principal = AzureServicePrincipal {
            directory_id: "tenant".to_string(),
            application_id: "app".to_string(),
            client_secret: "very-secret".to_string(),
        };
        assert!(!format!("{principal:?}").contains("very-secret"));
    }
}
