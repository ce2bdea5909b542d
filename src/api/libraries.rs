//! Purpose: Cluster library management (`/api/2.0/libraries/*`) and the `Library` union.
//! Exports: `LibrariesApi`, `Library`, `MavenLibrary`, `PythonPyPiLibrary`, `RCranLibrary`,
//! `LibraryFullStatus`, `LibraryInstallStatus`, `ClusterLibraryStatuses`, `LibrariesRequest`.
//! Role: Typed wrappers; `Library` is keyed by which of its package keys is present.
//! Invariants: Arms are checked as `jar`, `egg`, `whl`, `maven`, `pypi`, `cran`.
#![allow(clippy::result_large_err)]

use super::client::{ApiResult, DatabricksClient, Endpoint};
use crate::core::union::{Arm, Discriminator, TaggedUnion, impl_union_serde};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Library {
    Jar(String),
    Egg(String),
    Whl(String),
    Maven(MavenLibrary),
    Pypi(PythonPyPiLibrary),
    Cran(RCranLibrary),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MavenLibrary {
    pub coordinates: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PythonPyPiLibrary {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RCranLibrary {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

impl TaggedUnion for Library {
    const FAMILY: &'static str = "Library";
    const DISCRIMINATOR: Discriminator = Discriminator::Presence(&[
        Arm::nested("jar"),
        Arm::nested("egg"),
        Arm::nested("whl"),
        Arm::nested("maven"),
        Arm::nested("pypi"),
        Arm::nested("cran"),
    ]);

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self> {
        match tag {
            "jar" => serde_json::from_value(payload).map(Library::Jar),
            "egg" => serde_json::from_value(payload).map(Library::Egg),
            "whl" => serde_json::from_value(payload).map(Library::Whl),
            "maven" => serde_json::from_value(payload).map(Library::Maven),
            "pypi" => serde_json::from_value(payload).map(Library::Pypi),
            _ => serde_json::from_value(payload).map(Library::Cran),
        }
    }

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>) {
        match self {
            Library::Jar(path) => ("jar", Ok(Value::String(path.clone()))),
            Library::Egg(path) => ("egg", Ok(Value::String(path.clone()))),
            Library::Whl(path) => ("whl", Ok(Value::String(path.clone()))),
            Library::Maven(maven) => ("maven", serde_json::to_value(maven)),
            Library::Pypi(pypi) => ("pypi", serde_json::to_value(pypi)),
            Library::Cran(cran) => ("cran", serde_json::to_value(cran)),
        }
    }
}

impl_union_serde!(Library);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibraryInstallStatus {
    Pending,
    Resolving,
    Installing,
    Installed,
    Skipped,
    Failed,
    UninstallOnRestart,
    Restored,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryFullStatus {
    pub library: Library,
    pub status: LibraryInstallStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    #[serde(default)]
    pub is_library_for_all_clusters: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterLibraryStatuses {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub library_statuses: Vec<LibraryFullStatus>,
}

/// Body of `install` and `uninstall`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibrariesRequest {
    pub cluster_id: String,
    pub libraries: Vec<Library>,
}

#[derive(Deserialize)]
struct StatusesEnvelope {
    #[serde(default)]
    statuses: Vec<ClusterLibraryStatuses>,
}

pub struct LibrariesApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> LibrariesApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn all_cluster_statuses(&self) -> ApiResult<Vec<ClusterLibraryStatuses>> {
        let envelope: StatusesEnvelope = self
            .client
            .get(Endpoint::new("/api/2.0/libraries/all-cluster-statuses"))?;
        Ok(envelope.statuses)
    }

    pub fn cluster_status(&self, cluster_id: &str) -> ApiResult<ClusterLibraryStatuses> {
        self.client.get(
            Endpoint::new("/api/2.0/libraries/cluster-status").query("cluster_id", cluster_id),
        )
    }

    pub fn install(&self, request: &LibrariesRequest) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/libraries/install"), request)
    }

    /// Libraries are removed on the next cluster restart.
    pub fn uninstall(&self, request: &LibrariesRequest) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.0/libraries/uninstall"), request)
    }
}
