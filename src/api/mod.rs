//! Purpose: Define the public Rust API boundary for the Databricks client.
//! Exports: `DatabricksClient`, `ApiResult`, error types, and one module per REST resource.
//! Role: Public, additive-only surface; transport internals stay in the private `client` module.
//! Invariants: Every resource wrapper is reached through a `DatabricksClient` accessor.
//! Invariants: Model types live in their resource module and are re-exported only when shared.

mod client;
pub mod clusters;
pub mod dbfs;
pub mod jobs;
pub mod libraries;
pub mod permissions;
pub mod secrets;
pub mod unity_catalog;

pub use crate::core::epoch_ms;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::union::{TaggedUnion, UnionError};
pub use client::{ApiResult, DatabricksClient};
pub use clusters::{ClusterInfo, ClusterState, InitScriptInfo};
pub use libraries::Library;
pub use permissions::{
    AccessControlRequest, AclPermissionItem, ObjectType, PermissionLevel, Principal,
};
pub use secrets::SecretScope;
pub use unity_catalog::{Dependency, ListOptions, Page, TableConstraint};
