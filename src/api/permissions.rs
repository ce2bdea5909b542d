//! Purpose: Workspace object permissions (`/api/2.0/permissions/{object_type}/{object_id}`).
//! Exports: `PermissionsApi`, `Principal`, `AccessControlRequest`, `AclPermissionItem`,
//! `PermissionGrant`, `PermissionShape`, `PermissionLevel`, `ObjectType`, `ObjectPermissions`.
//! Role: Typed wrappers plus the two principal-keyed union families.
//! Invariants: Principal arms are checked as `user_name`, `group_name`, `service_principal_name`.
//! Invariants: `AclPermissionItem` re-emits the permission shape (flat or nested) it was read from.
#![allow(clippy::result_large_err)]

use super::client::{ApiResult, DatabricksClient, Endpoint};
use crate::core::error::{Error, ErrorKind};
use crate::core::union::{Arm, Discriminator, TaggedUnion, impl_union_serde};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const PRINCIPAL_ARMS: &[Arm] = &[
    Arm::flat("user_name"),
    Arm::flat("group_name"),
    Arm::flat("service_principal_name"),
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    CanManage,
    CanRestart,
    CanAttachTo,
    IsOwner,
    CanManageRun,
    CanView,
    CanRead,
    CanRun,
    CanEdit,
    CanUse,
    CanQuery,
    CanMonitor,
    CanManageStagingVersions,
    CanManageProductionVersions,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Principal {
    User(String),
    Group(String),
    ServicePrincipal(String),
}

impl Principal {
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    pub fn service_principal(name: impl Into<String>) -> Self {
        Self::ServicePrincipal(name.into())
    }

    /// Wire key that both identifies and carries this principal.
    pub fn key(&self) -> &'static str {
        match self {
            Principal::User(_) => "user_name",
            Principal::Group(_) => "group_name",
            Principal::ServicePrincipal(_) => "service_principal_name",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::User(name) | Principal::Group(name) | Principal::ServicePrincipal(name) => {
                name
            }
        }
    }

    fn from_wire(tag: &str, wire: PrincipalWire) -> serde_json::Result<Self> {
        let missing = <serde_json::Error as serde::de::Error>::missing_field;
        match tag {
            "user_name" => wire
                .user_name
                .map(Principal::User)
                .ok_or_else(|| missing("user_name")),
            "group_name" => wire
                .group_name
                .map(Principal::Group)
                .ok_or_else(|| missing("group_name")),
            _ => wire
                .service_principal_name
                .map(Principal::ServicePrincipal)
                .ok_or_else(|| missing("service_principal_name")),
        }
    }

    fn to_wire(&self) -> PrincipalWire {
        let mut wire = PrincipalWire::default();
        match self {
            Principal::User(name) => wire.user_name = Some(name.clone()),
            Principal::Group(name) => wire.group_name = Some(name.clone()),
            Principal::ServicePrincipal(name) => wire.service_principal_name = Some(name.clone()),
        }
        wire
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User(name) => write!(f, "user:{name}"),
            Principal::Group(name) => write!(f, "group:{name}"),
            Principal::ServicePrincipal(name) => write!(f, "service-principal:{name}"),
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct PrincipalWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_principal_name: Option<String>,
}

/// One entry of a `set`/`update` request body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessControlRequest {
    pub principal: Principal,
    pub permission_level: PermissionLevel,
}

impl AccessControlRequest {
    pub fn new(principal: Principal, permission_level: PermissionLevel) -> Self {
        Self {
            principal,
            permission_level,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct AccessControlWire {
    #[serde(flatten)]
    principal: PrincipalWire,
    permission_level: PermissionLevel,
}

impl TaggedUnion for AccessControlRequest {
    const FAMILY: &'static str = "AccessControlRequest";
    const DISCRIMINATOR: Discriminator = Discriminator::Presence(PRINCIPAL_ARMS);

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self> {
        let wire: AccessControlWire = serde_json::from_value(payload)?;
        Ok(Self {
            principal: Principal::from_wire(tag, wire.principal)?,
            permission_level: wire.permission_level,
        })
    }

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>) {
        let wire = AccessControlWire {
            principal: self.principal.to_wire(),
            permission_level: self.permission_level,
        };
        (self.principal.key(), serde_json::to_value(wire))
    }
}

impl_union_serde!(AccessControlRequest);

/// How the permission arrived on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PermissionShape {
    /// Top-level `permission_level`.
    #[default]
    Flat,
    /// First element of `all_permissions`.
    Nested,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PermissionGrant {
    pub permission_level: PermissionLevel,
    /// `None` when the entry did not carry the field.
    pub inherited: Option<bool>,
    pub inherited_from_object: Option<Vec<String>>,
    pub shape: PermissionShape,
}

impl PermissionGrant {
    pub fn direct(permission_level: PermissionLevel) -> Self {
        Self {
            permission_level,
            inherited: None,
            inherited_from_object: None,
            shape: PermissionShape::Flat,
        }
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited.unwrap_or(false)
    }

    pub fn inherited_from(&self) -> &[String] {
        self.inherited_from_object.as_deref().unwrap_or(&[])
    }

    fn from_nested(entry: InheritedPermissionWire) -> Self {
        Self {
            permission_level: entry.permission_level,
            inherited: entry.inherited,
            inherited_from_object: entry.inherited_from_object,
            shape: PermissionShape::Nested,
        }
    }

    fn to_nested(&self) -> InheritedPermissionWire {
        InheritedPermissionWire {
            permission_level: self.permission_level,
            inherited: self.inherited,
            inherited_from_object: self.inherited_from_object.clone(),
        }
    }
}

/// One entry of an object's access control list as returned by `get`.
///
/// `grant` is the flat permission or the first `all_permissions` entry;
/// `additional_grants` holds the remaining nested entries in wire order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AclPermissionItem {
    pub principal: Principal,
    pub grant: PermissionGrant,
    pub additional_grants: Vec<PermissionGrant>,
}

#[derive(Serialize, Deserialize)]
struct AclItemWire {
    #[serde(flatten)]
    principal: PrincipalWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    permission_level: Option<PermissionLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all_permissions: Option<Vec<InheritedPermissionWire>>,
}

#[derive(Serialize, Deserialize)]
struct InheritedPermissionWire {
    permission_level: PermissionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inherited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inherited_from_object: Option<Vec<String>>,
}

impl TaggedUnion for AclPermissionItem {
    const FAMILY: &'static str = "AclPermissionItem";
    const DISCRIMINATOR: Discriminator = Discriminator::Presence(PRINCIPAL_ARMS);

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self> {
        let wire: AclItemWire = serde_json::from_value(payload)?;
        let principal = Principal::from_wire(tag, wire.principal)?;
        let mut nested = wire
            .all_permissions
            .unwrap_or_default()
            .into_iter()
            .map(PermissionGrant::from_nested);
        let (grant, additional_grants) = match (nested.next(), wire.permission_level) {
            (Some(first), _) => (first, nested.collect()),
            (None, Some(level)) => (PermissionGrant::direct(level), Vec::new()),
            (None, None) => {
                return Err(<serde_json::Error as serde::de::Error>::missing_field(
                    "permission_level",
                ));
            }
        };
        Ok(Self {
            principal,
            grant,
            additional_grants,
        })
    }

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>) {
        let grant = &self.grant;
        let wire = match grant.shape {
            PermissionShape::Flat => AclItemWire {
                principal: self.principal.to_wire(),
                permission_level: Some(grant.permission_level),
                all_permissions: None,
            },
            PermissionShape::Nested => AclItemWire {
                principal: self.principal.to_wire(),
                permission_level: None,
                all_permissions: Some(
                    std::iter::once(grant)
                        .chain(&self.additional_grants)
                        .map(PermissionGrant::to_nested)
                        .collect(),
                ),
            },
        };
        (self.principal.key(), serde_json::to_value(wire))
    }
}

impl_union_serde!(AclPermissionItem);

/// Securable workspace object kinds; `path()` is the URL segment(s).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectType {
    Clusters,
    ClusterPolicies,
    InstancePools,
    Jobs,
    Pipelines,
    Notebooks,
    Directories,
    Repos,
    Experiments,
    RegisteredModels,
    SqlWarehouses,
    ServingEndpoints,
}

impl ObjectType {
    pub const ALL: [ObjectType; 12] = [
        ObjectType::Clusters,
        ObjectType::ClusterPolicies,
        ObjectType::InstancePools,
        ObjectType::Jobs,
        ObjectType::Pipelines,
        ObjectType::Notebooks,
        ObjectType::Directories,
        ObjectType::Repos,
        ObjectType::Experiments,
        ObjectType::RegisteredModels,
        ObjectType::SqlWarehouses,
        ObjectType::ServingEndpoints,
    ];

    pub fn path(self) -> &'static str {
        match self {
            ObjectType::Clusters => "clusters",
            ObjectType::ClusterPolicies => "cluster-policies",
            ObjectType::InstancePools => "instance-pools",
            ObjectType::Jobs => "jobs",
            ObjectType::Pipelines => "pipelines",
            ObjectType::Notebooks => "notebooks",
            ObjectType::Directories => "directories",
            ObjectType::Repos => "repos",
            ObjectType::Experiments => "experiments",
            ObjectType::RegisteredModels => "registered-models",
            ObjectType::SqlWarehouses => "sql/warehouses",
            ObjectType::ServingEndpoints => "serving-endpoints",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ObjectType {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ObjectType::ALL
            .into_iter()
            .find(|object_type| object_type.path() == input)
            .ok_or_else(|| {
                let known = ObjectType::ALL.map(ObjectType::path).join(", ");
                Error::new(ErrorKind::Usage)
                    .with_message(format!("unknown object type `{input}`"))
                    .with_hint(format!("Use one of: {known}."))
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub access_control_list: Vec<AclPermissionItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsRequest {
    pub access_control_list: Vec<AccessControlRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermissionLevelDescription {
    pub permission_level: PermissionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct PermissionLevelsEnvelope {
    #[serde(default)]
    permission_levels: Vec<PermissionLevelDescription>,
}

pub struct PermissionsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> PermissionsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn get(&self, object_type: ObjectType, object_id: &str) -> ApiResult<ObjectPermissions> {
        self.client.get(object_endpoint(object_type, object_id))
    }

    /// Replaces the direct permissions of the object (`PUT`).
    pub fn set(
        &self,
        object_type: ObjectType,
        object_id: &str,
        request: &PermissionsRequest,
    ) -> ApiResult<ObjectPermissions> {
        self.client
            .put(object_endpoint(object_type, object_id), request)
    }

    /// Adds to the direct permissions of the object (`PATCH`).
    pub fn update(
        &self,
        object_type: ObjectType,
        object_id: &str,
        request: &PermissionsRequest,
    ) -> ApiResult<ObjectPermissions> {
        self.client
            .patch(object_endpoint(object_type, object_id), request)
    }

    pub fn permission_levels(
        &self,
        object_type: ObjectType,
        object_id: &str,
    ) -> ApiResult<Vec<PermissionLevelDescription>> {
        let endpoint = object_endpoint(object_type, object_id).segment("permissionLevels");
        let envelope: PermissionLevelsEnvelope = self.client.get(endpoint)?;
        Ok(envelope.permission_levels)
    }
}

fn object_endpoint(object_type: ObjectType, object_id: &str) -> Endpoint {
    Endpoint::new(&format!("/api/2.0/permissions/{}", object_type.path())).segment(object_id)
}

#[cfg(test)]
mod tests {
    use super::{
        AccessControlRequest, AclPermissionItem, ObjectPermissions, ObjectType, PermissionGrant,
        PermissionLevel, PermissionShape, Principal,
    };
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn access_control_request_selects_principal_by_key() {
        let request: AccessControlRequest = serde_json::from_value(json!({
            "group_name": "data-eng",
            "permission_level": "CAN_RESTART"
        }))
        .expect("decode");
        assert_eq!(request.principal, Principal::group("data-eng"));
        assert_eq!(request.permission_level, PermissionLevel::CanRestart);
    }

    #[test]
    fn access_control_request_encodes_flat() {
        let request = AccessControlRequest::new(
            Principal::service_principal("9f0b-app"),
            PermissionLevel::CanManage,
        );
        assert_eq!(
            serde_json::to_value(&request).expect("encode"),
            json!({"service_principal_name": "9f0b-app", "permission_level": "CAN_MANAGE"})
        );
    }

    #[test]
    fn acl_item_flat_permission_defaults_inheritance() {
        let item: AclPermissionItem = serde_json::from_value(json!({
            "user_name": "alice@example.com",
            "permission_level": "CAN_MANAGE"
        }))
        .expect("decode");
        assert_eq!(item.principal, Principal::user("alice@example.com"));
        assert!(!item.grant.is_inherited());
        assert!(item.grant.inherited_from().is_empty());
        assert_eq!(item.grant.shape, PermissionShape::Flat);
        assert!(item.additional_grants.is_empty());
    }

    #[test]
    fn acl_item_nested_permission_reads_first_entry() {
        let item: AclPermissionItem = serde_json::from_value(json!({
            "group_name": "admins",
            "all_permissions": [
                {"permission_level": "CAN_MANAGE", "inherited": true, "inherited_from_object": ["x"]},
                {"permission_level": "CAN_VIEW"}
            ]
        }))
        .expect("decode");
        assert_eq!(item.grant.permission_level, PermissionLevel::CanManage);
        assert!(item.grant.is_inherited());
        assert_eq!(item.grant.inherited_from(), ["x".to_string()]);
        assert_eq!(item.grant.shape, PermissionShape::Nested);
        assert_eq!(item.additional_grants.len(), 1);
        assert_eq!(
            item.additional_grants[0].permission_level,
            PermissionLevel::CanView
        );
    }

    #[test]
    fn acl_item_nested_entry_defaults_missing_fields() {
        let item: AclPermissionItem = serde_json::from_value(json!({
            "user_name": "bob",
            "all_permissions": [{"permission_level": "CAN_ATTACH_TO"}]
        }))
        .expect("decode");
        assert!(!item.grant.is_inherited());
        assert!(item.grant.inherited_from().is_empty());
        assert_eq!(item.grant.inherited, None);
        assert_eq!(item.grant.inherited_from_object, None);
    }

    #[test]
    fn acl_item_nested_entry_reencodes_only_fields_it_carried() {
        let minimal = json!({
            "user_name": "a",
            "all_permissions": [{"permission_level": "CAN_MANAGE", "inherited": false}]
        });
        let item: AclPermissionItem = serde_json::from_value(minimal.clone()).expect("decode");
        assert_eq!(serde_json::to_value(&item).expect("encode"), minimal);
    }

    #[test]
    fn acl_item_keeps_every_nested_entry() {
        let wire = json!({
            "group_name": "admins",
            "all_permissions": [
                {"permission_level": "CAN_MANAGE", "inherited": true, "inherited_from_object": ["/clusters/"]},
                {"permission_level": "CAN_RESTART", "inherited": false}
            ]
        });
        let item: AclPermissionItem = serde_json::from_value(wire.clone()).expect("decode");
        assert_eq!(
            item.additional_grants,
            vec![PermissionGrant {
                permission_level: PermissionLevel::CanRestart,
                inherited: Some(false),
                inherited_from_object: None,
                shape: PermissionShape::Nested,
            }]
        );
        assert_eq!(serde_json::to_value(&item).expect("encode"), wire);
    }

    #[test]
    fn acl_item_reencodes_the_shape_it_was_read_from() {
        let nested = json!({
            "service_principal_name": "sp",
            "all_permissions": [
                {"permission_level": "IS_OWNER", "inherited": false, "inherited_from_object": []}
            ]
        });
        let item: AclPermissionItem = serde_json::from_value(nested.clone()).expect("decode");
        assert_eq!(serde_json::to_value(&item).expect("encode"), nested);

        let flat = json!({"user_name": "u", "permission_level": "CAN_VIEW"});
        let item: AclPermissionItem = serde_json::from_value(flat.clone()).expect("decode");
        assert_eq!(serde_json::to_value(&item).expect("encode"), flat);
    }

    #[test]
    fn acl_item_without_permission_is_rejected() {
        let err = serde_json::from_value::<AclPermissionItem>(json!({"user_name": "u"}))
            .expect_err("err");
        assert!(err.to_string().contains("permission_level"));
    }

    #[test]
    fn acl_item_without_principal_is_rejected() {
        let err = serde_json::from_value::<AclPermissionItem>(json!({
            "display_name": "Nobody",
            "permission_level": "CAN_VIEW"
        }))
        .expect_err("err");
        assert!(err.to_string().contains("no matching variant for AclPermissionItem"));
    }

    #[test]
    fn object_permissions_decode_mixed_list() {
        let permissions: ObjectPermissions = serde_json::from_value(json!({
            "object_id": "/clusters/0123-456789-abc",
            "object_type": "cluster",
            "access_control_list": [
                {"user_name": "a", "all_permissions": [{"permission_level": "CAN_MANAGE", "inherited": false}]},
                {"group_name": "admins", "all_permissions": [{"permission_level": "CAN_MANAGE", "inherited": true, "inherited_from_object": ["/clusters/"]}]}
            ]
        }))
        .expect("decode");
        assert_eq!(permissions.access_control_list.len(), 2);
        assert_eq!(
            permissions.access_control_list[1].grant,
            PermissionGrant {
                permission_level: PermissionLevel::CanManage,
                inherited: Some(true),
                inherited_from_object: Some(vec!["/clusters/".to_string()]),
                shape: PermissionShape::Nested,
            }
        );
    }

    #[test]
    fn object_type_parses_path_form() {
        assert_eq!(
            "sql/warehouses".parse::<ObjectType>().expect("type"),
            ObjectType::SqlWarehouses
        );
        let err = "warehouse".parse::<ObjectType>().expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
