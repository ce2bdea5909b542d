//! Purpose: Contract tests for every tagged-union family through the public API.
//! Exports: None (integration test module).
//! Role: Round-trip, discriminator selection and no-match behaviour per family.
//! Invariants: Wire shapes here are the documented Databricks shapes, not derived from the encoder.

use databricks_rest::api::clusters::ScriptDestination;
use databricks_rest::api::libraries::{MavenLibrary, PythonPyPiLibrary, RCranLibrary};
use databricks_rest::api::permissions::{PermissionGrant, PermissionShape};
use databricks_rest::api::secrets::AzureKeyVaultMetadata;
use databricks_rest::api::unity_catalog::tables::{
    ForeignKeyConstraint, NamedTableConstraint, PrimaryKeyConstraint,
};
use databricks_rest::api::{
    AccessControlRequest, AclPermissionItem, Dependency, ErrorKind, Error, InitScriptInfo,
    Library, PermissionLevel, Principal, SecretScope, TableConstraint, epoch_ms,
};
use databricks_rest::core::union::{TaggedUnion, UnionError, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt::Debug;
use time::macros::datetime;

fn assert_wire_round_trip<T>(wire: Value, expected: T)
where
    T: TaggedUnion + Serialize + DeserializeOwned + PartialEq + Debug,
{
    let decoded: T = serde_json::from_value(wire.clone()).expect("decode");
    assert_eq!(decoded, expected);
    assert_eq!(serde_json::to_value(&decoded).expect("encode"), wire);
    let again: T = decode(encode(&decoded).expect("encode")).expect("decode");
    assert_eq!(again, decoded);
}

fn assert_no_match<T: TaggedUnion + Debug>(wire: Value) {
    let err = decode::<T>(wire).expect_err("no variant");
    assert!(matches!(err, UnionError::NoMatchingVariant { .. }), "{err:?}");
    assert!(
        err.to_string()
            .starts_with(&format!("no matching variant for {}", T::FAMILY)),
        "{err}"
    );
}

#[test]
fn library_arms() {
    assert_wire_round_trip(
        json!({"jar": "dbfs:/libs/foo.jar"}),
        Library::Jar("dbfs:/libs/foo.jar".to_string()),
    );
    assert_wire_round_trip(
        json!({"whl": "/Volumes/main/default/libs/pkg-1.0-py3-none-any.whl"}),
        Library::Whl("/Volumes/main/default/libs/pkg-1.0-py3-none-any.whl".to_string()),
    );
    assert_wire_round_trip(
        json!({"egg": "dbfs:/libs/legacy-0.1-py2.7.egg"}),
        Library::Egg("dbfs:/libs/legacy-0.1-py2.7.egg".to_string()),
    );
    assert_wire_round_trip(
        json!({"maven": {"coordinates": "org.jsoup:jsoup:1.7.2", "exclusions": ["slf4j:slf4j"]}}),
        Library::Maven(MavenLibrary {
            coordinates: "org.jsoup:jsoup:1.7.2".to_string(),
            repo: None,
            exclusions: vec!["slf4j:slf4j".to_string()],
        }),
    );
    assert_wire_round_trip(
        json!({"pypi": {"package": "simplejson==3.8.0", "repo": "https://pypi.example"}}),
        Library::Pypi(PythonPyPiLibrary {
            package: "simplejson==3.8.0".to_string(),
            repo: Some("https://pypi.example".to_string()),
        }),
    );
    assert_wire_round_trip(
        json!({"cran": {"package": "ada", "repo": "https://cran.us.r-project.org"}}),
        Library::Cran(RCranLibrary {
            package: "ada".to_string(),
            repo: Some("https://cran.us.r-project.org".to_string()),
        }),
    );
    assert_no_match::<Library>(json!({"requirements": "/Workspace/reqs.txt"}));
}

#[test]
fn library_first_declared_key_wins() {
    let library: Library = serde_json::from_value(json!({
        "whl": "dbfs:/libs/pkg.whl",
        "jar": "dbfs:/libs/foo.jar"
    }))
    .expect("decode");
    assert_eq!(library, Library::Jar("dbfs:/libs/foo.jar".to_string()));
}

#[test]
fn library_payload_errors_name_the_family() {
    let err = serde_json::from_value::<Library>(json!({"maven": {"repo": "x"}}))
        .expect_err("coordinates missing");
    assert!(err.to_string().contains("Library"), "{err}");
}

#[test]
fn init_script_arms() {
    for (key, variant) in [
        ("workspace", InitScriptInfo::Workspace as fn(ScriptDestination) -> InitScriptInfo),
        ("dbfs", InitScriptInfo::Dbfs),
        ("abfss", InitScriptInfo::Abfss),
        ("volumes", InitScriptInfo::Volumes),
    ] {
        let destination = format!("{key}:/init/setup.sh");
        let mut wire = serde_json::Map::new();
        wire.insert(key.to_string(), json!({"destination": destination}));
        assert_wire_round_trip(
            Value::Object(wire),
            variant(ScriptDestination {
                destination: destination.clone(),
            }),
        );
    }
    assert_no_match::<InitScriptInfo>(json!({"s3": {"destination": "s3://bucket/init.sh"}}));
}

#[test]
fn secret_scope_selected_by_backend_type_value() {
    assert_wire_round_trip(
        json!({"name": "etl", "backend_type": "DATABRICKS"}),
        SecretScope::Databricks {
            name: "etl".to_string(),
        },
    );
    assert_wire_round_trip(
        json!({
            "name": "kv",
            "backend_type": "AZURE_KEYVAULT",
            "keyvault_metadata": {"resource_id": "/subscriptions/1/vaults/kv", "dns_name": "https://kv.vault.azure.net/"}
        }),
        SecretScope::AzureKeyVault {
            name: "kv".to_string(),
            keyvault_metadata: AzureKeyVaultMetadata {
                resource_id: "/subscriptions/1/vaults/kv".to_string(),
                dns_name: "https://kv.vault.azure.net/".to_string(),
            },
        },
    );
    assert_no_match::<SecretScope>(json!({"name": "etl"}));
    assert_no_match::<SecretScope>(json!({"name": "etl", "backend_type": "VAULT"}));
}

#[test]
fn access_control_request_principals() {
    assert_wire_round_trip(
        json!({"user_name": "ana@example.com", "permission_level": "CAN_MANAGE"}),
        AccessControlRequest::new(Principal::user("ana@example.com"), PermissionLevel::CanManage),
    );
    assert_wire_round_trip(
        json!({"group_name": "admins", "permission_level": "CAN_RESTART"}),
        AccessControlRequest::new(Principal::group("admins"), PermissionLevel::CanRestart),
    );
    assert_wire_round_trip(
        json!({"service_principal_name": "9f0c-app", "permission_level": "CAN_ATTACH_TO"}),
        AccessControlRequest::new(
            Principal::service_principal("9f0c-app"),
            PermissionLevel::CanAttachTo,
        ),
    );
    assert_no_match::<AccessControlRequest>(json!({"permission_level": "CAN_VIEW"}));
}

#[test]
fn principal_keys_are_checked_user_group_service_principal() {
    let request: AccessControlRequest = serde_json::from_value(json!({
        "service_principal_name": "9f0c-app",
        "group_name": "admins",
        "user_name": "ana@example.com",
        "permission_level": "CAN_VIEW"
    }))
    .expect("decode");
    assert_eq!(request.principal, Principal::user("ana@example.com"));

    let item: AclPermissionItem = serde_json::from_value(json!({
        "service_principal_name": "9f0c-app",
        "group_name": "admins",
        "permission_level": "CAN_VIEW"
    }))
    .expect("decode");
    assert_eq!(item.principal, Principal::group("admins"));
}

#[test]
fn acl_item_flat_permission_is_direct() {
    let item: AclPermissionItem = serde_json::from_value(json!({
        "user_name": "ana@example.com",
        "permission_level": "CAN_MANAGE"
    }))
    .expect("decode");
    assert_eq!(item.principal, Principal::user("ana@example.com"));
    assert!(!item.grant.is_inherited());
    assert!(item.grant.inherited_from().is_empty());
    assert_eq!(item.grant.shape, PermissionShape::Flat);
}

#[test]
fn acl_item_nested_permission_keeps_inheritance() {
    let wire = json!({
        "group_name": "admins",
        "all_permissions": [{
            "permission_level": "CAN_MANAGE",
            "inherited": true,
            "inherited_from_object": ["x"]
        }]
    });
    let item: AclPermissionItem = serde_json::from_value(wire.clone()).expect("decode");
    assert_eq!(
        item.grant,
        PermissionGrant {
            permission_level: PermissionLevel::CanManage,
            inherited: Some(true),
            inherited_from_object: Some(vec!["x".to_string()]),
            shape: PermissionShape::Nested,
        }
    );
    assert_eq!(serde_json::to_value(&item).expect("encode"), wire);
    assert_no_match::<AclPermissionItem>(json!({"permission_level": "CAN_VIEW"}));
}

#[test]
fn acl_item_nested_minimal_entry_round_trips() {
    let wire = json!({
        "user_name": "a",
        "all_permissions": [{"permission_level": "CAN_MANAGE", "inherited": false}]
    });
    let item: AclPermissionItem = serde_json::from_value(wire.clone()).expect("decode");
    assert!(!item.grant.is_inherited());
    assert!(item.grant.inherited_from().is_empty());
    assert_eq!(serde_json::to_value(&item).expect("encode"), wire);
}

#[test]
fn table_constraint_arms() {
    assert_wire_round_trip(
        json!({"primary_key_constraint": {"name": "pk_orders", "child_columns": ["id"]}}),
        TableConstraint::PrimaryKey(PrimaryKeyConstraint {
            name: "pk_orders".to_string(),
            child_columns: vec!["id".to_string()],
        }),
    );
    assert_wire_round_trip(
        json!({"foreign_key_constraint": {
            "name": "fk_customer",
            "child_columns": ["customer_id"],
            "parent_table": "main.sales.customers",
            "parent_columns": ["id"]
        }}),
        TableConstraint::ForeignKey(ForeignKeyConstraint {
            name: "fk_customer".to_string(),
            child_columns: vec!["customer_id".to_string()],
            parent_table: "main.sales.customers".to_string(),
            parent_columns: vec!["id".to_string()],
        }),
    );
    assert_wire_round_trip(
        json!({"named_table_constraint": {"name": "uq_order_ref"}}),
        TableConstraint::Named(NamedTableConstraint {
            name: "uq_order_ref".to_string(),
        }),
    );
    assert_no_match::<TableConstraint>(json!({"check_constraint": {"name": "c"}}));
}

#[test]
fn dependency_arms() {
    assert_wire_round_trip(
        json!({"table": {"table_full_name": "main.sales.orders"}}),
        Dependency::table("main.sales.orders"),
    );
    assert_wire_round_trip(
        json!({"function": {"function_full_name": "main.util.mask"}}),
        Dependency::function("main.util.mask"),
    );
    assert_no_match::<Dependency>(json!({}));
}

#[test]
fn non_object_input_is_rejected() {
    let err = decode::<Library>(json!("dbfs:/libs/foo.jar")).expect_err("not an object");
    assert!(matches!(err, UnionError::NotAnObject { .. }));
    let err: Error = err.into();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
struct Stamped {
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    at: Option<time::OffsetDateTime>,
}

#[test]
fn epoch_millis_round_trip_and_null() {
    let stamped: Stamped =
        serde_json::from_value(json!({"at": 1666369196203i64})).expect("decode");
    assert_eq!(stamped.at, Some(datetime!(2022-10-21 16:19:56.203 UTC)));
    assert_eq!(
        serde_json::to_value(&stamped).expect("encode"),
        json!({"at": 1666369196203i64})
    );

    let missing: Stamped = serde_json::from_value(json!({"at": null})).expect("decode");
    assert_eq!(missing.at, None);
    assert_eq!(serde_json::to_value(&missing).expect("encode"), json!({}));
}
