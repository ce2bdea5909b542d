//! Purpose: Unity Catalog tables (`/api/2.1/unity-catalog/tables`) and table summaries.
//! Exports: `TablesApi`, `TableInfo`, `TableSummary`, `ColumnInfo`, `TableType`,
//! `DataSourceFormat`, `TableConstraint` and `Dependency` unions with their payloads.
//! Role: Read-mostly wrappers; the only mutations are owner change and delete.
//! Invariants: Constraint arms are checked as primary key, foreign key, named.
//! Invariants: Dependency arms are checked as `table`, `function`.
#![allow(clippy::result_large_err)]

use super::{ListOptions, Page, uc_endpoint};
use crate::api::client::{ApiResult, DatabricksClient};
use crate::core::epoch_ms;
use crate::core::union::{Arm, Discriminator, TaggedUnion, impl_union_serde};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyConstraint {
    pub name: String,
    pub child_columns: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    pub name: String,
    pub child_columns: Vec<String>,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NamedTableConstraint {
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TableConstraint {
    PrimaryKey(PrimaryKeyConstraint),
    ForeignKey(ForeignKeyConstraint),
    Named(NamedTableConstraint),
}

impl TableConstraint {
    pub fn name(&self) -> &str {
        match self {
            TableConstraint::PrimaryKey(c) => &c.name,
            TableConstraint::ForeignKey(c) => &c.name,
            TableConstraint::Named(c) => &c.name,
        }
    }
}

impl TaggedUnion for TableConstraint {
    const FAMILY: &'static str = "TableConstraint";
    const DISCRIMINATOR: Discriminator = Discriminator::Presence(&[
        Arm::nested("primary_key_constraint"),
        Arm::nested("foreign_key_constraint"),
        Arm::nested("named_table_constraint"),
    ]);

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self> {
        match tag {
            "primary_key_constraint" => {
                serde_json::from_value(payload).map(TableConstraint::PrimaryKey)
            }
            "foreign_key_constraint" => {
                serde_json::from_value(payload).map(TableConstraint::ForeignKey)
            }
            _ => serde_json::from_value(payload).map(TableConstraint::Named),
        }
    }

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>) {
        match self {
            TableConstraint::PrimaryKey(c) => ("primary_key_constraint", serde_json::to_value(c)),
            TableConstraint::ForeignKey(c) => ("foreign_key_constraint", serde_json::to_value(c)),
            TableConstraint::Named(c) => ("named_table_constraint", serde_json::to_value(c)),
        }
    }
}

impl_union_serde!(TableConstraint);

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TableDependency {
    pub table_full_name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FunctionDependency {
    pub function_full_name: String,
}

/// Something a view or metric definition reads from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Dependency {
    Table(TableDependency),
    Function(FunctionDependency),
}

impl Dependency {
    pub fn table(full_name: impl Into<String>) -> Self {
        Dependency::Table(TableDependency {
            table_full_name: full_name.into(),
        })
    }

    pub fn function(full_name: impl Into<String>) -> Self {
        Dependency::Function(FunctionDependency {
            function_full_name: full_name.into(),
        })
    }
}

impl TaggedUnion for Dependency {
    const FAMILY: &'static str = "Dependency";
    const DISCRIMINATOR: Discriminator =
        Discriminator::Presence(&[Arm::nested("table"), Arm::nested("function")]);

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self> {
        match tag {
            "table" => serde_json::from_value(payload).map(Dependency::Table),
            _ => serde_json::from_value(payload).map(Dependency::Function),
        }
    }

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>) {
        match self {
            Dependency::Table(dep) => ("table", serde_json::to_value(dep)),
            Dependency::Function(dep) => ("function", serde_json::to_value(dep)),
        }
    }
}

impl_union_serde!(Dependency);

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DependencyList {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    Managed,
    External,
    View,
    MaterializedView,
    StreamingTable,
    ManagedShallowClone,
    ExternalShallowClone,
    Foreign,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceFormat {
    Delta,
    Csv,
    Json,
    Avro,
    Parquet,
    Orc,
    Text,
    UnityCatalog,
    Deltasharing,
    DatabricksFormat,
    MysqlFormat,
    PostgresqlFormat,
    RedshiftFormat,
    SnowflakeFormat,
    SqldwFormat,
    SqlserverFormat,
    BigqueryFormat,
    HiveSerde,
    HiveCustom,
    VectorIndexFormat,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_precision: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_scale: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    #[serde(default)]
    pub catalog_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<TableType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_format: Option<DataSourceFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_dependencies: Option<DependencyList>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_constraints: Vec<TableConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metastore_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_credential_name: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<TableType>,
}

#[derive(Serialize)]
struct OwnerBody<'a> {
    owner: &'a str,
}

#[derive(Deserialize)]
struct TablesEnvelope {
    #[serde(default)]
    tables: Vec<TableInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct SummariesEnvelope {
    #[serde(default)]
    tables: Vec<TableSummary>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ExistsEnvelope {
    #[serde(default)]
    table_exists: bool,
}

pub struct TablesApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> TablesApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn list(
        &self,
        catalog_name: &str,
        schema_name: &str,
        options: &ListOptions,
    ) -> ApiResult<Page<TableInfo>> {
        let endpoint = uc_endpoint("tables")
            .query("catalog_name", catalog_name)
            .query("schema_name", schema_name);
        let envelope: TablesEnvelope = self.client.get(options.apply(endpoint))?;
        Ok(Page::new(envelope.tables, envelope.next_page_token))
    }

    /// Patterns use SQL `LIKE` syntax; `None` matches everything.
    pub fn list_summaries(
        &self,
        catalog_name: &str,
        schema_name_pattern: Option<&str>,
        table_name_pattern: Option<&str>,
        options: &ListOptions,
    ) -> ApiResult<Page<TableSummary>> {
        let endpoint = uc_endpoint("table-summaries")
            .query("catalog_name", catalog_name)
            .query_opt("schema_name_pattern", schema_name_pattern)
            .query_opt("table_name_pattern", table_name_pattern);
        let envelope: SummariesEnvelope = self.client.get(options.apply(endpoint))?;
        Ok(Page::new(envelope.tables, envelope.next_page_token))
    }

    /// `full_name` is `catalog.schema.table`.
    pub fn get(&self, full_name: &str) -> ApiResult<TableInfo> {
        self.client.get(uc_endpoint("tables").segment(full_name))
    }

    pub fn exists(&self, full_name: &str) -> ApiResult<bool> {
        let envelope: ExistsEnvelope = self
            .client
            .get(uc_endpoint("tables").segment(full_name).segment("exists"))?;
        Ok(envelope.table_exists)
    }

    pub fn update_owner(&self, full_name: &str, owner: &str) -> ApiResult<()> {
        self.client
            .patch_unit(uc_endpoint("tables").segment(full_name), &OwnerBody { owner })
    }

    pub fn delete(&self, full_name: &str) -> ApiResult<()> {
        self.client.delete_unit(uc_endpoint("tables").segment(full_name))
    }
}
