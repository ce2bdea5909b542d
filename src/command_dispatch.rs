//! Purpose: Hold top-level CLI command dispatch for `dbrest`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap; one handler per resource family.
//! Invariants: Commands that return data print exactly one JSON value; unit commands print nothing.
//! Invariants: Request bodies are parsed into typed requests before any network call.

use super::*;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use databricks_rest::api::clusters::{
    ClusterAttributes, ClusterEventsRequest, EditClusterRequest, ResizeClusterRequest,
};
use databricks_rest::api::jobs::{
    JobSettings, ListJobsRequest, ListRunsRequest, RunNowRequest, UpdateJobRequest,
};
use databricks_rest::api::libraries::LibrariesRequest;
use databricks_rest::api::permissions::PermissionsRequest;
use databricks_rest::api::secrets::{CreateScopeRequest, PutSecretRequest};
use databricks_rest::api::unity_catalog::{
    BindableSecurableType, PermissionsChange, SecurableType, WorkspaceBinding,
};
use databricks_rest::api::ObjectType;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

#[derive(Deserialize)]
struct ChangesInput {
    changes: Vec<PermissionsChange>,
}

#[derive(Deserialize)]
struct BindingsInput {
    #[serde(default)]
    add: Vec<WorkspaceBinding>,
    #[serde(default)]
    remove: Vec<WorkspaceBinding>,
}

pub(super) fn dispatch_command(
    command: Command,
    workspace: WorkspaceArgs,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "dbrest", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output(color_mode);
            Ok(RunOutcome::ok())
        }
        command => {
            let client = workspace.connect()?;
            dispatch_resource(command, &client, color_mode)
        }
    }
}

fn dispatch_resource(
    command: Command,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Clusters { command } => clusters(command, client, color_mode),
        Command::Libraries { command } => libraries(command, client, color_mode),
        Command::Jobs { command } => jobs(command, client, color_mode),
        Command::Dbfs { command } => dbfs(command, client, color_mode),
        Command::Secrets { command } => secrets(command, client, color_mode),
        Command::Permissions { command } => permissions(command, client, color_mode),
        Command::Catalogs { command } => catalogs(command, client, color_mode),
        Command::Schemas { command } => schemas(command, client, color_mode),
        Command::Tables { command } => tables(command, client, color_mode),
        Command::Volumes { command } => volumes(command, client, color_mode),
        Command::Connections { command } => connections(command, client, color_mode),
        Command::Shares { command } => shares(command, client, color_mode),
        Command::StorageCredentials { command } => {
            storage_credentials(command, client, color_mode)
        }
        Command::Bindings { command } => bindings(command, client, color_mode),
        Command::Grants { command } => grants(command, client, color_mode),
        Command::Lineage { command } => lineage(command, client, color_mode),
        Command::Completion { .. } | Command::Version => Err(Error::new(ErrorKind::Internal)
            .with_message("command does not need a workspace client")),
    }
}

fn emit<T: Serialize>(value: &T, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let value = serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode result json")
            .with_source(err)
    })?;
    emit_json(&value, color_mode);
    Ok(RunOutcome::ok())
}

fn done(result: Result<(), Error>) -> Result<RunOutcome, Error> {
    result.map(|()| RunOutcome::ok())
}

fn clusters(
    command: ClustersCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.clusters();
    match command {
        ClustersCommand::Create(body) => {
            let attributes: ClusterAttributes = body.parse()?;
            let cluster_id = api.create(&attributes)?;
            emit(&json!({ "cluster_id": cluster_id }), color_mode)
        }
        ClustersCommand::Edit(body) => done(api.edit(&body.parse::<EditClusterRequest>()?)),
        ClustersCommand::Start { cluster_id } => done(api.start(&cluster_id)),
        ClustersCommand::Restart { cluster_id } => done(api.restart(&cluster_id)),
        ClustersCommand::Terminate { cluster_id } => done(api.terminate(&cluster_id)),
        ClustersCommand::PermanentDelete { cluster_id } => done(api.permanent_delete(&cluster_id)),
        ClustersCommand::Pin { cluster_id } => done(api.pin(&cluster_id)),
        ClustersCommand::Unpin { cluster_id } => done(api.unpin(&cluster_id)),
        ClustersCommand::Resize(body) => done(api.resize(&body.parse::<ResizeClusterRequest>()?)),
        ClustersCommand::Get { cluster_id } => emit(&api.get(&cluster_id)?, color_mode),
        ClustersCommand::List => emit(&api.list()?, color_mode),
        ClustersCommand::Events {
            cluster_id,
            limit,
            offset,
            body,
        } => {
            let mut request: ClusterEventsRequest = body.parse_optional()?.unwrap_or_default();
            request.cluster_id = cluster_id;
            request.limit = limit.or(request.limit);
            request.offset = offset.or(request.offset);
            emit(&api.events(&request)?, color_mode)
        }
        ClustersCommand::SparkVersions => emit(&api.spark_versions()?, color_mode),
    }
}

fn libraries(
    command: LibrariesCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.libraries();
    match command {
        LibrariesCommand::AllStatuses => emit(&api.all_cluster_statuses()?, color_mode),
        LibrariesCommand::Status { cluster_id } => {
            emit(&api.cluster_status(&cluster_id)?, color_mode)
        }
        LibrariesCommand::Install(body) => done(api.install(&body.parse::<LibrariesRequest>()?)),
        LibrariesCommand::Uninstall(body) => {
            done(api.uninstall(&body.parse::<LibrariesRequest>()?))
        }
    }
}

fn jobs(
    command: JobsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.jobs();
    match command {
        JobsCommand::Create(body) => {
            let job_id = api.create(&body.parse::<JobSettings>()?)?;
            emit(&json!({ "job_id": job_id }), color_mode)
        }
        JobsCommand::List {
            limit,
            page_token,
            name,
            expand_tasks,
        } => {
            let request = ListJobsRequest {
                limit,
                page_token,
                name,
                expand_tasks,
            };
            emit(&api.list(&request)?, color_mode)
        }
        JobsCommand::Get { job_id } => emit(&api.get(job_id)?, color_mode),
        JobsCommand::Reset { job_id, body } => {
            done(api.reset(job_id, &body.parse::<JobSettings>()?))
        }
        JobsCommand::Update(body) => done(api.update(&body.parse::<UpdateJobRequest>()?)),
        JobsCommand::Delete { job_id } => done(api.delete(job_id)),
        JobsCommand::RunNow { job_id, body } => {
            let mut request: RunNowRequest = body.parse_optional()?.unwrap_or_default();
            request.job_id = job_id;
            emit(&api.run_now(&request)?, color_mode)
        }
        JobsCommand::ListRuns {
            job_id,
            active_only,
            completed_only,
            limit,
            page_token,
        } => {
            let request = ListRunsRequest {
                job_id,
                active_only,
                completed_only,
                limit,
                page_token,
                ..ListRunsRequest::default()
            };
            emit(&api.list_runs(&request)?, color_mode)
        }
        JobsCommand::GetRun { run_id } => emit(&api.get_run(run_id)?, color_mode),
        JobsCommand::CancelRun { run_id } => done(api.cancel_run(run_id)),
        JobsCommand::DeleteRun { run_id } => done(api.delete_run(run_id)),
        JobsCommand::GetRunOutput { run_id } => emit(&api.get_run_output(run_id)?, color_mode),
    }
}

fn dbfs(
    command: DbfsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.dbfs();
    match command {
        DbfsCommand::Ls { path } => emit(&api.list(&path)?, color_mode),
        DbfsCommand::Stat { path } => emit(&api.get_status(&path)?, color_mode),
        DbfsCommand::Mkdirs { path } => done(api.mkdirs(&path)),
        DbfsCommand::Rm { path, recursive } => done(api.delete(&path, recursive)),
        DbfsCommand::Mv {
            source,
            destination,
        } => done(api.move_path(&source, &destination)),
        DbfsCommand::Upload {
            local,
            path,
            overwrite,
        } => {
            let bytes = if local.as_os_str() == "-" {
                api.upload(&path, io::stdin().lock(), overwrite)?
            } else {
                api.upload(&path, open_local(&local)?, overwrite)?
            };
            emit(&json!({ "path": path, "bytes": bytes }), color_mode)
        }
        DbfsCommand::Download { path, local } => {
            let file = File::create(&local).map_err(|err| local_io_error(&local, err))?;
            let mut writer = io::BufWriter::new(file);
            let bytes = api.download(&path, &mut writer)?;
            writer.flush().map_err(|err| local_io_error(&local, err))?;
            emit(
                &json!({ "path": path, "local": local.display().to_string(), "bytes": bytes }),
                color_mode,
            )
        }
        DbfsCommand::Cat { path } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            api.download(&path, &mut out)?;
            out.flush().map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to write stdout")
                    .with_source(err)
            })?;
            Ok(RunOutcome::ok())
        }
    }
}

fn open_local(path: &std::path::Path) -> Result<File, Error> {
    File::open(path).map_err(|err| local_io_error(path, err))
}

fn local_io_error(path: &std::path::Path, err: io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(format!("failed to access local file {}", path.display()))
        .with_source(err)
}

fn secrets(
    command: SecretsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.secrets();
    match command {
        SecretsCommand::CreateScope {
            scope,
            initial_manage_principal,
            body,
        } => {
            let mut request: CreateScopeRequest = body.parse_optional()?.unwrap_or_default();
            request.scope = scope;
            if initial_manage_principal.is_some() {
                request.initial_manage_principal = initial_manage_principal;
            }
            done(api.create_scope(&request))
        }
        SecretsCommand::DeleteScope { scope } => done(api.delete_scope(&scope)),
        SecretsCommand::ListScopes => emit(&api.list_scopes()?, color_mode),
        SecretsCommand::Put {
            scope,
            key,
            string_value,
            bytes_file,
        } => {
            let bytes_value = match bytes_file {
                Some(path) => {
                    let bytes = std::fs::read(&path).map_err(|err| local_io_error(&path, err))?;
                    Some(BASE64.encode(bytes))
                }
                None => None,
            };
            let request = PutSecretRequest {
                scope,
                key,
                string_value,
                bytes_value,
            };
            done(api.put_secret(&request))
        }
        SecretsCommand::Delete { scope, key } => done(api.delete_secret(&scope, &key)),
        SecretsCommand::List { scope } => emit(&api.list_secrets(&scope)?, color_mode),
        SecretsCommand::PutAcl {
            scope,
            principal,
            permission,
        } => done(api.put_acl(&scope, &principal, permission.into())),
        SecretsCommand::DeleteAcl { scope, principal } => done(api.delete_acl(&scope, &principal)),
        SecretsCommand::GetAcl { scope, principal } => {
            emit(&api.get_acl(&scope, &principal)?, color_mode)
        }
        SecretsCommand::ListAcls { scope } => emit(&api.list_acls(&scope)?, color_mode),
    }
}

fn permissions(
    command: PermissionsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.permissions();
    match command {
        PermissionsCommand::Get {
            object_type,
            object_id,
        } => emit(&api.get(object_type.parse::<ObjectType>()?, &object_id)?, color_mode),
        PermissionsCommand::Set {
            object_type,
            object_id,
            body,
        } => {
            let object_type: ObjectType = object_type.parse()?;
            let request: PermissionsRequest = body.parse()?;
            emit(&api.set(object_type, &object_id, &request)?, color_mode)
        }
        PermissionsCommand::Update {
            object_type,
            object_id,
            body,
        } => {
            let object_type: ObjectType = object_type.parse()?;
            let request: PermissionsRequest = body.parse()?;
            emit(&api.update(object_type, &object_id, &request)?, color_mode)
        }
        PermissionsCommand::Levels {
            object_type,
            object_id,
        } => {
            let object_type: ObjectType = object_type.parse()?;
            emit(&api.permission_levels(object_type, &object_id)?, color_mode)
        }
    }
}

fn catalogs(
    command: CatalogsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.catalogs();
    match command {
        CatalogsCommand::List(page) => emit(&api.list(&page.options())?, color_mode),
        CatalogsCommand::Get { name } => emit(&api.get(&name)?, color_mode),
        CatalogsCommand::Create(body) => emit(&api.create(&body.parse()?)?, color_mode),
        CatalogsCommand::Update { name, body } => {
            emit(&api.update(&name, &body.parse()?)?, color_mode)
        }
        CatalogsCommand::Delete { name, force } => done(api.delete(&name, force)),
    }
}

fn schemas(
    command: SchemasCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.schemas();
    match command {
        SchemasCommand::List { catalog_name, page } => {
            emit(&api.list(&catalog_name, &page.options())?, color_mode)
        }
        SchemasCommand::Get { full_name } => emit(&api.get(&full_name)?, color_mode),
        SchemasCommand::Create(body) => emit(&api.create(&body.parse()?)?, color_mode),
        SchemasCommand::Update { full_name, body } => {
            emit(&api.update(&full_name, &body.parse()?)?, color_mode)
        }
        SchemasCommand::Delete { full_name, force } => done(api.delete(&full_name, force)),
    }
}

fn tables(
    command: TablesCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.tables();
    match command {
        TablesCommand::List {
            catalog_name,
            schema_name,
            page,
        } => emit(
            &api.list(&catalog_name, &schema_name, &page.options())?,
            color_mode,
        ),
        TablesCommand::Summaries {
            catalog_name,
            schema_pattern,
            table_pattern,
            page,
        } => emit(
            &api.list_summaries(
                &catalog_name,
                schema_pattern.as_deref(),
                table_pattern.as_deref(),
                &page.options(),
            )?,
            color_mode,
        ),
        TablesCommand::Get { full_name } => emit(&api.get(&full_name)?, color_mode),
        TablesCommand::Exists { full_name } => {
            let exists = api.exists(&full_name)?;
            emit(&json!({ "table_exists": exists }), color_mode)
        }
        TablesCommand::SetOwner { full_name, owner } => done(api.update_owner(&full_name, &owner)),
        TablesCommand::Delete { full_name } => done(api.delete(&full_name)),
    }
}

fn volumes(
    command: VolumesCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.volumes();
    match command {
        VolumesCommand::List {
            catalog_name,
            schema_name,
            page,
        } => emit(
            &api.list(&catalog_name, &schema_name, &page.options())?,
            color_mode,
        ),
        VolumesCommand::Get { full_name } => emit(&api.get(&full_name)?, color_mode),
        VolumesCommand::Create(body) => emit(&api.create(&body.parse()?)?, color_mode),
        VolumesCommand::Update { full_name, body } => {
            emit(&api.update(&full_name, &body.parse()?)?, color_mode)
        }
        VolumesCommand::Delete { full_name } => done(api.delete(&full_name)),
    }
}

fn connections(
    command: ConnectionsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.connections();
    match command {
        ConnectionsCommand::List(page) => emit(&api.list(&page.options())?, color_mode),
        ConnectionsCommand::Get { name } => emit(&api.get(&name)?, color_mode),
        ConnectionsCommand::Create(body) => emit(&api.create(&body.parse()?)?, color_mode),
        ConnectionsCommand::Update { name, body } => {
            emit(&api.update(&name, &body.parse()?)?, color_mode)
        }
        ConnectionsCommand::Delete { name } => done(api.delete(&name)),
    }
}

fn shares(
    command: SharesCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.shares();
    match command {
        SharesCommand::List(page) => emit(&api.list(&page.options())?, color_mode),
        SharesCommand::Get {
            name,
            include_shared_data,
        } => emit(&api.get(&name, include_shared_data)?, color_mode),
        SharesCommand::Create(body) => emit(&api.create(&body.parse()?)?, color_mode),
        SharesCommand::Update { name, body } => {
            emit(&api.update(&name, &body.parse()?)?, color_mode)
        }
        SharesCommand::Delete { name } => done(api.delete(&name)),
        SharesCommand::Permissions { name } => emit(&api.permissions(&name)?, color_mode),
        SharesCommand::UpdatePermissions { name, body } => {
            let input: ChangesInput = body.parse()?;
            done(api.update_permissions(&name, &input.changes))
        }
    }
}

fn storage_credentials(
    command: StorageCredentialsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.storage_credentials();
    match command {
        StorageCredentialsCommand::List(page) => emit(&api.list(&page.options())?, color_mode),
        StorageCredentialsCommand::Get { name } => emit(&api.get(&name)?, color_mode),
        StorageCredentialsCommand::Create(body) => emit(&api.create(&body.parse()?)?, color_mode),
        StorageCredentialsCommand::Update { name, body } => {
            emit(&api.update(&name, &body.parse()?)?, color_mode)
        }
        StorageCredentialsCommand::Delete { name, force } => done(api.delete(&name, force)),
        StorageCredentialsCommand::Validate(body) => {
            emit(&api.validate(&body.parse()?)?, color_mode)
        }
    }
}

fn bindings(
    command: BindingsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.workspace_bindings();
    match command {
        BindingsCommand::GetCatalog { catalog } => {
            let workspaces = api.get_catalog_workspaces(&catalog)?;
            emit(&json!({ "workspaces": workspaces }), color_mode)
        }
        BindingsCommand::UpdateCatalog {
            catalog,
            assign,
            unassign,
        } => {
            if assign.is_empty() && unassign.is_empty() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("nothing to change")
                    .with_hint("Pass --assign <WORKSPACE_ID> and/or --unassign <WORKSPACE_ID>."));
            }
            let workspaces = api.update_catalog_workspaces(&catalog, &assign, &unassign)?;
            emit(&json!({ "workspaces": workspaces }), color_mode)
        }
        BindingsCommand::Get {
            securable_type,
            name,
        } => {
            let securable_type: BindableSecurableType = securable_type.parse()?;
            emit(&api.get_bindings(securable_type, &name)?, color_mode)
        }
        BindingsCommand::Update {
            securable_type,
            name,
            body,
        } => {
            let securable_type: BindableSecurableType = securable_type.parse()?;
            let input: BindingsInput = body.parse()?;
            let bindings = api.update_bindings(securable_type, &name, &input.add, &input.remove)?;
            emit(&json!({ "bindings": bindings }), color_mode)
        }
    }
}

fn grants(
    command: GrantsCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.grants();
    match command {
        GrantsCommand::Get {
            securable_type,
            full_name,
            principal,
        } => {
            let securable_type: SecurableType = securable_type.parse()?;
            let assignments = api.get(securable_type, &full_name, principal.as_deref())?;
            emit(&json!({ "privilege_assignments": assignments }), color_mode)
        }
        GrantsCommand::Effective {
            securable_type,
            full_name,
            principal,
        } => {
            let securable_type: SecurableType = securable_type.parse()?;
            let assignments = api.get_effective(securable_type, &full_name, principal.as_deref())?;
            emit(&json!({ "privilege_assignments": assignments }), color_mode)
        }
        GrantsCommand::Update {
            securable_type,
            full_name,
            body,
        } => {
            let securable_type: SecurableType = securable_type.parse()?;
            let input: ChangesInput = body.parse()?;
            let assignments = api.update(securable_type, &full_name, &input.changes)?;
            emit(&json!({ "privilege_assignments": assignments }), color_mode)
        }
    }
}

fn lineage(
    command: LineageCommand,
    client: &DatabricksClient,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let api = client.lineage();
    match command {
        LineageCommand::Table {
            table_name,
            include_entity_lineage,
        } => emit(&api.table_lineage(&table_name, include_entity_lineage)?, color_mode),
        LineageCommand::Column {
            table_name,
            column_name,
        } => emit(&api.column_lineage(&table_name, &column_name)?, color_mode),
    }
}
