//! Purpose: `dbrest` CLI entry point.
//! Role: Binary crate root; parses args, resolves workspace config, delegates to `command_dispatch`.
//! Invariants: Results are JSON on stdout; errors go to stderr via `output::emit_error`.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: `completion` and `version` never need a workspace host.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::aot::Shell;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod config;
mod output;

use config::ConfigInputs;
use databricks_rest::api::secrets::AclPermission;
use databricks_rest::api::{DatabricksClient, Error, ErrorKind, ListOptions, to_exit_code};
use output::{ColorMode, emit_error, emit_json};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    init_tracing(cli.verbose);

    let timeout = match cli.timeout.as_deref().map(parse_duration).transpose() {
        Ok(timeout) => timeout,
        Err(err) => return Err((err, color_mode)),
    };
    let workspace = WorkspaceArgs {
        inputs: ConfigInputs {
            host: cli.host,
            token: cli.token,
            token_file: cli.token_file,
            profile: cli.profile,
        },
        timeout,
    };

    command_dispatch::dispatch_command(cli.command, workspace, color_mode)
        .map_err(add_io_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Host/token inputs plus transport settings; turned into a client only when a command needs one.
struct WorkspaceArgs {
    inputs: ConfigInputs,
    timeout: Option<Duration>,
}

impl WorkspaceArgs {
    fn connect(self) -> Result<DatabricksClient, Error> {
        let resolved = config::resolve_workspace(self.inputs, |key| std::env::var(key).ok())?;
        let mut client = DatabricksClient::new(resolved.host)?;
        if let Some(token) = resolved.token {
            client = client.with_token(token);
        }
        if let Some(timeout) = self.timeout {
            client = client.with_timeout(timeout);
        }
        tracing::info!(host = %client.base_url(), "using workspace");
        Ok(client)
    }
}

#[derive(Parser)]
#[command(
    name = "dbrest",
    version,
    about = "Typed command-line client for the Databricks REST API",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Every command prints the service response as JSON on stdout.

Workspace resolution:
  - host:  --host, DATABRICKS_HOST, then `host` in ~/.databrickscfg
  - token: --token/--token-file, DATABRICKS_TOKEN, then `token` in ~/.databrickscfg
"#,
    after_help = r#"EXAMPLES
  $ dbrest clusters list
  $ dbrest jobs run-now 123 --json '{"job_parameters": {"env": "dev"}}'
  $ dbrest tables get main.sales.orders
  $ dbrest dbfs upload ./report.csv dbfs:/tmp/report.csv --overwrite
  $ dbrest --profile prod grants get catalog main

LEARN MORE
  $ dbrest <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "DATABRICKS_HOST",
        help = "Workspace URL or host (https assumed when no scheme is given)"
    )]
    host: Option<String>,
    #[arg(long, global = true, help = "Personal access token (default: DATABRICKS_TOKEN)")]
    token: Option<String>,
    #[arg(
        long,
        global = true,
        value_hint = ValueHint::FilePath,
        help = "Read the access token from a file"
    )]
    token_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "DATABRICKS_CONFIG_PROFILE",
        help = "Profile section in ~/.databrickscfg (default: DEFAULT)"
    )]
    profile: Option<String>,
    #[arg(long, global = true, help = "Per-request timeout, e.g. 30s, 500ms, 2m")]
    timeout: Option<String>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "More logging on stderr (-v info, -vv debug); RUST_LOG overrides"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Request body for create/update commands, parsed into the typed request before sending.
#[derive(Args, Debug, Default)]
struct BodyArgs {
    #[arg(
        long,
        value_name = "JSON",
        conflicts_with = "json_file",
        help = "Request body as inline JSON"
    )]
    json: Option<String>,
    #[arg(
        long,
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        help = "Read the request body from a file (`-` for stdin)"
    )]
    json_file: Option<PathBuf>,
}

impl BodyArgs {
    fn parse<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.parse_optional()?.ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("missing request body")
                .with_hint("Pass --json '{...}' or --json-file <path> (`-` reads stdin).")
        })
    }

    fn parse_optional<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        let Some(raw) = self.read_raw()? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid request json")
                .with_hint(
                    "The body must match the request shape; see the Databricks REST reference.",
                )
                .with_source(err)
        })
    }

    fn read_raw(&self) -> Result<Option<String>, Error> {
        if let Some(inline) = &self.json {
            return Ok(Some(inline.clone()));
        }
        let Some(path) = &self.json_file else {
            return Ok(None);
        };
        let mut raw = String::new();
        let result = if path.as_os_str() == "-" {
            io::stdin().read_to_string(&mut raw).map(|_| ())
        } else {
            std::fs::read_to_string(path).map(|text| raw = text)
        };
        result.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read request body from {}", path.display()))
                .with_source(err)
        })?;
        Ok(Some(raw))
    }
}

#[derive(Args, Debug, Default)]
struct PageArgs {
    #[arg(long, help = "Maximum number of items in the page")]
    max_results: Option<u32>,
    #[arg(long, help = "Token from a previous page's `next_page_token`")]
    page_token: Option<String>,
}

impl PageArgs {
    fn options(&self) -> ListOptions {
        ListOptions {
            max_results: self.max_results,
            page_token: self.page_token.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(arg_required_else_help = true, about = "Manage all-purpose clusters")]
    Clusters {
        #[command(subcommand)]
        command: ClustersCommand,
    },
    #[command(arg_required_else_help = true, about = "Install and inspect cluster libraries")]
    Libraries {
        #[command(subcommand)]
        command: LibrariesCommand,
    },
    #[command(arg_required_else_help = true, about = "Manage jobs and job runs")]
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    #[command(arg_required_else_help = true, about = "Work with files in DBFS")]
    Dbfs {
        #[command(subcommand)]
        command: DbfsCommand,
    },
    #[command(arg_required_else_help = true, about = "Manage secret scopes, secrets and ACLs")]
    Secrets {
        #[command(subcommand)]
        command: SecretsCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Workspace object permissions",
        long_about = r#"Read and change permissions of workspace objects.

OBJECT_TYPE is the URL segment: clusters, cluster-policies, instance-pools, jobs,
pipelines, notebooks, directories, repos, experiments, registered-models,
sql/warehouses, serving-endpoints."#
    )]
    Permissions {
        #[command(subcommand)]
        command: PermissionsCommand,
    },
    #[command(arg_required_else_help = true, about = "Unity Catalog catalogs")]
    Catalogs {
        #[command(subcommand)]
        command: CatalogsCommand,
    },
    #[command(arg_required_else_help = true, about = "Unity Catalog schemas")]
    Schemas {
        #[command(subcommand)]
        command: SchemasCommand,
    },
    #[command(arg_required_else_help = true, about = "Unity Catalog tables")]
    Tables {
        #[command(subcommand)]
        command: TablesCommand,
    },
    #[command(arg_required_else_help = true, about = "Unity Catalog volumes")]
    Volumes {
        #[command(subcommand)]
        command: VolumesCommand,
    },
    #[command(arg_required_else_help = true, about = "Unity Catalog connections")]
    Connections {
        #[command(subcommand)]
        command: ConnectionsCommand,
    },
    #[command(arg_required_else_help = true, about = "Delta Sharing shares")]
    Shares {
        #[command(subcommand)]
        command: SharesCommand,
    },
    #[command(
        name = "storage-credentials",
        arg_required_else_help = true,
        about = "Unity Catalog storage credentials"
    )]
    StorageCredentials {
        #[command(subcommand)]
        command: StorageCredentialsCommand,
    },
    #[command(arg_required_else_help = true, about = "Workspace bindings of isolated securables")]
    Bindings {
        #[command(subcommand)]
        command: BindingsCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Unity Catalog grants",
        long_about = r#"Read and change Unity Catalog privileges.

SECURABLE_TYPE is one of: catalog, schema, table, volume, function,
external_location, storage_credential, connection, share, recipient,
provider, metastore."#
    )]
    Grants {
        #[command(subcommand)]
        command: GrantsCommand,
    },
    #[command(arg_required_else_help = true, about = "Table and column lineage")]
    Lineage {
        #[command(subcommand)]
        command: LineageCommand,
    },
    #[command(about = "Print version info")]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ dbrest completion bash > ~/.local/share/bash-completion/completions/dbrest
  $ dbrest completion zsh > ~/.zfunc/_dbrest
  $ dbrest completion fish > ~/.config/fish/completions/dbrest.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ClustersCommand {
    #[command(about = "Create a cluster from ClusterAttributes JSON; prints the new cluster_id")]
    Create(BodyArgs),
    #[command(about = "Replace a cluster's attributes (body includes cluster_id)")]
    Edit(BodyArgs),
    #[command(about = "Start a terminated cluster")]
    Start { cluster_id: String },
    #[command(about = "Restart a running cluster")]
    Restart { cluster_id: String },
    #[command(about = "Terminate a cluster (it stays listed)")]
    Terminate { cluster_id: String },
    #[command(about = "Terminate and remove a cluster")]
    PermanentDelete { cluster_id: String },
    #[command(about = "Keep a cluster in the list after termination")]
    Pin { cluster_id: String },
    #[command(about = "Undo `pin`")]
    Unpin { cluster_id: String },
    #[command(about = "Change worker count or autoscale range")]
    Resize(BodyArgs),
    #[command(about = "Show one cluster")]
    Get { cluster_id: String },
    #[command(about = "List clusters")]
    List,
    #[command(about = "List cluster events; `next_page` holds the follow-up request")]
    Events {
        cluster_id: String,
        #[arg(long, help = "Maximum number of events")]
        limit: Option<i64>,
        #[arg(long, help = "Offset into the event list")]
        offset: Option<i64>,
        #[command(flatten)]
        body: BodyArgs,
    },
    #[command(about = "List available Databricks runtime versions")]
    SparkVersions,
}

#[derive(Subcommand)]
enum LibrariesCommand {
    #[command(about = "Library status on every cluster")]
    AllStatuses,
    #[command(about = "Library status on one cluster")]
    Status { cluster_id: String },
    #[command(about = "Install libraries ({cluster_id, libraries} body)")]
    Install(BodyArgs),
    #[command(about = "Uninstall libraries on next restart ({cluster_id, libraries} body)")]
    Uninstall(BodyArgs),
}

#[derive(Subcommand)]
enum JobsCommand {
    #[command(about = "Create a job from JobSettings JSON; prints the new job_id")]
    Create(BodyArgs),
    #[command(about = "List jobs")]
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        page_token: Option<String>,
        #[arg(long, help = "Exact job name filter")]
        name: Option<String>,
        #[arg(long, help = "Include task and cluster details")]
        expand_tasks: bool,
    },
    #[command(about = "Show one job")]
    Get { job_id: i64 },
    #[command(about = "Overwrite all settings of a job (JobSettings body)")]
    Reset {
        job_id: i64,
        #[command(flatten)]
        body: BodyArgs,
    },
    #[command(about = "Partially update a job ({job_id, new_settings, fields_to_remove} body)")]
    Update(BodyArgs),
    #[command(about = "Delete a job")]
    Delete { job_id: i64 },
    #[command(about = "Trigger a run; optional body carries parameters")]
    RunNow {
        job_id: i64,
        #[command(flatten)]
        body: BodyArgs,
    },
    #[command(about = "List job runs")]
    ListRuns {
        #[arg(long)]
        job_id: Option<i64>,
        #[arg(long, conflicts_with = "completed_only")]
        active_only: bool,
        #[arg(long)]
        completed_only: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        page_token: Option<String>,
    },
    #[command(about = "Show one run")]
    GetRun { run_id: i64 },
    #[command(about = "Cancel a run")]
    CancelRun { run_id: i64 },
    #[command(about = "Delete a finished run")]
    DeleteRun { run_id: i64 },
    #[command(about = "Show the output of a task run")]
    GetRunOutput { run_id: i64 },
}

#[derive(Subcommand)]
enum DbfsCommand {
    #[command(about = "List a directory")]
    Ls { path: String },
    #[command(about = "Show file or directory status")]
    Stat { path: String },
    #[command(about = "Create a directory and its parents")]
    Mkdirs { path: String },
    #[command(about = "Delete a file or directory")]
    Rm {
        path: String,
        #[arg(long, short)]
        recursive: bool,
    },
    #[command(about = "Move a file or directory")]
    Mv { source: String, destination: String },
    #[command(about = "Upload a local file (`-` for stdin) in 1 MB blocks")]
    Upload {
        #[arg(value_hint = ValueHint::FilePath)]
        local: PathBuf,
        path: String,
        #[arg(long)]
        overwrite: bool,
    },
    #[command(about = "Download a file to a local path")]
    Download {
        path: String,
        #[arg(value_hint = ValueHint::FilePath)]
        local: PathBuf,
    },
    #[command(about = "Write a file's raw bytes to stdout")]
    Cat { path: String },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AclPermissionCli {
    Read,
    Write,
    Manage,
}

impl From<AclPermissionCli> for AclPermission {
    fn from(value: AclPermissionCli) -> Self {
        match value {
            AclPermissionCli::Read => AclPermission::Read,
            AclPermissionCli::Write => AclPermission::Write,
            AclPermissionCli::Manage => AclPermission::Manage,
        }
    }
}

#[derive(Subcommand)]
enum SecretsCommand {
    #[command(about = "Create a secret scope; --json can describe an Azure Key Vault backend")]
    CreateScope {
        scope: String,
        #[arg(long, help = "Principal granted MANAGE (e.g. `users`)")]
        initial_manage_principal: Option<String>,
        #[command(flatten)]
        body: BodyArgs,
    },
    #[command(about = "Delete a secret scope")]
    DeleteScope { scope: String },
    #[command(about = "List secret scopes")]
    ListScopes,
    #[command(about = "Store a secret")]
    Put {
        scope: String,
        key: String,
        #[arg(
            long,
            conflicts_with = "bytes_file",
            required_unless_present = "bytes_file",
            help = "Secret as UTF-8 text"
        )]
        string_value: Option<String>,
        #[arg(long, value_hint = ValueHint::FilePath, help = "Secret bytes read from a file")]
        bytes_file: Option<PathBuf>,
    },
    #[command(about = "Delete a secret")]
    Delete { scope: String, key: String },
    #[command(about = "List secret keys in a scope (values are never returned)")]
    List { scope: String },
    #[command(about = "Grant a principal access to a scope")]
    PutAcl {
        scope: String,
        principal: String,
        #[arg(value_enum)]
        permission: AclPermissionCli,
    },
    #[command(about = "Remove a principal's access to a scope")]
    DeleteAcl { scope: String, principal: String },
    #[command(about = "Show one principal's access to a scope")]
    GetAcl { scope: String, principal: String },
    #[command(about = "List access rules of a scope")]
    ListAcls { scope: String },
}

#[derive(Subcommand)]
enum PermissionsCommand {
    #[command(about = "Show an object's access control list")]
    Get { object_type: String, object_id: String },
    #[command(about = "Replace direct permissions ({access_control_list} body)")]
    Set {
        object_type: String,
        object_id: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    #[command(about = "Add direct permissions ({access_control_list} body)")]
    Update {
        object_type: String,
        object_id: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    #[command(about = "List permission levels the object supports")]
    Levels { object_type: String, object_id: String },
}

#[derive(Subcommand)]
enum CatalogsCommand {
    List(PageArgs),
    Get {
        name: String,
    },
    Create(BodyArgs),
    Update {
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    Delete {
        name: String,
        #[arg(long, help = "Delete even when the catalog is not empty")]
        force: bool,
    },
}

#[derive(Subcommand)]
enum SchemasCommand {
    List {
        catalog_name: String,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        full_name: String,
    },
    Create(BodyArgs),
    Update {
        full_name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    Delete {
        full_name: String,
        #[arg(long, help = "Delete even when the schema is not empty")]
        force: bool,
    },
}

#[derive(Subcommand)]
enum TablesCommand {
    List {
        catalog_name: String,
        schema_name: String,
        #[command(flatten)]
        page: PageArgs,
    },
    #[command(about = "List table summaries across schemas (SQL LIKE patterns)")]
    Summaries {
        catalog_name: String,
        #[arg(long)]
        schema_pattern: Option<String>,
        #[arg(long)]
        table_pattern: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        full_name: String,
    },
    Exists {
        full_name: String,
    },
    #[command(about = "Change a table's owner")]
    SetOwner {
        full_name: String,
        owner: String,
    },
    Delete {
        full_name: String,
    },
}

#[derive(Subcommand)]
enum VolumesCommand {
    List {
        catalog_name: String,
        schema_name: String,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        full_name: String,
    },
    Create(BodyArgs),
    Update {
        full_name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    Delete {
        full_name: String,
    },
}

#[derive(Subcommand)]
enum ConnectionsCommand {
    List(PageArgs),
    Get {
        name: String,
    },
    Create(BodyArgs),
    Update {
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
enum SharesCommand {
    List(PageArgs),
    Get {
        name: String,
        #[arg(long, help = "Include the shared data objects")]
        include_shared_data: bool,
    },
    Create(BodyArgs),
    #[command(about = "Update a share; body carries owner, comment and object `updates`")]
    Update {
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    Delete {
        name: String,
    },
    #[command(about = "Show recipient grants on a share")]
    Permissions {
        name: String,
    },
    #[command(about = "Change recipient grants ({changes} body)")]
    UpdatePermissions {
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
}

#[derive(Subcommand)]
enum StorageCredentialsCommand {
    List(PageArgs),
    Get {
        name: String,
    },
    Create(BodyArgs),
    Update {
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    Delete {
        name: String,
        #[arg(long, help = "Delete even when external locations depend on it")]
        force: bool,
    },
    #[command(about = "Check that a credential can reach a location")]
    Validate(BodyArgs),
}

#[derive(Subcommand)]
enum BindingsCommand {
    #[command(about = "Workspace ids a catalog is bound to")]
    GetCatalog { catalog: String },
    #[command(about = "Assign or unassign workspaces for a catalog")]
    UpdateCatalog {
        catalog: String,
        #[arg(long = "assign", value_name = "WORKSPACE_ID")]
        assign: Vec<i64>,
        #[arg(long = "unassign", value_name = "WORKSPACE_ID")]
        unassign: Vec<i64>,
    },
    #[command(about = "Typed bindings of a catalog, external location or storage credential")]
    Get {
        securable_type: String,
        name: String,
    },
    #[command(about = "Add or remove typed bindings ({add, remove} body)")]
    Update {
        securable_type: String,
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
}

#[derive(Subcommand)]
enum GrantsCommand {
    #[command(about = "Direct grants on a securable")]
    Get {
        securable_type: String,
        full_name: String,
        #[arg(long)]
        principal: Option<String>,
    },
    #[command(about = "Direct and inherited grants on a securable")]
    Effective {
        securable_type: String,
        full_name: String,
        #[arg(long)]
        principal: Option<String>,
    },
    #[command(about = "Add or remove privileges ({changes} body)")]
    Update {
        securable_type: String,
        full_name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
}

#[derive(Subcommand)]
enum LineageCommand {
    #[command(about = "Upstream and downstream tables of a table")]
    Table {
        table_name: String,
        #[arg(long, help = "Also list notebooks, jobs and queries")]
        include_entity_lineage: bool,
    },
    #[command(about = "Upstream and downstream columns of a column")]
    Column {
        table_name: String,
        column_name: String,
    },
}

fn parse_duration(input: &str) -> Result<Duration, Error> {
    let invalid = || {
        Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use a number plus ms|s|m|h (e.g. 30s).")
    };
    let trimmed = input.trim();
    let split = trimmed.char_indices().find(|(_, ch)| !ch.is_ascii_digit());
    let (num_str, unit) = match split {
        Some((idx, _)) => trimmed.split_at(idx),
        None => ("", ""),
    };
    if num_str.is_empty() || unit.is_empty() {
        return Err(invalid());
    }
    let value: u64 = num_str.parse().map_err(|_| invalid())?;
    let millis = match unit {
        "ms" => value,
        "s" => value.saturating_mul(1_000),
        "m" => value.saturating_mul(60_000),
        "h" => value.saturating_mul(3_600_000),
        _ => return Err(invalid()),
    };
    Ok(Duration::from_millis(millis))
}

fn emit_version_output(color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!("dbrest {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(
            &json!({
                "name": "dbrest",
                "version": env!("CARGO_PKG_VERSION"),
            }),
            color_mode,
        );
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() || err.status().is_some() {
        return err;
    }
    if err.endpoint().is_some() {
        return err
            .with_hint("Check the workspace host (--host, DATABRICKS_HOST) and network access.");
    }
    err
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `dbrest --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "dbrest") else {
        return "Try `dbrest --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `dbrest --help`.".to_string();
    }
    format!("Try `dbrest {} --help`.", parts.join(" "))
}
