//! Purpose: Resolve workspace host and bearer token for the `dbrest` CLI.
//! Exports: `ConfigInputs`, `WorkspaceConfig`, `resolve_workspace`, `parse_profiles`.
//! Role: Merge flags, environment, token file and `~/.databrickscfg` profiles.
//! Invariants: Order is explicit flag, then environment, then profile; the first hit wins.
//! Invariants: `--token` and `--token-file` are mutually exclusive.
//! Invariants: A missing config file is only an error when a profile was named explicitly.
#![allow(clippy::result_large_err)]

use databricks_rest::api::{Error, ErrorKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_PROFILE: &str = "DEFAULT";

/// Raw values from the command line; `host` and `profile` already include clap's env fallback.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConfigInputs {
    pub(crate) host: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) token_file: Option<PathBuf>,
    pub(crate) profile: Option<String>,
}

#[derive(Clone, Eq, PartialEq)]
pub(crate) struct WorkspaceConfig {
    pub(crate) host: String,
    pub(crate) token: Option<String>,
}

impl std::fmt::Debug for WorkspaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceConfig")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

type Profiles = BTreeMap<String, BTreeMap<String, String>>;

pub(crate) fn resolve_workspace<F>(inputs: ConfigInputs, env: F) -> Result<WorkspaceConfig, Error>
where
    F: Fn(&str) -> Option<String>,
{
    if inputs.token.is_some() && inputs.token_file.is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--token cannot be combined with --token-file")
            .with_hint("Use --token-file to keep the token out of shell history."));
    }

    let mut host = non_empty(inputs.host);
    let mut token = match (non_empty(inputs.token), inputs.token_file) {
        (Some(token), _) => Some(token),
        (None, Some(path)) => Some(read_token_file(&path)?),
        (None, None) => non_empty(env("DATABRICKS_TOKEN")),
    };

    if host.is_none() || token.is_none() {
        let explicit = inputs.profile.is_some();
        let profile = inputs
            .profile
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        if let Some(section) = load_profile(&profile, explicit, &env)? {
            tracing::debug!(profile = %profile, "using config profile");
            host = host.or_else(|| non_empty(section.get("host").cloned()));
            token = token.or_else(|| non_empty(section.get("token").cloned()));
        }
    }

    let Some(host) = host else {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("workspace host is not configured")
            .with_hint(
                "Pass --host, set DATABRICKS_HOST, or add `host = ...` to a ~/.databrickscfg profile.",
            ));
    };
    Ok(WorkspaceConfig { host, token })
}

fn load_profile<F>(
    profile: &str,
    explicit: bool,
    env: &F,
) -> Result<Option<BTreeMap<String, String>>, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let path = config_file_path(env);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => return Ok(None),
        Err(err) => {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("failed to read config file {}", path.display()))
                .with_hint("Set DATABRICKS_CONFIG_FILE or create ~/.databrickscfg.")
                .with_source(err));
        }
    };
    let mut profiles = parse_profiles(&text);
    match profiles.remove(profile) {
        Some(section) => Ok(Some(section)),
        None if explicit => Err(Error::new(ErrorKind::NotFound)
            .with_message(format!("profile `{profile}` not found in {}", path.display()))
            .with_hint(format!(
                "Known profiles: {}.",
                known_profiles(&profiles)
            ))),
        None => Ok(None),
    }
}

fn known_profiles(profiles: &Profiles) -> String {
    if profiles.is_empty() {
        return "none".to_string();
    }
    profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

fn config_file_path<F>(env: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = non_empty(env("DATABRICKS_CONFIG_FILE")) {
        return PathBuf::from(path);
    }
    let home = env("HOME").or_else(|| env("USERPROFILE")).unwrap_or_default();
    PathBuf::from(home).join(".databrickscfg")
}

/// Parses the INI layout of `.databrickscfg`.
///
/// Keys before the first `[section]` belong to `DEFAULT`; later duplicates win.
pub(crate) fn parse_profiles(text: &str) -> Profiles {
    let mut profiles = Profiles::new();
    let mut current = DEFAULT_PROFILE.to_string();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            current = name.trim().to_string();
            profiles.entry(current.clone()).or_default();
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            profiles
                .entry(current.clone())
                .or_default()
                .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    profiles
}

fn read_token_file(path: &Path) -> Result<String, Error> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("failed to read token file {}", path.display()))
            .with_source(err)
    })?;
    let token = raw.trim().to_string();
    if token.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("token file {} is empty", path.display())));
    }
    Ok(token)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ConfigInputs, parse_profiles, resolve_workspace};
    use databricks_rest::api::ErrorKind;
    use std::collections::BTreeMap;
    use std::path::Path;

    const CFG: &str = "\
; shared settings
host = https://default.cloud.databricks.com
token = dapi-default

[staging]
host = https://staging.cloud.databricks.com
# no token here

[prod]
HOST=https://prod.cloud.databricks.com
token = dapi-prod
";

    fn env_with(config: &Path, pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let mut vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert(
            "DATABRICKS_CONFIG_FILE".to_string(),
            config.display().to_string(),
        );
        move |key| vars.get(key).cloned()
    }

    fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("databrickscfg");
        std::fs::write(&path, CFG).expect("write config");
        path
    }

    #[test]
    fn parses_sections_comments_and_leading_keys() {
        let profiles = parse_profiles(CFG);
        assert_eq!(
            profiles["DEFAULT"].get("token").map(String::as_str),
            Some("dapi-default")
        );
        assert_eq!(profiles["staging"].get("token"), None);
        assert_eq!(
            profiles["prod"].get("host").map(String::as_str),
            Some("https://prod.cloud.databricks.com")
        );
    }

    #[test]
    fn flags_win_over_environment_and_profile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(&dir);
        let env = env_with(&config, &[("DATABRICKS_TOKEN", "dapi-env")]);
        let resolved = resolve_workspace(
            ConfigInputs {
                host: Some("https://flag.example.com".to_string()),
                token: Some("dapi-flag".to_string()),
                ..ConfigInputs::default()
            },
            env,
        )
        .expect("resolve");
        assert_eq!(resolved.host, "https://flag.example.com");
        assert_eq!(resolved.token.as_deref(), Some("dapi-flag"));
    }

    #[test]
    fn environment_token_wins_over_profile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(&dir);
        let env = env_with(&config, &[("DATABRICKS_TOKEN", "dapi-env")]);
        let resolved = resolve_workspace(ConfigInputs::default(), env).expect("resolve");
        assert_eq!(resolved.host, "https://default.cloud.databricks.com");
        assert_eq!(resolved.token.as_deref(), Some("dapi-env"));
    }

    #[test]
    fn named_profile_fills_missing_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(&dir);
        let resolved = resolve_workspace(
            ConfigInputs {
                profile: Some("prod".to_string()),
                ..ConfigInputs::default()
            },
            env_with(&config, &[]),
        )
        .expect("resolve");
        assert_eq!(resolved.host, "https://prod.cloud.databricks.com");
        assert_eq!(resolved.token.as_deref(), Some("dapi-prod"));
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(&dir);
        let err = resolve_workspace(
            ConfigInputs {
                profile: Some("qa".to_string()),
                ..ConfigInputs::default()
            },
            env_with(&config, &[]),
        )
        .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.hint().unwrap_or_default().contains("staging"));
    }

    #[test]
    fn token_file_is_trimmed_and_exclusive_with_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "dapi-file\n").expect("write token");
        let missing = dir.path().join("missing.cfg");

        let resolved = resolve_workspace(
            ConfigInputs {
                host: Some("adb-1.2.azuredatabricks.net".to_string()),
                token_file: Some(token_path.clone()),
                ..ConfigInputs::default()
            },
            env_with(&missing, &[("DATABRICKS_TOKEN", "dapi-env")]),
        )
        .expect("resolve");
        assert_eq!(resolved.token.as_deref(), Some("dapi-file"));

        let err = resolve_workspace(
            ConfigInputs {
                host: Some("adb-1.2.azuredatabricks.net".to_string()),
                token: Some("dapi-flag".to_string()),
                token_file: Some(token_path),
                ..ConfigInputs::default()
            },
            env_with(&missing, &[]),
        )
        .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn missing_host_is_a_usage_error_with_hint() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.cfg");
        let err = resolve_workspace(ConfigInputs::default(), env_with(&missing, &[]))
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }
}
