use crate::cli::ExportArgs;
use crate::error::ExportError;
use crate::options::{DateFormat, ExportOptions, LineTerminator, parse_delimiter};
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_LOGIN_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_TEXT_LEN: usize = 4000;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub options: ExportOptions,
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
    pub show_secrets: bool,
}

/// Database connection target and fetch tuning.
#[derive(Debug)]
pub struct ConnectionConfig {
    pub connect: String,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub login_timeout_secs: u32,
    pub batch_size: usize,
    pub max_text_len: usize,
}

// --- TOML config file structs ---

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    defaults: TomlDefaults,
    #[serde(default)]
    profiles: HashMap<String, TomlProfile>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDefaults {
    delimiter: Option<String>,
    null_text: Option<String>,
    date_format: Option<String>,
    with_header: Option<bool>,
    use_crlf: Option<bool>,
    verbose: Option<bool>,
    login_timeout: Option<u32>,
    batch_size: Option<usize>,
    max_text_len: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct TomlProfile {
    connect: Option<String>,
    user: Option<String>,
    password: Option<String>,
    password_env: Option<String>,
}

/// Config path resolution result, distinguishing explicit vs auto-resolved paths.
struct ResolvedConfigPath {
    path: PathBuf,
    /// true if user explicitly specified via --config or DBEXPORT_CONFIG
    explicit: bool,
}

/// Resolve the config file path: --config flag > env var > platform default.
fn resolve_config_path(cli_config: Option<&PathBuf>) -> Option<ResolvedConfigPath> {
    if let Some(path) = cli_config {
        return Some(ResolvedConfigPath { path: path.clone(), explicit: true });
    }
    if let Some(path) = env_non_empty("DBEXPORT_CONFIG") {
        return Some(ResolvedConfigPath { path: PathBuf::from(path), explicit: true });
    }
    ProjectDirs::from("", "", "dbexport").map(|dirs| ResolvedConfigPath {
        path: dirs.config_dir().join("config.toml"),
        explicit: false,
    })
}

/// Load and parse the TOML config file (if it exists).
fn load_toml_config(resolved: Option<&ResolvedConfigPath>) -> Result<TomlConfig, ExportError> {
    let resolved = match resolved {
        Some(r) => r,
        None => return Ok(TomlConfig::default()),
    };

    if !resolved.path.exists() {
        if resolved.explicit {
            return Err(ExportError::config(format!(
                "config file not found: {}",
                resolved.path.display()
            )));
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&resolved.path).map_err(|e| {
        ExportError::config(format!(
            "cannot read config file {}: {}",
            resolved.path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        ExportError::config(format!(
            "invalid config file {}: {}",
            resolved.path.display(),
            e
        ))
    })
}

/// `Some(s)` unless `s` is empty.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Read an env var, treating unset and empty the same.
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve a password from direct value, env indirection, or env var.
fn resolve_secret(
    direct: Option<&str>,
    env_key: Option<&str>,
    fallback_env: &str,
) -> Option<SecretString> {
    if let Some(val) = non_empty(direct) {
        return Some(SecretString::from(val.to_string()));
    }
    // Env indirection (e.g., password_env = "MY_SECRET")
    if let Some(key) = env_key
        && let Some(val) = env_non_empty(key)
    {
        return Some(SecretString::from(val));
    }
    env_non_empty(fallback_env).map(SecretString::from)
}

/// Build AppConfig from the export CLI args.
pub fn load_from_export_args(
    args: &ExportArgs,
    verbose: bool,
    show_secrets: bool,
    config_path: Option<&PathBuf>,
) -> Result<AppConfig, ExportError> {
    let resolved_path = resolve_config_path(config_path);
    let toml_config = load_toml_config(resolved_path.as_ref())?;

    let profile = args
        .profile
        .as_ref()
        .map(|name| {
            toml_config.profiles.get(name).cloned().ok_or_else(|| {
                ExportError::config(format!("profile '{}' not found in config file", name))
            })
        })
        .transpose()?;

    let profile = profile.unwrap_or_default();
    let defaults = &toml_config.defaults;

    // connect: CLI/ENV > profile > error
    let connect = non_empty(args.connect.as_deref())
        .or(non_empty(profile.connect.as_deref()))
        .ok_or_else(|| {
            ExportError::config("no connection specified: use --connect or configure a profile")
        })?
        .to_string();

    let user = non_empty(args.user.as_deref())
        .or(non_empty(profile.user.as_deref()))
        .map(|s| s.to_string());

    let password = resolve_secret(
        args.password.as_deref(),
        profile.password_env.as_deref(),
        "DBEXPORT_PASSWORD",
    )
    .or_else(|| {
        non_empty(profile.password.as_deref()).map(|p| SecretString::from(p.to_string()))
    });

    let connection = ConnectionConfig {
        connect,
        user,
        password,
        login_timeout_secs: args
            .login_timeout
            .or(defaults.login_timeout)
            .unwrap_or(DEFAULT_LOGIN_TIMEOUT_SECS),
        batch_size: positive(
            "batch size",
            args.batch_size.or(defaults.batch_size).unwrap_or(DEFAULT_BATCH_SIZE),
        )?,
        max_text_len: positive(
            "max text length",
            args.max_text_len
                .or(defaults.max_text_len)
                .unwrap_or(DEFAULT_MAX_TEXT_LEN),
        )?,
    };

    let delimiter = parse_delimiter(
        args.delimiter
            .as_deref()
            .or(defaults.delimiter.as_deref())
            .unwrap_or(""),
    )?;

    let date_format = match args.date_format.as_deref().or(defaults.date_format.as_deref()) {
        Some(pattern) => DateFormat::parse(pattern)?,
        None => DateFormat::default(),
    };

    let options = ExportOptions {
        delimiter,
        terminator: LineTerminator::from_crlf_flag(
            args.use_crlf || defaults.use_crlf.unwrap_or(false),
        ),
        emit_header: args.with_header || defaults.with_header.unwrap_or(false),
        null_text: args
            .null_text
            .clone()
            .or_else(|| defaults.null_text.clone())
            .unwrap_or_default(),
        date_format,
    };

    // verbose: CLI/ENV OR TOML default
    let verbose = verbose || defaults.verbose.unwrap_or(false);

    Ok(AppConfig {
        connection,
        options,
        output_file: args.output.clone(),
        verbose,
        show_secrets,
    })
}

fn positive(what: &str, value: usize) -> Result<usize, ExportError> {
    if value == 0 {
        return Err(ExportError::config(format!("{what} must be greater than zero")));
    }
    Ok(value)
}
