// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::app::lifecycle::{
    DEFAULT_CHECK_STATUS_PERIOD, DEFAULT_SSH_OPTIONS, LifecycleSettings, OutputTemplate,
    default_outputs,
};
use crate::app::services::templates::{DEFAULT_JOB_SCRIPT, ResourceRequest};
use crate::app::types::{RemoteHost, SchedulerStates};

const APP_DIR_NAME: &str = "g09wrap";
const CONFIG_FILE_NAME: &str = "g09wrap.toml";
pub const CONFIG_ENV_VAR: &str = "G09WRAP_CONFIG_PATH";

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    remote_host: Option<String>,
    ssh_port: Option<u16>,
    identity_file: Option<String>,
    ssh_options: Option<Vec<String>>,
    remote_test_command: Option<String>,
    remote_wd: Option<String>,
    remote_wd_setup: Option<String>,
    remote_job_submit: Option<String>,
    submit_command: Option<String>,
    status_command: Option<String>,
    check_status_period_secs: Option<u64>,
    waiting_states: Option<Vec<String>>,
    complete_states: Option<Vec<String>>,
    error_states: Option<Vec<String>>,
    max_unknown_polls: Option<u32>,
    poll_timeout_secs: Option<u64>,
    recheck_connection_on_unknown: Option<bool>,
    executable: Option<String>,
    job_template: Option<String>,
    resources: Option<FileResources>,
    outputs: Option<Vec<FileOutput>>,
    log_file: Option<String>,
    verbose: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileResources {
    walltime: Option<String>,
    memory: Option<String>,
    nodes: Option<u32>,
    cores_per_node: Option<u32>,
    gaussian_memory: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileOutput {
    remote: String,
    local: Option<String>,
    #[serde(default)]
    echo: bool,
}

#[derive(Debug)]
pub struct Config {
    pub settings: LifecycleSettings,
    /// Explicit log file; `None` means `<job name>.log` in the current directory.
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
    #[allow(dead_code)]
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Override,
    Env,
    ConfigFile,
    Default,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Override => "override",
            ConfigSource::Env => "env",
            ConfigSource::ConfigFile => "config",
            ConfigSource::Default => "default",
        }
    }
}

#[derive(Debug)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

#[derive(Debug)]
pub struct ConfigReport {
    pub config_path: Option<PathBuf>,
    pub config_path_source: Option<ConfigSource>,
    pub config_file_present: bool,
    pub remote_host: ConfigValue<String>,
    pub check_status_period_secs: ConfigValue<u64>,
    pub executable: ConfigValue<String>,
    pub job_template: ConfigValue<Option<PathBuf>>,
    pub verbose: ConfigValue<bool>,
}

#[derive(Debug)]
pub struct LoadResult {
    pub config: Config,
    pub report: ConfigReport,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub remote_host: Option<String>,
    pub check_status_period_secs: Option<u64>,
    pub executable: Option<String>,
    pub max_unknown_polls: Option<u32>,
    pub poll_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub verbose: Option<bool>,
}

#[allow(dead_code)]
pub fn load(config_path_override: Option<PathBuf>, overrides: Overrides) -> Result<Config> {
    Ok(load_with_report(config_path_override, overrides)?.config)
}

pub fn load_with_report(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<LoadResult> {
    let (config_path, config_path_source, required) = match config_path_override {
        Some(path) => (Some(expand_path(path)), Some(ConfigSource::Override), true),
        None => match config_path_from_env()? {
            Some(path) => (Some(expand_path(path)), Some(ConfigSource::Env), true),
            None => match default_config_path().ok() {
                Some(path) => (Some(path), Some(ConfigSource::Default), false),
                None => (None, None, false),
            },
        },
    };
    let config_file_present = config_path
        .as_deref()
        .map(|path| path.exists())
        .unwrap_or(false);

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };
    let config_dir = config_path.as_deref().and_then(|path| path.parent());

    let (remote_host, remote_host_source) = match overrides.remote_host {
        Some(host) => (host, ConfigSource::Override),
        None => match file_config.remote_host {
            Some(host) => (host, ConfigSource::ConfigFile),
            None => anyhow::bail!(
                "remote_host is not set; pass --host or set remote_host in the config file"
            ),
        },
    };
    let remote_host = remote_host.trim().to_string();
    if remote_host.is_empty() {
        anyhow::bail!("remote_host must not be empty");
    }

    let (check_status_period_secs, check_status_period_source) = layered(
        overrides.check_status_period_secs,
        file_config.check_status_period_secs,
        DEFAULT_CHECK_STATUS_PERIOD.as_secs(),
    );
    if check_status_period_secs == 0 {
        anyhow::bail!("check_status_period_secs must be at least 1");
    }

    let mut settings = LifecycleSettings::new(RemoteHost {
        port: file_config.ssh_port,
        identity_file: file_config
            .identity_file
            .as_deref()
            .map(|raw| resolve_path(raw, config_dir)),
        options: file_config.ssh_options.unwrap_or_else(|| {
            DEFAULT_SSH_OPTIONS
                .iter()
                .map(|option| option.to_string())
                .collect()
        }),
        ..RemoteHost::new(remote_host.clone())
    });
    if settings.host.port == Some(0) {
        anyhow::bail!("ssh_port must be between 1 and 65535");
    }
    settings.check_status_period = Duration::from_secs(check_status_period_secs);

    let (executable, executable_source) = layered(
        overrides.executable,
        file_config.executable,
        settings.executable.clone(),
    );
    settings.executable = executable;

    for (slot, value) in [
        (&mut settings.remote_test_command, file_config.remote_test_command),
        (&mut settings.remote_wd, file_config.remote_wd),
        (&mut settings.remote_wd_setup, file_config.remote_wd_setup),
        (&mut settings.remote_job_submit, file_config.remote_job_submit),
        (&mut settings.submit_command, file_config.submit_command),
        (&mut settings.status_command, file_config.status_command),
    ] {
        if let Some(value) = value {
            *slot = value;
        }
    }

    settings.states = scheduler_states(
        file_config.waiting_states,
        file_config.complete_states,
        file_config.error_states,
    )?;

    settings.max_unknown_polls = overrides
        .max_unknown_polls
        .or(file_config.max_unknown_polls);
    if settings.max_unknown_polls == Some(0) {
        anyhow::bail!("max_unknown_polls must be at least 1");
    }
    let poll_timeout_secs = overrides
        .poll_timeout_secs
        .or(file_config.poll_timeout_secs);
    if poll_timeout_secs == Some(0) {
        anyhow::bail!("poll_timeout_secs must be at least 1");
    }
    settings.poll_timeout = poll_timeout_secs.map(Duration::from_secs);
    if let Some(recheck) = file_config.recheck_connection_on_unknown {
        settings.recheck_connection_on_unknown = recheck;
    }

    let job_template = file_config
        .job_template
        .as_deref()
        .map(|raw| resolve_path(raw, config_dir));
    settings.job_script_template = match job_template.as_deref() {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read job template {}", path.display()))?,
        None => DEFAULT_JOB_SCRIPT.to_string(),
    };
    let job_template_source = if job_template.is_some() {
        ConfigSource::ConfigFile
    } else {
        ConfigSource::Default
    };

    if let Some(resources) = file_config.resources {
        settings.resources = merge_resources(resources)?;
    }
    if let Some(outputs) = file_config.outputs {
        settings.outputs = outputs
            .into_iter()
            .map(|output| OutputTemplate {
                remote: output.remote,
                local: output.local.map(PathBuf::from).map(expand_path),
                echo: output.echo,
            })
            .collect();
    } else {
        settings.outputs = default_outputs();
    }
    if settings.outputs.iter().any(|output| output.remote.trim().is_empty()) {
        anyhow::bail!("outputs entries need a non-empty remote path");
    }

    let log_file = overrides
        .log_file
        .map(expand_path)
        .or_else(|| file_config.log_file.map(PathBuf::from).map(expand_path));
    let (verbose, verbose_source) = layered(overrides.verbose, file_config.verbose, false);

    let config = Config {
        settings,
        log_file,
        verbose,
        config_path: config_path.clone(),
    };

    let report = ConfigReport {
        config_path,
        config_path_source,
        config_file_present,
        remote_host: ConfigValue {
            value: remote_host,
            source: remote_host_source,
        },
        check_status_period_secs: ConfigValue {
            value: check_status_period_secs,
            source: check_status_period_source,
        },
        executable: ConfigValue {
            value: config.settings.executable.clone(),
            source: executable_source,
        },
        job_template: ConfigValue {
            value: job_template,
            source: job_template_source,
        },
        verbose: ConfigValue {
            value: config.verbose,
            source: verbose_source,
        },
    };

    Ok(LoadResult { config, report })
}

fn layered<T>(override_value: Option<T>, file_value: Option<T>, default: T) -> (T, ConfigSource) {
    match override_value {
        Some(value) => (value, ConfigSource::Override),
        None => match file_value {
            Some(value) => (value, ConfigSource::ConfigFile),
            None => (default, ConfigSource::Default),
        },
    }
}

fn scheduler_states(
    waiting: Option<Vec<String>>,
    complete: Option<Vec<String>>,
    error: Option<Vec<String>>,
) -> Result<SchedulerStates> {
    let defaults = SchedulerStates::default();
    let to_set = |tokens: Vec<String>| -> BTreeSet<String> {
        tokens
            .into_iter()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect()
    };
    let states = SchedulerStates {
        waiting: waiting.map(to_set).unwrap_or(defaults.waiting),
        complete: complete.map(to_set).unwrap_or(defaults.complete),
        error: error.map(to_set).unwrap_or(defaults.error),
    };

    if states.complete.is_empty() {
        anyhow::bail!("complete_states must name at least one scheduler state");
    }
    if let Some(token) = states.waiting.intersection(&states.complete).next() {
        anyhow::bail!("state '{token}' is listed in both waiting_states and complete_states");
    }
    if let Some(token) = states.error.difference(&states.complete).next() {
        anyhow::bail!("error state '{token}' must also be listed in complete_states");
    }
    Ok(states)
}

fn merge_resources(file: FileResources) -> Result<ResourceRequest> {
    let defaults = ResourceRequest::default();
    let resources = ResourceRequest {
        walltime: file.walltime.unwrap_or(defaults.walltime),
        memory: file.memory.unwrap_or(defaults.memory),
        nodes: file.nodes.unwrap_or(defaults.nodes),
        cores_per_node: file.cores_per_node.unwrap_or(defaults.cores_per_node),
        gaussian_memory: file.gaussian_memory.unwrap_or(defaults.gaussian_memory),
    };
    if resources.nodes == 0 || resources.cores_per_node == 0 {
        anyhow::bail!("resources.nodes and resources.cores_per_node must be at least 1");
    }
    Ok(resources)
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn resolve_path(raw: &str, base_dir: Option<&Path>) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        return path;
    }
    match base_dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn config_path_from_env() -> Result<Option<PathBuf>> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) => {
            if value.is_empty() {
                anyhow::bail!("{CONFIG_ENV_VAR} is set but empty");
            }
            Ok(Some(PathBuf::from(value)))
        }
        None => Ok(None),
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
