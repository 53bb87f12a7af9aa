// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeMap;
use std::error::Error as _;

use serde::Serialize;
use tera::Context;

use crate::app::errors::{AppResult, template_error};

/// PBS/Torque script used when no custom template is configured.
pub const DEFAULT_JOB_SCRIPT: &str = r#"#!/bin/bash
#PBS -S /bin/bash
#PBS -l walltime={{ walltime }}
#PBS -l mem={{ memory }}
#PBS -l nodes={{ nodes }}:ppn={{ cores_per_node }}

# module load gaussian

export GAUSS_MDEF={{ gaussian_memory }}
export GAUSS_CDEF={{ gaussian_cpus }}

cd {{ remote_wd }}
pwd
{{ executable }} {{ filename }}
exit $?
"#;

/// Batch resource request rendered into the job script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRequest {
    pub walltime: String,
    pub memory: String,
    pub nodes: u32,
    pub cores_per_node: u32,
    pub gaussian_memory: String,
}

impl Default for ResourceRequest {
    fn default() -> Self {
        Self {
            walltime: "01:00:00".to_string(),
            memory: "32GB".to_string(),
            nodes: 1,
            cores_per_node: 16,
            gaussian_memory: "30GB".to_string(),
        }
    }
}

impl ResourceRequest {
    /// Gaussian CPU list covering every core of one node, e.g. `0-15`.
    pub fn gaussian_cpus(&self) -> String {
        match self.cores_per_node {
            0 | 1 => "0".to_string(),
            n => format!("0-{}", n - 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScriptParams<'a> {
    pub job_name: &'a str,
    pub remote_wd: &'a str,
    pub executable: &'a str,
    pub filename: &'a str,
    pub resources: &'a ResourceRequest,
}

#[derive(Serialize)]
struct JobScriptContext<'a> {
    job_name: &'a str,
    remote_wd: &'a str,
    executable: &'a str,
    filename: &'a str,
    walltime: &'a str,
    memory: &'a str,
    nodes: u32,
    cores_per_node: u32,
    gaussian_memory: &'a str,
    gaussian_cpus: String,
}

/// Renders `template` with the given string values.
/// Undefined variables and malformed tags are errors; nothing is ever silently blanked.
pub fn render(template: &str, values: &BTreeMap<&str, &str>) -> AppResult<String> {
    let mut context = Context::new();
    for (name, value) in values {
        context.insert(*name, value);
    }
    render_with_context(template, &context)
}

pub fn render_job_script(template: &str, params: &JobScriptParams<'_>) -> AppResult<String> {
    let values = JobScriptContext {
        job_name: params.job_name,
        remote_wd: params.remote_wd,
        executable: params.executable,
        filename: params.filename,
        walltime: &params.resources.walltime,
        memory: &params.resources.memory,
        nodes: params.resources.nodes,
        cores_per_node: params.resources.cores_per_node,
        gaussian_memory: &params.resources.gaussian_memory,
        gaussian_cpus: params.resources.gaussian_cpus(),
    };
    let context = Context::from_serialize(&values)
        .map_err(|err| template_error(format!("failed to build template context: {err}")))?;
    render_with_context(template, &context)
}

fn render_with_context(template: &str, context: &Context) -> AppResult<String> {
    tera::Tera::one_off(template, context, false)
        .map_err(|err| template_error(format!("template render failed: {}", describe(&err))))
}

// tera keeps the useful part (which variable, which line) in the source chain.
fn describe(err: &tera::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::errors::{AppErrorKind, codes};

    fn params<'a>(resources: &'a ResourceRequest) -> JobScriptParams<'a> {
        JobScriptParams {
            job_name: "job",
            remote_wd: "/scratch/$USER/job",
            executable: "g09",
            filename: "job.inp",
            resources,
        }
    }

    #[test]
    fn renders_default_script_with_invocation() {
        let resources = ResourceRequest::default();
        let script = render_job_script(DEFAULT_JOB_SCRIPT, &params(&resources)).expect("render");
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("\ncd /scratch/$USER/job\n"));
        assert!(script.contains("\ng09 job.inp\n"));
        assert!(script.contains("#PBS -l nodes=1:ppn=16\n"));
        assert!(script.contains("export GAUSS_CDEF=0-15\n"));
        assert!(script.ends_with("exit $?\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let resources = ResourceRequest::default();
        let first = render_job_script(DEFAULT_JOB_SCRIPT, &params(&resources)).expect("first");
        let second = render_job_script(DEFAULT_JOB_SCRIPT, &params(&resources)).expect("second");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn undefined_variable_fails_loudly() {
        let resources = ResourceRequest::default();
        let err = render_job_script("cd {{ remote_dir }}\n", &params(&resources))
            .expect_err("must fail");
        assert_eq!(err.kind(), AppErrorKind::Config);
        assert_eq!(err.code(), codes::TEMPLATE_ERROR);
        assert!(err.message().contains("remote_dir"), "{}", err.message());
    }

    #[test]
    fn malformed_tag_fails_loudly() {
        let values = BTreeMap::from([("job_name", "job")]);
        let err = render("/scratch/{{ job_name", &values).expect_err("must fail");
        assert_eq!(err.code(), codes::TEMPLATE_ERROR);
    }

    #[test]
    fn renders_command_templates_verbatim_around_tags() {
        let values = BTreeMap::from([("job_id", "1234.pbs")]);
        let rendered = render(
            "qstat -f {{ job_id }} | awk '/job_state/ {print $NF}' ",
            &values,
        )
        .expect("render");
        assert_eq!(rendered, "qstat -f 1234.pbs | awk '/job_state/ {print $NF}' ");
    }

    #[test]
    fn single_core_nodes_use_cpu_zero() {
        let resources = ResourceRequest {
            cores_per_node: 1,
            ..ResourceRequest::default()
        };
        assert_eq!(resources.gaussian_cpus(), "0");
    }
}
