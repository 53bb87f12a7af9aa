// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Content-addressed store of tonto interaction-energy runs.
//!
//! Each entry lives in `<root>/<sha1 of the latin-1 encoded input>/` and holds the input as `stdin`,
//! copies of the wavefunction files it references and, once computed, `stdout`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use sha1::{Digest, Sha1};

pub const DEFAULT_STORAGE_DIR: &str = "tonto_hpc_files";
const STORED_INPUT: &str = "stdin";
const STORED_OUTPUT: &str = "stdout";
const WAVEFUNCTION_PATTERN: &str = r#""(.*)\.(FChk|sbf|fchk)""#;
const INTERACTION_ENERGY_KEYWORD: &str = "put_group_12_energies";

pub fn is_interaction_energy_input(contents: &str) -> bool {
    contents.contains(INTERACTION_ENERGY_KEYWORD)
}

/// Cache key shared with entries written by the earlier Python tool, so existing
/// `tonto_hpc_files/` directories keep hitting.
pub fn input_key(contents: &str) -> Result<String> {
    Ok(format!("{:x}", Sha1::digest(latin1_bytes(contents)?)))
}

fn latin1_bytes(contents: &str) -> Result<Vec<u8>> {
    contents
        .chars()
        .map(|c| {
            u8::try_from(c)
                .map_err(|_| anyhow!("input contains {c:?}, which has no latin-1 encoding"))
        })
        .collect()
}

/// Quoted wavefunction file names referenced by the input, in order of appearance.
pub fn referenced_wavefunctions(contents: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(WAVEFUNCTION_PATTERN).context("invalid wavefunction pattern")?;
    Ok(pattern
        .captures_iter(contents)
        .map(|caps| format!("{}.{}", &caps[1], &caps[2]))
        .collect())
}

#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn entry_dir(&self, contents: &str) -> Result<PathBuf> {
        Ok(self.root.join(input_key(contents)?))
    }

    /// Stored output for this input, if a previous run produced one.
    pub fn lookup(&self, contents: &str) -> Result<Option<String>> {
        let path = self.entry_dir(contents)?.join(STORED_OUTPUT);
        if !path.exists() {
            return Ok(None);
        }
        let stored = fs::read_to_string(&path)
            .with_context(|| format!("failed to read cached output {}", path.display()))?;
        Ok(Some(stored))
    }

    /// Records the input and copies its wavefunctions (resolved against `work_dir`)
    /// into the entry directory. Returns the entry directory.
    pub fn store_input(&self, contents: &str, work_dir: &Path) -> Result<PathBuf> {
        let dir = self.entry_dir(contents)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache entry {}", dir.display()))?;
        fs::write(dir.join(STORED_INPUT), contents)
            .with_context(|| format!("failed to store input in {}", dir.display()))?;

        for name in referenced_wavefunctions(contents)? {
            let source = work_dir.join(&name);
            let file_name = Path::new(&name)
                .file_name()
                .with_context(|| format!("wavefunction reference '{name}' has no file name"))?;
            fs::copy(&source, dir.join(file_name)).with_context(|| {
                format!("failed to copy wavefunction {} into cache", source.display())
            })?;
            tracing::debug!("cached wavefunction {}", source.display());
        }
        Ok(dir)
    }

    pub fn store_output(&self, contents: &str, output: &str) -> Result<()> {
        let dir = self.entry_dir(contents)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache entry {}", dir.display()))?;
        fs::write(dir.join(STORED_OUTPUT), output)
            .with_context(|| format!("failed to store output in {}", dir.display()))
    }
}
