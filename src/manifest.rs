use std::path::Path;
use std::process::Command;

use anyhow::Result;
use tracing::debug;

use crate::error::ScoutError;
use crate::types::DependencyRecord;

pub const DEFAULT_DEP_COMMAND: &str = "dep status -json";

/// 依存関係マニフェストを出力する外部コマンド。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ManifestCommand {
    fn default() -> Self {
        Self::parse(DEFAULT_DEP_COMMAND).unwrap_or_else(|| Self {
            program: "dep".to_string(),
            args: vec!["status".to_string(), "-json".to_string()],
        })
    }
}

impl ManifestCommand {
    /// 空白区切りのコマンドラインを分解する。空文字なら `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn read_manifest(repo_dir: &Path, command: &ManifestCommand) -> Result<Vec<DependencyRecord>> {
    if !repo_dir.is_dir() {
        return Err(ScoutError::RepoNotFound {
            path: repo_dir.to_path_buf(),
        }
        .into());
    }

    let shown = command.display();
    debug!(command = %shown, dir = %repo_dir.display(), "マニフェストを取得");

    let output = Command::new(&command.program)
        .args(&command.args)
        .current_dir(repo_dir)
        .output()
        .map_err(|source| ScoutError::DepSpawn {
            command: shown.clone(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !output.status.success() {
        return Err(ScoutError::DepFailed {
            command: shown,
            status: output.status.to_string(),
            stderr,
        }
        .into());
    }
    if !stderr.is_empty() {
        return Err(ScoutError::DepStderr {
            command: shown,
            stderr,
        }
        .into());
    }

    Ok(parse_manifest(&String::from_utf8_lossy(&output.stdout))?)
}

pub fn parse_manifest(text: &str) -> Result<Vec<DependencyRecord>, ScoutError> {
    serde_json::from_str(text.trim()).map_err(|source| ScoutError::ManifestParse { source })
}
