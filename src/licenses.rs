use anyhow::Result;
use clap::ValueEnum;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::LicenseStore;
use crate::github::{GithubClient, LicenseResponse};
use crate::pool;
use crate::types::{DependencyRecord, ModuleCoordinates};

pub const GOLANG_SYS: &str = "golang.org/x/sys";
const GOLANG_SYS_MIRROR: &str = "github.com/golang/sys";

/// GitHubが200以外を返したとき、既存のライセンスファイルで代用するかどうか。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StalePolicy {
    #[default]
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LicenseOutcome {
    Retrieved,
    OnDisk { http_status: u16 },
    Missing { http_status: u16 },
    Failed { error: String },
}

impl LicenseOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Retrieved | Self::OnDisk { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Retrieved => "retrieved",
            Self::OnDisk { .. } => "on disk",
            Self::Missing { .. } => "missing",
            Self::Failed { .. } => "failed",
        }
    }

    /// ログ用の一文。
    pub fn describe(&self) -> String {
        match self {
            Self::Retrieved => "GitHubから取得しました。".to_string(),
            Self::OnDisk { .. } => "既存のファイルを使用します。".to_string(),
            Self::Missing { http_status } => {
                format!("ライセンスが見つかりません (HTTP {http_status})")
            }
            Self::Failed { error } => format!("取得に失敗しました: {error}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseEntry {
    pub module: String,
    pub owner: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: LicenseOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LicenseReport {
    pub entries: Vec<LicenseEntry>,
}

impl LicenseReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &LicenseEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_resolved())
    }

    pub fn all_resolved(&self) -> bool {
        self.unresolved().next().is_none()
    }
}

/// ライセンス取得用の座標。`golang.org/x/sys` はGitHubのミラーに読み替える。
pub fn license_coordinates(project_root: &str) -> ModuleCoordinates {
    let path = if project_root == GOLANG_SYS {
        GOLANG_SYS_MIRROR
    } else {
        project_root
    };
    ModuleCoordinates::from_module_path(path)
}

pub fn fetch_licenses(
    records: &[DependencyRecord],
    github: &GithubClient,
    store: &LicenseStore,
    policy: StalePolicy,
    concurrency: usize,
) -> Result<LicenseReport> {
    if records.is_empty() {
        return Ok(LicenseReport::default());
    }

    let entries = pool::run_bounded(concurrency, "ライセンスを取得中", records, |record| {
        fetch_one(record, github, store, policy)
    })?;
    Ok(LicenseReport { entries })
}

fn fetch_one(
    record: &DependencyRecord,
    github: &GithubClient,
    store: &LicenseStore,
    policy: StalePolicy,
) -> LicenseEntry {
    let coords = license_coordinates(&record.project_root);
    let slug = coords.slug();

    let outcome = match github.fetch_license(&coords) {
        Ok(LicenseResponse::Found(text)) => match store.write(&coords, &text) {
            Ok(_) => LicenseOutcome::Retrieved,
            Err(err) => LicenseOutcome::Failed {
                error: format!("{err:#}"),
            },
        },
        Ok(LicenseResponse::Unavailable(status)) => fallback_outcome(&coords, status, store, policy),
        Err(err) => LicenseOutcome::Failed {
            error: format!("{err:#}"),
        },
    };

    if outcome.is_resolved() {
        info!("{slug}: {}", outcome.describe());
    } else {
        warn!("{slug}: {}", outcome.describe());
    }

    LicenseEntry {
        module: record.project_root.clone(),
        owner: coords.owner,
        name: coords.name,
        outcome,
    }
}

fn fallback_outcome(
    coords: &ModuleCoordinates,
    status: StatusCode,
    store: &LicenseStore,
    policy: StalePolicy,
) -> LicenseOutcome {
    let http_status = status.as_u16();

    if policy == StalePolicy::Accept && store.contains(coords) {
        if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
            warn!(
                "{}: HTTP {status} のため既存ファイルを使用します (レート制限の可能性)",
                coords.slug()
            );
        }
        return LicenseOutcome::OnDisk { http_status };
    }

    LicenseOutcome::Missing { http_status }
}
