use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use crate::cache::LicenseStore;
use crate::cli::{CommonArgs, LicensesCli, WhitesourceCli};
use crate::error::ScoutError;
use crate::github::GithubClient;
use crate::http::HttpClient;
use crate::licenses;
use crate::manifest;
use crate::output;
use crate::progress;
use crate::types::{DependencyRecord, SubmissionPayload};
use crate::whitesource::{self, SubmissionTokens, WhitesourceClient};

const NOTHING_TO_DO: &str = "依存関係がありません。処理は不要です。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Failure => ExitCode::FAILURE,
        }
    }
}

fn load_records(repo_dir: &Path, common: &CommonArgs) -> Result<Vec<DependencyRecord>> {
    let command = common.manifest_command()?;
    progress::with_spinner("依存関係を取得中...", |_| {
        manifest::read_manifest(repo_dir, &command)
    })
}

fn github_client(common: &CommonArgs) -> Result<GithubClient> {
    let http = HttpClient::new(common.http_settings())?;
    Ok(GithubClient::new(
        http,
        &common.github_api_url,
        common.github_token.clone(),
    ))
}

pub fn run_licenses(cli: &LicensesCli) -> Result<RunStatus> {
    println!("> Goの依存関係を取得し、ライセンスを保存します...");
    let records = load_records(&cli.repo_dir, &cli.common)?;
    debug!(count = records.len(), "マニフェストを読み込みました");
    if records.is_empty() {
        println!("{NOTHING_TO_DO}");
        return Ok(RunStatus::Success);
    }

    let store = LicenseStore::open(&cli.licenses_dir)?;
    let github = github_client(&cli.common)?;
    let report = licenses::fetch_licenses(
        &records,
        &github,
        &store,
        cli.stale_policy,
        cli.common.concurrency,
    )?;

    output::print_license_table(&report);
    output::output_json(&report, cli.print_json, cli.json_output.as_deref())?;

    if report.all_resolved() {
        println!("完了しました。");
        Ok(RunStatus::Success)
    } else {
        let missing: Vec<_> = report.unresolved().map(|e| e.module.as_str()).collect();
        println!("ERROR: 一部のライセンスが見つかりませんでした。");
        info!(modules = ?missing, "ライセンス未取得");
        Ok(RunStatus::Failure)
    }
}

fn require(value: &Option<String>, name: &'static str) -> Result<String, ScoutError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or(ScoutError::MissingEnv { name })
}

pub fn run_whitesource(cli: &WhitesourceCli) -> Result<RunStatus> {
    println!("> Gopkg.lockをWhiteSource APIのペイロードに変換します...");

    let records = load_records(&cli.repo_dir, &cli.common)?;
    if whitesource::submission_records(&records).is_empty() {
        println!("{NOTHING_TO_DO}");
        return Ok(RunStatus::Success);
    }

    let github = github_client(&cli.common)?;
    let dependencies = whitesource::convert_dependencies(&records, &github, cli.common.concurrency)?;
    output::print_dependency_table(&dependencies);

    if cli.dry_run {
        let payload = SubmissionPayload {
            project_token: cli.project_token.clone().unwrap_or_default(),
            dependencies,
        };
        println!("> --dry-run のため送信しません。ペイロード:");
        output::print_pretty(&payload)?;
        return Ok(RunStatus::Success);
    }

    let tokens = SubmissionTokens {
        org: require(&cli.org_token, "WHITESOURCE_ORG_TOKEN")?,
        product: require(&cli.product_token, "WHITESOURCE_PRODUCT_TOKEN")?,
    };
    let payload = SubmissionPayload {
        project_token: require(&cli.project_token, "WHITESOURCE_PROJECT_TOKEN")?,
        dependencies,
    };

    println!();
    println!("> WhiteSourceへ依存関係を送信中...");
    let form = whitesource::submission_form(&payload, &tokens, Utc::now().timestamp_millis())?;
    let client = WhitesourceClient::new(HttpClient::new(cli.common.http_settings())?, &cli.whitesource_url);
    let response = client.submit(&form)?;
    output::print_pretty(&response.body)?;

    if !response.status.is_success() {
        return Err(ScoutError::SubmissionRejected {
            status: response.status.as_u16(),
        }
        .into());
    }
    Ok(RunStatus::Success)
}
