use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Args, Parser};

use crate::http::{GITHUB_API_URL, HttpSettings, WHITESOURCE_URL};
use crate::licenses::StalePolicy;
use crate::manifest::{DEFAULT_DEP_COMMAND, ManifestCommand};
use crate::pool::DEFAULT_CONCURRENCY;

#[derive(Parser, Debug)]
#[command(
    name = "godep-licenses",
    author,
    version,
    about = "dep管理下のGoプロジェクトの依存ライセンスをGitHubから取得して保存するCLI",
    long_about = None
)]
pub struct LicensesCli {
    /// `dep status -json` を実行するリポジトリのディレクトリ。
    #[arg(value_name = "REPO_DIR")]
    pub repo_dir: PathBuf,

    /// ライセンスファイルの保存先ディレクトリ。存在しなければ作成します。
    #[arg(value_name = "LICENSES_DIR")]
    pub licenses_dir: PathBuf,

    /// GitHubが200以外を返したとき、既存のライセンスファイルを有効とみなすか。
    #[arg(long = "stale-policy", value_enum, default_value_t = StalePolicy::Accept)]
    pub stale_policy: StalePolicy,

    /// 取得結果のJSONを書き出すファイルパス。
    #[arg(long = "json-output", value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// 取得結果のJSONを標準出力へ出す場合は指定してください。
    #[arg(long = "print-json")]
    pub print_json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
#[command(
    name = "godep-whitesource",
    author,
    version,
    about = "dep管理下のGoプロジェクトの依存関係をWhiteSourceへ送信するCLI",
    long_about = None
)]
pub struct WhitesourceCli {
    /// `dep status -json` を実行するリポジトリのディレクトリ。
    #[arg(value_name = "REPO_DIR")]
    pub repo_dir: PathBuf,

    /// 送信せずにペイロードだけを表示します。
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// WhiteSourceのプロジェクトトークン。
    #[arg(long = "project-token", env = "WHITESOURCE_PROJECT_TOKEN", hide_env_values = true)]
    pub project_token: Option<String>,

    /// WhiteSourceの組織トークン。
    #[arg(long = "org-token", env = "WHITESOURCE_ORG_TOKEN", hide_env_values = true)]
    pub org_token: Option<String>,

    /// WhiteSourceのプロダクトトークン。
    #[arg(long = "product-token", env = "WHITESOURCE_PRODUCT_TOKEN", hide_env_values = true)]
    pub product_token: Option<String>,

    /// 送信先のWhiteSource agent API。
    #[arg(long = "whitesource-url", value_name = "URL", default_value = WHITESOURCE_URL)]
    pub whitesource_url: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// 両CLIで共通の通信・実行オプション。
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// GitHub APIのトークン。
    #[arg(long = "github-token", env = "CHANGELOG_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub APIのベースURL。
    #[arg(long = "github-api-url", value_name = "URL", default_value = GITHUB_API_URL)]
    pub github_api_url: String,

    /// 依存関係マニフェストを出力するコマンド。
    #[arg(
        long = "dep-command",
        value_name = "CMD",
        env = "GODEP_SCOUT_DEP_COMMAND",
        default_value = DEFAULT_DEP_COMMAND
    )]
    pub dep_command: String,

    /// 同時に実行するHTTPリクエストの上限。
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// 1リクエストあたりのタイムアウト秒数。
    #[arg(long = "timeout-secs", value_name = "SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// 一時的な通信エラー時の再試行回数。
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub retries: u32,

    /// 再試行の初回待機時間（ミリ秒）。以降は倍々で増えます。
    #[arg(long = "retry-delay-ms", value_name = "MS", default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// デバッグログを出力します。
    #[arg(long)]
    pub debug: bool,
}

impl CommonArgs {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..HttpSettings::default()
        }
    }

    pub fn manifest_command(&self) -> Result<ManifestCommand> {
        match ManifestCommand::parse(&self.dep_command) {
            Some(command) => Ok(command),
            None => bail!("--dep-command が空です"),
        }
    }
}
