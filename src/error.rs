use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("リポジトリのディレクトリが存在しません: {path}")]
    RepoNotFound { path: PathBuf },

    #[error("`{command}` を起動できませんでした: {source}")]
    DepSpawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` が失敗しました ({status}): {stderr}")]
    DepFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` が標準エラーに出力しました: {stderr}")]
    DepStderr { command: String, stderr: String },

    #[error("依存関係マニフェストの解析に失敗しました: {source}")]
    ManifestParse { source: serde_json::Error },

    #[error("コミット日付を取得できませんでした ({repo}@{revision}): {message}")]
    CommitDate {
        repo: String,
        revision: String,
        message: String,
    },

    #[error("WhiteSourceのレスポンスを解析できませんでした: {source}")]
    SubmissionParse { source: serde_json::Error },

    #[error("WhiteSourceが送信を拒否しました: HTTP {status}")]
    SubmissionRejected { status: u16 },

    #[error("環境変数 {name} が設定されていません")]
    MissingEnv { name: &'static str },
}
