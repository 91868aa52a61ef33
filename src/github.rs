use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::RequestBuilder;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use urlencoding::encode;

use crate::error::ScoutError;
use crate::http::HttpClient;
use crate::types::ModuleCoordinates;

const RAW_MEDIA_TYPE: &str = "application/vnd.github.VERSION.raw";
const COMMIT_USER_AGENT: &str = "esg-usa-bot_ci";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseResponse {
    Found(String),
    Unavailable(StatusCode),
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    http: HttpClient,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(http: HttpClient, api_url: &str, token: Option<String>) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// ライセンス本文を生テキストで取得する。200以外はステータスだけ返す。
    pub fn fetch_license(&self, coords: &ModuleCoordinates) -> Result<LicenseResponse> {
        let url = format!(
            "{}/repos/{}/{}/license",
            self.api_url,
            encode(&coords.owner),
            encode(&coords.name)
        );
        let response = self
            .http
            .send_with_retry(|client| {
                self.authorize(client.get(&url).header("Accept", RAW_MEDIA_TYPE))
            })
            .with_context(|| format!("GitHubリクエストに失敗しました: {}", coords.slug()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(LicenseResponse::Unavailable(status));
        }

        let body = response
            .text()
            .with_context(|| format!("ライセンス本文の読み込みに失敗: {}", coords.slug()))?;
        Ok(LicenseResponse::Found(body))
    }

    /// `repo` (`owner/name`) の `revision` がコミットされた日付を `YYYY-MM-DD` で返す。
    pub fn commit_date(&self, repo: &str, revision: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/commits/{}",
            self.api_url,
            repo,
            encode(revision)
        );
        let response = self
            .http
            .send_with_retry(|client| {
                self.authorize(client.get(&url).header(USER_AGENT, COMMIT_USER_AGENT))
            })
            .with_context(|| format!("GitHubリクエストに失敗しました: {repo}@{revision}"))?;
        let body = response
            .text()
            .with_context(|| format!("コミット情報の読み込みに失敗: {repo}@{revision}"))?;

        let date = parse_commit_date(&body).map_err(|message| ScoutError::CommitDate {
            repo: repo.to_string(),
            revision: revision.to_string(),
            message,
        })?;
        Ok(date)
    }
}

fn parse_commit_date(body: &str) -> Result<String, String> {
    let json: Value = serde_json::from_str(body).map_err(|err| err.to_string())?;
    let timestamp = json
        .pointer("/commit/author/date")
        .and_then(Value::as_str)
        .ok_or_else(|| "commit.author.date がありません".to_string())?;
    let date = timestamp.split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|err| format!("日付の形式が不正です ({timestamp}): {err}"))?;
    Ok(date.to_string())
}
