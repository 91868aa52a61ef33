use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::warn;

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const WHITESOURCE_URL: &str = "https://saas.whitesourcesoftware.com/agent";

const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// GitHub / WhiteSource クライアント共通の通信設定。
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: "esg-usa-bot".to_string(),
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// リトライ付きでリクエストを送るHTTPクライアント。
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    settings: HttpSettings,
}

impl HttpClient {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .context("HTTPクライアントの初期化に失敗しました")?;
        Ok(Self { client, settings })
    }

    /// 再送しない。冪等でないリクエスト用。
    pub fn send<F>(&self, build: F) -> reqwest::Result<Response>
    where
        F: FnOnce(&Client) -> RequestBuilder,
    {
        build(&self.client).send()
    }

    /// 接続エラー・タイムアウト・5xxのときだけ再送する。4xxはそのまま返す。
    pub fn send_with_retry<F>(&self, build: F) -> reqwest::Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = build(&self.client).send();
            let transient = match &result {
                Ok(response) => response.status().is_server_error(),
                Err(err) => err.is_connect() || err.is_timeout(),
            };
            if !transient || attempt >= self.settings.retries {
                return result;
            }

            let delay = backoff_delay(self.settings.retry_delay, attempt);
            match &result {
                Ok(response) => warn!(status = %response.status(), attempt, ?delay, "サーバーエラーのため再試行します"),
                Err(err) => warn!(error = %err, attempt, ?delay, "通信エラーのため再試行します"),
            }
            thread::sleep(delay);
            attempt += 1;
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}
