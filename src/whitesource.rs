use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};

use crate::error::ScoutError;
use crate::github::GithubClient;
use crate::http::HttpClient;
use crate::licenses::GOLANG_SYS;
use crate::pool;
use crate::types::{DependencyRecord, ModuleCoordinates, SubmissionPayload, WhitesourceDependency};

const BRANCH_PREFIX: &str = "branch ";
const GITHUB_HOST: &str = "github.com";
const AGENT: &str = "generic";
const AGENT_VERSION: &str = "2.4.1";
const PLUGIN_VERSION: &str = "1.0";

/// 送信対象の依存関係。`golang.org/x/sys` は除外する。
pub fn submission_records(records: &[DependencyRecord]) -> Vec<DependencyRecord> {
    records
        .iter()
        .filter(|r| r.project_root != GOLANG_SYS)
        .cloned()
        .collect()
}

/// `branch <name>` 形式のバージョンを `<name>_<YYYY-MM-DD>` に解決する。
/// GitHub以外のモジュールはブランチ名だけを返す。それ以外はそのまま返す。
pub fn resolve_version(record: &DependencyRecord, github: &GithubClient) -> Result<String> {
    let Some(branch) = record.version.strip_prefix(BRANCH_PREFIX) else {
        return Ok(record.version.clone());
    };

    match record
        .project_root
        .strip_prefix(GITHUB_HOST)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(repo) => {
            let date = github.commit_date(repo, &record.revision)?;
            Ok(format!("{branch}_{date}"))
        }
        None => Ok(branch.to_string()),
    }
}

pub fn convert_dependencies(
    records: &[DependencyRecord],
    github: &GithubClient,
    concurrency: usize,
) -> Result<Vec<WhitesourceDependency>> {
    let targets = submission_records(records);
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let results = pool::run_bounded(concurrency, "バージョンを解決中", &targets, |record| -> Result<WhitesourceDependency> {
        let coords = ModuleCoordinates::from_module_path(&record.project_root);
        let version = resolve_version(record, github)
            .with_context(|| format!("バージョンの解決に失敗: {}", record.project_root))?;
        info!("{} {} {}", coords.owner, coords.name, version);
        Ok(WhitesourceDependency::new(&coords, &version))
    })?;

    results.into_iter().collect()
}

#[derive(Debug, Clone)]
pub struct SubmissionTokens {
    pub org: String,
    pub product: String,
}

/// WhiteSource agent APIに送るフォーム項目。順序は固定。
pub fn submission_form(
    payload: &SubmissionPayload,
    tokens: &SubmissionTokens,
    timestamp_ms: i64,
) -> Result<Vec<(&'static str, String)>> {
    let diff = serde_json::to_string(payload).context("送信ペイロードのJSON化に失敗しました")?;
    Ok(vec![
        ("type", "UPDATE".to_string()),
        ("agent", AGENT.to_string()),
        ("agentVersion", AGENT_VERSION.to_string()),
        ("pluginVersion", PLUGIN_VERSION.to_string()),
        ("token", tokens.org.clone()),
        ("product", tokens.product.clone()),
        ("timeStamp", timestamp_ms.to_string()),
        ("diff", format!("[{diff}]")),
    ])
}

/// レスポンスをJSONとして解析する。`data` が文字列化されたJSONなら展開する。
pub fn parse_response(body: &str) -> Result<Value, ScoutError> {
    let mut json: Value =
        serde_json::from_str(body).map_err(|source| ScoutError::SubmissionParse { source })?;
    if let Some(data) = json.get_mut("data") {
        let nested = data
            .as_str()
            .and_then(|text| serde_json::from_str::<Value>(text).ok());
        if let Some(nested) = nested {
            *data = nested;
        }
    }
    Ok(json)
}

#[derive(Debug, Clone)]
pub struct SubmissionResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct WhitesourceClient {
    http: HttpClient,
    url: String,
}

impl WhitesourceClient {
    pub fn new(http: HttpClient, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }

    pub fn submit(&self, form: &[(&'static str, String)]) -> Result<SubmissionResponse> {
        let response = self
            .http
            .send(|client| {
                client
                    .post(&self.url)
                    .header("Charset", "utf-8")
                    .form(form)
            })
            .with_context(|| format!("WhiteSourceへの送信に失敗しました: {}", self.url))?;

        let status = response.status();
        let text = response
            .text()
            .context("WhiteSourceのレスポンス読み込みに失敗しました")?;

        match parse_response(&text) {
            Ok(body) => Ok(SubmissionResponse { status, body }),
            Err(err) => {
                error!(%status, body = %text, "WhiteSourceのレスポンスがJSONではありません");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpSettings;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn http() -> HttpClient {
        HttpClient::new(HttpSettings {
            retries: 0,
            retry_delay: Duration::ZERO,
            ..HttpSettings::default()
        })
        .unwrap()
    }

    fn github(server: &MockServer) -> GithubClient {
        GithubClient::new(http(), &server.base_url(), None)
    }

    fn record(root: &str, revision: &str, version: &str) -> DependencyRecord {
        DependencyRecord {
            project_root: root.to_string(),
            revision: revision.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn golang_sys_is_excluded() {
        let records = vec![
            record("github.com/foo/bar", "abc123", "v1.2.3"),
            record(GOLANG_SYS, "def456", "branch master"),
            record("golang.org/x/sys/unix", "def456", "branch master"),
        ];
        let targets = submission_records(&records);
        let roots: Vec<_> = targets.iter().map(|r| r.project_root.as_str()).collect();
        assert_eq!(roots, vec!["github.com/foo/bar", "golang.org/x/sys/unix"]);
    }

    #[test]
    fn tagged_version_passes_through_without_requests() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET);
            then.status(500);
        });

        let version =
            resolve_version(&record("github.com/foo/bar", "abc123", "v1.2.3"), &github(&server))
                .unwrap();
        assert_eq!(version, "v1.2.3");
        mock.assert_calls(0);
    }

    #[test]
    fn branch_version_on_github_gets_commit_date() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/repos/foo/bar/commits/abc123");
            then.status(200)
                .body(r#"{"commit":{"author":{"date":"2018-05-04T10:11:12Z"}}}"#);
        });

        let version = resolve_version(
            &record("github.com/foo/bar", "abc123", "branch master"),
            &github(&server),
        )
        .unwrap();

        assert_eq!(version, "master_2018-05-04");
        mock.assert();
    }

    #[test]
    fn branch_version_off_github_drops_prefix_only() {
        let server = MockServer::start();
        let version = resolve_version(
            &record("gopkg.in/yaml.v2", "abc123", "branch v2"),
            &github(&server),
        )
        .unwrap();
        assert_eq!(version, "v2");
    }

    #[test]
    fn unparseable_commit_response_aborts_conversion() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/foo/bar/commits/abc123");
            then.status(200).body("not json");
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/foo/baz/commits/abc123");
            then.status(200)
                .body(r#"{"commit":{"author":{"date":"2018-05-04T10:11:12Z"}}}"#);
        });

        let records = vec![
            record("github.com/foo/bar", "abc123", "branch master"),
            record("github.com/foo/baz", "abc123", "branch master"),
        ];
        let err = convert_dependencies(&records, &github(&server), 2).unwrap_err();
        assert!(err.chain().any(|cause| matches!(
            cause.downcast_ref::<ScoutError>(),
            Some(ScoutError::CommitDate { .. })
        )));
    }

    #[test]
    fn converts_every_non_filtered_record() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/foo/branchy/commits/fff000");
            then.status(200)
                .body(r#"{"commit":{"author":{"date":"2020-01-02T03:04:05Z"}}}"#);
        });

        let records = vec![
            record("github.com/foo/bar", "abc123", "v1.2.3"),
            record(GOLANG_SYS, "def456", "branch master"),
            record("github.com/foo/branchy", "fff000", "branch develop"),
            record("gopkg.in/yaml.v2", "111222", "v2.2.1"),
        ];
        let deps = convert_dependencies(&records, &github(&server), 3).unwrap();

        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].coordinates, "foo:bar:v1.2.3");
        assert_eq!(deps[0].group_id, "foo");
        assert_eq!(deps[1].version, "develop_2020-01-02");
        assert_eq!(deps[2].coordinates, ":yaml.v2:v2.2.1");
    }

    #[test]
    fn form_fields_are_ordered_and_wrap_payload() {
        let coords = ModuleCoordinates::from_module_path("github.com/foo/bar");
        let payload = SubmissionPayload {
            project_token: "proj".to_string(),
            dependencies: vec![WhitesourceDependency::new(&coords, "v1.2.3")],
        };
        let tokens = SubmissionTokens {
            org: "org".to_string(),
            product: "prod".to_string(),
        };

        let form = submission_form(&payload, &tokens, 1_500_000_000_000).unwrap();
        let keys: Vec<_> = form.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "type",
                "agent",
                "agentVersion",
                "pluginVersion",
                "token",
                "product",
                "timeStamp",
                "diff"
            ]
        );
        assert_eq!(form[4].1, "org");
        assert_eq!(form[6].1, "1500000000000");

        let diff: Value = serde_json::from_str(&form[7].1).unwrap();
        assert_eq!(diff[0]["projectToken"], "proj");
        assert_eq!(diff[0]["dependencies"][0]["name"], "bar");
        assert_eq!(diff[0]["dependencies"][0]["dependencyType"], "SOURCE_LIBRARY");
    }

    #[test]
    fn parse_response_expands_nested_data() {
        let body = r#"{"status":1,"message":"ok","data":"{\"updatedProjects\":[\"p\"]}"}"#;
        let json = parse_response(body).unwrap();
        assert_eq!(json["data"]["updatedProjects"][0], "p");

        let plain = parse_response(r#"{"status":1,"data":"plain text"}"#).unwrap();
        assert_eq!(plain["data"], "plain text");

        assert!(matches!(
            parse_response("<html>"),
            Err(ScoutError::SubmissionParse { .. })
        ));
    }

    #[test]
    fn submit_posts_form_and_parses_response() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/agent")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(200).body(r#"{"status":1,"data":"{\"ok\":true}"}"#);
        });

        let client = WhitesourceClient::new(http(), &server.url("/agent"));
        let form = vec![("type", "UPDATE".to_string()), ("diff", "[{}]".to_string())];
        let response = client.submit(&form).unwrap();

        mock.assert();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["ok"], true);
    }

    #[test]
    fn submit_is_sent_once_on_server_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/agent");
            then.status(503).body(r#"{"status":2,"message":"unavailable"}"#);
        });

        let http = HttpClient::new(HttpSettings {
            retries: 2,
            retry_delay: Duration::ZERO,
            ..HttpSettings::default()
        })
        .unwrap();
        let client = WhitesourceClient::new(http, &server.url("/agent"));
        let response = client.submit(&[("type", "UPDATE".to_string())]).unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        mock.assert_calls(1);
    }

    #[test]
    fn submit_fails_on_non_json_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/agent");
            then.status(200).body("Service Unavailable");
        });

        let client = WhitesourceClient::new(http(), &server.url("/agent"));
        let err = client.submit(&[("type", "UPDATE".to_string())]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScoutError>(),
            Some(ScoutError::SubmissionParse { .. })
        ));
    }
}
