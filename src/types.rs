use serde::{Deserialize, Serialize};

/// `dep status -json` が出力する1件分の依存関係。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DependencyRecord {
    pub project_root: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub version: String,
}

/// モジュールパスから導出したオーナー名とリポジトリ名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCoordinates {
    pub owner: String,
    pub name: String,
}

impl ModuleCoordinates {
    /// `host/owner/.../name` 形式のパスを分解する。
    /// セグメントが3つ未満ならオーナーは空文字になる。
    pub fn from_module_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').collect();
        let owner = if segments.len() >= 3 {
            segments[1].to_string()
        } else {
            String::new()
        };
        let name = segments.last().copied().unwrap_or_default().to_string();
        Self { owner, name }
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn license_file_name(&self) -> String {
        format!("{}--{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitesourceDependency {
    pub filename: String,
    pub name: String,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub sha1: String,
    pub dependency_type: String,
    pub coordinates: String,
}

impl WhitesourceDependency {
    pub fn new(coords: &ModuleCoordinates, version: &str) -> Self {
        let ModuleCoordinates { owner, name } = coords;
        Self {
            filename: format!("{name}-{version}"),
            name: name.clone(),
            group_id: owner.clone(),
            artifact_id: name.clone(),
            version: version.to_string(),
            sha1: String::new(),
            dependency_type: "SOURCE_LIBRARY".to_string(),
            coordinates: format!("{owner}:{name}:{version}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub project_token: String,
    pub dependencies: Vec<WhitesourceDependency>,
}
