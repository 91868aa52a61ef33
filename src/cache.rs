use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::types::ModuleCoordinates;

/// ライセンス本文を `<dir>/<owner>--<name>` に保存するディスク上のキャッシュ。
#[derive(Debug, Clone)]
pub struct LicenseStore {
    dir: PathBuf,
}

impl LicenseStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| {
            format!("ライセンスディレクトリの作成に失敗: {}", dir.display())
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, coords: &ModuleCoordinates) -> PathBuf {
        self.dir.join(coords.license_file_name())
    }

    pub fn contains(&self, coords: &ModuleCoordinates) -> bool {
        self.path_for(coords).is_file()
    }

    pub fn write(&self, coords: &ModuleCoordinates, text: &str) -> Result<PathBuf> {
        let path = self.path_for(coords);
        fs::write(&path, text)
            .with_context(|| format!("ライセンスファイルの書き込みに失敗: {}", path.display()))?;
        Ok(path)
    }
}
