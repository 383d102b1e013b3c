//! 档案存储
//!
//! 引擎只依赖 `ProfileStore` 的读写契约，具体持久化机制由宿主决定。
//! 这里提供内存实现（测试、嵌入）与 JSON 文件实现（命令行）。

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::error::{RewardError, Result};
use crate::models::Profile;

/// 档案存储接口
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore: Send + Sync {
    fn load(&self) -> Result<Profile>;

    /// 同步落盘，返回成功后调用方才会替换内存中的档案
    fn save(&self, profile: &Profile) -> Result<()>;
}

/// 内存档案存储
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    snapshot: Mutex<Profile>,
}

impl MemoryProfileStore {
    pub fn new(profile: Profile) -> Self {
        Self {
            snapshot: Mutex::new(profile),
        }
    }

    pub fn snapshot(&self) -> Profile {
        self.snapshot.lock().clone()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Result<Profile> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, profile: &Profile) -> Result<()> {
        *self.snapshot.lock() = profile.clone();
        Ok(())
    }
}

/// JSON 文件档案存储
///
/// 文件不存在时加载为空档案；写入先落临时文件再重命名，避免留下半写文件。
#[derive(Debug, Clone)]
pub struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "profile.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProfileStore for JsonFileProfileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Profile> {
        if !self.path.exists() {
            debug!("档案文件不存在，使用空档案");
            return Ok(Profile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[instrument(skip(self, profile), fields(path = %self.path.display()))]
    fn save(&self, profile: &Profile) -> Result<()> {
        let content = serde_json::to_string_pretty(profile)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| RewardError::Store(format!("{}: {}", parent.display(), e)))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, content)
            .map_err(|e| RewardError::Store(format!("{}: {}", temp.display(), e)))?;
        fs::rename(&temp, &self.path)
            .map_err(|e| RewardError::Store(format!("{}: {}", self.path.display(), e)))?;

        debug!("档案已写入");
        Ok(())
    }
}
