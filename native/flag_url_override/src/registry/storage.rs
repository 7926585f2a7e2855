// 覆写持久化存储

use super::Overrides;
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

pub trait OverrideStorage {
    // 读取命名空间下保存的覆写，不存在时返回空集合
    fn load(&self, namespace: &str) -> Result<Overrides>;

    fn save(&mut self, namespace: &str, overrides: &Overrides) -> Result<()>;
}

// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, Overrides>,
}

impl MemoryStorage {
    // 预置某个命名空间的覆写（模拟上次会话留下的数据）
    pub fn seeded(namespace: &str, overrides: Overrides) -> Self {
        let mut entries = HashMap::new();
        entries.insert(namespace.to_string(), overrides);
        Self { entries }
    }
}

impl OverrideStorage for MemoryStorage {
    fn load(&self, namespace: &str) -> Result<Overrides> {
        Ok(self.entries.get(namespace).cloned().unwrap_or_default())
    }

    fn save(&mut self, namespace: &str, overrides: &Overrides) -> Result<()> {
        self.entries.insert(namespace.to_string(), overrides.clone());
        Ok(())
    }
}

// JSON 文件存储，文件内容为 { 命名空间: { 开关键: 值 } }
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, Overrides>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl OverrideStorage for FileStorage {
    fn load(&self, namespace: &str) -> Result<Overrides> {
        let mut all = self.read_all()?;
        Ok(all.remove(namespace).unwrap_or_default())
    }

    fn save(&mut self, namespace: &str, overrides: &Overrides) -> Result<()> {
        let mut all = self.read_all()?;
        if overrides.is_empty() {
            all.remove(namespace);
        } else {
            all.insert(namespace.to_string(), overrides.clone());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        log::debug!("覆写已写入 {}", self.path.display());
        Ok(())
    }
}
