// 覆写注册表
//
// 对外暴露与外部注册表相同的能力集合：设置、移除、清空、列出覆写，以及激活。

pub mod storage;

use crate::config::OverrideOptions;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use storage::{MemoryStorage, OverrideStorage};

// 开关键 → 覆写值
pub type Overrides = BTreeMap<String, JsonValue>;

pub trait OverrideRegistry {
    fn set_override(&mut self, flag_key: &str, value: JsonValue);

    fn remove_override(&mut self, flag_key: &str);

    fn clear_all_overrides(&mut self);

    fn get_all_overrides(&self) -> Overrides;

    // 激活注册表（恢复已持久化的覆写等）
    fn register_debug(&mut self);
}

// 本地覆写注册表，每次变更后写入持久化存储
pub struct LocalOverrideRegistry {
    overrides: Overrides,
    storage: Box<dyn OverrideStorage>,
    options: OverrideOptions,
}

impl LocalOverrideRegistry {
    // 使用内存存储创建
    pub fn new(options: OverrideOptions) -> Self {
        Self::with_storage(options, Box::new(MemoryStorage::default()))
    }

    pub fn with_storage(options: OverrideOptions, storage: Box<dyn OverrideStorage>) -> Self {
        Self {
            overrides: Overrides::new(),
            storage,
            options,
        }
    }

    // 持久化失败只记录日志，内存中的覆写仍然有效
    fn persist(&mut self) {
        let namespace = &self.options.storage_namespace;
        if let Err(e) = self.storage.save(namespace, &self.overrides) {
            log::warn!("保存覆写失败（{}）：{}", namespace, e);
        }
    }
}

impl OverrideRegistry for LocalOverrideRegistry {
    fn set_override(&mut self, flag_key: &str, value: JsonValue) {
        self.overrides.insert(flag_key.to_string(), value);
        self.persist();
    }

    fn remove_override(&mut self, flag_key: &str) {
        if self.overrides.remove(flag_key).is_some() {
            self.persist();
        }
    }

    fn clear_all_overrides(&mut self) {
        self.overrides.clear();
        self.persist();
    }

    fn get_all_overrides(&self) -> Overrides {
        self.overrides.clone()
    }

    fn register_debug(&mut self) {
        let namespace = self.options.storage_namespace.clone();
        match self.storage.load(&namespace) {
            Ok(saved) => {
                if !saved.is_empty() {
                    log::debug!("恢复 {} 个已保存的覆写", saved.len());
                }
                self.overrides.extend(saved);
            }
            Err(e) => log::warn!("读取已保存的覆写失败（{}）：{}", namespace, e),
        }
    }
}
