// 覆写插件配置

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// URL 参数默认前缀
pub const DEFAULT_PARAMETER_PREFIX: &str = "ld_override_";

// 本地注册表默认存储命名空间
pub const DEFAULT_STORAGE_NAMESPACE: &str = "ld_flag_overrides";

// 清除哨兵：去掉前缀后恰好等于该值的参数只作为控制信号
pub const CLEAR_SENTINEL: &str = "_clear";

// 空键与哨兵键不能作为开关键：写入地址后会被当作控制信号或被忽略
pub fn is_reserved_flag_key(flag_key: &str) -> bool {
    flag_key.is_empty() || flag_key == CLEAR_SENTINEL
}

// 清除模式：决定注册时是否先清空已有覆写
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearMode {
    // 仅当地址中出现 _clear 哨兵时清空
    Explicit,
    // 每次注册都清空
    Always,
    // 地址中存在任意命名空间参数时清空
    #[default]
    Auto,
}

impl ClearMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Always => "always",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for ClearMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClearMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(Self::Explicit),
            "always" => Ok(Self::Always),
            "auto" => Ok(Self::Auto),
            other => {
                let message = format!("未知的清除模式：{other}（可选 explicit、always、auto）");
                Err(SyncError::Config(message))
            }
        }
    }
}

// 传递给底层注册表的选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverrideOptions {
    // 持久化覆写时使用的存储键
    pub storage_namespace: String,
}

impl Default for OverrideOptions {
    fn default() -> Self {
        Self {
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
        }
    }
}

// 插件配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginOptions {
    pub parameter_prefix: String,
    pub clear_mode: ClearMode,
    pub override_options: OverrideOptions,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
            clear_mode: ClearMode::default(),
            override_options: OverrideOptions::default(),
        }
    }
}

impl PluginOptions {
    // 从 JSON 文本加载，缺省字段使用默认值
    pub fn from_json_str(content: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        log::debug!("读取插件配置：{}", path.display());
        Self::from_json_str(&content)
    }

    // 空前缀会把页面上的所有参数都当作覆写
    pub fn validate(&self) -> Result<()> {
        if self.parameter_prefix.is_empty() {
            return Err(SyncError::Config("参数前缀不能为空".to_string()));
        }
        if self.override_options.storage_namespace.is_empty() {
            return Err(SyncError::Config("存储命名空间不能为空".to_string()));
        }
        Ok(())
    }
}
