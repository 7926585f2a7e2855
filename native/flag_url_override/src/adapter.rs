// 带 URL 同步的注册表适配器
//
// 包装外部注册表：每次变更先交给底层注册表执行，
// 再把全部覆写写回地址栏，最后通知变更回调。

use crate::codec;
use crate::config::is_reserved_flag_key;
use crate::error::{Result, SyncError};
use crate::location::PageLocation;
use crate::registry::{OverrideRegistry, Overrides};
use serde_json::Value as JsonValue;
use std::fmt;
use url::Url;

// 覆写变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideAction {
    Set,
    Remove,
    Clear,
}

impl OverrideAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Remove => "remove",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for OverrideAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 变更回调：(开关键, 动作)，清空时开关键为 None
pub type OverrideChangeCallback = Box<dyn FnMut(Option<&str>, OverrideAction)>;

pub struct UrlSyncedRegistry<R, L> {
    inner: R,
    location: L,
    parameter_prefix: String,
    on_change: Option<OverrideChangeCallback>,
}

impl<R, L> UrlSyncedRegistry<R, L>
where
    R: OverrideRegistry,
    L: PageLocation,
{
    pub fn new(inner: R, location: L, parameter_prefix: impl Into<String>) -> Self {
        Self {
            inner,
            location,
            parameter_prefix: parameter_prefix.into(),
            on_change: None,
        }
    }

    // 注册变更回调，只保留最后一次注册的回调
    pub fn on_override_change<F>(&mut self, callback: F)
    where
        F: FnMut(Option<&str>, OverrideAction) + 'static,
    {
        if self.on_change.is_some() {
            log::debug!("替换已有的覆写变更回调");
        }
        self.on_change = Some(Box::new(callback));
    }

    // 注册表非空时把当前覆写写回地址栏
    pub fn sync_initial_overrides(&mut self) {
        let overrides = self.inner.get_all_overrides();
        if !overrides.is_empty() {
            self.sync_overrides_to_url(&overrides);
        }
    }

    // 写回失败只记录日志，注册表状态保持不变
    pub fn sync_overrides_to_url(&mut self, overrides: &Overrides) {
        if let Err(e) = self.try_sync_overrides_to_url(overrides) {
            log::error!("同步覆写到 URL 失败：{}", e);
        }
    }

    fn try_sync_overrides_to_url(&mut self, overrides: &Overrides) -> Result<()> {
        let url = self.current_url()?;
        let rewritten = codec::rewrite_namespace(&url, &self.parameter_prefix, overrides);
        self.location.replace_state(rewritten.as_str())?;
        log::debug!("地址已更新：{}", rewritten);
        Ok(())
    }

    pub fn current_url(&self) -> Result<Url> {
        let href = self.location.href();
        Url::parse(&href).map_err(|source| SyncError::InvalidUrl { href, source })
    }

    pub fn parameter_prefix(&self) -> &str {
        &self.parameter_prefix
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    // 未经拦截的底层注册表，执行加载计划时使用，避免中途改写地址
    pub(crate) fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    fn sync_and_notify(&mut self, flag_key: Option<&str>, action: OverrideAction) {
        let overrides = self.inner.get_all_overrides();
        self.sync_overrides_to_url(&overrides);

        if let Some(callback) = self.on_change.as_mut() {
            callback(flag_key, action);
        }
    }
}

impl<R, L> OverrideRegistry for UrlSyncedRegistry<R, L>
where
    R: OverrideRegistry,
    L: PageLocation,
{
    fn set_override(&mut self, flag_key: &str, value: JsonValue) {
        // 保留键写入地址后无法按原样读回
        if is_reserved_flag_key(flag_key) {
            log::warn!("拒绝设置保留的开关键：{:?}", flag_key);
            return;
        }
        self.inner.set_override(flag_key, value);
        self.sync_and_notify(Some(flag_key), OverrideAction::Set);
    }

    fn remove_override(&mut self, flag_key: &str) {
        self.inner.remove_override(flag_key);
        self.sync_and_notify(Some(flag_key), OverrideAction::Remove);
    }

    fn clear_all_overrides(&mut self) {
        self.inner.clear_all_overrides();
        self.sync_and_notify(None, OverrideAction::Clear);
    }

    fn get_all_overrides(&self) -> Overrides {
        self.inner.get_all_overrides()
    }

    fn register_debug(&mut self) {
        self.inner.register_debug();
    }
}
