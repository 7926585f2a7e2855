// 覆写同步控制器
//
// 状态机：Uninitialized → Registering → Active。
// 注册时先让底层注册表完成自身激活（恢复持久化覆写），
// 再根据地址计算加载计划并执行，保证 URL 中的覆写优先。

use crate::adapter::{OverrideAction, UrlSyncedRegistry};
use crate::config::{ClearMode, PluginOptions};
use crate::location::PageLocation;
use crate::plan::LoadPlan;
use crate::registry::{LocalOverrideRegistry, OverrideRegistry, Overrides};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Registering,
    Active,
}

pub struct FlagUrlOverridePlugin<R, L> {
    registry: UrlSyncedRegistry<R, L>,
    clear_mode: ClearMode,
    state: SyncState,
}

impl<L: PageLocation> FlagUrlOverridePlugin<LocalOverrideRegistry, L> {
    // 使用本地注册表创建插件
    pub fn from_options(options: &PluginOptions, location: L) -> Self {
        let registry = LocalOverrideRegistry::new(options.override_options.clone());
        Self::new(registry, location, options)
    }
}

impl<R, L> FlagUrlOverridePlugin<R, L>
where
    R: OverrideRegistry,
    L: PageLocation,
{
    pub fn new(inner: R, location: L, options: &PluginOptions) -> Self {
        let prefix = options.parameter_prefix.clone();
        Self {
            registry: UrlSyncedRegistry::new(inner, location, prefix),
            clear_mode: options.clear_mode,
            state: SyncState::Uninitialized,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn on_override_change<F>(&mut self, callback: F)
    where
        F: FnMut(Option<&str>, OverrideAction) + 'static,
    {
        self.registry.on_override_change(callback);
    }

    pub fn sync_initial_overrides(&mut self) {
        self.registry.sync_initial_overrides();
    }

    pub fn location(&self) -> &L {
        self.registry.location()
    }

    // 按 清空 → 移除 → 应用 的顺序执行，全部使用未拦截的底层操作
    fn apply_load_plan(&mut self, plan: &LoadPlan) {
        let clear_mode = self.clear_mode;
        let inner = self.registry.inner_mut();

        if plan.should_clear_all {
            log::info!("清除全部覆写（清除模式：{}）", clear_mode);
            inner.clear_all_overrides();
        }

        for flag_key in &plan.keys_to_remove {
            log::info!("从 URL 移除覆写：{}", flag_key);
            inner.remove_override(flag_key);
        }

        for (flag_key, value) in &plan.overrides_to_apply {
            log::info!("从 URL 加载覆写：{} = {}", flag_key, value);
            inner.set_override(flag_key, value.clone());
        }

        if !plan.overrides_to_apply.is_empty() {
            log::info!("已从 URL 加载 {} 个覆写", plan.overrides_to_apply.len());
        }
    }
}

impl<R, L> OverrideRegistry for FlagUrlOverridePlugin<R, L>
where
    R: OverrideRegistry,
    L: PageLocation,
{
    fn set_override(&mut self, flag_key: &str, value: JsonValue) {
        self.registry.set_override(flag_key, value);
    }

    fn remove_override(&mut self, flag_key: &str) {
        self.registry.remove_override(flag_key);
    }

    fn clear_all_overrides(&mut self) {
        self.registry.clear_all_overrides();
    }

    fn get_all_overrides(&self) -> Overrides {
        self.registry.get_all_overrides()
    }

    fn register_debug(&mut self) {
        if self.state != SyncState::Uninitialized {
            log::warn!("覆写插件已激活，忽略重复的注册请求");
            return;
        }

        self.state = SyncState::Registering;
        self.registry.inner_mut().register_debug();

        match self.registry.current_url() {
            Ok(url) => {
                let prefix = self.registry.parameter_prefix();
                let plan = LoadPlan::from_url(&url, prefix, self.clear_mode);
                self.apply_load_plan(&plan);

                // 清空可能删掉了地址中未提及的覆写，最后统一写回一次
                let overrides = self.registry.get_all_overrides();
                self.registry.sync_overrides_to_url(&overrides);
            }
            Err(e) => {
                // 地址不可读时按无参数处理，always 模式仍需清空
                log::error!("读取页面地址失败，跳过 URL 覆写加载：{}", e);
                let plan = LoadPlan::from_entries(&[], self.clear_mode);
                self.apply_load_plan(&plan);
            }
        }

        self.state = SyncState::Active;
    }
}
