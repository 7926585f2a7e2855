// Flag URL Override Library
//
// 在功能开关覆写注册表与页面地址查询参数之间保持同步

pub mod adapter;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod logger;
pub mod plan;
pub mod registry;
pub mod session;

pub use adapter::{OverrideAction, OverrideChangeCallback, UrlSyncedRegistry};
pub use config::{ClearMode, OverrideOptions, PluginOptions};
pub use controller::{FlagUrlOverridePlugin, SyncState};
pub use error::{Result, SyncError};
pub use location::{MemoryLocation, PageLocation};
pub use plan::LoadPlan;
pub use registry::storage::{FileStorage, MemoryStorage, OverrideStorage};
pub use registry::{LocalOverrideRegistry, OverrideRegistry, Overrides};
pub use session::Session;

// 创建使用本地注册表的覆写插件
pub fn create_flag_url_override_plugin<L: PageLocation>(
    options: &PluginOptions,
    location: L,
) -> FlagUrlOverridePlugin<LocalOverrideRegistry, L> {
    FlagUrlOverridePlugin::from_options(options, location)
}
