// 覆写会话启动
//
// 页面地址中没有客户端 ID 时不激活插件，只返回提示信息；
// 否则创建插件、完成注册，并把初始覆写同步到地址栏。

use crate::config::PluginOptions;
use crate::controller::FlagUrlOverridePlugin;
use crate::location::PageLocation;
use crate::registry::OverrideRegistry;
use url::Url;

// 客户端 ID 所在的查询参数
pub const CLIENT_SIDE_ID_PARAM: &str = "clientSideId";

pub const MISSING_CLIENT_SIDE_ID_MESSAGE: &str =
    "未提供客户端 ID，请在地址中填写 clientSideId 参数后重新加载";

// 读取地址中的客户端 ID，缺失或地址无效时返回空字符串
pub fn client_side_id_from_url(href: &str) -> String {
    Url::parse(href)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == CLIENT_SIDE_ID_PARAM)
                .map(|(_, value)| value.trim().to_string())
        })
        .unwrap_or_default()
}

pub enum Session<R, L> {
    // 前置条件不满足，不做任何同步
    Inert { message: String },
    Active {
        client_side_id: String,
        plugin: FlagUrlOverridePlugin<R, L>,
    },
}

impl<R, L> Session<R, L>
where
    R: OverrideRegistry,
    L: PageLocation,
{
    pub fn start(inner: R, location: L, options: &PluginOptions) -> Self {
        let client_side_id = client_side_id_from_url(&location.href());
        if client_side_id.is_empty() {
            log::info!("{}", MISSING_CLIENT_SIDE_ID_MESSAGE);
            return Self::Inert {
                message: MISSING_CLIENT_SIDE_ID_MESSAGE.to_string(),
            };
        }

        log::info!("初始化覆写插件（客户端 ID：{}）", client_side_id);
        let mut plugin = FlagUrlOverridePlugin::new(inner, location, options);
        plugin.register_debug();
        plugin.sync_initial_overrides();
        log::info!("覆写 URL 同步已启用");

        Self::Active {
            client_side_id,
            plugin,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn plugin_mut(&mut self) -> Option<&mut FlagUrlOverridePlugin<R, L>> {
        match self {
            Self::Active { plugin, .. } => Some(plugin),
            Self::Inert { .. } => None,
        }
    }
}
