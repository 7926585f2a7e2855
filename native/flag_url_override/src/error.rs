// 覆写同步错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    // 当前页面地址无法解析
    #[error("无法解析页面地址 {href}：{source}")]
    InvalidUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },

    // 写回地址栏失败
    #[error("更新页面地址失败：{0}")]
    Location(String),

    // 覆写持久化失败
    #[error("覆写存储失败：{0}")]
    Storage(String),

    // 配置项无效
    #[error("配置无效：{0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
