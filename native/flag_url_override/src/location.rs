// 页面地址抽象
//
// 同步逻辑只需要读取当前地址，以及在不导航、不新增历史记录的前提下原地替换地址。

use crate::error::{Result, SyncError};
use url::Url;

pub trait PageLocation {
    // 当前完整地址
    fn href(&self) -> String;

    // 原地替换当前地址（对应 history.replaceState）
    fn replace_state(&mut self, href: &str) -> Result<()>;
}

// 内存中的页面地址，带历史记录栈
#[derive(Debug, Clone)]
pub struct MemoryLocation {
    // 最后一项为当前地址
    history: Vec<String>,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            history: vec![href.into()],
        }
    }

    // 导航到新地址，历史记录加一
    pub fn push(&mut self, href: impl Into<String>) {
        self.history.push(href.into());
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl PageLocation for MemoryLocation {
    fn href(&self) -> String {
        self.history.last().cloned().unwrap_or_default()
    }

    fn replace_state(&mut self, href: &str) -> Result<()> {
        Url::parse(href).map_err(|source| SyncError::InvalidUrl {
            href: href.to_string(),
            source,
        })?;

        match self.history.last_mut() {
            Some(current) => *current = href.to_string(),
            None => self.history.push(href.to_string()),
        }
        Ok(())
    }
}
