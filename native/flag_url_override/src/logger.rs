// 日志初始化
//
// 基于 env_logger 输出到终端，同时把格式化后的日志行保存到内存缓冲区，
// 供 get_recent_logs 读取最近的日志。

use chrono::Local;
use log::{Log, Metadata, Record};
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;

// 最多保留的日志行数
const MAX_RECENT_LOGS: usize = 500;

static RECENT_LOGS: Lazy<Mutex<VecDeque<String>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(MAX_RECENT_LOGS)));

struct BufferedLogger {
    inner: env_logger::Logger,
}

impl Log for BufferedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }
        push_recent(format_line(record));
        self.inner.log(record);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

// 初始化日志系统，默认级别 info，可通过 RUST_LOG 调整
pub fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    let inner = env_logger::Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_line(record)))
        .build();

    let max_level = inner.filter();
    // 重复初始化时保留已有的日志器
    if log::set_boxed_logger(Box::new(BufferedLogger { inner })).is_ok() {
        log::set_max_level(max_level);
    }
}

fn format_line(record: &Record) -> String {
    format!(
        "[{}] [{}] {}",
        Local::now().format("%H:%M:%S"),
        record.level(),
        record.args()
    )
}

fn push_recent(line: String) {
    if let Ok(mut logs) = RECENT_LOGS.lock() {
        while logs.len() >= MAX_RECENT_LOGS {
            logs.pop_front();
        }
        logs.push_back(line);
    }
}

// 获取最近的 lines 行日志（按时间顺序）
pub fn get_recent_logs(lines: usize) -> Vec<String> {
    match RECENT_LOGS.lock() {
        Ok(logs) => logs
            .iter()
            .skip(logs.len().saturating_sub(lines))
            .cloned()
            .collect(),
        Err(_) => Vec::new(),
    }
}
