// flag-url-override 命令行入口
//
// 以给定地址启动一次覆写会话，执行命令行中的变更，输出同步后的地址与覆写。

use anyhow::{Context, Result, bail};
use flag_url_override::codec::decode_value;
use flag_url_override::logger;
use flag_url_override::{
    FileStorage, LocalOverrideRegistry, MemoryLocation, MemoryStorage, OverrideRegistry,
    OverrideStorage, PageLocation, PluginOptions, Session,
};
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    url: String,
    prefix: Option<String>,
    clear_mode: Option<String>,
    config: Option<PathBuf>,
    store: Option<PathBuf>,
    sets: Vec<(String, String)>,
    removes: Vec<String>,
    clear: bool,
    logs: Option<usize>,
}

fn main() {
    logger::init_logger();

    if let Err(e) = run() {
        log::error!("执行失败：{:#}", e);
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || matches!(args[0].as_str(), "help" | "-h" | "--help") {
        print_usage();
        return Ok(());
    }
    if matches!(args[0].as_str(), "version" | "-v" | "--version") {
        println!("flag-url-override v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cli = parse_args(&args)?;
    let options = load_options(&cli)?;

    let storage: Box<dyn OverrideStorage> = match &cli.store {
        Some(path) => Box::new(FileStorage::new(path)),
        None => Box::new(MemoryStorage::default()),
    };
    let registry = LocalOverrideRegistry::with_storage(options.override_options.clone(), storage);
    let location = MemoryLocation::new(cli.url.clone());

    match Session::start(registry, location, &options) {
        Session::Inert { message } => println!("{message}"),
        Session::Active { mut plugin, .. } => {
            plugin.on_override_change(|flag_key, action| {
                log::info!("覆写变更：{} {}", action, flag_key.unwrap_or("*"));
            });

            if cli.clear {
                plugin.clear_all_overrides();
            }
            for flag_key in &cli.removes {
                plugin.remove_override(flag_key);
            }
            for (flag_key, raw_value) in &cli.sets {
                plugin.set_override(flag_key, decode_value(raw_value));
            }

            println!("{}", plugin.location().href());
            let overrides = serde_json::to_string_pretty(&plugin.get_all_overrides())
                .context("序列化覆写失败")?;
            println!("{overrides}");
        }
    }

    if let Some(lines) = cli.logs {
        for line in logger::get_recent_logs(lines) {
            println!("{line}");
        }
    }

    Ok(())
}

fn load_options(cli: &CliArgs) -> Result<PluginOptions> {
    let mut options = match &cli.config {
        Some(path) => PluginOptions::from_json_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => PluginOptions::default(),
    };

    if let Some(prefix) = &cli.prefix {
        options.parameter_prefix = prefix.clone();
    }
    if let Some(mode) = &cli.clear_mode {
        options.clear_mode = mode.parse()?;
    }
    options.validate()?;
    Ok(options)
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--prefix" => cli.prefix = Some(next_value(&mut iter, arg)?),
            "--clear-mode" => cli.clear_mode = Some(next_value(&mut iter, arg)?),
            "--config" => cli.config = Some(PathBuf::from(next_value(&mut iter, arg)?)),
            "--store" => cli.store = Some(PathBuf::from(next_value(&mut iter, arg)?)),
            "--set" => {
                let pair = next_value(&mut iter, arg)?;
                let Some((flag_key, raw_value)) = pair.split_once('=') else {
                    bail!("--set 参数格式应为 key=value：{}", pair);
                };
                cli.sets.push((flag_key.to_string(), raw_value.to_string()));
            }
            "--remove" => cli.removes.push(next_value(&mut iter, arg)?),
            "--clear" => cli.clear = true,
            "--logs" => {
                let value = next_value(&mut iter, arg)?;
                cli.logs = Some(
                    value
                        .parse::<usize>()
                        .with_context(|| format!("--logs 需要数字：{}", value))?,
                );
            }
            other if other.starts_with("--") => bail!("未知参数：{}", other),
            other => {
                if !cli.url.is_empty() {
                    bail!("只能指定一个地址：{}", other);
                }
                cli.url = other.to_string();
            }
        }
    }

    if cli.url.is_empty() {
        bail!("缺少页面地址");
    }
    Ok(cli)
}

fn next_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String> {
    iter.next()
        .cloned()
        .with_context(|| format!("{} 缺少参数值", flag))
}

fn print_usage() {
    println!("flag-url-override v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法：flag-url-override <地址> [选项]");
    println!();
    println!("选项：");
    println!("  --prefix <前缀>        URL 参数前缀（默认 ld_override_）");
    println!("  --clear-mode <模式>    explicit | always | auto（默认 auto）");
    println!("  --config <文件>        从 JSON 文件读取插件配置");
    println!("  --store <文件>         覆写持久化文件（默认仅保存在内存）");
    println!("  --set <key=value>      设置覆写，值按 JSON 解析");
    println!("  --remove <key>         移除覆写");
    println!("  --clear                清除全部覆写");
    println!("  --logs <行数>          输出最近的日志");
    println!();
    println!("地址中需要包含 clientSideId 参数，否则不会启用覆写同步");
}
