// 触发词扫描工具 - 从标准输入逐行读取文本片段，输出命中结果（JSON）
//
// 用法:
//   trigger-scan [--config <path>] [--case-sensitive | --ignore-case]
//
// 未指定 --config 时使用 MEMORY_TRIGGER_CONFIG 或系统配置目录下的 triggers.json
use anyhow::Result;
use memory_trigger_lib::{TriggerConfig, TriggerEngine};
use std::io::{BufRead, Write};
use std::path::PathBuf;

struct Options {
    config: Option<PathBuf>,
    case_override: Option<bool>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        config: None,
        case_override: None,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config 缺少路径参数"))?;
                options.config = Some(PathBuf::from(path));
            }
            "--case-sensitive" => options.case_override = Some(true),
            "--ignore-case" => options.case_override = Some(false),
            other => anyhow::bail!("未知参数: {}", other),
        }
    }

    Ok(options)
}

fn main() -> Result<()> {
    // 日志输出到 stderr，stdout 只输出结果
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args()?;
    let config = match &options.config {
        Some(path) => TriggerConfig::load_from(path)?,
        None => TriggerConfig::load()?,
    };

    let engine = TriggerEngine::from_config(&config)?;
    tracing::info!("触发引擎就绪 (generation={})", engine.generation());

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let matches = engine.scan(&line, options.case_override)?;
        if matches.gaps > 0 {
            tracing::warn!("{} 个汉字无已知读音，拼音匹配可能遗漏", matches.gaps);
        }

        writeln!(stdout, "{}", serde_json::to_string(&matches)?)?;
    }

    Ok(())
}
