//! gateway CLI 分发：`run`、`doctor`、`version`。

use anyhow::anyhow;
use serde_json::json;

use crate::config::GatewayConfig;

/// CLI 分发结果。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CliDispatch {
    /// 继续进入 gateway 主循环。
    Run,
    /// 命令已处理完成，主程序应退出。
    Exit,
}

/// 解析并执行 gateway CLI。
pub(crate) fn dispatch(args: &[String]) -> anyhow::Result<CliDispatch> {
    let Some(cmd) = args.first().map(|arg| arg.trim()) else {
        return Ok(CliDispatch::Run);
    };
    if cmd.is_empty() || cmd == "run" {
        return Ok(CliDispatch::Run);
    }

    match cmd {
        "-h" | "--help" | "help" => {
            print_root_help();
            Ok(CliDispatch::Exit)
        }
        "doctor" => {
            let format = parse_doctor_format(&args[1..])?;
            run_doctor(format);
            Ok(CliDispatch::Exit)
        }
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(CliDispatch::Exit)
        }
        other => Err(anyhow!(
            "unknown command: {other}; run `tg-gateway --help` for usage"
        )),
    }
}

/// `doctor` 输出格式。
#[derive(Debug, PartialEq, Eq)]
enum DoctorFormat {
    Text,
    Json,
}

/// 解析 doctor 的 `--format` 参数。
fn parse_doctor_format(args: &[String]) -> anyhow::Result<DoctorFormat> {
    if args.is_empty() {
        return Ok(DoctorFormat::Text);
    }
    if args.len() == 2 && args[0] == "--format" {
        return match args[1].as_str() {
            "text" => Ok(DoctorFormat::Text),
            "json" => Ok(DoctorFormat::Json),
            other => Err(anyhow!("unsupported doctor format: {other}")),
        };
    }
    Err(anyhow!("usage: tg-gateway doctor [--format text|json]"))
}

/// 打印解析后的配置（密钥脱敏）；配置无效时以非零码退出。
fn run_doctor(format: DoctorFormat) {
    let config = GatewayConfig::from_env();
    let payload = doctor_report(&config);

    match format {
        DoctorFormat::Text => {
            for (key, value) in payload.as_object().into_iter().flatten() {
                match value.as_str() {
                    Some(text) => println!("{key}: {text}"),
                    None => println!("{key}: {value}"),
                }
            }
        }
        DoctorFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }

    if config.is_err() {
        std::process::exit(1);
    }
}

/// 组装 doctor 报告，不包含签名密钥与任何 secret。
fn doctor_report(config: &anyhow::Result<GatewayConfig>) -> serde_json::Value {
    match config {
        Ok(config) => json!({
            "configValid": true,
            "addr": config.addr,
            "signingKey": "configured (redacted)",
            "algorithm": config.signing_key.algorithm().as_str(),
            "tokenTtlSec": config.token_ttl.as_secs(),
            "corsOrigins": config.cors_origins.join(","),
            "credentialsPath": config.credentials_path.display().to_string(),
            "credentialsFileLoaded": config.credentials_file_loaded,
            "identities": config.credentials.len(),
        }),
        Err(err) => json!({
            "configValid": false,
            "error": format!("{err:#}"),
        }),
    }
}

/// 打印 root help。
fn print_root_help() {
    println!("tg-gateway usage:");
    println!("  tg-gateway run");
    println!("  tg-gateway doctor [--format text|json]");
    println!("  tg-gateway version");
}
