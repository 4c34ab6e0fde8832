//! Gateway 二进制入口：解析 CLI、初始化日志与配置后启动服务。

mod api;
mod app;
mod auth;
mod cli;
mod config;
mod logging;
mod state;

#[tokio::main]
/// 启动 Gateway 服务。
async fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    match cli::dispatch(&args)? {
        cli::CliDispatch::Run => {}
        cli::CliDispatch::Exit => return Ok(()),
    }

    let _log_runtime = logging::init("gateway")?;
    let config = config::GatewayConfig::from_env()
        .inspect_err(|err| tracing::error!("load gateway config failed: {err:#}"))?;
    app::run(config).await
}
