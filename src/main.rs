use anyhow::Result;
use clap::Parser;
use study_assistant::config::Config;
use study_assistant::logger;
use study_assistant::orchestrator::{App, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logger::init_with_verbose(cli.verbose || config.verbose_logging);

    // 初始化并运行应用
    let overrides = cli.config_patch();
    App::initialize(config, overrides).run(cli.command).await?;

    Ok(())
}
