use clap::Parser;
use qrgen_studio::cli::{Cli, Commands};
use qrgen_studio::config::{StaticConfig, init_config_with};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_with(StaticConfig::load_from(&cli.config));

    match cli.command {
        None | Some(Commands::Serve) => {
            let config = qrgen_studio::config::get_config();
            // guard 需要存活到进程结束，否则文件日志不会刷新
            let _log_guard = qrgen_studio::system::init_logging(&config.logging)?;
            qrgen_studio::runtime::modes::run_server().await
        }
        #[cfg(feature = "cli")]
        Some(command) => {
            if let Err(e) = qrgen_studio::runtime::modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
        #[cfg(not(feature = "cli"))]
        Some(_) => anyhow::bail!("CLI commands require the `cli` feature"),
    }
}
