use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use jenkins_plugin_sync::config::Config;
use jenkins_plugin_sync::logger;
use jenkins_plugin_sync::plugin::{PluginBackup, PluginInstaller};

const DEFAULT_CONFIG_PATH: &str = "/etc/jenkins-plugins.yaml";

#[derive(Parser)]
#[command(name = "jenkins-plugins")]
#[command(about = "Install and update Jenkins plugins from an update center")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short = 'c', long = "config", global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install plugins (defaults to the configured list) and restart Jenkins
    Install {
        /// Plugin names, overriding the configured list for this run
        plugins: Vec<String>,
    },

    /// Show which plugins would be installed and which are excluded
    Plan {
        /// Plugin names (defaults to the configured list)
        plugins: Vec<String>,
    },

    /// Copy the plugins directory to the backup directory
    Backup,

    /// Replace the plugins directory with the backup
    Restore,

    /// Remove the backup directory
    CleanBackup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("无法加载配置文件 {}", cli.config.display()))?;
    logger::init_tracing(&config.log).context("日志初始化失败")?;

    match cli.command {
        Commands::Install { plugins } => {
            let requested = requested_or_configured(plugins, &config);
            let installer = PluginInstaller::from_config(&config).await?;
            let report = installer.install(requested).await?;

            info!(
                "[PLUGINS] 安装完成: 下载 {} 个, 失败 {} 个, 删除 {} 个",
                report.downloaded.len(),
                report.failed.len(),
                report.removed.len()
            );
            if !report.failed.is_empty() {
                warn!("[PLUGINS] 下载失败的插件: {}", report.failed.join(" "));
            }
            for name in &report.installed {
                println!("{}", name);
            }
        }
        Commands::Plan { plugins } => {
            let requested = requested_or_configured(plugins, &config);
            let installer = PluginInstaller::from_config(&config).await?;
            let plan = installer.plan(requested).await?;

            for name in &plan.to_install {
                println!("install  {}", name);
            }
            for name in &plan.excluded {
                println!("excluded {}", name);
            }
        }
        Commands::Backup => PluginBackup::from_config(&config.paths)?.backup()?,
        Commands::Restore => PluginBackup::from_config(&config.paths)?.restore()?,
        Commands::CleanBackup => PluginBackup::from_config(&config.paths)?.clean_backup()?,
    }

    Ok(())
}

fn requested_or_configured(plugins: Vec<String>, config: &Config) -> Vec<String> {
    if plugins.is_empty() {
        config.configured_plugins()
    } else {
        plugins
    }
}
