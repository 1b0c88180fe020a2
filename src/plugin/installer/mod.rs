//! 插件安装器模块
//!
//! - 解析安装计划并逐个下载插件
//! - 按配置列表处理未列出的插件
//! - 安装结束后重启 Jenkins

mod installer;
mod types;

pub use installer::{find_unlisted, InstallerOptions, PluginInstaller};
pub use types::{BatchOutcome, InstallDecision, InstallError, InstallReport, UnlistedOutcome};
