//! Jenkins 插件同步
//!
//! 根据配置的插件列表解析依赖、过滤不兼容插件、下载安装，
//! 并提供插件目录的备份与恢复。

pub mod admin;
pub mod config;
pub mod logger;
pub mod plugin;
pub mod proxy;
pub mod resolver;
pub mod update_center;
pub mod version;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use plugin::{InstallReport, PluginBackup, PluginInstaller};
