//! Jenkins 插件目录管理
//!
//! - 插件安装与未列出插件清理
//! - 插件目录备份与恢复
//! - 插件目录属主与权限

pub mod backup;
pub mod installer;
pub mod layout;
pub mod ownership;

pub use backup::PluginBackup;
pub use installer::{
    InstallDecision, InstallError, InstallReport, InstallerOptions, PluginInstaller,
};
pub use ownership::{Ownership, OwnershipError};
