//! 插件安装器类型定义
//!
//! 定义安装相关的错误类型、安装决策和安装结果

use indexmap::IndexSet;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::admin::AdminError;
use crate::plugin::ownership::OwnershipError;
use crate::proxy::ProxyError;
use crate::resolver::ResolveError;
use crate::update_center::{IndexError, PluginSiteError};

/// 安装错误类型
#[derive(Error, Debug)]
pub enum InstallError {
    /// 插件站点不可用
    #[error(transparent)]
    PluginSite(#[from] PluginSiteError),

    /// 依赖解析失败
    #[error("依赖解析失败: {0}")]
    Resolve(#[from] ResolveError),

    /// 插件索引错误
    #[error("插件索引错误: {0}")]
    Index(#[from] IndexError),

    /// 管理 API 错误
    #[error("Jenkins 管理 API 错误: {0}")]
    Admin(#[from] AdminError),

    /// 属主设置失败
    #[error("属主设置失败: {0}")]
    Ownership(#[from] OwnershipError),

    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败: {0}")]
    Client(#[from] ProxyError),

    /// 插件目录匹配失败
    #[error("插件目录匹配失败: {0}")]
    Glob(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 单个插件的安装决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallDecision {
    /// 未安装
    NotInstalled { latest: String },
    /// 已是最新版本
    UpToDate { version: String },
    /// 已安装但与最新版本不同
    NeedsUpdate { installed: String, latest: String },
}

impl InstallDecision {
    /// 根据已安装版本和最新版本得出决策
    pub fn evaluate(installed: Option<String>, latest: String) -> Self {
        match installed {
            None => InstallDecision::NotInstalled { latest },
            Some(installed) if installed == latest => {
                InstallDecision::UpToDate { version: installed }
            }
            Some(installed) => InstallDecision::NeedsUpdate { installed, latest },
        }
    }

    /// 是否需要下载
    ///
    /// 未安装时总是下载；版本不同时只有开启自动更新才下载。
    pub fn should_download(&self, auto_update: bool) -> bool {
        match self {
            InstallDecision::NotInstalled { .. } => true,
            InstallDecision::NeedsUpdate { .. } => auto_update,
            InstallDecision::UpToDate { .. } => false,
        }
    }

    /// 将要安装的版本
    pub fn target_version(&self) -> &str {
        match self {
            InstallDecision::NotInstalled { latest } => latest,
            InstallDecision::UpToDate { version } => version,
            InstallDecision::NeedsUpdate { latest, .. } => latest,
        }
    }
}

impl fmt::Display for InstallDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallDecision::NotInstalled { latest } => write!(f, "未安装 (最新 {})", latest),
            InstallDecision::UpToDate { version } => write!(f, "已是最新 ({})", version),
            InstallDecision::NeedsUpdate { installed, latest } => {
                write!(f, "可更新 ({} -> {})", installed, latest)
            }
        }
    }
}

/// 批量下载结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// 未列出插件的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlistedOutcome {
    /// 不在配置列表闭包中的插件文件
    pub unlisted: Vec<PathBuf>,
    /// 实际删除的插件文件
    pub removed: Vec<PathBuf>,
}

/// 一次安装的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// 安装结束后插件目录中存在的插件
    pub installed: BTreeSet<String>,
    /// 因版本不兼容而排除的插件
    pub excluded: IndexSet<String>,
    pub downloaded: Vec<String>,
    pub failed: Vec<String>,
    pub unlisted: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        assert_eq!(
            InstallDecision::evaluate(None, "1.0".into()),
            InstallDecision::NotInstalled { latest: "1.0".into() }
        );
        assert_eq!(
            InstallDecision::evaluate(Some("1.0".into()), "1.0".into()),
            InstallDecision::UpToDate { version: "1.0".into() }
        );
        assert_eq!(
            InstallDecision::evaluate(Some("0.9".into()), "1.0".into()),
            InstallDecision::NeedsUpdate {
                installed: "0.9".into(),
                latest: "1.0".into()
            }
        );
    }

    #[test]
    fn test_should_download() {
        let not_installed = InstallDecision::NotInstalled { latest: "1.0".into() };
        let up_to_date = InstallDecision::UpToDate { version: "1.0".into() };
        let needs_update = InstallDecision::NeedsUpdate {
            installed: "0.9".into(),
            latest: "1.0".into(),
        };

        assert!(not_installed.should_download(false));
        assert!(not_installed.should_download(true));
        assert!(!up_to_date.should_download(false));
        assert!(!up_to_date.should_download(true));
        assert!(!needs_update.should_download(false));
        assert!(needs_update.should_download(true));
    }

    #[test]
    fn test_newer_installed_version_still_differs() {
        // 已安装版本比索引更新时也视为不同版本
        let decision = InstallDecision::evaluate(Some("2.0".into()), "1.0".into());
        assert!(decision.should_download(true));
        assert_eq!(decision.target_version(), "1.0");
    }
}
