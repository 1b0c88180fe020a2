//! 插件站点数据结构
//!
//! 对应 update-center.json 中用到的字段

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// 插件站点不可用
///
/// 配置的插件站点没有提供 update-center.json 或无法访问
#[derive(Debug, Error)]
#[error("配置的插件站点没有提供 update-center.json 文件或无法访问: {url} ({reason})")]
pub struct PluginSiteError {
    pub url: String,
    pub reason: String,
}

/// 插件索引错误
#[derive(Debug, Error)]
pub enum IndexError {
    /// 插件不存在
    #[error("插件不存在: {0}")]
    NotFound(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 下载失败
    #[error("下载 {name} 失败: {reason}")]
    Download { name: String, reason: String },

    /// 校验和不匹配
    #[error("{name} 校验和不匹配: 期望 {expected}, 实际 {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// 清单无效
    #[error("清单无效: {0}")]
    InvalidManifest(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// 是否属于单个插件的下载失败（不应中断整批安装）
    pub fn is_download_failure(&self) -> bool {
        matches!(
            self,
            IndexError::Network(_)
                | IndexError::Download { .. }
                | IndexError::ChecksumMismatch { .. }
        )
    }
}

/// update-center.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCenterManifest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub core: Option<CoreRelease>,
    #[serde(default)]
    pub plugins: HashMap<String, PluginMetadata>,
}

/// 核心版本信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreRelease {
    pub version: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// 单个插件的元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    /// 最低 Jenkins 核心版本
    #[serde(default)]
    pub required_core: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<PluginDependency>,
    #[serde(default)]
    pub url: Option<String>,
    /// base64 编码的 SHA-256
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl PluginMetadata {
    /// 必需（非可选）依赖的名称
    pub fn required_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| !d.optional)
            .map(|d| d.name.as_str())
    }
}

/// 插件依赖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDependency {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

/// 插件文件名（不含版本号）
pub fn plugin_file_name(name: &str) -> String {
    format!("{}.jpi", name)
}

/// 插件在目标目录中的路径
pub fn plugin_file_path(dest_dir: &std::path::Path, name: &str) -> PathBuf {
    dest_dir.join(plugin_file_name(name))
}
