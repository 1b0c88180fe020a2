//! 插件索引（update center）模块
//!
//! - `PluginIndex`：插件元数据查询与下载接口
//! - `UpdateCenter`：基于 update-center.json 的实现

mod client;
mod types;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use client::UpdateCenter;
pub use types::{
    plugin_file_name, plugin_file_path, CoreRelease, IndexError, PluginDependency, PluginMetadata,
    PluginSiteError, UpdateCenterManifest,
};

/// 默认公共插件站点
pub const DEFAULT_PLUGINS_SITE: &str = "https://updates.jenkins-ci.org/latest/";

/// 默认公共站点对应的清单地址
pub const DEFAULT_UPDATE_CENTER_URL: &str = "https://updates.jenkins.io/update-center.json";

/// 插件索引接口
#[async_trait]
pub trait PluginIndex: Send + Sync {
    /// 查询插件元数据
    async fn plugin_data(&self, name: &str) -> Result<PluginMetadata, IndexError>;

    /// 下载插件到目标目录，文件名为 `<name>.jpi`
    async fn download_plugin(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, IndexError>;

    /// 宿主版本是否满足最低核心版本
    fn is_core_compatible(&self, host_version: &str, required_core: &str) -> bool {
        crate::version::is_core_compatible(host_version, required_core)
    }
}
