//! Jenkins 管理 API
//!
//! 提供插件版本查询、宿主版本查询和重启能力

mod jenkins;

use async_trait::async_trait;
use thiserror::Error;

pub use jenkins::JenkinsApi;

/// 管理 API 错误
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("请求 Jenkins 失败: {0}")]
    Request(String),

    #[error("Jenkins 返回错误状态 {status}: {url}")]
    Status { status: u16, url: String },

    #[error("Jenkins 响应缺少 X-Jenkins 版本头")]
    MissingVersionHeader,

    #[error("无效的 Jenkins 响应: {0}")]
    InvalidResponse(String),
}

/// 宿主管理接口
#[async_trait]
pub trait HostAdmin: Send + Sync {
    /// 已安装插件的版本，未安装时返回 `None`
    async fn plugin_version(&self, name: &str) -> Result<Option<String>, AdminError>;

    /// 宿主自身版本
    async fn version(&self) -> Result<String, AdminError>;

    /// 重启宿主
    async fn restart(&self) -> Result<(), AdminError>;
}
