//! 基于 Jenkins REST API 的 `HostAdmin` 实现

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{AdminError, HostAdmin};
use crate::config::JenkinsConfig;

/// pluginManager/api/json 响应
#[derive(Debug, Deserialize)]
struct PluginManagerResponse {
    #[serde(default)]
    plugins: Vec<InstalledPluginInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstalledPluginInfo {
    short_name: String,
    version: String,
}

/// Jenkins 管理 API 客户端
pub struct JenkinsApi {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl JenkinsApi {
    /// 创建客户端
    ///
    /// 管理 API 访问本地 Jenkins，始终不走代理。
    pub fn new(config: &JenkinsConfig, timeout: Duration) -> Result<Self, AdminError> {
        let client = Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| AdminError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, Some(&self.password))
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, AdminError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| AdminError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdminError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HostAdmin for JenkinsApi {
    async fn plugin_version(&self, name: &str) -> Result<Option<String>, AdminError> {
        let url = self.url("pluginManager/api/json?depth=1");
        let response = self.send(self.client.get(&url), &url).await?;
        let body: PluginManagerResponse = response
            .json()
            .await
            .map_err(|e| AdminError::InvalidResponse(e.to_string()))?;

        let version = body
            .plugins
            .into_iter()
            .find(|p| p.short_name == name)
            .map(|p| p.version);
        debug!("[JENKINS] 插件 {} 已安装版本: {:?}", name, version);
        Ok(version)
    }

    async fn version(&self) -> Result<String, AdminError> {
        let url = self.url("");
        let response = self.send(self.client.get(&url), &url).await?;
        response
            .headers()
            .get("x-jenkins")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AdminError::MissingVersionHeader)
    }

    async fn restart(&self) -> Result<(), AdminError> {
        let url = self.url("safeRestart");
        info!("[JENKINS] 请求重启 Jenkins");
        self.send(self.client.post(&url), &url).await?;
        Ok(())
    }
}
