//! Jenkins update center 客户端
//!
//! 构造时拉取一次 update-center.json，之后的元数据查询都基于内存中的清单；
//! 插件下载以 `<name>.jpi` 命名写入插件目录。

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use super::types::{
    plugin_file_path, IndexError, PluginMetadata, PluginSiteError, UpdateCenterManifest,
};
use super::{PluginIndex, DEFAULT_PLUGINS_SITE, DEFAULT_UPDATE_CENTER_URL};
use crate::logger::sanitize_log_message;

/// update center 客户端
pub struct UpdateCenter {
    client: Client,
    manifest_url: Url,
    manifest: UpdateCenterManifest,
}

impl UpdateCenter {
    /// 根据配置的插件站点计算清单地址
    ///
    /// 默认公共站点直接使用官方 update center 地址，
    /// 其他站点在末尾追加 `/update-center.json`。
    pub fn manifest_url_for(plugins_site: &str) -> Result<Url, PluginSiteError> {
        let site = plugins_site.trim();
        let raw = if site == DEFAULT_PLUGINS_SITE {
            DEFAULT_UPDATE_CENTER_URL.to_string()
        } else {
            format!("{}/update-center.json", site.trim_end_matches('/'))
        };

        Url::parse(&raw).map_err(|e| PluginSiteError {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    /// 连接插件站点并加载清单
    pub async fn connect(plugins_site: &str, client: Client) -> Result<Self, PluginSiteError> {
        let manifest_url = Self::manifest_url_for(plugins_site)?;
        let site_error = |reason: String| PluginSiteError {
            url: manifest_url.to_string(),
            reason,
        };

        info!(
            "[UPDATE_CENTER] 加载插件站点清单: {}",
            sanitize_log_message(manifest_url.as_str())
        );

        let response = client
            .get(manifest_url.clone())
            .send()
            .await
            .map_err(|e| site_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(site_error(format!("HTTP {}", response.status())));
        }

        let body = response.text().await.map_err(|e| site_error(e.to_string()))?;
        let manifest = Self::parse_manifest(&body).map_err(|e| site_error(e.to_string()))?;

        info!(
            "[UPDATE_CENTER] 清单加载完成, 共 {} 个插件",
            manifest.plugins.len()
        );

        Ok(Self::from_manifest(client, manifest_url, manifest))
    }

    /// 使用已加载的清单创建客户端
    pub fn from_manifest(client: Client, manifest_url: Url, manifest: UpdateCenterManifest) -> Self {
        Self {
            client,
            manifest_url,
            manifest,
        }
    }

    /// 解析清单内容
    ///
    /// 官方站点返回 JSONP 形式 `updateCenter.post(\n{...}\n);`，先去掉外层包装。
    pub fn parse_manifest(body: &str) -> Result<UpdateCenterManifest, IndexError> {
        let trimmed = body.trim();
        let json = if trimmed.starts_with('{') {
            trimmed
        } else {
            let start = trimmed
                .find('{')
                .ok_or_else(|| IndexError::InvalidManifest("未找到 JSON 内容".to_string()))?;
            let end = trimmed
                .rfind('}')
                .ok_or_else(|| IndexError::InvalidManifest("JSON 内容不完整".to_string()))?;
            if end < start {
                return Err(IndexError::InvalidManifest("JSON 内容不完整".to_string()));
            }
            &trimmed[start..=end]
        };

        serde_json::from_str(json).map_err(|e| IndexError::InvalidManifest(e.to_string()))
    }

    /// 当前清单
    pub fn manifest(&self) -> &UpdateCenterManifest {
        &self.manifest
    }

    /// 清单地址
    pub fn manifest_url(&self) -> &Url {
        &self.manifest_url
    }

    fn lookup(&self, name: &str) -> Result<&PluginMetadata, IndexError> {
        self.manifest
            .plugins
            .get(name)
            .ok_or_else(|| IndexError::NotFound(name.to_string()))
    }

    /// 下载地址，相对地址基于清单地址解析
    fn download_url(&self, metadata: &PluginMetadata) -> Result<Url, IndexError> {
        let raw = metadata.url.as_deref().ok_or_else(|| IndexError::Download {
            name: metadata.name.clone(),
            reason: "清单中没有下载地址".to_string(),
        })?;

        self.manifest_url
            .join(raw)
            .map_err(|e| IndexError::Download {
                name: metadata.name.clone(),
                reason: format!("无效的下载地址 {}: {}", raw, e),
            })
    }

    /// 流式下载到临时文件，返回内容的 base64 SHA-256
    async fn fetch_to(&self, name: &str, url: Url, target: &Path) -> Result<String, IndexError> {
        let download_error = |reason: String| IndexError::Download {
            name: name.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IndexError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_error(format!("HTTP {}", response.status())));
        }

        let mut file = fs::File::create(target).await?;
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| download_error(format!("读取数据失败: {}", e)))?;
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("[UPDATE_CENTER] {} 下载 {} bytes", name, downloaded);
        Ok(BASE64.encode(hasher.finalize()))
    }
}

#[async_trait]
impl PluginIndex for UpdateCenter {
    async fn plugin_data(&self, name: &str) -> Result<PluginMetadata, IndexError> {
        self.lookup(name).cloned()
    }

    async fn download_plugin(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, IndexError> {
        let metadata = self.lookup(name)?;
        let url = self.download_url(metadata)?;
        let target = plugin_file_path(dest_dir, name);
        let temp = target.with_extension("jpi.tmp");

        info!("[UPDATE_CENTER] 开始下载: {} -> {:?}", url, target);

        let actual = match self.fetch_to(name, url, &temp).await {
            Ok(actual) => actual,
            Err(e) => {
                let _ = fs::remove_file(&temp).await;
                return Err(e);
            }
        };

        if let Some(expected) = metadata.sha256.as_deref() {
            if expected != actual {
                warn!(
                    "[UPDATE_CENTER] {} 校验和不匹配: 期望 {}, 实际 {}",
                    name, expected, actual
                );
                let _ = fs::remove_file(&temp).await;
                return Err(IndexError::ChecksumMismatch {
                    name: name.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        fs::rename(&temp, &target).await?;
        info!("[UPDATE_CENTER] 下载完成: {:?}", target);
        Ok(target)
    }
}
