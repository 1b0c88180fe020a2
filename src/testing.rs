//! 测试用的内存插件索引和模拟管理 API

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::admin::{AdminError, HostAdmin};
use crate::update_center::{
    plugin_file_path, IndexError, PluginDependency, PluginIndex, PluginMetadata,
};

/// 内存插件索引
#[derive(Default)]
pub struct MemoryIndex {
    plugins: HashMap<String, PluginMetadata>,
    failing_downloads: HashSet<String>,
    lookups: AtomicUsize,
    downloads: Mutex<Vec<String>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加插件
    pub fn plugin(mut self, name: &str, version: &str, required_core: &str, deps: &[&str]) -> Self {
        let metadata = PluginMetadata {
            name: name.to_string(),
            version: version.to_string(),
            required_core: Some(required_core.to_string()).filter(|v| !v.is_empty()),
            dependencies: deps
                .iter()
                .map(|d| PluginDependency {
                    name: d.to_string(),
                    version: None,
                    optional: false,
                })
                .collect(),
            url: None,
            sha256: None,
            title: None,
        };
        self.plugins.insert(name.to_string(), metadata);
        self
    }

    /// 添加可选依赖
    pub fn optional_dependency(mut self, name: &str, dep: &str) -> Self {
        if let Some(metadata) = self.plugins.get_mut(name) {
            metadata.dependencies.push(PluginDependency {
                name: dep.to_string(),
                version: None,
                optional: true,
            });
        }
        self
    }

    /// 让某个插件的下载失败
    pub fn failing_download(mut self, name: &str) -> Self {
        self.failing_downloads.insert(name.to_string());
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginIndex for MemoryIndex {
    async fn plugin_data(&self, name: &str) -> Result<PluginMetadata, IndexError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(name.to_string()))
    }

    async fn download_plugin(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, IndexError> {
        let metadata = self.plugin_data(name).await?;
        if self.failing_downloads.contains(name) {
            return Err(IndexError::Download {
                name: name.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            });
        }

        let path = plugin_file_path(dest_dir, name);
        std::fs::write(&path, metadata.version.as_bytes())?;
        self.downloads.lock().unwrap().push(name.to_string());
        Ok(path)
    }
}

/// 模拟的 Jenkins 管理 API
pub struct FakeAdmin {
    host_version: String,
    installed: Mutex<HashMap<String, String>>,
    broken_plugin_query: Option<String>,
    failing_restart: bool,
    restarts: AtomicUsize,
}

impl FakeAdmin {
    pub fn new(host_version: &str) -> Self {
        Self {
            host_version: host_version.to_string(),
            installed: Mutex::new(HashMap::new()),
            broken_plugin_query: None,
            failing_restart: false,
            restarts: AtomicUsize::new(0),
        }
    }

    /// 设置已安装插件的版本
    pub fn installed(self, name: &str, version: &str) -> Self {
        self.installed
            .lock()
            .unwrap()
            .insert(name.to_string(), version.to_string());
        self
    }

    /// 查询该插件版本时返回错误
    pub fn broken_plugin_query(mut self, name: &str) -> Self {
        self.broken_plugin_query = Some(name.to_string());
        self
    }

    /// 重启请求返回错误
    pub fn failing_restart(mut self) -> Self {
        self.failing_restart = true;
        self
    }

    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostAdmin for FakeAdmin {
    async fn plugin_version(&self, name: &str) -> Result<Option<String>, AdminError> {
        if self.broken_plugin_query.as_deref() == Some(name) {
            return Err(AdminError::Request("connection reset".to_string()));
        }
        Ok(self.installed.lock().unwrap().get(name).cloned())
    }

    async fn version(&self) -> Result<String, AdminError> {
        Ok(self.host_version.clone())
    }

    async fn restart(&self) -> Result<(), AdminError> {
        if self.failing_restart {
            return Err(AdminError::Status {
                status: 503,
                url: "/safeRestart".to_string(),
            });
        }
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
