//! 插件安装器核心实现
//!
//! 安装流程：
//! 1. 解析安装计划（必需插件 + 请求插件 + 传递依赖，排除不兼容插件）
//! 2. 逐个决定是否下载，单个插件下载失败不影响其余插件
//! 3. 修正插件目录属主
//! 4. 按配置列表处理未列出的插件
//! 5. 重启 Jenkins 使插件生效

use indexmap::IndexSet;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::types::{BatchOutcome, InstallDecision, InstallError, InstallReport, UnlistedOutcome};
use crate::admin::{HostAdmin, JenkinsApi};
use crate::config::Config;
use crate::plugin::layout::{list_plugin_files, plugin_name, plugin_names, remove_plugin_file};
use crate::plugin::ownership::{ensure_dir, Ownership, PLUGINS_DIR_MODE};
use crate::proxy::ProxyClientFactory;
use crate::resolver::{Plan, Resolver};
use crate::update_center::{PluginIndex, UpdateCenter};

/// 安装选项
#[derive(Debug, Clone, Default)]
pub struct InstallerOptions {
    /// 配置中声明的插件列表，作为清理未列出插件的基准
    pub configured_plugins: Vec<String>,
    /// 已安装版本与最新版本不同时是否重新下载
    pub auto_update: bool,
    /// 是否删除未列出的插件
    pub remove_unlisted: bool,
}

/// 插件安装器
///
/// 负责协调整个安装流程
pub struct PluginInstaller {
    index: Arc<dyn PluginIndex>,
    admin: Arc<dyn HostAdmin>,
    /// 插件目录
    plugins_dir: PathBuf,
    ownership: Option<Ownership>,
    options: InstallerOptions,
}

impl PluginInstaller {
    /// 创建新的安装器实例
    pub fn new(
        index: Arc<dyn PluginIndex>,
        admin: Arc<dyn HostAdmin>,
        plugins_dir: PathBuf,
        ownership: Option<Ownership>,
        options: InstallerOptions,
    ) -> Self {
        Self {
            index,
            admin,
            plugins_dir,
            ownership,
            options,
        }
    }

    /// 根据配置创建安装器
    ///
    /// 连接插件站点失败时返回 `InstallError::PluginSite`。
    pub async fn from_config(config: &Config) -> Result<Self, InstallError> {
        let factory = ProxyClientFactory::from_settings(&config.proxy_settings())
            .with_connect_timeout(config.timeouts.connect())
            .with_request_timeout(config.timeouts.request());
        let client = factory.create_client()?;

        let update_center = UpdateCenter::connect(&config.plugins_site, client).await?;
        let admin = JenkinsApi::new(&config.jenkins, config.timeouts.request())?;
        let ownership = Ownership::from_config(&config.paths)?;

        Ok(Self::new(
            Arc::new(update_center),
            Arc::new(admin),
            config.paths.plugins.clone(),
            ownership,
            InstallerOptions {
                configured_plugins: config.configured_plugins(),
                auto_update: config.plugins_auto_update,
                remove_unlisted: config.remove_unlisted_plugins,
            },
        ))
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.index.as_ref(), self.admin.as_ref())
    }

    /// 计算安装计划
    pub async fn plan<I, S>(&self, requested: I) -> Result<Plan, InstallError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.resolver().plan(requested).await?)
    }

    /// 决定单个插件是否需要安装
    pub async fn decide_install(&self, name: &str) -> Result<InstallDecision, InstallError> {
        let installed = self.admin.plugin_version(name).await?;
        let latest = self.index.plugin_data(name).await?.version;
        Ok(InstallDecision::evaluate(installed, latest))
    }

    /// 安装插件
    ///
    /// `requested` 只影响本次安装哪些插件；清理未列出插件始终以配置列表为准。
    pub async fn install<I, S>(&self, requested: I) -> Result<InstallReport, InstallError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        info!("[PLUGINS] 开始安装插件");

        match self.run(requested).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("[PLUGINS] 插件安装失败, 详情见日志: {}", e);
                Err(e)
            }
        }
    }

    /// 安装流程主体
    ///
    /// 两个计划都在修改插件目录之前算出，解析失败时磁盘保持不变。
    async fn run<I, S>(&self, requested: I) -> Result<InstallReport, InstallError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let plan = self.plan(requested).await?;
        if !plan.excluded.is_empty() {
            info!(
                "[PLUGINS] 以下插件需要更高版本的 Jenkins, 未安装: ({})",
                join(&plan.excluded)
            );
        }
        let configured = self.plan(self.options.configured_plugins.clone()).await?;

        ensure_dir(&self.plugins_dir, self.ownership.as_ref(), PLUGINS_DIR_MODE)?;
        let existing = list_plugin_files(&self.plugins_dir)?;

        let batch = self.install_plugins(&plan.to_install).await?;
        let unlisted = self.reconcile_unlisted(&existing, &configured.to_install)?;

        info!("[PLUGINS] 重启 Jenkins 以加载插件");
        self.admin.restart().await?;

        let present = list_plugin_files(&self.plugins_dir)?;
        Ok(InstallReport {
            installed: plugin_names(&present),
            excluded: plan.excluded,
            downloaded: batch.downloaded,
            failed: batch.failed,
            unlisted: unlisted.unlisted,
            removed: unlisted.removed,
        })
    }

    /// 逐个安装插件，结束后修正插件目录属主
    async fn install_plugins(&self, names: &IndexSet<String>) -> Result<BatchOutcome, InstallError> {
        info!("[PLUGINS] 安装插件 ({})", join(names));
        let mut outcome = BatchOutcome::default();

        for name in names {
            let decision = self.decide_install(name).await?;
            if !decision.should_download(self.options.auto_update) {
                info!("[PLUGINS] 插件 {} {}, 跳过", name, decision);
                outcome.skipped.push(name.clone());
                continue;
            }

            info!("[PLUGINS] 安装插件 {}-{}", name, decision.target_version());
            match self.index.download_plugin(name, &self.plugins_dir).await {
                Ok(_) => outcome.downloaded.push(name.clone()),
                Err(e) if e.is_download_failure() => {
                    warn!("[PLUGINS] 下载 {} 失败: {}", name, e);
                    outcome.failed.push(name.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(ownership) = &self.ownership {
            ownership.apply_recursive(&self.plugins_dir)?;
        }

        Ok(outcome)
    }

    /// 处理不在配置列表闭包中的插件文件
    ///
    /// `existing` 为下载开始前的插件文件列表，`closure` 为配置列表的安装计划。
    pub fn reconcile_unlisted(
        &self,
        existing: &BTreeSet<PathBuf>,
        closure: &IndexSet<String>,
    ) -> Result<UnlistedOutcome, InstallError> {
        let unlisted = find_unlisted(existing, closure);

        let mut outcome = UnlistedOutcome::default();
        if unlisted.is_empty() {
            return Ok(outcome);
        }

        if self.options.remove_unlisted {
            for path in &unlisted {
                if remove_plugin_file(path)? {
                    info!("[PLUGINS] 删除未列出的插件 '{}'", path.display());
                    outcome.removed.push(path.clone());
                }
            }
        } else {
            let listed: Vec<String> = unlisted.iter().map(|p| p.display().to_string()).collect();
            info!(
                "[PLUGINS] 未列出的插件: ({}) 未删除。将 remove-unlisted-plugins 设为 'yes' 以清理",
                listed.join(", ")
            );
        }

        outcome.unlisted = unlisted;
        Ok(outcome)
    }

    /// 插件目录
    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn options(&self) -> &InstallerOptions {
        &self.options
    }
}

/// 不在闭包中的插件文件（按文件名去掉扩展名后匹配）
pub fn find_unlisted(existing: &BTreeSet<PathBuf>, closure: &IndexSet<String>) -> Vec<PathBuf> {
    existing
        .iter()
        .filter(|path| match plugin_name(path) {
            Some(name) => !closure.contains(name),
            None => true,
        })
        .cloned()
        .collect()
}

fn join(names: &IndexSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}
