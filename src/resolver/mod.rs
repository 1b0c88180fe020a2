//! 插件依赖解析
//!
//! - `expand`：将插件集合扩展为包含全部传递依赖的不动点
//! - `partition`：按宿主版本拆分为兼容与不兼容两部分
//! - `Resolver::plan`：在请求列表前加入必需插件，得到最终安装计划
//!
//! 解析结果每次调用时重新计算，不做持久化。


use indexmap::IndexSet;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

use crate::admin::{AdminError, HostAdmin};
use crate::update_center::{IndexError, PluginIndex};

/// Jenkins 运行所必需的插件，无论配置如何都会进入解析
pub const REQUIRED_PLUGINS: &[&str] = &["instance-identity"];

/// 解析错误
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Admin(#[from] AdminError),
}

/// 兼容性拆分结果，两个列表都保持输入顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub compatible: Vec<String>,
    pub incompatible: Vec<String>,
}

/// 安装计划
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// 兼容的插件（含传递依赖和必需插件）
    pub to_install: IndexSet<String>,
    /// 因宿主版本过低而排除的插件，仅用于报告
    pub excluded: IndexSet<String>,
}

/// 把必需插件放在请求列表前面并去重
pub fn with_required<I, S>(requested: I) -> IndexSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    REQUIRED_PLUGINS
        .iter()
        .map(|name| name.to_string())
        .chain(requested.into_iter().map(Into::into))
        .filter(|name| !name.trim().is_empty())
        .collect()
}

/// 扩展到传递依赖的不动点
///
/// 使用工作队列，每个名称只查询一次索引；可选依赖不参与扩展。
/// 结果顺序：先是输入顺序，再按发现顺序追加依赖。
pub async fn expand(
    index: &dyn PluginIndex,
    names: &IndexSet<String>,
) -> Result<IndexSet<String>, IndexError> {
    let mut resolved = names.clone();
    let mut queue: VecDeque<String> = names.iter().cloned().collect();

    while let Some(name) = queue.pop_front() {
        let metadata = index.plugin_data(&name).await?;
        for dependency in metadata.required_dependencies() {
            if resolved.insert(dependency.to_string()) {
                debug!("[RESOLVER] {} 依赖 {}", name, dependency);
                queue.push_back(dependency.to_string());
            }
        }
    }

    Ok(resolved)
}

/// 按宿主版本拆分插件集合
///
/// 宿主版本不低于插件的最低核心版本时视为兼容；清单未声明最低版本的插件视为兼容。
pub async fn partition(
    index: &dyn PluginIndex,
    names: &IndexSet<String>,
    host_version: &str,
) -> Result<Partition, IndexError> {
    let mut result = Partition::default();

    for name in names {
        let metadata = index.plugin_data(name).await?;
        let compatible = match metadata.required_core.as_deref() {
            Some(required) => index.is_core_compatible(host_version, required),
            None => true,
        };

        if compatible {
            result.compatible.push(name.clone());
        } else {
            debug!(
                "[RESOLVER] {} 需要 Jenkins {:?}，当前为 {}",
                name, metadata.required_core, host_version
            );
            result.incompatible.push(name.clone());
        }
    }

    Ok(result)
}

/// 安装计划解析器
pub struct Resolver<'a> {
    index: &'a dyn PluginIndex,
    admin: &'a dyn HostAdmin,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a dyn PluginIndex, admin: &'a dyn HostAdmin) -> Self {
        Self { index, admin }
    }

    /// 计算安装计划
    pub async fn plan<I, S>(&self, requested: I) -> Result<Plan, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested = with_required(requested);
        let resolved = expand(self.index, &requested).await?;
        let host_version = self.admin.version().await?;
        let partition = partition(self.index, &resolved, &host_version).await?;

        info!(
            "[RESOLVER] 请求 {} 个插件, 解析后 {} 个, 排除 {} 个 (Jenkins {})",
            requested.len(),
            resolved.len(),
            partition.incompatible.len(),
            host_version
        );

        Ok(Plan {
            to_install: partition.compatible.into_iter().collect(),
            excluded: partition.incompatible.into_iter().collect(),
        })
    }
}
