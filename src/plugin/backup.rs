//! 插件备份与恢复
//!
//! 在插件目录和备份目录之间整体复制，不做合并：
//! 恢复时先删除插件目录，再把备份复制回来。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use super::installer::InstallError;
use super::ownership::Ownership;
use crate::config::PathsConfig;

/// 插件备份服务
#[derive(Debug, Clone)]
pub struct PluginBackup {
    plugins_dir: PathBuf,
    backup_dir: PathBuf,
    ownership: Option<Ownership>,
}

impl PluginBackup {
    pub fn new(plugins_dir: PathBuf, backup_dir: PathBuf, ownership: Option<Ownership>) -> Self {
        Self {
            plugins_dir,
            backup_dir,
            ownership,
        }
    }

    pub fn from_config(paths: &PathsConfig) -> Result<Self, InstallError> {
        Ok(Self::new(
            paths.plugins.clone(),
            paths.plugins_backup.clone(),
            Ownership::from_config(paths)?,
        ))
    }

    /// 备份插件目录
    pub fn backup(&self) -> Result<(), InstallError> {
        info!("[BACKUP] 备份插件: {:?} -> {:?}", self.plugins_dir, self.backup_dir);
        copy_tree(&self.plugins_dir, &self.backup_dir)?;
        Ok(())
    }

    /// 从备份目录恢复插件
    ///
    /// 备份目录不存在时在删除插件目录之前返回错误。
    pub fn restore(&self) -> Result<(), InstallError> {
        info!("[BACKUP] 从备份恢复插件: {:?} -> {:?}", self.backup_dir, self.plugins_dir);
        fs::metadata(&self.backup_dir)?;

        if self.plugins_dir.exists() {
            fs::remove_dir_all(&self.plugins_dir)?;
        }
        copy_tree(&self.backup_dir, &self.plugins_dir)?;

        if let Some(ownership) = &self.ownership {
            ownership.apply_recursive(&self.plugins_dir)?;
        }
        Ok(())
    }

    /// 删除备份目录
    pub fn clean_backup(&self) -> Result<(), InstallError> {
        info!("[BACKUP] 清理插件备份: {:?}", self.backup_dir);
        match fs::remove_dir_all(&self.backup_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

/// 递归复制目录，目标已存在的文件会被覆盖
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else {
            // fs::copy 会同时复制权限位
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}
