//! 插件目录属主与权限
//!
//! 插件目录归服务账号所有；用户和组名通过 /etc/passwd、/etc/group 解析，
//! 也可以直接配置数字 id。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::PathsConfig;

/// 插件目录权限
pub const PLUGINS_DIR_MODE: u32 = 0o755;

const PASSWD_FILE: &str = "/etc/passwd";
const GROUP_FILE: &str = "/etc/group";

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("未知用户: {0}")]
    UnknownUser(String),

    #[error("未知用户组: {0}")]
    UnknownGroup(String),

    #[error("修改 {path:?} 属主失败: {source}")]
    Chown {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("遍历目录失败: {0}")]
    Walk(String),

    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
}

/// 已解析的属主
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    pub fn from_ids(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// 根据配置解析属主，owner 为空时返回 `None`（不修改属主）
    pub fn from_config(paths: &PathsConfig) -> Result<Option<Self>, OwnershipError> {
        if paths.owner.trim().is_empty() {
            return Ok(None);
        }
        let group = if paths.group.trim().is_empty() {
            paths.owner.as_str()
        } else {
            paths.group.as_str()
        };
        Self::resolve(paths.owner.trim(), group.trim()).map(Some)
    }

    /// 解析用户名和组名
    pub fn resolve(owner: &str, group: &str) -> Result<Self, OwnershipError> {
        let uid = match owner.parse::<u32>() {
            Ok(uid) => uid,
            Err(_) => {
                let passwd = fs::read_to_string(PASSWD_FILE)?;
                lookup_id(&passwd, owner)
                    .ok_or_else(|| OwnershipError::UnknownUser(owner.to_string()))?
            }
        };
        let gid = match group.parse::<u32>() {
            Ok(gid) => gid,
            Err(_) => {
                let groups = fs::read_to_string(GROUP_FILE)?;
                lookup_id(&groups, group)
                    .ok_or_else(|| OwnershipError::UnknownGroup(group.to_string()))?
            }
        };
        Ok(Self { uid, gid })
    }

    /// 修改单个路径的属主（不跟随符号链接）
    pub fn apply(&self, path: &Path) -> Result<(), OwnershipError> {
        #[cfg(unix)]
        {
            std::os::unix::fs::lchown(path, Some(self.uid), Some(self.gid)).map_err(|source| {
                OwnershipError::Chown {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        }
        #[cfg(not(unix))]
        let _ = path;
        Ok(())
    }

    /// 递归修改目录树属主（包括根目录）
    pub fn apply_recursive(&self, root: &Path) -> Result<(), OwnershipError> {
        debug!("[OWNERSHIP] chown -R {}:{} {:?}", self.uid, self.gid, root);
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| OwnershipError::Walk(e.to_string()))?;
            self.apply(entry.path())?;
        }
        Ok(())
    }
}

/// 从 passwd/group 格式内容中按名称查找 id（第三列）
pub fn lookup_id(content: &str, name: &str) -> Option<u32> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find_map(|line| {
            let mut fields = line.split(':');
            let entry_name = fields.next()?;
            if entry_name != name {
                return None;
            }
            fields.nth(1)?.parse().ok()
        })
}

/// 确保目录存在并设置属主和权限
pub fn ensure_dir(path: &Path, ownership: Option<&Ownership>, mode: u32) -> Result<(), OwnershipError> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    if let Some(ownership) = ownership {
        ownership.apply(path)?;
    }
    Ok(())
}
