//! 插件目录布局
//!
//! 插件文件命名为 `<name>.jpi` 或 `<name>.hpi`

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::installer::InstallError;

/// 列出插件目录中的插件文件
pub fn list_plugin_files(dir: &Path) -> Result<BTreeSet<PathBuf>, InstallError> {
    let pattern = format!(
        "{}/*.[hj]pi",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let entries = glob::glob(&pattern).map_err(|e| InstallError::Glob(e.to_string()))?;
    let mut files = BTreeSet::new();
    for entry in entries {
        let path = entry.map_err(|e| InstallError::Glob(e.to_string()))?;
        files.insert(path);
    }
    Ok(files)
}

/// 插件文件对应的插件名
pub fn plugin_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// 插件文件对应的插件名集合
pub fn plugin_names<'a, I>(paths: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    paths
        .into_iter()
        .filter_map(|p| plugin_name(p))
        .map(str::to_string)
        .collect()
}

/// 删除插件文件，路径不是普通文件时跳过并返回 `false`
pub fn remove_plugin_file(path: &Path) -> io::Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(path)?;
    Ok(true)
}
