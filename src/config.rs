//! 配置管理
//!
//! 从 YAML 文件加载插件同步配置，键名沿用 kebab-case 风格：
//!
//! ```yaml
//! proxy-hostname: proxy.internal
//! proxy-port: 3128
//! plugins-site: https://updates.jenkins-ci.org/latest/
//! plugins: git workflow-aggregator
//! plugins-auto-update: true
//! remove-unlisted-plugins: "yes"
//! jenkins:
//!   url: http://localhost:8080
//!   username: admin
//!   password: 11aa22bb
//! ```

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::proxy::ProxySettings;
use crate::update_center::DEFAULT_PLUGINS_SITE;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("配置无效: {0}")]
    Invalid(String),
}

/// 插件同步配置
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub proxy_hostname: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub proxy_port: String,
    #[serde(default)]
    pub proxy_username: String,
    #[serde(default)]
    pub proxy_password: String,

    /// 插件站点（update center）基础 URL
    #[serde(default = "default_plugins_site")]
    pub plugins_site: String,

    /// 以空白分隔的插件列表
    #[serde(default)]
    pub plugins: String,

    #[serde(default)]
    pub plugins_auto_update: bool,

    #[serde(default, deserialize_with = "yes_no")]
    pub remove_unlisted_plugins: bool,

    pub jenkins: JenkinsConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Jenkins 管理 API 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsConfig {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// 插件目录配置
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsConfig {
    #[serde(default = "default_plugins_dir")]
    pub plugins: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub plugins_backup: PathBuf,
    /// 插件目录属主，空字符串表示不修改属主
    #[serde(default = "default_service_account")]
    pub owner: String,
    #[serde(default = "default_service_account")]
    pub group: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            plugins: default_plugins_dir(),
            plugins_backup: default_backup_dir(),
            owner: default_service_account(),
            group: default_service_account(),
        }
    }
}

/// HTTP 超时配置（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_secs")]
    pub connect_secs: u64,
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_secs(),
            request_secs: default_request_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_plugins_site() -> String {
    DEFAULT_PLUGINS_SITE.to_string()
}

fn default_plugins_dir() -> PathBuf {
    PathBuf::from("/var/lib/jenkins/plugins")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/var/lib/jenkins/plugins.bak")
}

fn default_service_account() -> String {
    "jenkins".to_string()
}

fn default_connect_secs() -> u64 {
    30
}

fn default_request_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 端口既可以写成字符串也可以写成数字
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

/// 接受 "yes"/"no" 以及布尔值
fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(true),
            "no" | "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "期望 'yes' 或 'no'，实际为 '{}'",
                other
            ))),
        },
    }
}

impl Config {
    /// 从文件加载配置
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// 从 YAML 字符串解析并校验配置
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jenkins.url.trim().is_empty() {
            return Err(ConfigError::Invalid("jenkins.url 不能为空".to_string()));
        }

        let port = self.proxy_port.trim();
        if !port.is_empty() && port.parse::<u16>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "proxy-port 不是有效端口: {}",
                port
            )));
        }

        if self.plugins_site.trim().is_empty() {
            return Err(ConfigError::Invalid("plugins-site 不能为空".to_string()));
        }

        Ok(())
    }

    /// 代理配置项
    pub fn proxy_settings(&self) -> ProxySettings {
        ProxySettings {
            hostname: self.proxy_hostname.clone(),
            port: self.proxy_port.clone(),
            username: self.proxy_username.clone(),
            password: self.proxy_password.clone(),
        }
    }

    /// 配置中声明的插件列表
    pub fn configured_plugins(&self) -> Vec<String> {
        split_plugin_list(&self.plugins)
    }
}

/// 拆分以空白分隔的插件列表
pub fn split_plugin_list(list: &str) -> Vec<String> {
    list.split_whitespace().map(str::to_string).collect()
}
