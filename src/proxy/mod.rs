//! 代理模块
//!
//! 为插件站点访问提供带代理配置的 HTTP 客户端

mod client_factory;

pub use client_factory::{ProxyClientFactory, ProxyError, ProxyMode, ProxySettings};
