use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// 用户存储库实现选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryBackend {
    /// 本地键值存储（模拟数据库）
    Local,
    /// 远程 HTTP API
    Remote,
}

/// 键值存储实现选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Redis,
}

impl FromStr for RepositoryBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "mock" => Ok(Self::Local),
            "remote" | "http" => Ok(Self::Remote),
            other => Err(ConfigError::Invalid {
                key: "REPOSITORY_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} is required when STORAGE_BACKEND=redis")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub repository_backend: RepositoryBackend,
    pub remote_api_url: String,
    pub storage_backend: StorageBackend,
    pub redis_url: Option<String>,
    pub storage_namespace: String,
    pub mock_latency_ms: u64,
    pub free_message_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".into(),
            server_port: 5002,
            api_base_uri: "/api".into(),
            repository_backend: RepositoryBackend::Local,
            remote_api_url: "http://localhost:5002/api".into(),
            storage_backend: StorageBackend::Memory,
            redis_url: None,
            storage_namespace: "floatchat".into(),
            mock_latency_ms: 0,
            free_message_limit: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置，未设置的项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(v) => v.parse()?,
            None => defaults.storage_backend,
        };
        let redis_url = lookup("REDIS_URL").filter(|v| !v.trim().is_empty());
        if storage_backend == StorageBackend::Redis && redis_url.is_none() {
            return Err(ConfigError::Missing("REDIS_URL"));
        }

        Ok(Config {
            server_host: lookup("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port)?,
            api_base_uri: lookup("API_BASE_URI").unwrap_or(defaults.api_base_uri),
            repository_backend: match lookup("REPOSITORY_BACKEND") {
                Some(v) => v.parse()?,
                None => defaults.repository_backend,
            },
            remote_api_url: lookup("REMOTE_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.remote_api_url),
            storage_backend,
            redis_url,
            storage_namespace: lookup("STORAGE_NAMESPACE").unwrap_or(defaults.storage_namespace),
            mock_latency_ms: parse_or(&lookup, "MOCK_LATENCY_MS", defaults.mock_latency_ms)?,
            free_message_limit: parse_or(
                &lookup,
                "FREE_MESSAGE_LIMIT",
                defaults.free_message_limit,
            )?,
        })
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.server_port, 5002);
        assert_eq!(config.api_base_uri, "/api");
        assert_eq!(config.repository_backend, RepositoryBackend::Local);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.free_message_limit, 3);
        assert_eq!(config.mock_latency(), Duration::ZERO);
    }

    #[test]
    fn remote_backend_and_trailing_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("REPOSITORY_BACKEND", "Remote"),
            ("REMOTE_API_URL", "http://api.example.test/api/"),
        ]))
        .unwrap();

        assert_eq!(config.repository_backend, RepositoryBackend::Remote);
        assert_eq!(config.remote_api_url, "http://api.example.test/api");
    }

    #[test]
    fn redis_requires_url() {
        let err = Config::from_lookup(lookup_from(&[("STORAGE_BACKEND", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("REDIS_URL")));
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = Config::from_lookup(lookup_from(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SERVER_PORT", .. }));
    }
}
