use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::connection::{
    compose_url, expand_env_vars, ConnectionParts, ResolvedConnection, UrlSource,
};
use crate::matcher::{LexicalStrategy, Matcher, ValueStrategy};
use crate::session::{duration_from_str, SessionTimeouts};

pub const DEFAULT_CONFIG_FILE: &str = "wordmatch.toml";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8089;
pub const DEFAULT_POOL_SIZE: usize = 5;
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(10);

/// Main configuration structure loaded from wordmatch.toml
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    pub matcher: Option<MatcherConfig>,
    pub peer: Option<PeerConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Full URL; may contain `${VAR}`. Wins over the discrete fields below.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub user: Option<String>,
    /// May contain `${VAR}`.
    pub password: Option<String>,
    pub pool_size: Option<usize>,
    #[serde(default)]
    pub timeouts: SessionTimeouts,
    #[serde(default)]
    pub storage: StorageKind,
}

/// Which phrase store backs the service.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct MatcherConfig {
    pub value: Option<ValueStrategy>,
    pub lexical: Option<LexicalStrategy>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    pub url: Option<String>,
    #[serde(default = "default_peer_timeout", deserialize_with = "duration_from_str")]
    pub timeout: Duration,
}

fn default_peer_timeout() -> Duration {
    DEFAULT_PEER_TIMEOUT
}

impl Config {
    /// Load config from file, or return default if no config exists.
    /// If an explicit path is provided via --config, it MUST exist (error if not).
    /// If no path is provided, check ./wordmatch.toml (use default if not found).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    bail!("Config file not found: {}", p.display());
                }
                p
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    default_path
                } else {
                    return Ok(Config::default());
                }
            }
        };

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(size) = self.database.as_ref().and_then(|d| d.pool_size) {
            if size == 0 {
                bail!("database.pool_size must be at least 1");
            }
        }
        Ok(())
    }

    /// Address to listen on: CLI > config > defaults.
    pub fn listen_addr(&self, cli_host: Option<&str>, cli_port: Option<u16>) -> Result<SocketAddr> {
        let host = cli_host
            .or_else(|| self.server.as_ref().and_then(|s| s.host.as_deref()))
            .unwrap_or(DEFAULT_HOST);
        let port = cli_port
            .or_else(|| self.server.as_ref().and_then(|s| s.port))
            .unwrap_or(DEFAULT_PORT);

        let ip: IpAddr = host
            .parse()
            .with_context(|| format!("Invalid listen host '{}': expected an IP address", host))?;
        Ok(SocketAddr::new(ip, port))
    }

    /// Resolve the database URL.
    ///
    /// Resolution order:
    /// 1. -d / --database-url
    /// 2. DATABASE_URL environment variable (passed in by the caller)
    /// 3. [database].url in config
    /// 4. [database] host/port/name/user/password
    pub fn resolve_database_url(
        &self,
        cli_url: Option<&str>,
        env_url: Option<&str>,
    ) -> Result<ResolvedConnection> {
        if let Some(url) = cli_url {
            return ResolvedConnection::from_url(url.to_string(), UrlSource::Cli);
        }

        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            return ResolvedConnection::from_url(url.to_string(), UrlSource::Env);
        }

        let db = self.database.as_ref();

        if let Some(template) = db.and_then(|d| d.url.as_deref()) {
            let url = expand_env_vars("database.url", template)?;
            return ResolvedConnection::from_url(url, UrlSource::ConfigUrl);
        }

        let password = db
            .and_then(|d| d.password.as_deref())
            .map(|p| expand_env_vars("database.password", p))
            .transpose()?;

        let url = compose_url(&ConnectionParts {
            host: db.and_then(|d| d.host.as_deref()).unwrap_or("localhost"),
            port: db.and_then(|d| d.port).unwrap_or(5432),
            database: db.and_then(|d| d.name.as_deref()).unwrap_or("words"),
            user: db.and_then(|d| d.user.as_deref()).unwrap_or("postgres"),
            password: password.as_deref(),
        })?;
        ResolvedConnection::from_url(url, UrlSource::ConfigParts)
    }

    pub fn storage(&self) -> StorageKind {
        self.database
            .as_ref()
            .map(|d| d.storage)
            .unwrap_or_default()
    }

    pub fn pool_size(&self) -> usize {
        self.database
            .as_ref()
            .and_then(|d| d.pool_size)
            .unwrap_or(DEFAULT_POOL_SIZE)
    }

    pub fn timeouts(&self) -> SessionTimeouts {
        self.database
            .as_ref()
            .map(|d| d.timeouts)
            .unwrap_or_default()
    }

    /// Strategies: CLI > config > defaults.
    pub fn matcher(
        &self,
        cli_value: Option<ValueStrategy>,
        cli_lexical: Option<LexicalStrategy>,
    ) -> Matcher {
        let configured = self.matcher.as_ref();
        Matcher::new(
            cli_value
                .or_else(|| configured.and_then(|m| m.value))
                .unwrap_or_default(),
            cli_lexical
                .or_else(|| configured.and_then(|m| m.lexical))
                .unwrap_or_default(),
        )
    }

    /// Peer base URL: CLI > config. `None` means candidates come from the store.
    pub fn peer_url<'a>(&'a self, cli_peer: Option<&'a str>) -> Option<&'a str> {
        cli_peer
            .or_else(|| self.peer.as_ref().and_then(|p| p.url.as_deref()))
            .filter(|url| !url.trim().is_empty())
    }

    pub fn peer_timeout(&self) -> Duration {
        self.peer
            .as_ref()
            .map_or(DEFAULT_PEER_TIMEOUT, |p| p.timeout)
    }
}
