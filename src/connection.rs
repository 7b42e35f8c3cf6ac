//! Database connection resolution for wordmatch.
//!
//! Supports:
//! - Environment variable expansion (`${VAR}`)
//! - Composing a URL from discrete host/port/name/user/password settings
//! - Password-free display of the resolved target

use anyhow::{bail, Context, Result};
use url::Url;

/// Where the database URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    Cli,
    Env,
    ConfigUrl,
    ConfigParts,
}

impl std::fmt::Display for UrlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlSource::Cli => write!(f, "--database-url"),
            UrlSource::Env => write!(f, "DATABASE_URL"),
            UrlSource::ConfigUrl => write!(f, "database.url"),
            UrlSource::ConfigParts => write!(f, "database settings"),
        }
    }
}

/// A fully resolved connection ready for use
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    /// Resolved database URL (never log this!)
    pub url: String,
    /// Host extracted from URL (safe to display)
    pub host: String,
    /// Port (default 5432)
    pub port: u16,
    /// Database name
    pub database: String,
    /// Username
    pub user: String,
    pub source: UrlSource,
}

impl ResolvedConnection {
    pub fn from_url(url: String, source: UrlSource) -> Result<Self> {
        let parsed = parse_connection_url(&url)?;
        Ok(Self {
            url,
            host: parsed.host,
            port: parsed.port,
            database: parsed.database,
            user: parsed.user,
            source,
        })
    }

    /// Display string for banner (never includes password)
    pub fn display(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Log the connection banner
    pub fn log_banner(&self) {
        tracing::info!(
            db = %self.display(),
            user = %self.user,
            source = %self.source,
            "using phrase database"
        );
    }
}

/// Discrete connection settings, used when no URL is given.
#[derive(Debug, Clone)]
pub struct ConnectionParts<'a> {
    pub host: &'a str,
    pub port: u16,
    pub database: &'a str,
    pub user: &'a str,
    pub password: Option<&'a str>,
}

/// Build a postgres URL from parts, percent-encoding credentials.
pub fn compose_url(parts: &ConnectionParts<'_>) -> Result<String> {
    if parts.database.is_empty() {
        bail!("database.name cannot be empty");
    }

    let mut url = Url::parse("postgres://localhost").context("Invalid base URL")?;
    url.set_host(Some(parts.host))
        .with_context(|| format!("Invalid database host '{}'", parts.host))?;
    url.set_port(Some(parts.port))
        .map_err(|_| anyhow::anyhow!("Cannot set port on database URL"))?;
    url.set_username(parts.user)
        .map_err(|_| anyhow::anyhow!("Cannot set user on database URL"))?;
    url.set_password(parts.password)
        .map_err(|_| anyhow::anyhow!("Cannot set password on database URL"))?;
    url.set_path(&format!("/{}", parts.database));

    Ok(url.to_string())
}

/// Expand environment variables in a string (${VAR} syntax)
pub fn expand_env_vars(field: &str, template: &str) -> Result<String> {
    let mut result = template.to_string();
    let mut start = 0;

    while let Some(var_start) = result[start..].find("${") {
        let var_start = start + var_start;
        let var_end = result[var_start..]
            .find('}')
            .ok_or_else(|| anyhow::anyhow!("Unclosed ${{ in {}", field))?;
        let var_end = var_start + var_end;

        let var_name = &result[var_start + 2..var_end];
        let var_value = std::env::var(var_name).with_context(|| {
            format!(
                "{} references undefined environment variable '{}'.\n\
                 Hint: Set the variable or update wordmatch.toml",
                field, var_name
            )
        })?;

        result = format!("{}{}{}", &result[..var_start], var_value, &result[var_end + 1..]);
        start = var_start + var_value.len();
    }

    Ok(result)
}

/// Parsed URL components
struct ParsedUrl {
    host: String,
    port: u16,
    database: String,
    user: String,
}

/// Parse a database URL to extract components (safe for display)
fn parse_connection_url(url: &str) -> Result<ParsedUrl> {
    let parsed = Url::parse(url).with_context(|| "Invalid database URL format")?;

    if !matches!(parsed.scheme(), "postgres" | "postgresql") {
        bail!(
            "Database URL must use the postgres:// scheme, got '{}://'",
            parsed.scheme()
        );
    }

    let host = parsed.host_str().unwrap_or("localhost").to_string();
    let port = parsed.port().unwrap_or(5432);
    let database = parsed.path().trim_start_matches('/').to_string();
    let user = parsed.username().to_string();

    if database.is_empty() {
        bail!("Database URL must include a database name");
    }

    Ok(ParsedUrl {
        host,
        port,
        database,
        user: if user.is_empty() {
            "postgres".to_string()
        } else {
            user
        },
    })
}
