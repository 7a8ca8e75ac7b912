use std::{env, str::FromStr};

use anyhow::{Context, Result, anyhow};
use crates::infra::db::postgres::postgres_connection::PoolSettings;

use super::config_model::{BackendServer, Database, DotEnvyConfig};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| env::var(key).ok())
}

fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let backend_server = BackendServer {
        host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        port: var("SERVER_PORT")
            .ok_or_else(|| anyhow!("SERVER_PORT is not set"))?
            .trim()
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: parse_or(&var, "SERVER_BODY_LIMIT", 1)?,
        timeout: parse_or(&var, "SERVER_TIMEOUT", 15)?,
    };

    let defaults = PoolSettings::default();
    let database = Database {
        url: match var("DATABASE_URL") {
            Some(url) => url,
            None => database_url_from_parts(&var)?,
        },
        pool: PoolSettings {
            max_size: parse_or(&var, "DB_MAX_CONNECTIONS", defaults.max_size)?,
            min_idle: parse_or(&var, "DB_MIN_IDLE", defaults.min_idle)?,
            ..defaults
        },
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
    })
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} is invalid (value: {raw})")),
        None => Ok(default),
    }
}

fn database_url_from_parts(var: &impl Fn(&str) -> Option<String>) -> Result<String> {
    let required = |key: &str| {
        var(key).ok_or_else(|| anyhow!("{key} is not set and DATABASE_URL is missing"))
    };

    let host = required("DB_HOST")?;
    let name = required("DB_NAME")?;
    let user = required("DB_USER")?;
    let password = var("DB_PASSWORD").unwrap_or_default();
    let port: u16 = parse_or(var, "DB_PORT", 5432)?;
    let sslmode = var("DB_SSLMODE").unwrap_or_else(|| "disable".to_string());

    let credentials = if password.is_empty() {
        user
    } else {
        format!("{user}:{password}")
    };

    Ok(format!(
        "postgres://{credentials}@{host}:{port}/{name}?sslmode={sslmode}"
    ))
}
