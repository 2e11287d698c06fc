use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;
        let max_connections = parse_max_connections(std::env::var("DB_MAX_CONNECTIONS").ok())?;

        Ok(Settings {
            database_url,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<String>) -> anyhow::Result<u32> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|count| *count > 0)
            .with_context(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got {value:?}")),
    }
}
