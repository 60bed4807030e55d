use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Knobs for how a record's currency gets picked.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Name of the currency used when a user has no default of their own.
    pub fallback_name: String,
    /// Use the `currency_id` from the request body when it resolves.
    pub honor_client_currency: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub currency: CurrencyConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "finance-tracker".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "finance-tracker-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let currency = CurrencyConfig {
            fallback_name: std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "UAH".into()),
            honor_client_currency: std::env::var("RECORDS_HONOR_CLIENT_CURRENCY")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        };
        Ok(Self {
            database_url,
            db_max_connections,
            jwt,
            currency,
        })
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
