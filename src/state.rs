use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::db::{MemoryRepository, PgRepository, Repository};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let repo = match config.database_url.as_deref() {
            Some(url) => {
                let pg = PgRepository::connect(url, config.db_max_connections).await?;
                pg.migrate().await?;
                info!("using postgres repository");
                Arc::new(pg) as Arc<dyn Repository>
            }
            None => {
                warn!("DATABASE_URL not set; data lives in memory and is lost on exit");
                Arc::new(MemoryRepository::new()) as Arc<dyn Repository>
            }
        };

        Ok(Self::from_parts(repo, config))
    }

    pub fn from_parts(repo: Arc<dyn Repository>, config: Arc<AppConfig>) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self { repo, config, keys }
    }

    /// State backed by an empty in-memory repository, for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(|_| {})
    }

    #[cfg(test)]
    pub fn fake_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        use crate::config::{CurrencyConfig, JwtConfig};

        let mut config = AppConfig {
            database_url: None,
            db_max_connections: 1,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            currency: CurrencyConfig {
                fallback_name: "UAH".into(),
                honor_client_currency: false,
            },
        };
        tweak(&mut config);
        Self::from_parts(Arc::new(MemoryRepository::new()), Arc::new(config))
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}
