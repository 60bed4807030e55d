use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::config::CurrencyConfig;
use crate::db::{new_id, Record, RecordFilter, RepoError, Repository, User};
use crate::error::ApiError;

pub struct NewRecord {
    pub user_id: String,
    pub category_id: String,
    pub amount: f64,
    pub currency_id: Option<String>,
}

/// Picks the currency for a record owned by `user`.
///
/// Order: the user's default currency, then the currency named
/// `cfg.fallback_name`, then none. With `honor_client_currency` set, a
/// requested currency takes precedence but must exist.
pub async fn resolve_currency(
    repo: &dyn Repository,
    cfg: &CurrencyConfig,
    user: &User,
    requested: Option<&str>,
) -> Result<Option<String>, ApiError> {
    if cfg.honor_client_currency {
        if let Some(id) = requested.filter(|id| !id.is_empty()) {
            return match repo.get_currency(id).await? {
                Some(c) => Ok(Some(c.id)),
                None => Err(ApiError::InvalidReference(format!(
                    "No currency found with id {id}"
                ))),
            };
        }
    } else if requested.is_some() {
        debug!(user_id = %user.id, "ignoring client currency_id");
    }

    if let Some(id) = &user.default_currency_id {
        return Ok(Some(id.clone()));
    }
    Ok(repo
        .find_currency_by_name(&cfg.fallback_name)
        .await?
        .map(|c| c.id))
}

/// Validates references, resolves the currency and stores a new record.
/// Nothing is written unless both the user and the category exist.
pub async fn create_record(
    repo: &dyn Repository,
    cfg: &CurrencyConfig,
    input: NewRecord,
) -> Result<Record, ApiError> {
    let user = repo.get_user(&input.user_id).await?;
    let category = repo.get_category(&input.category_id).await?;

    let (user, category) = match (user, category) {
        (Some(u), Some(c)) => (u, c),
        (user, category) => {
            let mut missing = Vec::new();
            if user.is_none() {
                missing.push(format!("user {}", input.user_id));
            }
            if category.is_none() {
                missing.push(format!("category {}", input.category_id));
            }
            let details = format!("Unknown {}", missing.join(", "));
            warn!(%details, "record rejected");
            return Err(ApiError::InvalidReference(details));
        }
    };

    let currency_id = resolve_currency(repo, cfg, &user, input.currency_id.as_deref()).await?;

    let record = Record {
        id: new_id(),
        user_id: user.id,
        category_id: category.id,
        currency_id,
        timestamp: now_to_second(),
        amount: input.amount,
    };

    repo.insert_record(&record).await.map_err(|e| {
        if let RepoError::Conflict(constraint) = &e {
            error!(%constraint, record_id = %record.id, "fresh record id collided");
        }
        ApiError::Internal(e.into())
    })?;

    info!(
        record_id = %record.id,
        user_id = %record.user_id,
        currency_id = ?record.currency_id,
        amount = record.amount,
        "record created"
    );
    Ok(record)
}

/// Lists records for a user and/or category. Each given filter must
/// reference an existing row.
pub async fn list_records(
    repo: &dyn Repository,
    filter: RecordFilter,
) -> Result<Vec<Record>, ApiError> {
    if filter.user_id.is_none() && filter.category_id.is_none() {
        return Err(ApiError::field(
            "_query",
            "At least one of user_id or category_id is required",
        ));
    }
    if let Some(id) = &filter.user_id {
        if repo.get_user(id).await?.is_none() {
            return Err(ApiError::not_found("user", id));
        }
    }
    if let Some(id) = &filter.category_id {
        if repo.get_category(id).await?.is_none() {
            return Err(ApiError::not_found("category", id));
        }
    }
    Ok(repo.list_records(&filter).await?)
}

fn now_to_second() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Category, Currency, MemoryRepository};

    struct Fixture {
        repo: MemoryRepository,
        user: User,
        category: Category,
    }

    fn cfg(honor: bool) -> CurrencyConfig {
        CurrencyConfig {
            fallback_name: "UAH".into(),
            honor_client_currency: honor,
        }
    }

    async fn currency(repo: &MemoryRepository, name: &str) -> Currency {
        let c = Currency { id: new_id(), name: name.into() };
        repo.insert_currency(&c).await.unwrap();
        c
    }

    async fn fixture(default_currency_id: Option<String>) -> Fixture {
        let repo = MemoryRepository::new();
        let user = User {
            id: new_id(),
            username: "alice".into(),
            password_hash: "$argon2id$stub".into(),
            default_currency_id,
        };
        let category = Category { id: new_id(), name: "groceries".into() };
        repo.insert_user(&user).await.unwrap();
        repo.insert_category(&category).await.unwrap();
        Fixture { repo, user, category }
    }

    fn submission(f: &Fixture, currency_id: Option<&str>) -> NewRecord {
        NewRecord {
            user_id: f.user.id.clone(),
            category_id: f.category.id.clone(),
            amount: 12.5,
            currency_id: currency_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn user_default_currency_wins_over_request() {
        let usd_id = new_id();
        let f = fixture(Some(usd_id.clone())).await;
        currency(&f.repo, "UAH").await;
        let eur = currency(&f.repo, "EUR").await;
        // user references a currency row that must exist for the FK
        f.repo
            .insert_currency(&Currency { id: usd_id.clone(), name: "USD".into() })
            .await
            .unwrap();

        let record = create_record(&f.repo, &cfg(false), submission(&f, Some(&eur.id)))
            .await
            .unwrap();
        assert_eq!(record.currency_id, Some(usd_id));
        assert_eq!(record.amount, 12.5);
    }

    #[tokio::test]
    async fn falls_back_to_uah_without_user_default() {
        let f = fixture(None).await;
        let uah = currency(&f.repo, "UAH").await;

        let record = create_record(&f.repo, &cfg(false), submission(&f, None)).await.unwrap();
        assert_eq!(record.currency_id, Some(uah.id));
    }

    #[tokio::test]
    async fn no_currency_at_all_gives_null() {
        let f = fixture(None).await;
        let record = create_record(&f.repo, &cfg(false), submission(&f, None)).await.unwrap();
        assert_eq!(record.currency_id, None);
        let stored = f.repo.get_record(&record.id).await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn unknown_user_or_category_persists_nothing() {
        let f = fixture(None).await;

        let mut bad_user = submission(&f, None);
        bad_user.user_id = "ghost".into();
        let err = create_record(&f.repo, &cfg(false), bad_user).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidReference(ref d) if d.contains("user ghost")));

        let mut bad_cat = submission(&f, None);
        bad_cat.category_id = "nowhere".into();
        let err = create_record(&f.repo, &cfg(false), bad_cat).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidReference(ref d) if d.contains("category nowhere")));

        let all = f
            .repo
            .list_records(&RecordFilter { user_id: Some(f.user.id.clone()), category_id: None })
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn honored_client_currency_is_used_when_enabled() {
        let f = fixture(None).await;
        currency(&f.repo, "UAH").await;
        let eur = currency(&f.repo, "EUR").await;

        let record = create_record(&f.repo, &cfg(true), submission(&f, Some(&eur.id)))
            .await
            .unwrap();
        assert_eq!(record.currency_id, Some(eur.id));

        let err = create_record(&f.repo, &cfg(true), submission(&f, Some("bogus")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn timestamp_has_second_granularity() {
        let f = fixture(None).await;
        let record = create_record(&f.repo, &cfg(false), submission(&f, None)).await.unwrap();
        assert_eq!(record.timestamp.nanosecond(), 0);
    }

    #[tokio::test]
    async fn listing_requires_a_filter_and_existing_ids() {
        let f = fixture(None).await;
        create_record(&f.repo, &cfg(false), submission(&f, None)).await.unwrap();

        let err = list_records(&f.repo, RecordFilter::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = list_records(
            &f.repo,
            RecordFilter { user_id: Some("ghost".into()), category_id: None },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let rows = list_records(
            &f.repo,
            RecordFilter { user_id: None, category_id: Some(f.category.id.clone()) },
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
