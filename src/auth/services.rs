use tracing::{info, warn};

use super::password::{hash_password, verify_password};
use crate::config::CurrencyConfig;
use crate::db::{new_id, Repository, User};
use crate::error::{ApiError, AuthError};

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub default_currency_id: Option<&'a str>,
}

/// Creates a user with a hashed password. Without an explicit default
/// currency the user gets the fallback currency, if one exists.
pub async fn register_user(
    repo: &dyn Repository,
    currency: &CurrencyConfig,
    input: NewUser<'_>,
) -> Result<User, ApiError> {
    let default_currency_id = match input.default_currency_id.filter(|id| !id.is_empty()) {
        Some(id) => match repo.get_currency(id).await? {
            Some(c) => Some(c.id),
            None => {
                warn!(currency_id = %id, "register with unknown default currency");
                return Err(ApiError::InvalidReference(format!(
                    "No currency found with id {id}"
                )));
            }
        },
        None => repo
            .find_currency_by_name(&currency.fallback_name)
            .await?
            .map(|c| c.id),
    };

    let user = User {
        id: new_id(),
        username: input.username.to_string(),
        password_hash: hash_password(input.password)?,
        default_currency_id,
    };
    repo.insert_user(&user)
        .await
        .map_err(|e| ApiError::from_repo("user", e))?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks credentials. Unknown user and wrong password look the same to the caller.
pub async fn authenticate(
    repo: &dyn Repository,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let Some(user) = repo.find_user_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(AuthError::BadCredentials.into());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AuthError::BadCredentials.into());
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Currency, MemoryRepository};

    fn uah_config() -> CurrencyConfig {
        CurrencyConfig {
            fallback_name: "UAH".into(),
            honor_client_currency: false,
        }
    }

    fn alice<'a>() -> NewUser<'a> {
        NewUser {
            username: "alice",
            password: "pw1",
            default_currency_id: None,
        }
    }

    #[tokio::test]
    async fn stored_password_is_hashed_and_verifies() {
        let repo = MemoryRepository::new();
        let user = register_user(&repo, &uah_config(), alice()).await.unwrap();
        let stored = repo.get_user(&user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw1");
        assert!(verify_password("pw1", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_and_first_survives() {
        let repo = MemoryRepository::new();
        let first = register_user(&repo, &uah_config(), alice()).await.unwrap();

        let second = NewUser { password: "other", ..alice() };
        let err = register_user(&repo, &uah_config(), second).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "This user already exists"));

        let stored = repo.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert!(verify_password("pw1", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn default_currency_falls_back_to_uah() {
        let repo = MemoryRepository::new();
        let uah = Currency { id: new_id(), name: "UAH".into() };
        repo.insert_currency(&uah).await.unwrap();

        let user = register_user(&repo, &uah_config(), alice()).await.unwrap();
        assert_eq!(user.default_currency_id, Some(uah.id));
    }

    #[tokio::test]
    async fn default_currency_is_null_without_uah() {
        let repo = MemoryRepository::new();
        let user = register_user(&repo, &uah_config(), alice()).await.unwrap();
        assert_eq!(user.default_currency_id, None);
    }

    #[tokio::test]
    async fn explicit_default_currency_must_exist() {
        let repo = MemoryRepository::new();
        let input = NewUser { default_currency_id: Some("missing"), ..alice() };
        let err = register_user(&repo, &uah_config(), input).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidReference(_)));
        assert!(repo.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let repo = MemoryRepository::new();
        register_user(&repo, &uah_config(), alice()).await.unwrap();

        let wrong_pw = authenticate(&repo, "alice", "nope").await.unwrap_err();
        let no_user = authenticate(&repo, "mallory", "pw1").await.unwrap_err();
        assert!(matches!(wrong_pw, ApiError::Auth(AuthError::BadCredentials)));
        assert!(matches!(no_user, ApiError::Auth(AuthError::BadCredentials)));

        let ok = authenticate(&repo, "alice", "pw1").await.unwrap();
        assert_eq!(ok.username, "alice");
    }
}
