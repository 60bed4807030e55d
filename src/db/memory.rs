use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Category, Currency, Record, RecordFilter, RepoError, RepoResult, Repository, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    currencies: Vec<Currency>,
    categories: Vec<Category>,
    records: Vec<Record>,
}

/// In-process repository with the same constraint rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut users = self.tables.read().await.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.id == user.id) {
            return Err(RepoError::Conflict("users_pkey".into()));
        }
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(RepoError::Conflict("users_username_key".into()));
        }
        t.users.push(user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> RepoResult<Option<User>> {
        let mut t = self.tables.write().await;
        let Some(pos) = t.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        let user = t.users.remove(pos);
        t.records.retain(|r| r.user_id != user.id);
        Ok(Some(user))
    }

    async fn get_currency(&self, id: &str) -> RepoResult<Option<Currency>> {
        let t = self.tables.read().await;
        Ok(t.currencies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_currency_by_name(&self, name: &str) -> RepoResult<Option<Currency>> {
        let t = self.tables.read().await;
        Ok(t.currencies.iter().find(|c| c.name == name).cloned())
    }

    async fn list_currencies(&self) -> RepoResult<Vec<Currency>> {
        let mut rows = self.tables.read().await.currencies.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_currency(&self, currency: &Currency) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if t.currencies.iter().any(|c| c.id == currency.id) {
            return Err(RepoError::Conflict("currencies_pkey".into()));
        }
        if t.currencies.iter().any(|c| c.name == currency.name) {
            return Err(RepoError::Conflict("currencies_name_key".into()));
        }
        t.currencies.push(currency.clone());
        Ok(())
    }

    async fn delete_currency(&self, id: &str) -> RepoResult<Option<Currency>> {
        let mut t = self.tables.write().await;
        let Some(pos) = t.currencies.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let currency = t.currencies.remove(pos);
        for u in t.users.iter_mut() {
            if u.default_currency_id.as_deref() == Some(currency.id.as_str()) {
                u.default_currency_id = None;
            }
        }
        for r in t.records.iter_mut() {
            if r.currency_id.as_deref() == Some(currency.id.as_str()) {
                r.currency_id = None;
            }
        }
        Ok(Some(currency))
    }

    async fn get_category(&self, id: &str) -> RepoResult<Option<Category>> {
        let t = self.tables.read().await;
        Ok(t.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut rows = self.tables.read().await.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_category(&self, category: &Category) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if t.categories.iter().any(|c| c.id == category.id) {
            return Err(RepoError::Conflict("categories_pkey".into()));
        }
        if t.categories.iter().any(|c| c.name == category.name) {
            return Err(RepoError::Conflict("categories_name_key".into()));
        }
        t.categories.push(category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: &str) -> RepoResult<Option<Category>> {
        let mut t = self.tables.write().await;
        let Some(pos) = t.categories.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let category = t.categories.remove(pos);
        t.records.retain(|r| r.category_id != category.id);
        Ok(Some(category))
    }

    async fn get_record(&self, id: &str) -> RepoResult<Option<Record>> {
        let t = self.tables.read().await;
        Ok(t.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_records(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>> {
        let t = self.tables.read().await;
        Ok(t.records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn insert_record(&self, record: &Record) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if t.records.iter().any(|r| r.id == record.id) {
            return Err(RepoError::Conflict("records_pkey".into()));
        }
        // foreign keys, same as the schema
        let user_ok = t.users.iter().any(|u| u.id == record.user_id);
        let category_ok = t.categories.iter().any(|c| c.id == record.category_id);
        let currency_ok = record
            .currency_id
            .as_deref()
            .map_or(true, |id| t.currencies.iter().any(|c| c.id == id));
        if !(user_ok && category_ok && currency_ok) {
            return Err(RepoError::Database(sqlx::Error::Protocol(format!(
                "foreign key violation inserting record {}",
                record.id
            ))));
        }
        t.records.push(record.clone());
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> RepoResult<Option<Record>> {
        let mut t = self.tables.write().await;
        let Some(pos) = t.records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        Ok(Some(t.records.remove(pos)))
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::db::new_id;

    fn user(name: &str) -> User {
        User {
            id: new_id(),
            username: name.into(),
            password_hash: "$argon2id$stub".into(),
            default_currency_id: None,
        }
    }

    fn record(user_id: &str, category_id: &str, currency_id: Option<&str>) -> Record {
        Record {
            id: new_id(),
            user_id: user_id.into(),
            category_id: category_id.into(),
            currency_id: currency_id.map(str::to_string),
            timestamp: OffsetDateTime::now_utc(),
            amount: 10.0,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict_and_keeps_first() {
        let repo = MemoryRepository::new();
        let first = user("alice");
        repo.insert_user(&first).await.unwrap();

        let err = repo.insert_user(&user("alice")).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));

        let stored = repo.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored, first);
        assert_eq!(repo.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_currency_name_is_a_conflict() {
        let repo = MemoryRepository::new();
        let uah = Currency { id: new_id(), name: "UAH".into() };
        repo.insert_currency(&uah).await.unwrap();
        let err = repo
            .insert_currency(&Currency { id: new_id(), name: "UAH".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_missing_rows_reports_none() {
        let repo = MemoryRepository::new();
        assert!(repo.delete_category("nope").await.unwrap().is_none());
        assert!(repo.delete_user("nope").await.unwrap().is_none());
        assert!(repo.delete_currency("nope").await.unwrap().is_none());
        assert!(repo.delete_record("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_records() {
        let repo = MemoryRepository::new();
        let u = user("bob");
        let cat = Category { id: new_id(), name: "food".into() };
        repo.insert_user(&u).await.unwrap();
        repo.insert_category(&cat).await.unwrap();
        let r = record(&u.id, &cat.id, None);
        repo.insert_record(&r).await.unwrap();

        let deleted = repo.delete_user(&u.id).await.unwrap();
        assert_eq!(deleted.map(|d| d.id), Some(u.id.clone()));
        assert!(repo.get_record(&r.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_currency_clears_references() {
        let repo = MemoryRepository::new();
        let usd = Currency { id: new_id(), name: "USD".into() };
        repo.insert_currency(&usd).await.unwrap();
        let mut u = user("carol");
        u.default_currency_id = Some(usd.id.clone());
        let cat = Category { id: new_id(), name: "rent".into() };
        repo.insert_user(&u).await.unwrap();
        repo.insert_category(&cat).await.unwrap();
        let r = record(&u.id, &cat.id, Some(&usd.id));
        repo.insert_record(&r).await.unwrap();

        repo.delete_currency(&usd.id).await.unwrap();

        let u = repo.get_user(&u.id).await.unwrap().unwrap();
        assert_eq!(u.default_currency_id, None);
        let r = repo.get_record(&r.id).await.unwrap().unwrap();
        assert_eq!(r.currency_id, None);
    }

    #[tokio::test]
    async fn record_insert_checks_foreign_keys() {
        let repo = MemoryRepository::new();
        let err = repo.insert_record(&record("ghost", "ghost", None)).await.unwrap_err();
        assert!(matches!(err, RepoError::Database(_)));
        assert!(repo.list_records(&RecordFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_records_applies_filter() {
        let repo = MemoryRepository::new();
        let a = user("a");
        let b = user("b");
        let cat = Category { id: new_id(), name: "misc".into() };
        repo.insert_user(&a).await.unwrap();
        repo.insert_user(&b).await.unwrap();
        repo.insert_category(&cat).await.unwrap();
        repo.insert_record(&record(&a.id, &cat.id, None)).await.unwrap();
        repo.insert_record(&record(&b.id, &cat.id, None)).await.unwrap();

        let only_a = repo
            .list_records(&RecordFilter { user_id: Some(a.id.clone()), category_id: None })
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].user_id, a.id);

        let by_cat = repo
            .list_records(&RecordFilter { user_id: None, category_id: Some(cat.id.clone()) })
            .await
            .unwrap();
        assert_eq!(by_cat.len(), 2);
    }
}
