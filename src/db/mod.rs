mod memory;
mod models;
mod postgres;

use async_trait::async_trait;

pub use memory::MemoryRepository;
pub use models::{new_id, Category, Currency, Record, RecordFilter, User};
pub use postgres::PgRepository;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage for every entity the API knows about.
///
/// Lookups return `Ok(None)` for a missing id. Deletes return the removed row,
/// or `Ok(None)` when there was nothing to remove. Deleting a user or a
/// category removes their records; deleting a currency clears references to it.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_user(&self, id: &str) -> RepoResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn insert_user(&self, user: &User) -> RepoResult<()>;
    async fn delete_user(&self, id: &str) -> RepoResult<Option<User>>;

    async fn get_currency(&self, id: &str) -> RepoResult<Option<Currency>>;
    async fn find_currency_by_name(&self, name: &str) -> RepoResult<Option<Currency>>;
    async fn list_currencies(&self) -> RepoResult<Vec<Currency>>;
    async fn insert_currency(&self, currency: &Currency) -> RepoResult<()>;
    async fn delete_currency(&self, id: &str) -> RepoResult<Option<Currency>>;

    async fn get_category(&self, id: &str) -> RepoResult<Option<Category>>;
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn insert_category(&self, category: &Category) -> RepoResult<()>;
    async fn delete_category(&self, id: &str) -> RepoResult<Option<Category>>;

    async fn get_record(&self, id: &str) -> RepoResult<Option<Record>>;
    async fn list_records(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>>;
    async fn insert_record(&self, record: &Record) -> RepoResult<()>;
    async fn delete_record(&self, id: &str) -> RepoResult<Option<Record>>;
}
