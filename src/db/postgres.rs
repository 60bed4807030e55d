use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use super::{Category, Currency, Record, RecordFilter, RepoError, RepoResult, Repository, User};

#[derive(Clone)]
pub struct PgRepository {
    db: PgPool,
}

impl PgRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        use anyhow::Context;

        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    /// Applies the embedded migrations. Startup must not continue on failure.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        use anyhow::Context;

        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run database migrations")?;
        info!("database migrations applied");
        Ok(())
    }
}

/// Unique violations become `Conflict`; everything else stays a database error.
fn map_write_err(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            debug!(%constraint, "unique violation");
            return RepoError::Conflict(constraint);
        }
    }
    RepoError::Database(e)
}

#[async_trait]
impl Repository for PgRepository {
    // ---- users ----

    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, default_currency_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, default_currency_id
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, default_currency_id
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, default_currency_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.default_currency_id) // Option<String> → NULL allowed
        .execute(&self.db)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> RepoResult<Option<User>> {
        // records go with it via ON DELETE CASCADE
        let user = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, username, password_hash, default_currency_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    // ---- currencies ----

    async fn get_currency(&self, id: &str) -> RepoResult<Option<Currency>> {
        let currency =
            sqlx::query_as::<_, Currency>(r#"SELECT id, name FROM currencies WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(currency)
    }

    async fn find_currency_by_name(&self, name: &str) -> RepoResult<Option<Currency>> {
        let currency =
            sqlx::query_as::<_, Currency>(r#"SELECT id, name FROM currencies WHERE name = $1"#)
                .bind(name)
                .fetch_optional(&self.db)
                .await?;
        Ok(currency)
    }

    async fn list_currencies(&self) -> RepoResult<Vec<Currency>> {
        let rows = sqlx::query_as::<_, Currency>(r#"SELECT id, name FROM currencies ORDER BY name"#)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn insert_currency(&self, currency: &Currency) -> RepoResult<()> {
        sqlx::query(r#"INSERT INTO currencies (id, name) VALUES ($1, $2)"#)
            .bind(&currency.id)
            .bind(&currency.name)
            .execute(&self.db)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn delete_currency(&self, id: &str) -> RepoResult<Option<Currency>> {
        let currency = sqlx::query_as::<_, Currency>(
            r#"DELETE FROM currencies WHERE id = $1 RETURNING id, name"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(currency)
    }

    // ---- categories ----

    async fn get_category(&self, id: &str) -> RepoResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>(r#"SELECT id, name FROM categories WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(category)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(r#"SELECT id, name FROM categories ORDER BY name"#)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn insert_category(&self, category: &Category) -> RepoResult<()> {
        sqlx::query(r#"INSERT INTO categories (id, name) VALUES ($1, $2)"#)
            .bind(&category.id)
            .bind(&category.name)
            .execute(&self.db)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn delete_category(&self, id: &str) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"DELETE FROM categories WHERE id = $1 RETURNING id, name"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(category)
    }

    // ---- records ----

    async fn get_record(&self, id: &str) -> RepoResult<Option<Record>> {
        let record = sqlx::query_as::<_, Record>(
            r#"
            SELECT id, user_id, category_id, currency_id, created_at, amount
            FROM records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }

    async fn list_records(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, Record>(
            r#"
            SELECT id, user_id, category_id, currency_id, created_at, amount
            FROM records
            WHERE ($1::text IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR category_id = $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&filter.user_id)
        .bind(&filter.category_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_record(&self, record: &Record) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO records (id, user_id, category_id, currency_id, created_at, amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.category_id)
        .bind(&record.currency_id)
        .bind(record.timestamp)
        .bind(record.amount)
        .execute(&self.db)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> RepoResult<Option<Record>> {
        let record = sqlx::query_as::<_, Record>(
            r#"
            DELETE FROM records
            WHERE id = $1
            RETURNING id, user_id, category_id, currency_id, created_at, amount
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }
}
