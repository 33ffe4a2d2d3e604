use async_trait::async_trait;
use burrow_core::dedup::destination_digest;
use burrow_core::error::{ConflictTarget, StorageError};
use burrow_core::query::{ListQuery, Page, SortField, SortOrder};
use burrow_core::repository::{ReadRepository, Repository, Result, SequenceCounter};
use burrow_core::{NewUrlMapping, ShortCode, UrlMapping};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use tracing::{debug, warn};

const SELECT_COLUMNS: &str =
    "id, short_code, destination_url, title, description, owner_id, created_at";

/// Name of the unique index that enforces destination dedup.
const DEDUP_INDEX: &str = "uk_dedup_key";

/// MySQL implementation of the repository contract.
///
/// Deletes are hard deletes; a freed short code may be issued again.
/// Timestamps are stored as microseconds since the Unix epoch.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

/// Tells a dedup-index violation apart from a short code collision.
fn conflict_target(err: &sqlx::Error, new: &NewUrlMapping) -> ConflictTarget {
    let on_dedup = err
        .as_database_error()
        .is_some_and(|db| db.message().contains(DEDUP_INDEX));
    if on_dedup {
        ConflictTarget::Destination(new.destination_url.clone())
    } else {
        ConflictTarget::ShortCode(new.short_code.to_string())
    }
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn parse_created_at(micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{micros}': {e}"))
    })
}

fn row_to_mapping(row: &MySqlRow) -> Result<UrlMapping> {
    let code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let short_code = ShortCode::new(&code).map_err(|e| StorageError::InvalidData(e.to_string()))?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    Ok(UrlMapping {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        short_code,
        destination_url: row.try_get("destination_url").map_err(map_sqlx_error)?,
        title: row.try_get("title").map_err(map_sqlx_error)?,
        description: row.try_get("description").map_err(map_sqlx_error)?,
        owner_id: row.try_get("owner_id").map_err(map_sqlx_error)?,
        created_at: parse_created_at(created_at)?,
    })
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::ShortCode => "short_code",
        SortField::Title => "title",
        SortField::DestinationUrl => "destination_url",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, MySql>, owner_id: u64, pattern: Option<&str>) {
    builder.push(" WHERE owner_id = ").push_bind(owner_id);
    if let Some(pattern) = pattern {
        builder
            .push(" AND (LOWER(COALESCE(title, '')) LIKE ")
            .push_bind(pattern.to_owned())
            .push(" OR LOWER(COALESCE(description, '')) LIKE ")
            .push_bind(pattern.to_owned())
            .push(" OR LOWER(short_code) LIKE ")
            .push_bind(pattern.to_owned())
            .push(")");
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn find_by_short_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM short_urls WHERE short_code = ? LIMIT 1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_mapping).transpose()
    }

    async fn find_by_destination(
        &self,
        destination: &str,
        owner_id: Option<u64>,
    ) -> Result<Option<UrlMapping>> {
        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT {SELECT_COLUMNS} FROM short_urls WHERE destination_hash = "
        ));
        builder
            .push_bind(destination_digest(destination))
            .push(" AND destination_url = ")
            .push_bind(destination.to_owned());
        if let Some(owner_id) = owner_id {
            builder.push(" AND owner_id = ").push_bind(owner_id);
        }
        builder.push(" ORDER BY id ASC LIMIT 1");

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_mapping).transpose()
    }

    async fn list_by_owner(&self, query: &ListQuery) -> Result<Page<UrlMapping>> {
        let pattern = query.search_needle().map(|n| like_pattern(&n));

        // Count and page read from one REPEATABLE READ snapshot.
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) AS total FROM short_urls");
        push_filters(&mut count, query.owner_id, pattern.as_deref());
        let total: i64 = count
            .build()
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .try_get("total")
            .map_err(map_sqlx_error)?;

        let mut select =
            QueryBuilder::<MySql>::new(format!("SELECT {SELECT_COLUMNS} FROM short_urls"));
        push_filters(&mut select, query.owner_id, pattern.as_deref());
        let direction = sort_direction(query.sort_order);
        select
            .push(format!(
                " ORDER BY {} {direction}, id {direction} LIMIT ",
                sort_column(query.sort_field)
            ))
            .push_bind(u64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows = select
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        let items = rows.iter().map(row_to_mapping).collect::<Result<Vec<_>>>()?;
        let total_count = u64::try_from(total)
            .map_err(|_| StorageError::InvalidData(format!("negative row count {total}")))?;

        Ok(Page { items, total_count })
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn create(&self, new: NewUrlMapping) -> Result<UrlMapping> {
        // Truncated to the stored precision so a reread compares equal.
        let created_at = parse_created_at(Timestamp::now().as_microsecond())?;

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls
                (short_code, destination_url, destination_hash, dedup_key,
                 title, description, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.short_code.as_str())
        .bind(&new.destination_url)
        .bind(destination_digest(&new.destination_url))
        .bind(new.dedup_key.as_ref().map(|k| k.as_str()))
        .bind(new.title.as_deref())
        .bind(new.description.as_deref())
        .bind(new.owner_id)
        .bind(created_at.as_microsecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_id();
                debug!(id, code = %new.short_code, "inserted url mapping");
                Ok(UrlMapping {
                    id,
                    short_code: new.short_code,
                    destination_url: new.destination_url,
                    title: new.title,
                    description: new.description,
                    owner_id: new.owner_id,
                    created_at,
                })
            }
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(conflict_target(&err, &new)))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query("DELETE FROM short_urls WHERE short_code = ?")
            .bind(code.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Durable counter stored as one row of `sequence_counters`.
///
/// The increment is a single `UPDATE ... LAST_INSERT_ID(value + 1)`, so each
/// caller reads back the value its own statement produced.
#[derive(Debug, Clone)]
pub struct MySqlSequenceCounter {
    pool: MySqlPool,
    name: String,
}

impl MySqlSequenceCounter {
    pub const DEFAULT_NAME: &'static str = "url_counter";

    /// Binds to the named counter, creating it at zero if it does not exist.
    pub async fn init(pool: MySqlPool, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let seeded = sqlx::query("INSERT IGNORE INTO sequence_counters (name, value) VALUES (?, 0)")
            .bind(&name)
            .execute(&pool)
            .await
            .map_err(map_sqlx_error)?;
        if seeded.rows_affected() > 0 {
            debug!(counter = %name, "seeded sequence counter");
        }
        Ok(Self { pool, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl SequenceCounter for MySqlSequenceCounter {
    async fn next_value(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE sequence_counters SET value = LAST_INSERT_ID(value + 1) WHERE name = ?",
        )
        .bind(&self.name)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() != 1 {
            warn!(counter = %self.name, "sequence counter row is missing");
            return Err(StorageError::InvalidData(format!(
                "sequence counter '{}' does not exist",
                self.name
            )));
        }

        Ok(result.last_insert_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("report"), "%report%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn sort_columns_are_whitelisted() {
        assert_eq!(sort_column(SortField::CreatedAt), "created_at");
        assert_eq!(sort_column(SortField::DestinationUrl), "destination_url");
        assert_eq!(sort_direction(SortOrder::Desc), "DESC");
    }

    #[test]
    fn pool_timeout_maps_to_timeout() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StorageError::Timeout(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            StorageError::InvalidData(_)
        ));
    }
}
