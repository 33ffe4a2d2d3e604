use crate::mysql::map_sqlx_error;
use burrow_core::repository::Result;
use sqlx::MySqlPool;
use tracing::info;

pub const SHORT_URLS: &str = include_str!("../ddl/mysql/short_urls.sql");
pub const SEQUENCE_COUNTERS: &str = include_str!("../ddl/mysql/sequence_counters.sql");

/// Creates the tables the MySQL backends need if they do not exist yet.
pub async fn ensure(pool: &MySqlPool) -> Result<()> {
    for ddl in [SHORT_URLS, SEQUENCE_COUNTERS] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(map_sqlx_error)?;
    }
    info!("mysql schema is up to date");
    Ok(())
}
