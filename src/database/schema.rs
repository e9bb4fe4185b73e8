//! Startup schema bootstrap.
//!
//! The two tables are created in place of external migration tooling. There
//! are deliberately no foreign-key constraints: deleting a group leaves its
//! child groups and member users behind with dangling references, and reads
//! of those rows must keep working.

use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

const CREATE_GROUPS: &str = "\
CREATE TABLE IF NOT EXISTS groups (
    id              BIGSERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    parent_group_id BIGINT,
    created_at      TIMESTAMPTZ NOT NULL,
    updated_at      TIMESTAMPTZ NOT NULL
)";

const CREATE_USERS: &str = "\
CREATE TABLE IF NOT EXISTS users (
    id          BIGSERIAL PRIMARY KEY,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    job_title   TEXT NOT NULL,
    group_id    BIGINT,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
)";

/// Apply the schema, creating missing tables. Statements run one at a time;
/// each is idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query(CREATE_GROUPS).execute(pool).await?;
    sqlx::query(CREATE_USERS).execute(pool).await?;
    info!("Database schema initialized");
    Ok(())
}
