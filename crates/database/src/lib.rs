use std::env;

pub mod dispatch_post;
pub mod housekeeping;
pub mod journey;
pub mod rows;
pub mod server;

#[derive(Debug)]
pub enum DatabaseError {
    Connect(sqlx::Error),
    Query(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
    UnknownColumnValue(String),
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::Connect(err) => write!(f, "database connect failed: {err}"),
            DatabaseError::Query(err) => write!(f, "database query failed: {err}"),
            DatabaseError::Migrate(err) => write!(f, "database migration failed: {err}"),
            DatabaseError::UnknownColumnValue(value) => write!(f, "unrecognised stored value: {value}"),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::Query(err)
    }
}

/// Fallback shape for assembling a Postgres URL from discrete component
/// variables, used when the composition root has no single `SIT_DATABASE_URL`
/// to hand the pool.
pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("SIT_DATABASE_USER").ok()?;
        let password = env::var("SIT_DATABASE_PASSWORD").ok()?;
        let hostname = env::var("SIT_DATABASE_HOST").ok()?;
        let port: u16 = env::var("SIT_DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("SIT_DATABASE_NAME").ok()?;
        Some(Self { username, password, hostname, port, database })
    }

    pub fn postgres_url(&self) -> String {
        format!("postgres://{}:{}@{}:{}/{}", self.username, self.password, self.hostname, self.port, self.database)
    }
}

#[derive(Clone)]
pub struct PgDatabase {
    pub(crate) pool: sqlx::PgPool,
}

impl PgDatabase {
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let pool = sqlx::postgres::PgPool::connect(url).await.map_err(DatabaseError::Connect)?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(DatabaseError::Migrate)?;
        Ok(Self { pool })
    }

    /// Bind-parameter ceiling used by the housekeeper to size its delete
    /// batches (§4.8).
    pub const BULK_PARAMETER_LIMIT: usize = 30_000;
}
