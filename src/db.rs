use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub min_idle: u32,
    pub max_lifetime: Duration,
    pub connect_timeout: Duration,
    /// Server-side deadline for every statement; zero disables it.
    pub statement_timeout: Duration,
}

impl PoolSettings {
    pub fn for_url(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            max_connections: 10,
            min_idle: 2,
            max_lifetime: Duration::from_secs(30 * 60),
            connect_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(5),
        }
    }
}

/// Applies the statement deadline to each connection handed out by the pool.
/// A statement that runs past it is cancelled by Postgres and the enclosing
/// transaction is rolled back.
#[derive(Debug)]
struct StatementTimeout(Duration);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query(format!("SET statement_timeout = {}", self.0.as_millis()))
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn create_pool(settings: &PoolSettings) -> Result<DbPool, r2d2::Error> {
    let manager = ConnectionManager::<PgConnection>::new(&settings.database_url);
    Pool::builder()
        .max_size(settings.max_connections)
        .min_idle(Some(settings.min_idle.min(settings.max_connections)))
        .max_lifetime(Some(settings.max_lifetime))
        .connection_timeout(settings.connect_timeout)
        .connection_customizer(Box::new(StatementTimeout(settings.statement_timeout)))
        .build(manager)
}
