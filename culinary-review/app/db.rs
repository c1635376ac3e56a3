use std::fmt;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{AppError, AppResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Connection pool handle. Diesel is blocking, so work runs on the blocking pool.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("Db")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl Db {
    pub fn connect(database_url: &str, max_size: u32) -> AppResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder().max_size(max_size).build(manager)?;
        Ok(Self { pool })
    }

    /// A pool that opens connections on first use.
    pub fn connect_lazy(database_url: &str, max_size: u32) -> Self {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_size)
            .build_unchecked(manager);
        Self { pool }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs `f` with a pooled connection on tokio's blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }

    pub async fn migrate(&self) -> AppResult<Vec<String>> {
        self.run(|conn| {
            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("migration failed: {}", e)))?;
            Ok(applied.iter().map(|version| version.to_string()).collect())
        })
        .await
    }
}
