use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Migrations compiled into the binary
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies per-connection SQLite settings whenever the pool opens a connection
///
/// SQLite only enforces foreign keys when asked to, and the pragma is scoped
/// to a single connection, so it has to be set on every one of them.
#[derive(Debug, Clone, Copy)]
pub struct SqlitePragmas {
    /// How long a writer waits on a locked database before giving up
    pub busy_timeout_ms: u32,
}

impl Default for SqlitePragmas {
    fn default() -> Self {
        Self { busy_timeout_ms: 5000 }
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds a connection pool for the given SQLite database URL
///
/// ### Errors
///
/// Returns an error if the pool cannot open its initial connections.
pub fn init_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas::default()))
        .build(manager)?;
    Ok(pool)
}

/// Runs every pending embedded migration on the given connection
///
/// ### Errors
///
/// Returns an error if a migration fails to apply.
pub fn run_migrations(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    Ok(())
}
