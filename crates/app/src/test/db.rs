//! Per-test PostgreSQL databases
//!
//! One container serves the whole test binary. Every [`TestDb`] gets a freshly created
//! database inside it with the kasa migrations applied, so service tests can commit
//! normally without seeing each other's carts or orders. Databases are dropped in the
//! background once their `TestDb` goes away.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool, query};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};
use uuid::Uuid;

use crate::database;

const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "kasa_test";
const POSTGRES_PASSWORD: &str = "kasa_test_password";

/// Prefix shared by every per-test database name.
const DATABASE_PREFIX: &str = "kasa_test_";

static SERVER: Lazy<OnceCell<Server>> = Lazy::new(OnceCell::new);

/// The shared container and a queue of databases waiting to be dropped.
struct Server {
    _container: ContainerAsync<PostgresImage>,
    base_url: String,
    retired: mpsc::UnboundedSender<String>,
}

impl Server {
    async fn start() -> Self {
        let container = PostgresImage::default()
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_db_name(POSTGRES_USER)
            .with_tag(POSTGRES_TAG)
            .start()
            .await
            .expect("Failed to start PostgreSQL container");

        let host = std::env::var("TESTCONTAINERS_HOST_OVERRIDE")
            .unwrap_or_else(|_| "localhost".to_string());

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get container port");

        let base_url = format!("postgresql://{POSTGRES_USER}:{POSTGRES_PASSWORD}@{host}:{port}");
        let (retired, receiver) = mpsc::unbounded_channel();

        tokio::spawn(drop_retired_databases(admin_url(&base_url), receiver));

        Self {
            _container: container,
            base_url,
            retired,
        }
    }
}

fn admin_url(base_url: &str) -> String {
    format!("{base_url}/postgres")
}

async fn drop_retired_databases(admin_url: String, mut receiver: mpsc::UnboundedReceiver<String>) {
    while let Some(name) = receiver.recv().await {
        if let Err(error) = drop_database(&admin_url, &name).await {
            eprintln!("Failed to drop test database '{name}': {error}");
        }
    }
}

async fn drop_database(admin_url: &str, name: &str) -> Result<(), sqlx::Error> {
    let mut conn = PgConnection::connect(admin_url).await?;

    query(&format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// A migrated database owned by one test.
///
/// Names are generated here and never come from test input, so they are safe to
/// interpolate into `CREATE DATABASE` and `DROP DATABASE`.
#[derive(Debug)]
pub struct TestDb {
    pool: PgPool,
    name: String,
}

impl TestDb {
    pub async fn new() -> Self {
        let server = SERVER.get_or_init(Server::start).await;
        let name = format!("{DATABASE_PREFIX}{}", Uuid::now_v7().simple());

        let mut conn = PgConnection::connect(&admin_url(&server.base_url))
            .await
            .expect("Failed to connect to postgres database");

        query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let pool = PgPool::connect(&format!("{}/{name}", server.base_url))
            .await
            .expect("Failed to create pool for test database");

        database::migrate(&pool)
            .await
            .expect("Failed to run migrations on test database");

        Self { pool, name }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(server) = SERVER.get() {
            let _ = server.retired.send(self.name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn migrations_create_checkout_tables() -> TestResult {
        let test_db = TestDb::new().await;

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name <> '_sqlx_migrations' \
             ORDER BY table_name",
        )
        .fetch_all(test_db.pool())
        .await?;

        assert_eq!(
            tables,
            vec![
                "cart_lines",
                "order_lines",
                "orders",
                "product_addon_mappings",
                "product_addons",
                "product_variants",
                "products",
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn databases_do_not_share_rows() -> TestResult {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        assert_ne!(first.name, second.name);
        assert!(first.name.starts_with(DATABASE_PREFIX));

        query("INSERT INTO products (uuid, name, price) VALUES ($1, 'Tee', 1500)")
            .bind(Uuid::now_v7())
            .execute(first.pool())
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(second.pool())
            .await?;

        assert_eq!(count, 0);

        Ok(())
    }
}
