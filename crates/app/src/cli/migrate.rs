use kasa_app::{config::DatabaseConfig, database};

pub(crate) async fn run(config: &DatabaseConfig) -> Result<(), String> {
    let pool = database::connect(&config.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::migrate(&pool)
        .await
        .map_err(|error| format!("failed to apply migrations: {error}"))?;

    println!("migrations applied");

    Ok(())
}
