use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{db_types::Coins, sqlite::db::profiles, SqliteDatabase};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

/// A fresh database url in the system temp directory.
pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("quiz_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("🚀️ Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

/// Creates and migrates a new database, and returns a connection to it.
pub async fn fresh_database() -> (SqliteDatabase, String) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    (db, url)
}

/// Gives a player coins to spend, creating their profile if needed. Returns the new balance.
pub async fn seed_balance(db: &SqliteDatabase, user_id: &str, coins: Coins) -> Coins {
    let mut conn = db.pool().acquire().await.expect("Error acquiring a connection");
    let balance = profiles::credit(user_id, coins, &mut conn).await.expect("Error seeding balance");
    debug!("🚀️ Seeded {user_id} with {coins}. Balance: {balance}");
    balance
}

pub async fn remove_database(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        warn!("🚀️ Failed to close database {url}: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to remove database {url}: {e}");
    }
}
