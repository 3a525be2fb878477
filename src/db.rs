use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;

use crate::error::AppResult;

pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;

    for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }

    // Only creates what is missing; existing rows are never touched.
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}
