//! Apply pending migrations

use anyhow::{Context, Result};
use clap::Parser;
use taskboard_server::MIGRATOR;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let pool = args.db.connect(&args.db.store_config()).await?;
    MIGRATOR.run(&pool).await.context("Failed to apply migrations")?;
    tracing::info!(migrations = MIGRATOR.iter().count(), "database is up to date");
    Ok(())
}
