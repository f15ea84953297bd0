use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args.resolve_db_path();

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = store::open(&db_path)?;
    let schema_version = store::schema_version(&connection)?.unwrap_or_default();
    info!(path = %db_path.display(), schema_version = %schema_version, "database status");

    for table in store::LAYER_TABLES {
        let rows = store::table_count(&connection, table).unwrap_or(0);
        info!(table, rows, "layer table");
    }

    Ok(())
}
