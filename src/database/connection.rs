use log::{debug, error};
use rusqlite::{Connection, Result, ffi};

// Embed migrations from the migrations directory
refinery::embed_migrations!("migrations");

/// Opens the database and brings the schema up to date
pub fn init_connection(db_path: &str) -> Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    match migrations::runner().run(&mut conn) {
        Ok(report) => {
            debug!(
                "Applied {} migration(s) to {}",
                report.applied_migrations().len(),
                db_path
            );
        }
        Err(e) => {
            error!("Migrating {} failed: {}", db_path, e);
            return Err(rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_ERROR),
                Some(format!("migration failed: {}", e)),
            ));
        }
    }

    Ok(conn)
}
