//! Opening and configuring the local database.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations::run_migrations;

const DB_FILE_NAME: &str = "cinescope.db";

/// Two CLI invocations may touch the same file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DbLocation {
    File(PathBuf),
    Memory,
}

impl DbLocation {
    /// `{dir}/cinescope.db`, or `~/.local/share/cinescope/cinescope.db`.
    fn in_dir(dir: Option<&PathBuf>) -> Result<Self> {
        let base = match dir {
            Some(d) => d.clone(),
            None => {
                let home = std::env::var("HOME").context("HOME environment variable is not set")?;
                Path::new(&home).join(".local/share/cinescope")
            }
        };
        Ok(Self::File(base.join(DB_FILE_NAME)))
    }

    fn connect(&self) -> Result<Connection> {
        let conn = match self {
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create directory {}", parent.display())
                    })?;
                }
                let conn = Connection::open(path)
                    .with_context(|| format!("failed to open database {}", path.display()))?;
                conn.busy_timeout(BUSY_TIMEOUT)
                    .context("failed to set busy timeout")?;
                conn
            }
            Self::Memory => {
                Connection::open_in_memory().context("failed to open in-memory database")?
            }
        };
        conn.pragma_update(None, "foreign_keys", true)
            .context("failed to enable foreign keys")?;
        run_migrations(&conn).context("database migration failed")?;
        Ok(conn)
    }
}

/// Opens (or creates) the database under `dir` and migrates it.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrations fail.
pub fn open_db(dir: Option<&PathBuf>) -> Result<Connection> {
    let location = DbLocation::in_dir(dir)?;
    let conn = location.connect()?;
    if let DbLocation::File(path) = &location {
        tracing::debug!(path = %path.display(), "database opened");
    }
    Ok(conn)
}

/// Opens a migrated in-memory database.
///
/// # Errors
///
/// Returns an error if migrations fail.
pub fn open_memory_db() -> Result<Connection> {
    DbLocation::Memory.connect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_open_db_creates_file_and_migrates() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");

        // Act
        let conn = open_db(Some(&nested)).unwrap();

        // Assert
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert!(version > 0);
        assert!(nested.join(DB_FILE_NAME).exists());
    }

    #[test]
    fn test_location_with_dir() {
        // Arrange
        let dir = PathBuf::from("/tmp/films");

        // Act
        let location = DbLocation::in_dir(Some(&dir)).unwrap();

        // Assert
        assert_eq!(
            location,
            DbLocation::File(PathBuf::from("/tmp/films/cinescope.db"))
        );
    }

    #[test]
    fn test_location_default() {
        // Arrange & Act
        let location = DbLocation::in_dir(None).unwrap();

        // Assert
        assert!(matches!(
            location,
            DbLocation::File(ref p) if p.ends_with(".local/share/cinescope/cinescope.db")
        ));
    }

    #[test]
    fn test_memory_db_enforces_foreign_keys() {
        // Arrange & Act
        let conn = open_memory_db().unwrap();

        // Assert
        let enabled: bool = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }
}
