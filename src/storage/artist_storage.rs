use async_duckdb::ClientBuilder;
use async_duckdb::duckdb::OptionalExt;
use async_duckdb::duckdb::params;
use chrono::{DateTime, Utc};
use log::debug;
use std::path::Path;

use crate::errors::{Error, Result};
use crate::storage::entities::{Artist, ArtistDraft};

enum Table {
    Artist,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Artist => "artist",
        }
    }
}

const ID_SEQUENCE: &str = "artist_id_seq";

// Timestamps cross the driver boundary as microseconds since the Unix epoch.
const ARTIST_COLUMNS: &str = "id, name, monthly_listeners, epoch_us(last_checked)";

/// Raw row as read from DuckDB, before timestamp conversion.
struct ArtistRow {
    id: i64,
    name: String,
    monthly_listeners: i32,
    last_checked_us: i64,
}

impl ArtistRow {
    fn from_row(row: &async_duckdb::duckdb::Row<'_>) -> async_duckdb::duckdb::Result<Self> {
        Ok(ArtistRow {
            id: row.get(0)?,
            name: row.get(1)?,
            monthly_listeners: row.get(2)?,
            last_checked_us: row.get(3)?,
        })
    }
}

impl TryFrom<ArtistRow> for Artist {
    type Error = Error;

    fn try_from(row: ArtistRow) -> Result<Self> {
        let last_checked = DateTime::from_timestamp_micros(row.last_checked_us).ok_or_else(|| {
            Error::CorruptedRow(format!(
                "artist {} has out of range last_checked {}",
                row.id, row.last_checked_us
            ))
        })?;
        Ok(Artist {
            id: row.id,
            name: row.name,
            monthly_listeners: row.monthly_listeners,
            last_checked,
        })
    }
}

/// Current UTC time truncated to the precision the database keeps, so the
/// record handed back to callers matches what a later read returns.
fn now_micros() -> (DateTime<Utc>, i64) {
    let micros = Utc::now().timestamp_micros();
    let now = DateTime::from_timestamp_micros(micros).unwrap_or_default();
    (now, micros)
}

/// Data access for the `artist` table.
///
/// Every statement is parameterized and auto-committed on its own. The
/// underlying client serializes calls onto a single connection thread, so
/// the storage can be shared freely behind an `Arc`.
pub struct ArtistStorage {
    client: async_duckdb::Client,
}

impl ArtistStorage {
    /// Wraps an already opened client
    pub fn new(client: async_duckdb::Client) -> Self {
        ArtistStorage { client }
    }

    /// Opens (or creates) a database file at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let client = ClientBuilder::new().path(path).open().await?;
        debug!("Opened artist database at {path:?}");
        Ok(ArtistStorage { client })
    }

    /// Opens a private, process-local database. Nothing is persisted.
    pub async fn open_in_memory() -> Result<Self> {
        let client = ClientBuilder::new().open().await?;
        debug!("Opened in-memory artist database");
        Ok(ArtistStorage { client })
    }

    /// Creates the id sequence and the `artist` table if they are missing
    pub async fn init_db(&self) -> Result<()> {
        let table_query = format!(
            "
            CREATE SEQUENCE IF NOT EXISTS {seq} START 1;
            CREATE TABLE IF NOT EXISTS {artist_table} (
                id BIGINT PRIMARY KEY DEFAULT nextval('{seq}'),
                name TEXT NOT NULL,
                monthly_listeners INTEGER NOT NULL,
                last_checked TIMESTAMP NOT NULL
            );
        ",
            seq = ID_SEQUENCE,
            artist_table = Table::Artist.as_str()
        );
        self.client
            .conn(move |conn| conn.execute_batch(&table_query))
            .await?;

        debug!("Successfully initialized artist database");
        Ok(())
    }

    /// Fetches one artist. Returns `Error::NotFound` when no row has the given id.
    pub async fn get(&self, id: i64) -> Result<Artist> {
        let query = format!(
            "SELECT {ARTIST_COLUMNS} FROM {} WHERE id = ?1;",
            Table::Artist.as_str()
        );

        let row = self
            .client
            .conn(move |conn| conn.query_row(&query, [id], ArtistRow::from_row).optional())
            .await?;

        match row {
            Some(row) => Artist::try_from(row),
            None => Err(Error::NotFound(id)),
        }
    }

    /// Inserts a new artist stamped with the current time and returns it with its id.
    pub async fn create(&self, draft: &ArtistDraft) -> Result<Artist> {
        let query = format!(
            "INSERT INTO {} (name, monthly_listeners, last_checked) \
             VALUES (?1, ?2, make_timestamp(?3)) RETURNING id;",
            Table::Artist.as_str()
        );
        let (last_checked, micros) = now_micros();
        let name = draft.name.clone();
        let listeners = draft.monthly_listeners;

        let id = self
            .client
            .conn(move |conn| {
                conn.query_row(&query, params![name, listeners, micros], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .await?;

        debug!("Created artist {id}");
        Ok(draft.clone().into_artist(id, last_checked))
    }

    /// Overwrites every mutable field and refreshes `last_checked`.
    /// Returns `Error::NotFound` when no row has the given id.
    pub async fn update(&self, id: i64, draft: &ArtistDraft) -> Result<Artist> {
        let query = format!(
            "UPDATE {} SET name = ?1, monthly_listeners = ?2, last_checked = make_timestamp(?3) \
             WHERE id = ?4;",
            Table::Artist.as_str()
        );
        let (last_checked, micros) = now_micros();
        let name = draft.name.clone();
        let listeners = draft.monthly_listeners;

        let changed = self
            .client
            .conn(move |conn| conn.execute(&query, params![name, listeners, micros, id]))
            .await?;

        if changed == 0 {
            return Err(Error::NotFound(id));
        }
        debug!("Updated artist {id}");
        Ok(draft.clone().into_artist(id, last_checked))
    }

    /// Removes the row. Returns `Error::NotFound` when no row has the given id.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE id = ?1;", Table::Artist.as_str());

        let changed = self
            .client
            .conn(move |conn| conn.execute(&query, [id]))
            .await?;

        if changed == 0 {
            return Err(Error::NotFound(id));
        }
        debug!("Deleted artist {id}");
        Ok(())
    }

    /// Fetches up to `count` artists ordered by id, skipping the first `start`.
    pub async fn list(&self, start: i64, count: i64) -> Result<Vec<Artist>> {
        let query = format!(
            "SELECT {ARTIST_COLUMNS} FROM {} ORDER BY id LIMIT ?1 OFFSET ?2;",
            Table::Artist.as_str()
        );

        let rows = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare(&query)?;
                let mut rows = stmt.query(params![count, start])?;
                let mut artists = vec![];
                while let Some(row) = rows.next()? {
                    artists.push(ArtistRow::from_row(row)?);
                }
                Ok(artists)
            })
            .await?;

        rows.into_iter().map(Artist::try_from).collect()
    }

    /// Number of stored artists
    pub async fn count(&self) -> Result<i64> {
        let query = format!("SELECT count(*) FROM {};", Table::Artist.as_str());

        let total = self
            .client
            .conn(move |conn| conn.query_row(&query, [], |row| row.get::<_, i64>(0)))
            .await?;

        Ok(total)
    }
}
