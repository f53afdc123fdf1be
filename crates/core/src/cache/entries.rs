//! Entry operations within a partition.
//!
//! Entries are keyed by `(partition, url)`. Writing an existing key replaces
//! the row, so the entry moves to the end of the insertion order and the
//! last completed write wins.

use super::connection::CacheDb;
use super::hash::body_digest;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response snapshot to be written into a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StoredResponse {
    pub fn new(url: impl Into<String>, status: u16, body: Vec<u8>) -> Self {
        Self { url: url.into(), status, content_type: None, headers: Vec::new(), body }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }
}

/// A stored entry as read back from a partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Insertion sequence; larger is more recent.
    pub seq: i64,
    pub partition: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub body_sha256: String,
    pub stored_at: String,
}

const SELECT_ENTRY: &str = "SELECT e.seq, e.partition_name, e.url, e.status_code, e.content_type,
        e.headers_json, e.body, e.body_sha256, e.stored_at
     FROM entries e";

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CacheEntry, String)> {
    let entry = CacheEntry {
        seq: row.get(0)?,
        partition: row.get(1)?,
        url: row.get(2)?,
        status: row.get::<_, i64>(3)? as u16,
        content_type: row.get(4)?,
        headers: Vec::new(),
        body: row.get(6)?,
        body_sha256: row.get(7)?,
        stored_at: row.get(8)?,
    };
    Ok((entry, row.get(5)?))
}

fn decode_entry(raw: rusqlite::Result<(CacheEntry, String)>) -> Result<Option<CacheEntry>, Error> {
    match raw {
        Ok((mut entry, headers_json)) => {
            entry.headers = serde_json::from_str(&headers_json)?;
            Ok(Some(entry))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn insert_entry(
    conn: &rusqlite::Connection, partition: &str, response: &StoredResponse, stored_at: &str,
) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![partition, stored_at],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO entries (
            partition_name, url, status_code, content_type, headers_json, body, body_sha256, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            partition,
            &response.url,
            response.status as i64,
            &response.content_type,
            headers_json,
            &response.body,
            body_digest(&response.body),
            stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response under its URL, creating the partition if needed.
    pub async fn put_entry(&self, partition: &str, response: &StoredResponse) -> Result<(), Error> {
        let partition = partition.to_string();
        let response = response.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                insert_entry(&tx, &partition, &response, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store several responses in one transaction.
    ///
    /// Either every response is written or none is.
    pub async fn put_entries(&self, partition: &str, responses: &[StoredResponse]) -> Result<(), Error> {
        let partition = partition.to_string();
        let responses = responses.to_vec();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for response in &responses {
                    insert_entry(&tx, &partition, response, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a URL in one partition.
    pub async fn match_entry(&self, partition: &str, url: &str) -> Result<Option<CacheEntry>, Error> {
        let partition = partition.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE e.partition_name = ?1 AND e.url = ?2"))?;
                decode_entry(stmt.query_row(params![partition, url], read_entry))
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a URL across every partition, oldest partition first.
    pub async fn match_any(&self, url: &str) -> Result<Option<CacheEntry>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_ENTRY} JOIN partitions p ON p.name = e.partition_name
                     WHERE e.url = ?1 ORDER BY p.rowid ASC LIMIT 1"
                ))?;
                decode_entry(stmt.query_row(params![url], read_entry))
            })
            .await
            .map_err(Error::from)
    }

    /// URLs stored in a partition, oldest first.
    pub async fn entry_keys(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE partition_name = ?1 ORDER BY seq ASC")?;
                let keys = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn entry_count(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE partition_name = ?1",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns false if it was not present.
    pub async fn delete_entry(&self, partition: &str, url: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition_name = ?1 AND url = ?2",
                    params![partition, url],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Keep only the `max_entries` most recently added entries of a partition.
    ///
    /// Returns the number of deleted entries.
    pub async fn trim_partition(&self, partition: &str, max_entries: usize) -> Result<u64, Error> {
        let partition = partition.to_string();
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition_name = ?1 AND seq NOT IN (
                        SELECT seq FROM entries WHERE partition_name = ?1 ORDER BY seq DESC LIMIT ?2
                    )",
                    params![partition, max],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
