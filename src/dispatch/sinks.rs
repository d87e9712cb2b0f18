//! Result sinks.
//!
//! # Responsibilities
//! - `console`: one JSON record per line on stdout
//! - `json_lines`: append JSON records to a file
//! - `sqlite`: insert records into a `monitors` table
//!
//! # Design Decisions
//! - Every sink is shared by all probe loops and serializes its own writes
//! - The SQLite pool holds a single connection, so inserts queue one at a
//!   time no matter how many targets report concurrently

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::dispatch::{ResultSink, SinkError};
use crate::health::result::ProbeResult;

/// Prints each record to stdout.
pub struct ConsoleSink {
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }

    /// Write records to `out` instead of stdout.
    pub fn with_writer(out: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn write(&self, result: &ProbeResult) -> Result<(), SinkError> {
        let mut line = result.to_json()?;
        line.push('\n');
        // One locked write per record keeps lines from interleaving.
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.out.lock().await.flush().await?;
        Ok(())
    }
}

/// Appends records to a newline-delimited JSON file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        tracing::info!(path = %path.display(), "JSON lines sink opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    fn name(&self) -> &str {
        "json_lines"
    }

    async fn write(&self, result: &ProbeResult) -> Result<(), SinkError> {
        let mut line = result.to_json()?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let file = self.file.lock().await;
        file.sync_all().await?;
        Ok(())
    }
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS monitors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT,
    status TEXT,
    latency_ms INTEGER,
    url TEXT,
    message TEXT
)";

/// Inserts records into a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    /// Open (creating if missing) the database and its table.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        tracing::info!(path = %path.as_ref().display(), "SQLite sink opened");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ResultSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn write(&self, result: &ProbeResult) -> Result<(), SinkError> {
        sqlx::query(
            "INSERT INTO monitors (timestamp, status, latency_ms, url, message) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&result.timestamp)
        .bind(result.status.as_str())
        .bind(i64::try_from(result.latency_ms).unwrap_or(i64::MAX))
        .bind(&result.url)
        .bind(&result.message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::result::ProbeStatus;
    use chrono::Utc;
    use sqlx::Row;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn result(url: &str, status: ProbeStatus) -> ProbeResult {
        ProbeResult::new(Utc::now(), status, Duration::from_millis(7), url, "200 OK")
    }

    #[tokio::test]
    async fn test_json_lines_appends_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let sink = JsonLinesSink::open(&path).await.unwrap();
        sink.write(&result("http://a", ProbeStatus::Ok)).await.unwrap();
        sink.write(&result("http://b", ProbeStatus::Error)).await.unwrap();
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: ProbeResult = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.url, "http://b");
        assert_eq!(second.status, ProbeStatus::Error);
    }

    #[tokio::test]
    async fn test_sqlite_concurrent_writes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(SqliteSink::open(dir.path().join("monitors.db")).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..8 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                let url = format!("http://target-{i}");
                for _ in 0..5 {
                    sink.write(&result(&url, ProbeStatus::Ok)).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let row = sqlx::query("SELECT COUNT(*) AS n FROM monitors")
            .fetch_one(sink.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 40);

        let row = sqlx::query("SELECT status, latency_ms FROM monitors LIMIT 1")
            .fetch_one(sink.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("status"), "OK");
        assert_eq!(row.get::<i64, _>("latency_ms"), 7);

        sink.close().await.unwrap();
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_console_sink_writes_one_line_per_record() {
        let (writer, mut reader) = tokio::io::duplex(4096);
        let sink = ConsoleSink::with_writer(writer);

        sink.write(&result("http://a", ProbeStatus::Ok)).await.unwrap();
        sink.write(&result("http://b", ProbeStatus::Error)).await.unwrap();
        sink.close().await.unwrap();
        drop(sink);

        let mut output = String::new();
        reader.read_to_string(&mut output).await.unwrap();
        let urls: Vec<String> = output
            .lines()
            .map(|l| serde_json::from_str::<ProbeResult>(l).unwrap().url)
            .collect();
        assert_eq!(urls, vec!["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn test_console_sink_on_stdout() {
        let sink = ConsoleSink::new();
        sink.write(&result("http://a", ProbeStatus::Ok)).await.unwrap();
    }
}
