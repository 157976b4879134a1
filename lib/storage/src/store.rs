use parking_lot::Mutex;
use reframe_core::{Error, Example, ExampleId, NewExample, Result, Vector};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::schema;
use crate::{to_init_err, to_storage_err};

/// Rows fetched per round trip while scanning
const SCAN_PAGE_SIZE: usize = 256;

struct Inner {
    conn: Connection,
    dimension: Option<usize>,
}

/// Persistent table of example pairs and their embeddings.
///
/// All access goes through one connection behind a mutex, so there is a single
/// writer at any time. Every `insert` batch runs in one transaction.
pub struct EmbeddingStore {
    inner: Mutex<Inner>,
    location: Option<PathBuf>,
}

impl EmbeddingStore {
    /// Open the store at `path`, creating the file and schema if needed.
    ///
    /// `dimension` pins the embedding length; when the store already holds
    /// embeddings of another length this fails with `StoreInit`.
    pub fn open_or_create<P: AsRef<Path>>(path: P, dimension: Option<usize>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path).map_err(to_init_err)?;
        let store = Self::init(conn, dimension, Some(path))?;
        info!(
            "Embedding store ready at {:?} ({} examples)",
            store.location,
            store.count()?
        );
        Ok(store)
    }

    /// In-memory store, mostly for tests
    pub fn open_in_memory(dimension: Option<usize>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(to_init_err)?;
        Self::init(conn, dimension, None)
    }

    fn init(conn: Connection, dimension: Option<usize>, location: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA busy_timeout = 5000;")
            .map_err(to_init_err)?;

        if schema::ensure_schema(&conn)? {
            info!("Created '{}' table", schema::TABLE);
        }

        let observed = observed_dimension(&conn)?;
        if let (Some(expected), Some(observed)) = (dimension, observed) {
            if expected != observed {
                return Err(Error::StoreInit(format!(
                    "store holds {}-dimensional embeddings but {} were configured",
                    observed, expected
                )));
            }
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                conn,
                dimension: dimension.or(observed),
            }),
            location,
        })
    }

    /// Backing file, `None` for in-memory stores
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Embedding length shared by every stored example, once known
    pub fn dimension(&self) -> Option<usize> {
        self.inner.lock().dimension
    }

    pub fn count(&self) -> Result<usize> {
        let inner = self.inner.lock();
        let count: i64 = inner
            .conn
            .query_row("SELECT COUNT(*) FROM examples", [], |row| row.get(0))
            .map_err(to_storage_err)?;
        Ok(count as usize)
    }

    /// Append a batch of examples and return their assigned ids.
    ///
    /// The whole batch is validated first and then written in one transaction,
    /// so on any error nothing from the batch is stored.
    pub fn insert(&self, batch: &[NewExample]) -> Result<Vec<ExampleId>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut inner = self.inner.lock();
        let dimension = validate_batch(batch, inner.dimension)?;

        let tx = inner.conn.transaction().map_err(to_storage_err)?;
        let mut ids = Vec::with_capacity(batch.len());
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO examples (dysfunctional_text, embedding, functional_text)
                     VALUES (?1, ?2, ?3)",
                )
                .map_err(to_storage_err)?;

            for (index, example) in batch.iter().enumerate() {
                let embedding = serde_json::to_string(&example.embedding).map_err(|e| {
                    Error::Insert {
                        index,
                        reason: e.to_string(),
                    }
                })?;
                stmt.execute(params![
                    example.pair.dysfunctional_text,
                    embedding,
                    example.pair.functional_text
                ])
                .map_err(|e| Error::Insert {
                    index,
                    reason: e.to_string(),
                })?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit().map_err(to_storage_err)?;

        inner.dimension = Some(dimension);
        debug!("Inserted {} examples", ids.len());
        Ok(ids)
    }

    /// Lazily iterate every stored example in id order.
    ///
    /// Each call starts a fresh scan that re-reads the table page by page.
    pub fn scan_all(&self) -> ExampleScan<'_> {
        ExampleScan {
            store: self,
            after: ExampleId::MIN,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    fn fetch_page(&self, after: ExampleId, limit: usize) -> Result<Vec<Example>> {
        let inner = self.inner.lock();
        let mut stmt = inner
            .conn
            .prepare_cached(
                "SELECT id, dysfunctional_text, embedding, functional_text
                 FROM examples WHERE id > ?1 ORDER BY id LIMIT ?2",
            )
            .map_err(to_storage_err)?;

        let rows = stmt
            .query_map(params![after, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(to_storage_err)?;

        let mut page = Vec::with_capacity(limit);
        for row in rows {
            let (id, dysfunctional_text, embedding, functional_text) =
                row.map_err(to_storage_err)?;
            page.push(Example {
                id,
                dysfunctional_text,
                functional_text,
                embedding: decode_embedding(&embedding)?,
            });
        }
        Ok(page)
    }
}

/// Lazy, finite scan over the store, returned by [`EmbeddingStore::scan_all`]
pub struct ExampleScan<'a> {
    store: &'a EmbeddingStore,
    after: ExampleId,
    buffer: VecDeque<Example>,
    done: bool,
}

impl Iterator for ExampleScan<'_> {
    type Item = Result<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            match self.store.fetch_page(self.after, SCAN_PAGE_SIZE) {
                Ok(page) => {
                    if page.len() < SCAN_PAGE_SIZE {
                        self.done = true;
                    }
                    if let Some(last) = page.last() {
                        self.after = last.id;
                    }
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Check every record before anything is written. Returns the batch dimension.
fn validate_batch(batch: &[NewExample], known: Option<usize>) -> Result<usize> {
    let mut dimension = known;
    for (index, example) in batch.iter().enumerate() {
        let reject = |reason: String| Error::Insert { index, reason };

        if example.pair.dysfunctional_text.trim().is_empty() {
            return Err(reject("dysfunctional text is empty".to_string()));
        }
        if example.pair.functional_text.trim().is_empty() {
            return Err(reject("functional text is empty".to_string()));
        }
        if example.embedding.is_empty() {
            return Err(reject("embedding is empty".to_string()));
        }
        if example.embedding.as_slice().iter().any(|x| !x.is_finite()) {
            return Err(reject("embedding contains non-finite values".to_string()));
        }
        match dimension {
            Some(expected) if expected != example.embedding.dim() => {
                return Err(reject(
                    Error::DimensionMismatch {
                        expected,
                        actual: example.embedding.dim(),
                    }
                    .to_string(),
                ));
            }
            Some(_) => {}
            None => dimension = Some(example.embedding.dim()),
        }
    }
    // non-empty batch, so the loop always settled a dimension
    dimension.ok_or_else(|| Error::Storage("empty batch".to_string()))
}

fn observed_dimension(conn: &Connection) -> Result<Option<usize>> {
    let first: Option<String> = conn
        .query_row(
            "SELECT embedding FROM examples ORDER BY id LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(to_init_err)?;
    match first {
        Some(raw) => Ok(Some(decode_embedding(&raw)?.dim())),
        None => Ok(None),
    }
}

fn decode_embedding(raw: &str) -> Result<Vector> {
    serde_json::from_str::<Vec<f32>>(raw)
        .map(Vector::new)
        .map_err(|e| Error::Serialization(format!("invalid stored embedding: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_core::ExamplePair;

    fn example(dysfunctional: &str, functional: &str, embedding: Vec<f32>) -> NewExample {
        NewExample::new(ExamplePair::new(dysfunctional, functional), embedding)
    }

    #[test]
    fn test_insert_and_scan_round_trip() {
        let store = EmbeddingStore::open_in_memory(None).unwrap();
        let ids = store
            .insert(&[
                example("You never listen.", "I feel unheard sometimes.", vec![0.25, -0.5, 1.0]),
                example("Typical of you.", "Can we talk about this?", vec![0.1, 0.2, 0.3]),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);

        let scanned: Vec<Example> = store.scan_all().collect::<Result<_>>().unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].id, ids[0]);
        assert_eq!(scanned[0].dysfunctional_text, "You never listen.");
        assert_eq!(scanned[0].functional_text, "I feel unheard sometimes.");
        for (a, b) in scanned[0].embedding.as_slice().iter().zip([0.25f32, -0.5, 1.0]) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(store.dimension(), Some(3));
    }

    #[test]
    fn test_scan_is_restartable() {
        let store = EmbeddingStore::open_in_memory(None).unwrap();
        store.insert(&[example("a", "b", vec![1.0, 0.0])]).unwrap();

        assert_eq!(store.scan_all().count(), 1);
        assert_eq!(store.scan_all().count(), 1);

        store.insert(&[example("c", "d", vec![0.0, 1.0])]).unwrap();
        assert_eq!(store.scan_all().count(), 2);
    }

    #[test]
    fn test_scan_crosses_page_boundary() {
        let store = EmbeddingStore::open_in_memory(None).unwrap();
        let batch: Vec<NewExample> = (0..SCAN_PAGE_SIZE + 3)
            .map(|i| example(&format!("d{}", i), &format!("f{}", i), vec![i as f32, 1.0]))
            .collect();
        store.insert(&batch).unwrap();

        let ids: Vec<ExampleId> = store.scan_all().map(|e| e.unwrap().id).collect();
        assert_eq!(ids.len(), SCAN_PAGE_SIZE + 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_dimension_mismatch_rejects_whole_batch() {
        let store = EmbeddingStore::open_in_memory(None).unwrap();
        store.insert(&[example("a", "b", vec![1.0, 0.0])]).unwrap();

        let err = store
            .insert(&[
                example("c", "d", vec![0.0, 1.0]),
                example("e", "f", vec![0.0, 1.0, 0.5]),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::Insert { index: 1, .. }));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_mismatch_within_first_batch() {
        let store = EmbeddingStore::open_in_memory(None).unwrap();
        let err = store
            .insert(&[example("a", "b", vec![1.0]), example("c", "d", vec![1.0, 2.0])])
            .unwrap_err();
        assert!(matches!(err, Error::Insert { index: 1, .. }));
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.dimension(), None);
    }

    #[test]
    fn test_empty_text_rejected() {
        let store = EmbeddingStore::open_in_memory(None).unwrap();
        let err = store
            .insert(&[example("a", "b", vec![1.0]), example("  ", "d", vec![1.0])])
            .unwrap_err();
        assert!(matches!(err, Error::Insert { index: 1, .. }));

        let err = store.insert(&[example("a", "", vec![1.0])]).unwrap_err();
        assert!(matches!(err, Error::Insert { index: 0, .. }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_configured_dimension_enforced() {
        let store = EmbeddingStore::open_in_memory(Some(4)).unwrap();
        let err = store.insert(&[example("a", "b", vec![1.0, 2.0])]).unwrap_err();
        assert!(matches!(err, Error::Insert { index: 0, .. }));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let store = EmbeddingStore::open_in_memory(None).unwrap();
        assert!(store.insert(&[]).unwrap().is_empty());
        assert_eq!(store.scan_all().count(), 0);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("embeddings.db");

        {
            let store = EmbeddingStore::open_or_create(&path, None).unwrap();
            store.insert(&[example("a", "b", vec![0.5, 0.5])]).unwrap();
        }

        let store = EmbeddingStore::open_or_create(&path, None).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.dimension(), Some(2));
        assert_eq!(store.location(), Some(path.as_path()));
    }

    #[test]
    fn test_reopen_with_other_dimension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.db");
        {
            let store = EmbeddingStore::open_or_create(&path, None).unwrap();
            store.insert(&[example("a", "b", vec![0.5, 0.5])]).unwrap();
        }

        let err = EmbeddingStore::open_or_create(&path, Some(1536)).err().unwrap();
        assert!(matches!(err, Error::StoreInit(_)));
    }

    #[test]
    fn test_non_database_file_fails_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.db");
        std::fs::write(&path, b"this is definitely not an sqlite database file").unwrap();

        let err = EmbeddingStore::open_or_create(&path, None).err().unwrap();
        assert!(matches!(err, Error::StoreInit(_)));
    }
}
