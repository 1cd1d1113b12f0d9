//! Chunked blob storage for uploaded images.
//!
//! Each upload gets a `blob_files` row (bucket, filename, length, chunk size)
//! and its bytes are split across ordered `blob_chunks` rows. Writers stream
//! bytes in as they arrive; readers stream chunks back one query at a time.

use bytes::Bytes;
use futures::Stream;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use super::models::{timestamp_now, BlobRef};

/// Bucket holding every uploaded image
pub const IMAGES_BUCKET: &str = "images";

/// Default chunk size (255 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Metadata of a stored file
#[derive(Debug, Clone, FromRow)]
pub struct BlobFile {
    pub id: String,
    pub bucket: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub length: i64,
    pub chunk_size: i64,
    pub upload_date: String,
}

impl BlobFile {
    /// Stored content type, falling back to a guess from the filename
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.filename)
                    .first_or_octet_stream()
                    .to_string()
            })
    }

    fn chunk_count(&self) -> i64 {
        if self.length <= 0 || self.chunk_size <= 0 {
            0
        } else {
            (self.length + self.chunk_size - 1) / self.chunk_size
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    db: SqlitePool,
    chunk_size: usize,
}

impl BlobStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Open a writer for a new file under a freshly generated id
    pub async fn begin(
        &self,
        bucket: &str,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<BlobWriter, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO blob_files (id, bucket, filename, content_type, length, chunk_size, upload_date)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(bucket)
        .bind(filename)
        .bind(content_type)
        .bind(self.chunk_size as i64)
        .bind(timestamp_now())
        .execute(&self.db)
        .await?;

        debug!(blob_id = %id, bucket = %bucket, filename = %filename, "Started blob upload");

        Ok(BlobWriter {
            db: self.db.clone(),
            descriptor: BlobRef {
                id,
                filename: filename.to_string(),
                bucket: bucket.to_string(),
            },
            chunk_size: self.chunk_size,
            buffer: Vec::with_capacity(self.chunk_size),
            next_chunk: 0,
            length: 0,
        })
    }

    pub async fn find(&self, id: &str) -> Result<Option<BlobFile>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, bucket, filename, content_type, length, chunk_size, upload_date
            FROM blob_files
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
    }

    /// Stream the file's bytes back in chunk order
    pub fn stream(&self, file: &BlobFile) -> impl Stream<Item = Result<Bytes, sqlx::Error>> + Send + 'static {
        let db = self.db.clone();
        let file_id = file.id.clone();
        let chunks = file.chunk_count();

        async_stream::try_stream! {
            for n in 0..chunks {
                let data: Option<Vec<u8>> = sqlx::query_scalar(
                    "SELECT data FROM blob_chunks WHERE file_id = ? AND n = ?",
                )
                .bind(&file_id)
                .bind(n)
                .fetch_optional(&db)
                .await?;

                let data = data.ok_or(sqlx::Error::RowNotFound)?;
                yield Bytes::from(data);
            }
        }
    }

    /// Delete a file and its chunks. Returns false when the id is unknown.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM blob_chunks WHERE file_id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        let result = sqlx::query("DELETE FROM blob_files WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-progress upload. Full chunks are flushed as soon as they fill up.
pub struct BlobWriter {
    db: SqlitePool,
    descriptor: BlobRef,
    chunk_size: usize,
    buffer: Vec<u8>,
    next_chunk: i64,
    length: i64,
}

impl BlobWriter {
    pub async fn write(&mut self, mut data: &[u8]) -> Result<(), sqlx::Error> {
        while !data.is_empty() {
            let room = self.chunk_size - self.buffer.len();
            let take = room.min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.buffer.len() == self.chunk_size {
                self.flush_chunk().await?;
            }
        }
        Ok(())
    }

    async fn flush_chunk(&mut self) -> Result<(), sqlx::Error> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        sqlx::query("INSERT INTO blob_chunks (file_id, n, data) VALUES (?, ?, ?)")
            .bind(&self.descriptor.id)
            .bind(self.next_chunk)
            .bind(&self.buffer)
            .execute(&self.db)
            .await?;

        self.length += self.buffer.len() as i64;
        self.next_chunk += 1;
        self.buffer.clear();
        Ok(())
    }

    /// Flush the trailing partial chunk and record the final length
    pub async fn finish(mut self) -> Result<BlobRef, sqlx::Error> {
        self.flush_chunk().await?;

        sqlx::query("UPDATE blob_files SET length = ? WHERE id = ?")
            .bind(self.length)
            .bind(&self.descriptor.id)
            .execute(&self.db)
            .await?;

        debug!(blob_id = %self.descriptor.id, length = self.length, "Finished blob upload");
        Ok(self.descriptor)
    }

    /// Drop everything written so far
    pub async fn abort(self) -> Result<(), sqlx::Error> {
        BlobStore::new(self.db).delete(&self.descriptor.id).await?;
        Ok(())
    }
}

#[cfg(test)]
impl BlobStore {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Store a complete in-memory file
    pub async fn put(
        &self,
        bucket: &str,
        filename: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<BlobRef, sqlx::Error> {
        let mut writer = self.begin(bucket, filename, content_type).await?;
        writer.write(data).await?;
        writer.finish().await
    }

    /// Read the whole file into memory
    pub async fn read_all(&self, id: &str) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let chunks: Vec<Vec<u8>> = sqlx::query_scalar(
            "SELECT data FROM blob_chunks WHERE file_id = ? ORDER BY n",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        match self.find(id).await? {
            Some(_) => Ok(Some(chunks.concat())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
impl BlobWriter {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_put_splits_into_chunks_and_streams_back() {
        let db = init_memory().await.unwrap();
        let store = BlobStore::new(db.clone()).with_chunk_size(4);

        let data = b"0123456789".to_vec();
        let icon = store
            .put(IMAGES_BUCKET, "digits.txt", Some("text/plain"), &data)
            .await
            .unwrap();
        assert_eq!(icon.bucket, IMAGES_BUCKET);
        assert_eq!(icon.filename, "digits.txt");

        let chunk_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blob_chunks WHERE file_id = ?")
            .bind(&icon.id)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(chunk_rows, 3);

        let file = store.find(&icon.id).await.unwrap().unwrap();
        assert_eq!(file.length, 10);
        assert_eq!(file.mime_type(), "text/plain");

        let parts: Vec<Bytes> = store.stream(&file).try_collect().await.unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.concat(), data);
    }

    #[tokio::test]
    async fn test_incremental_writes_cross_chunk_boundaries() {
        let db = init_memory().await.unwrap();
        let store = BlobStore::new(db).with_chunk_size(3);

        let mut writer = store.begin(IMAGES_BUCKET, "a.bin", None).await.unwrap();
        writer.write(b"ab").await.unwrap();
        writer.write(b"cdef").await.unwrap();
        writer.write(b"g").await.unwrap();
        let icon = writer.finish().await.unwrap();

        assert_eq!(store.read_all(&icon.id).await.unwrap().unwrap(), b"abcdefg");
    }

    #[tokio::test]
    async fn test_missing_and_deleted_files() {
        let db = init_memory().await.unwrap();
        let store = BlobStore::new(db);

        assert!(store.find("does-not-exist").await.unwrap().is_none());
        assert!(store.read_all("does-not-exist").await.unwrap().is_none());

        let icon = store
            .put(IMAGES_BUCKET, "pie.png", None, b"png")
            .await
            .unwrap();
        assert!(store.delete(&icon.id).await.unwrap());
        assert!(store.find(&icon.id).await.unwrap().is_none());
        assert!(!store.delete(&icon.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mime_type_falls_back_to_filename() {
        let db = init_memory().await.unwrap();
        let store = BlobStore::new(db);

        let icon = store.put(IMAGES_BUCKET, "pie.png", None, b"x").await.unwrap();
        let file = store.find(&icon.id).await.unwrap().unwrap();
        assert_eq!(file.mime_type(), "image/png");

        let icon = store.put(IMAGES_BUCKET, "blob", None, b"x").await.unwrap();
        let file = store.find(&icon.id).await.unwrap().unwrap();
        assert_eq!(file.mime_type(), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_abort_removes_partial_upload() {
        let db = init_memory().await.unwrap();
        let store = BlobStore::new(db);

        let mut writer = store.begin(IMAGES_BUCKET, "half.png", None).await.unwrap();
        writer.write(b"partial").await.unwrap();
        let id = writer.id().to_string();
        writer.abort().await.unwrap();

        assert!(store.find(&id).await.unwrap().is_none());
    }
}
