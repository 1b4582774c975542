use crate::error::{Error, Result};
use crate::models::document::Document;
use crate::utils::text::tidy_extracted;
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

#[derive(Clone)]
pub struct DocumentService {
    pool: SqlitePool,
}

impl DocumentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_document(
        &self,
        title: &str,
        filename: Option<&str>,
        content: &str,
    ) -> Result<Document> {
        let doc = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (id, title, filename, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(filename)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(document_id = %doc.id, chars = doc.content.len(), "Document stored");
        Ok(doc)
    }

    /// Extracts text from a file on disk and stores it as a document.
    pub async fn ingest_file(&self, path: &Path, title: Option<String>) -> Result<Document> {
        let text = extract_text_from_file(path).await?;
        if text.trim().is_empty() {
            return Err(Error::BadRequest(format!(
                "No extractable text in {}",
                path.display()
            )));
        }

        let filename = path.file_name().and_then(|n| n.to_str());
        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled document")
                .to_string()
        });
        self.create_document(&title, filename, &text).await
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Document> {
        let doc = sqlx::query_as::<_, Document>(r#"SELECT * FROM documents WHERE id = ?1"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(doc)
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(
            r#"SELECT * FROM documents ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub async fn extract_text_from_file(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let raw = match ext.as_str() {
        "pdf" => {
            let output = tokio::process::Command::new("pdftotext")
                .arg("-layout")
                .arg(path)
                .arg("-")
                .output()
                .await
                .map_err(|e| {
                    tracing::error!("Failed to run pdftotext on {}: {}", path.display(), e);
                    anyhow::anyhow!("pdftotext not available: {}", e)
                })?;
            if !output.status.success() {
                return Err(anyhow::anyhow!(
                    "pdftotext failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                )
                .into());
            }
            String::from_utf8_lossy(&output.stdout).to_string()
        }
        "txt" | "text" | "md" | "markdown" => fs::read_to_string(path).await?,
        other => {
            return Err(Error::BadRequest(format!(
                "Unsupported document type: '{}'",
                other
            )))
        }
    };

    Ok(tidy_extracted(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::store::DocumentStore;
    use std::io::Write;

    async fn setup() -> (DocumentStore, DocumentService) {
        let store = DocumentStore::open(&Config::local("sqlite::memory:"))
            .await
            .expect("store");
        let svc = DocumentService::new(store.pool().clone());
        (store, svc)
    }

    #[tokio::test]
    async fn ingests_text_file_with_stem_as_title() {
        let (_store, svc) = setup().await;
        let mut file = tempfile::Builder::new()
            .prefix("photosynthesis")
            .suffix(".txt")
            .tempfile()
            .unwrap();
        writeln!(file, "Plants turn light into sugar.   \n\n\n\nChlorophyll is green.").unwrap();

        let doc = svc.ingest_file(file.path(), None).await.unwrap();
        assert!(doc.title.starts_with("photosynthesis"));
        assert_eq!(
            doc.content,
            "Plants turn light into sugar.\n\nChlorophyll is green."
        );

        let fetched = svc.get_document(doc.id).await.unwrap();
        assert_eq!(fetched.content, doc.content);
        assert_eq!(svc.list_documents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_unsupported_and_empty_files() {
        let (_store, svc) = setup().await;
        let xlsx = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = svc.ingest_file(xlsx.path(), None).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let empty = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        let err = svc
            .ingest_file(empty.path(), Some("Empty".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let (_store, svc) = setup().await;
        let err = svc.get_document(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!svc.delete_document(Uuid::new_v4()).await.unwrap());
    }
}
