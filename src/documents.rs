use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::CoverLetterDocument;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("backend request failed: {0}")]
    Network(String),

    #[error("backend answered {status}")]
    Status { status: u16 },

    #[error("backend response could not be decoded: {0}")]
    Decode(String),
}

// 1. DocumentService Contract
/// DocumentService
///
/// Load/save contract for cover-letter documents held by the remote backend.
/// Failures are reported, never retried here.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Loads the document `id` on behalf of the bearer of `token`.
    async fn load(&self, id: &str, token: Option<&str>) -> Result<CoverLetterDocument, DocumentError>;

    /// Creates the document when `doc.id` is `None`, otherwise updates it.
    /// Returns the stored document, including its id.
    async fn save(
        &self,
        doc: &CoverLetterDocument,
        token: Option<&str>,
    ) -> Result<CoverLetterDocument, DocumentError>;
}

pub type DocumentState = Arc<dyn DocumentService>;

// 2. The Real Implementation (remote REST backend)
/// HttpDocumentService
///
/// Talks to `{base_url}/cover-letters`. The bearer token is taken from the
/// caller's session and forwarded untouched.
#[derive(Clone)]
pub struct HttpDocumentService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DocumentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocumentError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/cover-letters/{}", self.base_url, urlencoding::encode(id)),
            None => format!("{}/cover-letters", self.base_url),
        }
    }

    fn authorize(builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn load(&self, id: &str, token: Option<&str>) -> Result<CoverLetterDocument, DocumentError> {
        let request = Self::authorize(self.client.get(self.url(Some(id))), token);
        let response = request
            .send()
            .await
            .map_err(|e| DocumentError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(DocumentError::NotFound(id.to_string())),
            status if !status.is_success() => {
                return Err(DocumentError::Status {
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let mut doc = response
            .json::<CoverLetterDocument>()
            .await
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        if doc.id.is_none() {
            doc.id = Some(id.to_string());
        }
        tracing::debug!(document_id = %id, questions = doc.questions.len(), "document loaded");
        Ok(doc)
    }

    async fn save(
        &self,
        doc: &CoverLetterDocument,
        token: Option<&str>,
    ) -> Result<CoverLetterDocument, DocumentError> {
        let builder = match doc.id.as_deref() {
            Some(id) => self.client.put(self.url(Some(id))),
            None => self.client.post(self.url(None)),
        };
        let response = Self::authorize(builder, token)
            .json(doc)
            .send()
            .await
            .map_err(|e| DocumentError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DocumentError::NotFound(doc.id.clone().unwrap_or_default()));
        }
        if !status.is_success() {
            return Err(DocumentError::Status {
                status: status.as_u16(),
            });
        }

        let saved = response
            .json::<CoverLetterDocument>()
            .await
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        Ok(CoverLetterDocument {
            id: saved.id.or_else(|| doc.id.clone()),
            ..saved
        })
    }
}

// 3. The Mock Implementation (For Tests)
/// MockDocumentService
///
/// In-memory document store. `should_fail` simulates an unreachable backend.
#[derive(Clone, Default)]
pub struct MockDocumentService {
    pub should_fail: bool,
    documents: Arc<Mutex<HashMap<String, CoverLetterDocument>>>,
}

impl MockDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Seeds a document under its id (a fresh one is assigned when missing).
    pub fn with_document(self, mut doc: CoverLetterDocument) -> Self {
        let id = doc.id.get_or_insert_with(|| Uuid::new_v4().to_string()).clone();
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(id, doc);
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<CoverLetterDocument> {
        self.documents.lock().ok()?.get(id).cloned()
    }
}

#[async_trait]
impl DocumentService for MockDocumentService {
    async fn load(&self, id: &str, _token: Option<&str>) -> Result<CoverLetterDocument, DocumentError> {
        if self.should_fail {
            return Err(DocumentError::Network("Mock backend error: simulation requested".to_string()));
        }
        self.get(id).ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    async fn save(
        &self,
        doc: &CoverLetterDocument,
        _token: Option<&str>,
    ) -> Result<CoverLetterDocument, DocumentError> {
        if self.should_fail {
            return Err(DocumentError::Network("Mock backend error: simulation requested".to_string()));
        }
        let mut stored = doc.clone();
        let id = stored.id.get_or_insert_with(|| Uuid::new_v4().to_string()).clone();
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| DocumentError::Network("mock store poisoned".to_string()))?;
        documents.insert(id, stored.clone());
        Ok(stored)
    }
}
