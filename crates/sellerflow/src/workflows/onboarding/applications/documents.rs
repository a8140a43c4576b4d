/// Durable storage boundary for uploaded identity and supporting documents.
/// Keys are opaque strings persisted on the application record; the core
/// never learns storage details. Implementations bound their calls with a
/// timeout and report expiry as [`DocumentError::Timeout`].
pub trait DocumentStore: Send + Sync {
    /// Store bytes and return the opaque key for later retrieval.
    fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DocumentError>;

    fn retrieve(&self, key: &str) -> Result<StoredDocument, DocumentError>;

    fn delete(&self, key: &str) -> Result<(), DocumentError>;
}

/// Downloaded document payload plus the metadata needed to serve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub key: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StoredDocument {
    /// Content type for the download response, falling back to a generic
    /// byte stream when the store recorded none.
    pub fn serve_content_type(&self) -> &str {
        if self.content_type.is_empty() {
            mime::APPLICATION_OCTET_STREAM.essence_str()
        } else {
            &self.content_type
        }
    }
}

/// Selects which stored document of an application to stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSelector {
    /// The mandatory identity document.
    IdDocument,
    /// One entry of the ordered supporting-document list.
    Additional(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document store timed out")]
    Timeout,
}
