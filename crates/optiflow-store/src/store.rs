//! Document repository implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use optiflow_core::{ConfigurationDocument, OptiflowError, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::revision::{parse_version, Revision};

const RESOURCE: &str = "document";

/// Storage of configuration documents keyed by session id.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store a new document. Fails if the session id is taken or the
    /// version is not `major.minor.patch`.
    async fn create(&self, document: ConfigurationDocument) -> Result<Revision>;

    /// The latest revision of a document.
    async fn get(&self, session_id: &str) -> Result<Option<ConfigurationDocument>>;

    /// A document as it was at a given version.
    async fn get_version(
        &self,
        session_id: &str,
        version: &str,
    ) -> Result<Option<ConfigurationDocument>>;

    /// Store an edited document as a new revision.
    ///
    /// The version is bumped according to the kind of change and
    /// `lastModified` is stamped. An edit that changes nothing returns the
    /// current revision.
    async fn update(&self, document: ConfigurationDocument) -> Result<Revision>;

    /// Latest revision of every document, ordered by session id.
    async fn list(&self) -> Result<Vec<ConfigurationDocument>>;

    /// Every revision of a document, oldest first.
    async fn history(&self, session_id: &str) -> Result<Vec<Revision>>;
}

/// In-memory implementation of DocumentRepository.
#[derive(Clone, Default)]
pub struct InMemoryDocumentRepository {
    /// session id -> revisions (append-only).
    documents: Arc<RwLock<HashMap<String, Vec<Revision>>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(session_id: &str) -> OptiflowError {
        OptiflowError::NotFound {
            resource_type: RESOURCE.to_string(),
            id: session_id.to_string(),
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, document: ConfigurationDocument) -> Result<Revision> {
        if parse_version(&document.version).is_err() {
            warn!(session_id = %document.session_id, version = %document.version, "Rejected document");
            return Err(OptiflowError::InvalidDocument {
                message: format!("Invalid semantic version '{}'", document.version),
                session_id: Some(document.session_id),
            });
        }

        let mut documents = self.documents.write().await;

        if documents.contains_key(&document.session_id) {
            return Err(OptiflowError::AlreadyExists {
                resource_type: RESOURCE.to_string(),
                id: document.session_id,
            });
        }

        let revision = Revision::initial(document);
        info!(
            session_id = %revision.document.session_id,
            version = %revision.version,
            "Stored document"
        );
        documents.insert(revision.document.session_id.clone(), vec![revision.clone()]);

        Ok(revision)
    }

    async fn get(&self, session_id: &str) -> Result<Option<ConfigurationDocument>> {
        let documents = self.documents.read().await;

        Ok(documents
            .get(session_id)
            .and_then(|revisions| revisions.last())
            .map(|revision| revision.document.clone()))
    }

    async fn get_version(
        &self,
        session_id: &str,
        version: &str,
    ) -> Result<Option<ConfigurationDocument>> {
        let documents = self.documents.read().await;

        Ok(documents
            .get(session_id)
            .and_then(|revisions| revisions.iter().rev().find(|r| r.version == version))
            .map(|revision| revision.document.clone()))
    }

    async fn update(&self, document: ConfigurationDocument) -> Result<Revision> {
        let mut documents = self.documents.write().await;

        let revisions = documents
            .get_mut(&document.session_id)
            .ok_or_else(|| Self::not_found(&document.session_id))?;
        let current = revisions
            .last()
            .ok_or_else(|| Self::not_found(&document.session_id))?;

        let Some(next) = current.next(document)? else {
            return Ok(current.clone());
        };

        info!(
            session_id = %next.document.session_id,
            from = %current.version,
            to = %next.version,
            changes = next.changes.len(),
            "Updated document"
        );
        revisions.push(next.clone());

        Ok(next)
    }

    async fn list(&self) -> Result<Vec<ConfigurationDocument>> {
        let documents = self.documents.read().await;

        let mut latest: Vec<ConfigurationDocument> = documents
            .values()
            .filter_map(|revisions| revisions.last())
            .map(|revision| revision.document.clone())
            .collect();
        latest.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        Ok(latest)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Revision>> {
        let documents = self.documents.read().await;

        documents
            .get(session_id)
            .cloned()
            .ok_or_else(|| Self::not_found(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiflow_core::{DocumentStatus, Objective, ProtocolStep, StepAction};

    use crate::revision::ChangeType;

    fn document(session_id: &str) -> ConfigurationDocument {
        ConfigurationDocument::builder()
            .session_id(session_id)
            .objective(Objective::minimize("cost"))
            .step(ProtocolStep::new("collect", StepAction::CollectData))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryDocumentRepository::new();

        let revision = repo.create(document("s-1")).await.unwrap();
        assert_eq!(revision.version, "1.0.0");
        assert!(revision.changes.is_empty());

        let stored = repo.get("s-1").await.unwrap().unwrap();
        assert_eq!(stored, revision.document);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create() {
        let repo = InMemoryDocumentRepository::new();
        repo.create(document("s-1")).await.unwrap();

        let err = repo.create(document("s-1")).await.unwrap_err();
        assert!(matches!(err, OptiflowError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_non_semantic_version() {
        let repo = InMemoryDocumentRepository::new();
        let mut doc = document("s-1");
        doc.version = "draft".to_string();

        let err = repo.create(doc).await.unwrap_err();
        match err {
            OptiflowError::InvalidDocument { session_id, message } => {
                assert_eq!(session_id.as_deref(), Some("s-1"));
                assert_eq!(message, "Invalid semantic version 'draft'");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(repo.get("s-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown() {
        let repo = InMemoryDocumentRepository::new();
        let err = repo.update(document("ghost")).await.unwrap_err();
        assert!(matches!(err, OptiflowError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let repo = InMemoryDocumentRepository::new();
        let first = repo.create(document("s-1")).await.unwrap();

        let mut edited = first.document.clone();
        edited.protocol.allow_partial_solutions = true;
        let second = repo.update(edited).await.unwrap();
        assert_eq!(second.version, "1.1.0");
        assert_eq!(second.change_type, Some(ChangeType::Minor));

        let mut edited = second.document.clone();
        edited.status = DocumentStatus::Completed;
        let third = repo.update(edited).await.unwrap();
        assert_eq!(third.version, "1.1.1");

        let current = repo.get("s-1").await.unwrap().unwrap();
        assert_eq!(current.version, "1.1.1");
        assert_eq!(current.status, DocumentStatus::Completed);

        let old = repo.get_version("s-1", "1.0.0").await.unwrap().unwrap();
        assert!(!old.protocol.allow_partial_solutions);
    }

    #[tokio::test]
    async fn test_noop_update_keeps_revision() {
        let repo = InMemoryDocumentRepository::new();
        let first = repo.create(document("s-1")).await.unwrap();

        let again = repo.update(first.document.clone()).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(repo.history("s-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let repo = InMemoryDocumentRepository::new();
        repo.create(document("b")).await.unwrap();
        repo.create(document("a")).await.unwrap();

        let ids: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.session_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
