use crate::models::{Document, UpdateDocumentRequest, User};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::{collections::HashMap, path::Path, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// Persistence contract for the user directory and the document catalog.
/// Handlers and the session store depend on this trait only.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- User Directory ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn list_users(&self) -> Vec<User>;

    // --- Documents ---
    async fn list_documents(&self) -> Vec<Document>;
    async fn get_document(&self, id: Uuid) -> Option<Document>;
    /// Partial update. Returns `None` when the document does not exist.
    async fn update_document(&self, id: Uuid, req: UpdateDocumentRequest) -> Option<Document>;
}

/// RepositoryState
///
/// The concrete type used to share persistence access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse seed file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Seed
///
/// Initial directory contents, loaded from JSON at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Seed {
    pub async fn from_file(path: &Path) -> Result<Self, SeedError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Read {
                path: path.display().to_string(),
                source,
            })?;
        serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// InMemoryRepository
///
/// Process-local implementation. Lists are returned sorted so responses are stable.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current contents with `seed`.
    pub async fn load(&self, seed: Seed) {
        let users: HashMap<_, _> = seed.users.into_iter().map(|u| (u.id, u)).collect();
        let documents: HashMap<_, _> = seed.documents.into_iter().map(|d| (d.id, d)).collect();

        tracing::info!(
            users = users.len(),
            documents = documents.len(),
            "directory loaded"
        );

        // Both guards are held across the swap so no reader sees half a seed.
        // Lock order: users, then documents.
        let mut current_users = self.users.write().await;
        let mut current_documents = self.documents.write().await;
        *current_users = users;
        *current_documents = documents;
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn insert_document(&self, document: Document) {
        self.documents.write().await.insert(document.id, document);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    async fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    async fn list_documents(&self) -> Vec<Document> {
        let mut documents: Vec<Document> = self.documents.read().await.values().cloned().collect();
        // Most recently edited first.
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        documents
    }

    async fn get_document(&self, id: Uuid) -> Option<Document> {
        self.documents.read().await.get(&id).cloned()
    }

    async fn update_document(&self, id: Uuid, req: UpdateDocumentRequest) -> Option<Document> {
        let mut documents = self.documents.write().await;
        let document = documents.get_mut(&id)?;

        if let Some(title) = req.title {
            document.title = title;
        }
        if let Some(body) = req.body {
            document.body = body;
        }
        document.updated_at = Utc::now();

        Some(document.clone())
    }
}
