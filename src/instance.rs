//! Shared server-side state: the one external resource filters and
//! handlers lock around. The chain itself stays lock-free.

use std::collections::BTreeMap;
use std::sync::RwLock as StdRwLock;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::resources::models::{
    ContentItem, LOCAL_STATUS_IN_SERVICE, REMOTE_STATUS_AVAILABLE, REMOTE_STATUS_CHECKING,
    Repository, RepositoryStatus,
};

/// Opaque key-value cache keyed by content path.
pub trait PathCache: Send + Sync {
    fn put(&self, path: &str, value: String);
    fn get(&self, path: &str) -> Option<String>;
    /// Removes every entry under the prefix; returns how many went away.
    fn purge_prefix(&self, prefix: &str) -> usize;
}

/// In-memory [`PathCache`].
#[derive(Debug, Default)]
pub struct MemoryPathCache {
    entries: StdRwLock<BTreeMap<String, String>>,
}

impl MemoryPathCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathCache for MemoryPathCache {
    fn put(&self, path: &str, value: String) {
        self.entries
            .write()
            .expect("path cache lock poisoned")
            .insert(path.to_string(), value);
    }

    fn get(&self, path: &str) -> Option<String> {
        self.entries
            .read()
            .expect("path cache lock poisoned")
            .get(path)
            .cloned()
    }

    fn purge_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().expect("path cache lock poisoned");
        let before = entries.len();
        entries.retain(|path, _| !path.starts_with(prefix));
        before - entries.len()
    }
}

fn content_key(repository_id: &str, subpath: &str) -> String {
    let subpath = subpath.trim_matches('/');
    if subpath.is_empty() {
        repository_id.to_string()
    } else {
        format!("{repository_id}/{subpath}")
    }
}

/// Username/password pairs accepted by the authentication guard.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: BTreeMap<String, String>,
}

impl CredentialStore {
    pub fn from_users(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users.get(username).is_some_and(|p| p == password)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// One server instance: repositories, statuses, content listings, the
/// path cache, credentials, and issued login tokens.
pub struct ServerInstance {
    repositories: RwLock<BTreeMap<String, Repository>>,
    statuses: RwLock<BTreeMap<String, RepositoryStatus>>,
    content: RwLock<BTreeMap<String, Vec<ContentItem>>>,
    cache: Box<dyn PathCache>,
    credentials: CredentialStore,
    tokens: RwLock<BTreeMap<String, String>>,
}

impl ServerInstance {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            repositories: RwLock::new(BTreeMap::new()),
            statuses: RwLock::new(BTreeMap::new()),
            content: RwLock::new(BTreeMap::new()),
            cache: Box::new(MemoryPathCache::new()),
            credentials,
            tokens: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn cache(&self) -> &dyn PathCache {
        self.cache.as_ref()
    }

    pub async fn upsert_repository(&self, repository: Repository) {
        let id = repository.id.clone();
        // Proxy repositories carry a remote status; everything else has none.
        let remote_status = (repository.repo_type.as_deref() == Some("proxy"))
            .then(|| REMOTE_STATUS_AVAILABLE.to_string());
        self.statuses.write().await.entry(id.clone()).or_insert(RepositoryStatus {
            id: id.clone(),
            local_status: LOCAL_STATUS_IN_SERVICE.to_string(),
            remote_status,
            model_encoding: None,
        });
        self.repositories.write().await.insert(id, repository);
    }

    pub async fn list_repositories(&self) -> Vec<Repository> {
        self.repositories.read().await.values().cloned().collect()
    }

    pub async fn repository_status(&self, id: &str) -> Option<RepositoryStatus> {
        self.statuses.read().await.get(id).cloned()
    }

    pub async fn set_repository_status(&self, status: RepositoryStatus) {
        self.statuses.write().await.insert(status.id.clone(), status);
    }

    pub async fn list_statuses(&self) -> Vec<RepositoryStatus> {
        self.statuses.read().await.values().cloned().collect()
    }

    /// Marks every proxy repository's remote status as being re-checked.
    pub async fn begin_remote_checks(&self) -> usize {
        let mut statuses = self.statuses.write().await;
        let mut marked = 0;
        for status in statuses.values_mut() {
            if status.remote_status.is_some() {
                status.remote_status = Some(REMOTE_STATUS_CHECKING.to_string());
                marked += 1;
            }
        }
        marked
    }

    /// Stores the listing for one content node; an empty `subpath` is the
    /// repository root.
    pub async fn set_content(&self, repository_id: &str, subpath: &str, items: Vec<ContentItem>) {
        self.content
            .write()
            .await
            .insert(content_key(repository_id, subpath), items);
    }

    pub async fn content_at(&self, repository_id: &str, subpath: &str) -> Option<Vec<ContentItem>> {
        self.content
            .read()
            .await
            .get(&content_key(repository_id, subpath))
            .cloned()
    }

    /// Issues a fresh authorization token for the principal.
    pub async fn issue_token(&self, username: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens
            .write()
            .await
            .insert(token.clone(), username.to_string());
        info!(username, "issued authorization token");
        token
    }

    /// Revokes every token issued to the principal.
    pub async fn revoke_tokens(&self, username: &str) -> usize {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, owner| owner != username);
        before - tokens.len()
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_store_verifies_exact_pairs() {
        let store = CredentialStore::from_users(
            [("admin".to_string(), "secret".to_string())].into(),
        );
        assert!(store.verify("admin", "secret"));
        assert!(!store.verify("admin", "wrong"));
        assert!(!store.verify("other", "secret"));
    }

    #[test]
    fn path_cache_purges_by_prefix() {
        let cache = MemoryPathCache::new();
        cache.put("repositories/r1/content/a", "A".to_string());
        cache.put("repositories/r1/content/b", "B".to_string());
        cache.put("repositories/r2/content/a", "C".to_string());

        assert_eq!(cache.purge_prefix("repositories/r1/"), 2);
        assert!(cache.get("repositories/r1/content/a").is_none());
        assert_eq!(cache.get("repositories/r2/content/a"), Some("C".to_string()));
    }

    fn repository(id: &str, repo_type: &str) -> Repository {
        Repository {
            id: id.to_string(),
            name: id.to_string(),
            repo_type: Some(repo_type.to_string()),
            resource_uri: None,
            model_encoding: None,
        }
    }

    #[tokio::test]
    async fn proxy_repositories_start_available_and_get_rechecked() {
        let instance = ServerInstance::new(CredentialStore::default());
        instance.upsert_repository(repository("central", "proxy")).await;
        instance.upsert_repository(repository("releases", "hosted")).await;

        let central = instance.repository_status("central").await.unwrap();
        assert_eq!(central.remote_status.as_deref(), Some(REMOTE_STATUS_AVAILABLE));
        let releases = instance.repository_status("releases").await.unwrap();
        assert!(releases.remote_status.is_none());

        // Only repositories with a remote side get marked.
        assert_eq!(instance.begin_remote_checks().await, 1);
        let central = instance.repository_status("central").await.unwrap();
        assert_eq!(central.remote_status.as_deref(), Some(REMOTE_STATUS_CHECKING));
    }

    #[tokio::test]
    async fn content_listings_are_keyed_by_node_path() {
        let instance = ServerInstance::new(CredentialStore::default());
        let root = vec![ContentItem {
            text: "org".to_string(),
            leaf: false,
            resource_uri: None,
            model_encoding: None,
        }];
        let nested = vec![ContentItem {
            text: "acme".to_string(),
            leaf: false,
            resource_uri: None,
            model_encoding: None,
        }];
        instance.set_content("releases", "", root).await;
        instance.set_content("releases", "org/", nested).await;

        assert_eq!(instance.content_at("releases", "").await.unwrap()[0].text, "org");
        assert_eq!(instance.content_at("releases", "org").await.unwrap()[0].text, "acme");
        assert!(instance.content_at("releases", "org/acme").await.is_none());
        assert!(instance.content_at("central", "").await.is_none());
    }

    #[tokio::test]
    async fn tokens_are_issued_and_revoked_per_user() {
        let instance = ServerInstance::new(CredentialStore::default());
        instance.issue_token("admin").await;
        instance.issue_token("admin").await;
        instance.issue_token("deploy").await;

        assert_eq!(instance.token_count().await, 3);
        assert_eq!(instance.revoke_tokens("admin").await, 2);
        assert_eq!(instance.token_count().await, 1);
    }
}
