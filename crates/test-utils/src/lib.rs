//! Vetrina test utilities.
//!
//! Helpers for plugin testing: item and user fixtures, an in-memory
//! [`Host`] implementation, and assertion utilities.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;
use vetrina_sdk::host::{Host, HostResult};
use vetrina_sdk::types::{ContentTypeInfo, Item, LogLevel};

/// Create a test item with default values.
pub fn test_item(item_type: &str, title: &str) -> TestItem {
    TestItem {
        id: Uuid::now_v7(),
        item_type: item_type.to_string(),
        title: title.to_string(),
        author_id: Uuid::nil(),
        status: 1,
    }
}

/// A test item builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub id: Uuid,
    pub item_type: String,
    pub title: String,
    pub author_id: Uuid,
    pub status: i16,
}

impl TestItem {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author_id: Uuid) -> Self {
        self.author_id = author_id;
        self
    }

    /// Set as unpublished.
    pub fn unpublished(mut self) -> Self {
        self.status = 0;
        self
    }

    /// Build the SDK item.
    pub fn build(self) -> Item {
        Item {
            id: self.id,
            item_type: self.item_type,
            title: self.title,
            status: self.status,
            author_id: self.author_id,
            created: 1_700_000_000,
            changed: 1_700_000_000,
        }
    }
}

/// A log record captured by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub plugin: String,
    pub message: String,
}

/// In-memory [`Host`] for exercising plugin taps without a kernel.
///
/// Tokens are scoped to their action and consumed on successful
/// verification, like the kernel's session-backed tokens.
#[derive(Debug)]
pub struct MemoryHost {
    user_id: Uuid,
    permissions: HashSet<String>,
    content_types: Vec<ContentTypeInfo>,
    variables: Mutex<HashMap<String, Value>>,
    meta: Mutex<HashMap<(Uuid, String), String>>,
    tokens: Mutex<Vec<(String, String)>>,
    next_token: Mutex<u64>,
    logs: Mutex<Vec<LogRecord>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// An anonymous user with no permissions, and the `article` and `page`
    /// content types.
    pub fn new() -> Self {
        Self {
            user_id: Uuid::nil(),
            permissions: HashSet::new(),
            content_types: vec![
                ContentTypeInfo::new("article", "Article"),
                ContentTypeInfo::new("page", "Basic page"),
            ],
            variables: Mutex::new(HashMap::new()),
            meta: Mutex::new(HashMap::new()),
            tokens: Mutex::new(Vec::new()),
            next_token: Mutex::new(0),
            logs: Mutex::new(Vec::new()),
        }
    }

    /// A user holding `administer site`.
    pub fn admin() -> Self {
        Self::new()
            .with_user(Uuid::now_v7())
            .with_permissions(&["administer site"])
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions
            .extend(permissions.iter().map(|p| p.to_string()));
        self
    }

    /// Replace the known content types. Non-public types are filtered out of
    /// [`Host::public_content_types`].
    pub fn with_content_types(mut self, types: Vec<ContentTypeInfo>) -> Self {
        self.content_types = types;
        self
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Current value of a configuration variable.
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables.lock().get(name).cloned()
    }

    /// Seed a configuration variable.
    pub fn set_variable(&self, name: &str, value: Value) {
        self.variables.lock().insert(name.to_string(), value);
    }

    /// Current value of an item attribute.
    pub fn meta(&self, item_id: Uuid, key: &str) -> Option<String> {
        self.meta.lock().get(&(item_id, key.to_string())).cloned()
    }

    /// Seed an item attribute.
    pub fn set_meta(&self, item_id: Uuid, key: &str, value: &str) {
        self.meta
            .lock()
            .insert((item_id, key.to_string()), value.to_string());
    }

    /// Number of unconsumed tokens.
    pub fn outstanding_tokens(&self) -> usize {
        self.tokens.lock().len()
    }

    /// Every log record emitted so far.
    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs.lock().clone()
    }

    /// Snapshot of all item attributes, for asserting that nothing changed.
    pub fn meta_snapshot(&self) -> BTreeMap<(Uuid, String), String> {
        self.meta
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn has(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[async_trait]
impl Host for MemoryHost {
    async fn variable_get(&self, name: &str) -> HostResult<Option<Value>> {
        Ok(self.variable(name))
    }

    async fn item_meta_get(&self, item_id: Uuid, key: &str) -> HostResult<Option<String>> {
        Ok(self.meta(item_id, key))
    }

    async fn item_meta_set(&self, item_id: Uuid, key: &str, value: &str) -> HostResult<()> {
        self.set_meta(item_id, key, value);
        Ok(())
    }

    async fn public_content_types(&self) -> HostResult<Vec<ContentTypeInfo>> {
        let mut types: Vec<_> = self
            .content_types
            .iter()
            .filter(|t| t.public)
            .cloned()
            .collect();
        types.sort_by(|a, b| a.machine_name.cmp(&b.machine_name));
        Ok(types)
    }

    async fn issue_token(&self, action: &str) -> HostResult<String> {
        let mut next = self.next_token.lock();
        *next += 1;
        let token = format!("token-{next}");
        self.tokens.lock().push((action.to_string(), token.clone()));
        Ok(token)
    }

    async fn verify_token(&self, action: &str, token: &str) -> HostResult<bool> {
        let mut tokens = self.tokens.lock();
        match tokens.iter().position(|(a, t)| a == action && t == token) {
            Some(pos) => {
                tokens.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn current_user_has_permission(&self, permission: &str) -> bool {
        self.has(permission)
    }

    fn current_user_can_edit(&self, item: &Item) -> bool {
        self.has("administer site")
            || self.has("edit any content")
            || (self.has("edit own content")
                && !self.user_id.is_nil()
                && item.author_id == self.user_id)
    }

    fn log(&self, level: LogLevel, plugin: &str, message: &str) {
        self.logs.lock().push(LogRecord {
            level,
            plugin: plugin.to_string(),
            message: message.to_string(),
        });
    }
}

/// Assertion helpers for rendered output.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }
}
