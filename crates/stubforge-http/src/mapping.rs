//! Mappings: configured rules pairing request matchers with response and
//! webhook actions, plus the copy-on-write registry that publishes them.

use crate::matching::{MatchResult, RequestMatcher, Score};
use crate::model::{RequestMessage, WebhookRequest};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// One configured rule. Immutable after registration; matchers are created
/// once and shared across all concurrent matching passes.
pub struct Mapping {
    pub id: Uuid,
    pub title: Option<String>,
    pub matchers: Vec<Arc<dyn RequestMatcher>>,
    pub webhooks: Vec<WebhookRequest>,
    /// Deserialize proxied response bodies as JSON.
    pub deserialize_json: bool,
    /// Decompress gzip/deflate proxied response bodies.
    pub decompress_gzip_and_deflate: bool,
}

impl Mapping {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: None,
            matchers: Vec::new(),
            webhooks: Vec::new(),
            deserialize_json: false,
            decompress_gzip_and_deflate: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn RequestMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn with_webhook(mut self, webhook: WebhookRequest) -> Self {
        self.webhooks.push(webhook);
        self
    }

    /// Run every matcher against the request, recording each contribution
    /// into the accumulator, and report the mean. Ranking across mappings
    /// is the caller's concern.
    pub fn score(&self, request: &RequestMessage, result: &mut MatchResult) -> Score {
        for matcher in &self.matchers {
            matcher.score(request, result);
        }
        result.average_score()
    }
}

impl Default for Mapping {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapping")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("matchers", &self.matchers.len())
            .field("webhooks", &self.webhooks.len())
            .finish()
    }
}

/// Published set of mappings under concurrent read/write.
///
/// Readers take one [`snapshot`](Self::snapshot) and use it for an entire
/// matching pass; writers rebuild the vector and swap the published
/// reference, so a pass never observes a set that changed mid-evaluation.
#[derive(Default)]
pub struct MappingRegistry {
    published: RwLock<Arc<Vec<Arc<Mapping>>>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current consistent snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Mapping>>> {
        Arc::clone(&self.published.read())
    }

    /// Publish a new set containing the given mapping.
    pub fn register(&self, mapping: Mapping) -> Uuid {
        let id = mapping.id;
        let mut published = self.published.write();
        let mut next: Vec<Arc<Mapping>> = published.as_ref().clone();
        next.push(Arc::new(mapping));
        *published = Arc::new(next);
        debug!(mapping_id = %id, total = published.len(), "mapping registered");
        id
    }

    /// Publish a new set without the given mapping.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut published = self.published.write();
        let before = published.len();
        let next: Vec<Arc<Mapping>> = published
            .iter()
            .filter(|m| m.id != id)
            .cloned()
            .collect();
        let removed = next.len() != before;
        if removed {
            *published = Arc::new(next);
            debug!(mapping_id = %id, "mapping removed");
        }
        removed
    }

    /// Publish an empty set.
    pub fn clear(&self) {
        *self.published.write() = Arc::new(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.published.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.read().is_empty()
    }
}
