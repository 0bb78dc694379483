use super::{FeedStore, PersistenceResult};
use crate::feed::FeedRecord;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryFeedStore {
    feeds: RwLock<BTreeMap<String, FeedRecord>>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedStore for MemoryFeedStore {
    fn save_feed(&self, feed: &FeedRecord) -> PersistenceResult<()> {
        super::validate_feed(feed)?;
        self.feeds
            .write()
            .insert(feed.unique_id.clone(), feed.clone());
        Ok(())
    }

    fn load_feed(&self, unique_id: &str) -> PersistenceResult<Option<FeedRecord>> {
        Ok(self.feeds.read().get(unique_id).cloned())
    }

    fn list_feeds(&self) -> PersistenceResult<Vec<FeedRecord>> {
        Ok(self.feeds.read().values().cloned().collect())
    }

    fn delete_feed(&self, unique_id: &str) -> PersistenceResult<bool> {
        Ok(self.feeds.write().remove(unique_id).is_some())
    }
}
