//! Tag Service
//!
//! Named text snippets moderators can recall in chat.

use dashmap::DashMap;

#[derive(Default)]
pub struct TagService {
    tags: DashMap<String, String>,
}

impl TagService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a tag, returning the previous content
    pub fn set(&self, name: &str, content: impl Into<String>) -> Option<String> {
        self.tags.insert(name.to_lowercase(), content.into())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.tags.get(&name.to_lowercase()).map(|tag| tag.clone())
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.tags.remove(&name.to_lowercase()).map(|(_, content)| content)
    }

    /// Tag names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
