//! Play queue
//!
//! In-memory ordered list of things to play next: files, streams,
//! favorites and presets. Preset items only store an index into
//! [`PRESETS`](crate::presets::PRESETS) and resolve their name and URL
//! from it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::queue::MAX_ITEMS;
use crate::presets::preset;

/// Where a queue item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    File,
    Stream,
    Favorite,
    Preset,
}

impl ItemKind {
    /// Short tag used in listings
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::File => "FILE",
            ItemKind::Stream => "STREAM",
            ItemKind::Favorite => "FAVO",
            ItemKind::Preset => "PRESET",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub kind: ItemKind,
    pub name: String,
    pub url: String,
    /// Index into the preset table; only meaningful for `Preset` items
    #[serde(default)]
    pub preset_index: usize,
}

impl QueueItem {
    pub fn file(url: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::File,
            name: String::new(),
            url: url.into(),
            preset_index: 0,
        }
    }

    pub fn stream(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Stream,
            name: name.into(),
            url: url.into(),
            preset_index: 0,
        }
    }

    pub fn favorite(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Favorite,
            name: name.into(),
            url: url.into(),
            preset_index: 0,
        }
    }

    pub fn preset(index: usize) -> Self {
        Self {
            kind: ItemKind::Preset,
            name: String::new(),
            url: String::new(),
            preset_index: index,
        }
    }

    /// URL to open, resolving presets through the preset table
    pub fn resolved_url(&self) -> Option<&str> {
        match self.kind {
            ItemKind::Preset => preset(self.preset_index).map(|p| p.url),
            _ => Some(self.url.as_str()),
        }
    }

    /// Display name, resolving presets through the preset table
    pub fn resolved_name(&self) -> Option<&str> {
        match self.kind {
            ItemKind::Preset => preset(self.preset_index).map(|p| p.name),
            _ => Some(self.name.as_str()),
        }
    }

    /// Name shown in listings: last path segment for files
    fn label(&self) -> &str {
        match self.kind {
            ItemKind::File => self.url.rsplit('/').next().unwrap_or_default(),
            _ => self.resolved_name().unwrap_or_default(),
        }
    }
}

/// Bounded play queue with a current-item cursor
#[derive(Debug, Default)]
pub struct PlayQueue {
    items: Vec<QueueItem>,
    /// `None` while stopped
    current: Option<usize>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(MAX_ITEMS),
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item. Returns false, leaving the queue unchanged, when full.
    pub fn add(&mut self, item: QueueItem) -> bool {
        if self.items.len() >= MAX_ITEMS {
            debug!(capacity = MAX_ITEMS, "queue full, item dropped");
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove the item at `index`; items after the cursor keep their place.
    pub fn remove(&mut self, index: usize) -> Option<QueueItem> {
        if index >= self.items.len() {
            return None;
        }
        if let Some(current) = self.current {
            if index < current {
                self.current = Some(current - 1);
            }
        }
        Some(self.items.remove(index))
    }

    /// Empty the queue and stop the cursor
    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn url(&self, index: usize) -> Option<&str> {
        self.items.get(index).and_then(QueueItem::resolved_url)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.items.get(index).and_then(QueueItem::resolved_name)
    }

    pub fn current_item(&self) -> Option<usize> {
        self.current
    }

    pub fn set_current_item(&mut self, index: Option<usize>) {
        self.current = index;
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Move the cursor to the next item, starting from the first when
    /// stopped. Past the end the cursor stops and `None` is returned.
    pub fn advance(&mut self) -> Option<usize> {
        let next = self.current.map_or(0, |i| i + 1);
        self.current = (next < self.items.len()).then_some(next);
        self.current
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }
}

impl fmt::Display for PlayQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "playlist")?;
        for item in &self.items {
            writeln!(f, "{}", item.label())?;
            writeln!(f, "{}", item.kind)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::PRESETS;

    #[test]
    fn add_and_resolve() {
        let mut q = PlayQueue::new();
        assert!(q.add(QueueItem::stream("Test FM", "http://radio.example/live")));
        assert!(q.add(QueueItem::preset(1)));
        assert_eq!(q.len(), 2);
        assert_eq!(q.url(0), Some("http://radio.example/live"));
        assert_eq!(q.name(1), Some(PRESETS[1].name));
        assert_eq!(q.url(1), Some(PRESETS[1].url));
        assert_eq!(q.url(2), None);
    }

    #[test]
    fn bad_preset_index_resolves_to_none() {
        let mut q = PlayQueue::new();
        q.add(QueueItem::preset(PRESETS.len() + 3));
        assert_eq!(q.url(0), None);
        assert_eq!(q.name(0), None);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut q = PlayQueue::new();
        for i in 0..MAX_ITEMS {
            assert!(q.add(QueueItem::file(format!("http://files.example/{i}.mp3"))));
        }
        assert!(!q.add(QueueItem::file("http://files.example/extra.mp3")));
        assert_eq!(q.len(), MAX_ITEMS);
    }

    #[test]
    fn advance_walks_then_stops() {
        let mut q = PlayQueue::new();
        q.add(QueueItem::file("http://a/1.mp3"));
        q.add(QueueItem::file("http://a/2.mp3"));
        assert_eq!(q.current_item(), None);
        assert_eq!(q.advance(), Some(0));
        assert_eq!(q.advance(), Some(1));
        assert_eq!(q.current().map(|i| i.url.as_str()), Some("http://a/2.mp3"));
        assert_eq!(q.advance(), None);
        assert_eq!(q.current_item(), None);
    }

    #[test]
    fn advance_on_empty_queue() {
        let mut q = PlayQueue::new();
        assert_eq!(q.advance(), None);
    }

    #[test]
    fn remove_shifts_cursor() {
        let mut q = PlayQueue::new();
        for n in ["a", "b", "c"] {
            q.add(QueueItem::stream(n, format!("http://x/{n}")));
        }
        q.set_current_item(Some(2));
        assert_eq!(q.remove(0).map(|i| i.name), Some("a".to_string()));
        assert_eq!(q.current_item(), Some(1));
        assert_eq!(q.current().map(|i| i.name.as_str()), Some("c"));
        assert!(q.remove(9).is_none());
    }

    #[test]
    fn clear_resets_cursor() {
        let mut q = PlayQueue::new();
        q.add(QueueItem::file("http://a/1.mp3"));
        q.advance();
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.current_item(), None);
    }

    #[test]
    fn listing() {
        let mut q = PlayQueue::new();
        q.add(QueueItem::file("http://files.example/music/song.mp3"));
        q.add(QueueItem::preset(0));
        q.add(QueueItem::favorite("Night Jazz", "http://jazz.example/"));
        q.add(QueueItem::stream("Found", "http://found.example/"));
        let expected = format!(
            "playlist\nsong.mp3\nFILE\n{}\nPRESET\nNight Jazz\nFAVO\nFound\nSTREAM\n",
            PRESETS[0].name
        );
        assert_eq!(q.to_string(), expected);
    }

    #[test]
    fn item_serde() {
        let item = QueueItem::favorite("Night Jazz", "http://jazz.example/");
        let json = serde_json::to_string(&item).unwrap();
        let back: QueueItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
