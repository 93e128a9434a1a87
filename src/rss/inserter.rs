//! Feed item insertion.
//!
//! One run loads the feed, adds at most one item at the head, trims the
//! tail to the configured size, and writes the feed back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::{ChannelConfig, FeedConfig};
use crate::datetime::{format_rfc2822, normalize_rfc2822};
use crate::rss::document;
use crate::rss::link::{canonicalize_link, stable_guid};
use crate::rss::types::{FeedDocument, Guid, Item, NewItem};
use crate::{FeedError, Result};

/// What happened to a submitted item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The item was added at the head of the feed.
    Inserted {
        /// Identifier of the new item.
        guid: String,
        /// Number of old items removed to respect the size cap.
        evicted: usize,
    },
    /// An item with the same identifier already exists; nothing changed.
    Duplicate {
        /// The identifier that matched.
        guid: String,
    },
}

impl InsertOutcome {
    /// Identifier the submission resolved to.
    pub fn guid(&self) -> &str {
        match self {
            InsertOutcome::Inserted { guid, .. } | InsertOutcome::Duplicate { guid } => guid,
        }
    }

    /// Whether the item was added.
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted { .. })
    }
}

/// Result of a full load-insert-save run.
#[derive(Debug, Clone)]
pub struct AddItemReport {
    /// Absolute path of the feed that was written.
    pub path: PathBuf,
    /// What happened to the item.
    pub outcome: InsertOutcome,
    /// Number of items in the feed after the run.
    pub item_count: usize,
}

/// Inserts items into a feed document under a fixed policy.
pub struct FeedInserter<'a> {
    tracking_params: &'a [String],
    max_items: usize,
}

impl<'a> FeedInserter<'a> {
    /// Create an inserter from the feed configuration.
    pub fn new(config: &'a FeedConfig) -> Self {
        Self {
            tracking_params: &config.tracking_params,
            max_items: config.max_items,
        }
    }

    /// Override the item cap.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Item cap in effect.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Insert `item` into `doc`, stamped with the current time.
    pub fn insert(&self, doc: &mut FeedDocument, item: &NewItem) -> Result<InsertOutcome> {
        self.insert_at(doc, item, Utc::now())
    }

    /// Insert `item` into `doc`, using `now` for default timestamps.
    ///
    /// The item's identifier is the explicit guid, else its canonical link,
    /// else its title. If an item with that identifier exists the document
    /// is left untouched. Otherwise the new item goes first, the channel's
    /// `lastBuildDate` is set to `now`, and the oldest items beyond the cap
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Usage`] if the item has no usable identifier or
    /// its publication date is not RFC 2822. The document is not modified.
    pub fn insert_at(
        &self,
        doc: &mut FeedDocument,
        item: &NewItem,
        now: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        if self.max_items == 0 {
            return Err(FeedError::Usage(
                "maximum item count must be at least 1".to_string(),
            ));
        }

        let link = canonicalize_link(&item.link, self.tracking_params);
        if link != item.link {
            debug!(original = %item.link, canonical = %link, "stripped tracking parameters");
        }

        let guid = stable_guid(item.guid.as_deref(), &link, &item.title).ok_or_else(|| {
            FeedError::Usage("item needs a guid, a link, or a title to identify it".to_string())
        })?;

        if doc.contains_guid(&guid) {
            info!(guid = %guid, "item already in feed, skipping");
            return Ok(InsertOutcome::Duplicate { guid });
        }

        let pub_date = match &item.pub_date {
            Some(pub_date) => normalize_rfc2822(pub_date)?,
            None => format_rfc2822(&now),
        };

        let new_item = Item {
            title: Some(item.title.clone()),
            link: Some(link),
            description: Some(item.description.clone()),
            pub_date: Some(pub_date),
            guid: Some(Guid::new(guid.clone())),
            extensions: Vec::new(),
        };

        doc.channel.items.insert(0, new_item);
        doc.channel.last_build_date = Some(format_rfc2822(&now));

        let evicted = trim(doc, self.max_items);
        info!(guid = %guid, evicted, items = doc.items().len(), "item added to feed");

        Ok(InsertOutcome::Inserted { guid, evicted })
    }
}

/// Drop the oldest items so at most `max_items` remain.
///
/// Returns the number of items removed.
pub fn trim(doc: &mut FeedDocument, max_items: usize) -> usize {
    let items = &mut doc.channel.items;
    if items.len() <= max_items {
        return 0;
    }
    let evicted = items.len() - max_items;
    items.truncate(max_items);
    evicted
}

/// Resolve a feed path against the working directory.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Add one item to the feed file at `path`.
///
/// Loads the feed (or starts a new one from `channel` defaults), inserts
/// the item under the `feed` policy, and writes the whole document back.
/// A duplicate submission still rewrites the file and reports success.
pub fn add_item(
    path: &Path,
    item: &NewItem,
    feed: &FeedConfig,
    channel: &ChannelConfig,
) -> Result<AddItemReport> {
    let path = absolute_path(path)?;
    let inserter = FeedInserter::new(feed);

    let mut doc = document::load_or_init(&path, channel)?;
    let outcome = inserter.insert(&mut doc, item)?;
    document::save(&doc, &path)?;

    Ok(AddItemReport {
        path,
        outcome,
        item_count: doc.items().len(),
    })
}
