//! riggs-feed - keeps a small RSS 2.0 feed file up to date.
//!
//! Each run adds one item: the link is stripped of tracking parameters,
//! the item is skipped if its identifier is already present, and the feed
//! is capped to a maximum number of items, newest first.

pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod rss;

pub use config::{ChannelConfig, Config, FeedConfig, LoggingConfig, DEFAULT_TRACKING_PARAMS};
pub use error::{FeedError, Result};
pub use rss::{
    add_item, canonicalize_link, stable_guid, AddItemReport, FeedDocument, FeedInserter, Guid,
    InsertOutcome, Item, NewItem,
};
