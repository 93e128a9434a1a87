//! RSS feed maintenance for riggs-feed.
//!
//! This module owns the feed document model, its XML storage, link
//! canonicalization, and the item inserter.

pub mod document;
pub mod inserter;
pub mod link;
pub mod types;

pub use document::{ensure_channel, load_or_init, parse, save, to_xml};
pub use inserter::{add_item, trim, AddItemReport, FeedInserter, InsertOutcome};
pub use link::{canonicalize_link, stable_guid};
pub use types::{Channel, Element, FeedDocument, Guid, Item, NewItem, RSS_VERSION};
