//! RSS document types for riggs-feed.

/// RSS version written to the root element.
pub const RSS_VERSION: &str = "2.0";

/// A generic XML element the feed model does not interpret.
///
/// Kept so that unknown channel or item children (`language`, `atom:link`,
/// `enclosure`, ...) survive a read-modify-write cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified element name, including any namespace prefix.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Concatenated text content.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Look up an attribute value by name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Item identifier plus its permalink flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guid {
    /// Identifier text.
    pub value: String,
    /// Whether the identifier is itself a dereferenceable URL.
    pub is_permalink: bool,
}

impl Guid {
    /// Build a guid, deriving the permalink flag from the identifier.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let is_permalink = value.starts_with("http://") || value.starts_with("https://");
        Self {
            value,
            is_permalink,
        }
    }
}

/// A feed item.
///
/// Fields are optional because hand-edited feeds may omit them; items
/// created by [`crate::rss::FeedInserter`] always populate all five.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    /// Item title.
    pub title: Option<String>,
    /// Link to the article.
    pub link: Option<String>,
    /// Item description.
    pub description: Option<String>,
    /// Publication timestamp (RFC 2822).
    pub pub_date: Option<String>,
    /// Stable identifier.
    pub guid: Option<Guid>,
    /// Children not modelled above.
    pub extensions: Vec<Element>,
}

impl Item {
    /// Identifier text, if the item has one.
    pub fn guid_value(&self) -> Option<&str> {
        self.guid.as_ref().map(|g| g.value.as_str())
    }
}

/// The feed channel: metadata plus items, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    /// Channel title.
    pub title: Option<String>,
    /// Channel link.
    pub link: Option<String>,
    /// Channel description.
    pub description: Option<String>,
    /// Last build timestamp (RFC 2822).
    pub last_build_date: Option<String>,
    /// Children not modelled above.
    pub extensions: Vec<Element>,
    /// Items, newest first.
    pub items: Vec<Item>,
}

/// An RSS document: the `<rss>` root and its single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    /// Root attributes other than `version` (namespace declarations etc.).
    pub attributes: Vec<(String, String)>,
    /// The channel.
    pub channel: Channel,
    /// Root children other than the channel.
    pub extensions: Vec<Element>,
}

impl FeedDocument {
    /// Create an empty document shell with the given channel metadata.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
        last_build_date: impl Into<String>,
    ) -> Self {
        Self {
            attributes: Vec::new(),
            channel: Channel {
                title: Some(title.into()),
                link: Some(link.into()),
                description: Some(description.into()),
                last_build_date: Some(last_build_date.into()),
                extensions: Vec::new(),
                items: Vec::new(),
            },
            extensions: Vec::new(),
        }
    }

    /// Items, newest first.
    pub fn items(&self) -> &[Item] {
        &self.channel.items
    }

    /// Whether any item carries the given identifier.
    pub fn contains_guid(&self, guid: &str) -> bool {
        self.channel
            .items
            .iter()
            .any(|item| item.guid_value() == Some(guid))
    }
}

/// A new item to add to the feed.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Item title.
    pub title: String,
    /// Article link; may be empty.
    pub link: String,
    /// Item description.
    pub description: String,
    /// Explicit identifier; blank values are ignored.
    pub guid: Option<String>,
    /// Publication timestamp (RFC 2822); defaults to now.
    pub pub_date: Option<String>,
}

impl NewItem {
    /// Create a new item request.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: description.into(),
            guid: None,
            pub_date: None,
        }
    }

    /// Set an explicit identifier.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    /// Set the publication timestamp.
    pub fn with_pub_date(mut self, pub_date: impl Into<String>) -> Self {
        self.pub_date = Some(pub_date.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_permalink_https() {
        let guid = Guid::new("https://example.com/t");
        assert!(guid.is_permalink);
    }

    #[test]
    fn test_guid_permalink_http() {
        assert!(Guid::new("http://example.com/t").is_permalink);
    }

    #[test]
    fn test_guid_not_permalink() {
        assert!(!Guid::new("custom-id-1").is_permalink);
        assert!(!Guid::new("ftp://example.com/file").is_permalink);
        assert!(!Guid::new("HTTPS://example.com").is_permalink);
    }

    #[test]
    fn test_element_builder() {
        let el = Element::new("atom:link")
            .with_attribute("href", "https://example.com/feed.xml")
            .with_attribute("rel", "self");

        assert_eq!(el.attribute("rel"), Some("self"));
        assert_eq!(el.attribute("type"), None);
        assert!(el.text.is_empty());
    }

    #[test]
    fn test_element_child() {
        let mut image = Element::new("image");
        image.children.push(Element::new("url").with_text("https://example.com/logo.png"));

        assert_eq!(
            image.child("url").map(|c| c.text.as_str()),
            Some("https://example.com/logo.png")
        );
        assert!(image.child("title").is_none());
    }

    #[test]
    fn test_document_new_is_empty() {
        let doc = FeedDocument::new("T", "https://example.com/", "D", "Wed, 05 Jun 2024 14:23:01 +0000");
        assert!(doc.items().is_empty());
        assert_eq!(doc.channel.title.as_deref(), Some("T"));
        assert!(doc.attributes.is_empty());
    }

    #[test]
    fn test_contains_guid() {
        let mut doc = FeedDocument::new("T", "L", "D", "now");
        doc.channel.items.push(Item {
            guid: Some(Guid::new("a")),
            ..Default::default()
        });
        doc.channel.items.push(Item::default());

        assert!(doc.contains_guid("a"));
        assert!(!doc.contains_guid("b"));
        assert!(!doc.contains_guid(""));
    }

    #[test]
    fn test_new_item_builder() {
        let item = NewItem::new("Title", "https://example.com/", "Desc")
            .with_guid("custom-id-1")
            .with_pub_date("Wed, 05 Jun 2024 14:23:01 +0000");

        assert_eq!(item.guid.as_deref(), Some("custom-id-1"));
        assert_eq!(item.pub_date.as_deref(), Some("Wed, 05 Jun 2024 14:23:01 +0000"));
    }
}
