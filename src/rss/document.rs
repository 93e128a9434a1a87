//! Feed document storage: XML parsing, serialization, and file I/O.
//!
//! The whole document is parsed into an element tree, mapped onto the
//! typed model, and rebuilt from that model on every save. Elements the
//! model does not interpret are carried through as [`Element`] trees.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::ChannelConfig;
use crate::datetime::now_rfc2822;
use crate::rss::types::{Channel, Element, FeedDocument, Guid, Item, RSS_VERSION};
use crate::{FeedError, Result};

/// Indentation width of the serialized document.
const INDENT_SIZE: usize = 2;

fn xml_error<E: std::fmt::Display>(e: E) -> FeedError {
    FeedError::Xml(e.to_string())
}

/// Parse an RSS document.
///
/// # Errors
///
/// - [`FeedError::Xml`] if the input is not well-formed XML
/// - [`FeedError::Structure`] if the root element is not `<rss>`
pub fn parse(xml: &[u8]) -> Result<FeedDocument> {
    let root = parse_tree(xml)?;
    document_from_tree(root)
}

/// Serialize a document as indented RSS 2.0 with an XML declaration.
pub fn to_xml(doc: &FeedDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", RSS_VERSION));
    for (key, value) in &doc.attributes {
        rss.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(rss)).map_err(xml_error)?;

    write_channel(&mut writer, &doc.channel)?;
    for element in &doc.extensions {
        write_element(&mut writer, element)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(xml_error)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(xml_error)
}

/// Fill in channel metadata missing from a loaded document.
///
/// Returns the names of the elements that were added.
pub fn ensure_channel(doc: &mut FeedDocument, defaults: &ChannelConfig) -> Vec<&'static str> {
    let channel = &mut doc.channel;
    let mut filled = Vec::new();

    if channel.title.is_none() {
        channel.title = Some(defaults.title.clone());
        filled.push("title");
    }
    if channel.link.is_none() {
        channel.link = Some(defaults.link.clone());
        filled.push("link");
    }
    if channel.description.is_none() {
        channel.description = Some(defaults.description.clone());
        filled.push("description");
    }
    if channel.last_build_date.is_none() {
        channel.last_build_date = Some(now_rfc2822());
        filled.push("lastBuildDate");
    }

    if !filled.is_empty() {
        warn!(elements = ?filled, "channel metadata missing, filled with defaults");
    }
    filled
}

/// Load the feed at `path`, or start an empty one if the file does not exist.
///
/// Missing channel metadata in an existing feed is filled from `defaults`.
pub fn load_or_init(path: &Path, defaults: &ChannelConfig) -> Result<FeedDocument> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "feed file not found, starting a new feed");
            return Ok(FeedDocument::new(
                defaults.title.clone(),
                defaults.link.clone(),
                defaults.description.clone(),
                now_rfc2822(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let mut doc = parse(&bytes)?;
    debug!(path = %path.display(), items = doc.items().len(), "loaded feed");
    ensure_channel(&mut doc, defaults);
    Ok(doc)
}

/// Write the document to `path`, replacing any existing file.
///
/// The XML is written to a temporary file in the same directory and then
/// renamed over the target, so readers see either the old or the new feed.
/// An existing file's permissions are kept.
pub fn save(doc: &FeedDocument, path: &Path) -> Result<()> {
    let xml = to_xml(doc)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(xml.as_bytes())?;
    tmp.as_file().sync_all()?;

    match fs::metadata(path) {
        Ok(metadata) => fs::set_permissions(tmp.path(), metadata.permissions())?,
        Err(e) if e.kind() == ErrorKind::NotFound => set_default_permissions(tmp.path())?,
        Err(e) => return Err(e.into()),
    }

    tmp.persist(path).map_err(|e| FeedError::Io(e.error))?;
    debug!(path = %path.display(), bytes = xml.len(), "feed written");
    Ok(())
}

/// New feed files are created world-readable (0644).
#[cfg(unix)]
fn set_default_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn parse_tree(xml: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(xml);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(element_from_start(&e)?),
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| FeedError::Xml("unbalanced end tag".to_string()))?;
                // Whitespace between child elements is indentation; leaf text is kept verbatim.
                if !element.children.is_empty() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&e.unescape().map_err(xml_error)?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FeedError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Xml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| FeedError::Xml("document has no root element".to_string()))
}

fn element_from_start(start: &BytesStart) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(FeedError::Xml(format!(
            "unexpected second root element <{}>",
            element.name
        )));
    }
    Ok(())
}

fn document_from_tree(root: Element) -> Result<FeedDocument> {
    if root.name != "rss" {
        return Err(FeedError::Structure(format!(
            "root element must be <rss>, found <{}>",
            root.name
        )));
    }

    let attributes = root
        .attributes
        .into_iter()
        .filter(|(key, _)| key != "version")
        .collect();

    let mut channel = None;
    let mut extensions = Vec::new();
    for child in root.children {
        if child.name == "channel" && channel.is_none() {
            channel = Some(channel_from_element(child));
        } else {
            extensions.push(child);
        }
    }

    Ok(FeedDocument {
        attributes,
        channel: channel.unwrap_or_default(),
        extensions,
    })
}

fn channel_from_element(element: Element) -> Channel {
    let mut channel = Channel::default();
    for child in element.children {
        match child.name.as_str() {
            "title" if channel.title.is_none() => channel.title = Some(child.text),
            "link" if channel.link.is_none() => channel.link = Some(child.text),
            "description" if channel.description.is_none() => {
                channel.description = Some(child.text)
            }
            "lastBuildDate" if channel.last_build_date.is_none() => {
                channel.last_build_date = Some(child.text)
            }
            "item" => channel.items.push(item_from_element(child)),
            _ => channel.extensions.push(child),
        }
    }
    channel
}

fn item_from_element(element: Element) -> Item {
    let mut item = Item::default();
    for child in element.children {
        match child.name.as_str() {
            "title" if item.title.is_none() => item.title = Some(child.text),
            "link" if item.link.is_none() => item.link = Some(child.text),
            "description" if item.description.is_none() => item.description = Some(child.text),
            "pubDate" if item.pub_date.is_none() => item.pub_date = Some(child.text),
            "guid" if item.guid.is_none() => {
                // RSS 2.0: isPermaLink defaults to true when absent.
                let is_permalink = child
                    .attribute("isPermaLink")
                    .map(|v| !v.trim().eq_ignore_ascii_case("false"))
                    .unwrap_or(true);
                item.guid = Some(Guid {
                    value: child.text,
                    is_permalink,
                });
            }
            _ => item.extensions.push(child),
        }
    }
    item
}

fn write_channel(writer: &mut Writer<Vec<u8>>, channel: &Channel) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(xml_error)?;

    write_optional(writer, "title", channel.title.as_deref())?;
    write_optional(writer, "link", channel.link.as_deref())?;
    write_optional(writer, "description", channel.description.as_deref())?;
    write_optional(writer, "lastBuildDate", channel.last_build_date.as_deref())?;
    for element in &channel.extensions {
        write_element(writer, element)?;
    }
    for item in &channel.items {
        write_item(writer, item)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(xml_error)?;
    Ok(())
}

fn write_item(writer: &mut Writer<Vec<u8>>, item: &Item) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .map_err(xml_error)?;

    write_optional(writer, "title", item.title.as_deref())?;
    write_optional(writer, "link", item.link.as_deref())?;
    write_optional(writer, "description", item.description.as_deref())?;
    write_optional(writer, "pubDate", item.pub_date.as_deref())?;
    if let Some(guid) = &item.guid {
        let mut start = BytesStart::new("guid");
        start.push_attribute(("isPermaLink", if guid.is_permalink { "true" } else { "false" }));
        write_text(writer, start, &guid.value)?;
    }
    for element in &item.extensions {
        write_element(writer, element)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .map_err(xml_error)?;
    Ok(())
}

fn write_optional(writer: &mut Writer<Vec<u8>>, name: &str, text: Option<&str>) -> Result<()> {
    match text {
        Some(text) => write_text(writer, BytesStart::new(name), text),
        None => Ok(()),
    }
}

/// Write `<name attrs>text</name>` on a single line, even when `text` is empty.
fn write_text(writer: &mut Writer<Vec<u8>>, start: BytesStart, text: &str) -> Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer.write_event(Event::End(end)).map_err(xml_error)?;
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        if element.text.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(xml_error);
        }
        return write_text(writer, start, &element.text);
    }

    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(xml_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(end)).map_err(xml_error)?;
    Ok(())
}
