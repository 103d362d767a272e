//! XML deserialization: parsing server documents into model types.
//!
//! This module provides the [`S3Deserialize`] trait, the generic [`from_xml`]
//! entry point and [`parse_lifecycle`] for lifecycle configuration bodies.
//!
//! Text is read untrimmed so that values such as prefixes keep their exact
//! bytes. Elements the model does not know about are captured verbatim inside
//! rules and filters rather than dropped, so a rewritten document keeps them.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use ecs_s3_model::{
    Expiration, LifecycleDocument, LifecycleRule, RuleFilter, RuleStatus,
    VersioningConfiguration, VersioningStatus,
};

use crate::error::XmlError;
use crate::serialize::LIFECYCLE_ROOT;

/// Trait for deserializing types from XML.
///
/// Implementors parse XML elements from the reader and populate the struct fields.
/// The root element has already been consumed by the caller; the implementation
/// reads child elements until the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// The reader is positioned just after the opening tag of this element.
    /// The implementation should read all child content and return when
    /// the matching end tag is consumed.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize XML into a typed value.
///
/// Finds the root element and delegates to the type's `S3Deserialize` implementation.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or deserialization fails.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);

    // Skip the XML declaration and find the root element.
    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                let value = T::deserialize_xml(&mut reader)?;
                expect_document_end(&mut reader)?;
                return Ok(value);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            // Skip declaration, comments, processing instructions, whitespace.
            _ => {}
        }
    }
}

/// Parse a lifecycle configuration body.
///
/// An empty (or all-whitespace) body means the bucket has no lifecycle
/// configuration and yields an empty document. Anything else must be a
/// well-formed `<LifecycleConfiguration>` document.
///
/// # Errors
///
/// Returns `XmlError` for malformed XML, a different root element, or
/// unparsable rule values.
///
/// # Examples
///
/// ```
/// use ecs_s3_xml::parse_lifecycle;
///
/// assert!(parse_lifecycle(b"").unwrap().is_empty());
///
/// let doc = parse_lifecycle(
///     br#"<LifecycleConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
///           <Rule><ID>r1</ID><Filter/><Status>Enabled</Status>
///             <Expiration><Days>30</Days></Expiration></Rule>
///         </LifecycleConfiguration>"#,
/// )
/// .unwrap();
/// assert_eq!(doc.rule_ids(), vec!["r1"]);
///
/// assert!(parse_lifecycle(b"<LifecycleConfiguration><Rule>").is_err());
/// assert!(parse_lifecycle(b"<LifecycleConfiguration/><LifecycleConfiguration/>").is_err());
/// ```
pub fn parse_lifecycle(xml: &[u8]) -> Result<LifecycleDocument, XmlError> {
    if xml.iter().all(u8::is_ascii_whitespace) {
        return Ok(LifecycleDocument::new());
    }

    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                expect_root(&e)?;
                let document = LifecycleDocument::deserialize_xml(&mut reader)?;
                expect_document_end(&mut reader)?;
                return Ok(document);
            }
            Event::Empty(e) => {
                expect_root(&e)?;
                expect_document_end(&mut reader)?;
                return Ok(LifecycleDocument::new());
            }
            Event::Eof => {
                return Err(XmlError::MissingElement(LIFECYCLE_ROOT.to_string()));
            }
            _ => {}
        }
    }
}

/// Parse a `?versioning` response body.
///
/// # Errors
///
/// Returns `XmlError` if the body is not well-formed XML.
pub fn parse_versioning(xml: &[u8]) -> Result<VersioningConfiguration, XmlError> {
    if xml.iter().all(u8::is_ascii_whitespace) {
        return Ok(VersioningConfiguration::default());
    }
    from_xml(xml)
}

fn expect_root(start: &BytesStart<'_>) -> Result<(), XmlError> {
    let name = tag_name(start)?;
    if name == LIFECYCLE_ROOT {
        Ok(())
    } else {
        Err(XmlError::UnexpectedElement(name))
    }
}

/// Consume the rest of the input after the root element closed.
///
/// Only whitespace, comments and processing instructions may follow the root.
fn expect_document_end(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    loop {
        match reader.read_event()? {
            Event::Eof => return Ok(()),
            Event::Comment(_) | Event::PI(_) => {}
            Event::Text(e) if e.iter().all(u8::is_ascii_whitespace) => {}
            Event::Start(e) | Event::Empty(e) => {
                return Err(XmlError::UnexpectedElement(format!(
                    "{} after the document root",
                    tag_name(&e)?
                )));
            }
            other => {
                return Err(XmlError::ParseError(format!(
                    "content after the document root: {other:?}"
                )));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions for reading common XML patterns
// ---------------------------------------------------------------------------

/// Local name of an element, without any namespace prefix.
pub(crate) fn tag_name(start: &BytesStart<'_>) -> Result<String, XmlError> {
    let local = start.local_name();
    std::str::from_utf8(local.as_ref())
        .map(str::to_owned)
        .map_err(|e| XmlError::ParseError(e.to_string()))
}

/// Read the text content of the current element and consume its end tag.
///
/// Expects the reader to be positioned right after a `Start` event. Reads
/// the text content, resolving entity references, and consumes through the
/// matching `End` event.
pub(crate) fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::GeneralRef(e) => {
                let name = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let char_ref = e
                    .resolve_char_ref()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                if let Some(ch) = char_ref {
                    text.push(ch);
                } else if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(&name)
                {
                    text.push_str(resolved);
                } else {
                    return Err(XmlError::ParseError(format!("unknown entity: &{name};")));
                }
            }
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
pub(crate) fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Re-emit an element and all its children as an XML string.
///
/// `start` is the already consumed opening tag; the reader is left just past
/// the matching end tag.
fn capture_element(reader: &mut Reader<&[u8]>, start: BytesStart<'_>) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(start))?;

    let mut depth: u32 = 1;
    while depth > 0 {
        let event = reader.read_event()?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while capturing element".to_string(),
                ));
            }
            _ => {}
        }
        writer.write_event(event)?;
    }

    into_string(writer.into_inner())
}

/// Re-emit a self-closing element as an XML string.
fn capture_empty(start: BytesStart<'_>) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Empty(start))?;
    into_string(writer.into_inner())
}

fn into_string(bytes: Vec<u8>) -> Result<String, XmlError> {
    String::from_utf8(bytes).map_err(|e| XmlError::ParseError(e.to_string()))
}

/// Parse a boolean from XML text (`true`/`false`, any case).
fn parse_bool(s: &str) -> Result<bool, XmlError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(XmlError::ParseError(format!("invalid boolean: {s}")))
    }
}

/// Parse a day count from XML text.
fn parse_days(s: &str) -> Result<u32, XmlError> {
    s.trim()
        .parse::<u32>()
        .map_err(|e| XmlError::ParseError(format!("invalid day count '{s}': {e}")))
}

/// Parse an ISO 8601 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, XmlError> {
    let s = s.trim();
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .or_else(|_| {
            // S3 format without offset: 2006-02-03T16:45:09.000Z
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
                .map(|ndt| ndt.and_utc())
        })
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        })
        .map_err(|e| XmlError::ParseError(format!("invalid timestamp '{s}': {e}")))
}

/// Deserialize a list of elements with the given tag name, skipping others.
fn deserialize_list<T: S3Deserialize>(
    reader: &mut Reader<&[u8]>,
    item_tag: &str,
) -> Result<Vec<T>, XmlError> {
    let mut items = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if tag_name(&e)? == item_tag {
                    items.push(T::deserialize_xml(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF in list".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(items)
}

// ---------------------------------------------------------------------------
// S3Deserialize implementations
// ---------------------------------------------------------------------------

/// Reads the `<Expiration>` element and collapses it to a single form.
///
/// Delete marker wins over days, days over date. Children other than those
/// three are returned verbatim.
fn read_expiration(
    reader: &mut Reader<&[u8]>,
) -> Result<(Option<Expiration>, Vec<String>), XmlError> {
    let mut date = None;
    let mut days = None;
    let mut expired_object_delete_marker = false;
    let mut preserved = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match tag_name(&e)?.as_str() {
                "Date" => {
                    let text = read_text_content(reader)?;
                    date = Some(parse_timestamp(&text)?);
                }
                "Days" => {
                    let text = read_text_content(reader)?;
                    days = Some(parse_days(&text)?);
                }
                "ExpiredObjectDeleteMarker" => {
                    let text = read_text_content(reader)?;
                    expired_object_delete_marker = parse_bool(&text)?;
                }
                _ => preserved.push(capture_element(reader, e)?),
            },
            Event::Empty(e) => match tag_name(&e)?.as_str() {
                "Date" | "Days" | "ExpiredObjectDeleteMarker" => {}
                _ => preserved.push(capture_empty(e)?),
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF in Expiration".to_string(),
                ));
            }
            _ => {}
        }
    }

    let expiration = Expiration::from_parts(days, date, expired_object_delete_marker);
    Ok((expiration, preserved))
}

/// Parse a rule status. Values are case-sensitive, as the server writes them.
fn parse_status(s: &str) -> Result<RuleStatus, XmlError> {
    s.trim()
        .parse()
        .map_err(|e: ecs_s3_model::ParseEnumError| XmlError::ParseError(e.to_string()))
}

impl S3Deserialize for RuleFilter {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut filter = RuleFilter::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => match tag_name(&e)?.as_str() {
                    "Prefix" => filter.prefix = Some(read_text_content(reader)?),
                    _ => filter
                        .preserved_elements
                        .push(capture_element(reader, e)?),
                },
                Event::Empty(e) => {
                    if tag_name(&e)? != "Prefix" {
                        filter.preserved_elements.push(capture_empty(e)?);
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Filter".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(filter)
    }
}

impl S3Deserialize for LifecycleRule {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut rule = LifecycleRule {
            status: RuleStatus::Disabled,
            ..LifecycleRule::default()
        };
        let mut legacy_prefix = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match tag_name(&e)?.as_str() {
                    "ID" => rule.id = read_text_content(reader)?,
                    // Pre-Filter schema: the prefix sits directly under <Rule>.
                    "Prefix" => legacy_prefix = Some(read_text_content(reader)?),
                    "Filter" => rule.filter = RuleFilter::deserialize_xml(reader)?,
                    "Status" => rule.status = parse_status(&read_text_content(reader)?)?,
                    "Expiration" => {
                        let (expiration, preserved) = read_expiration(reader)?;
                        rule.expiration = expiration;
                        rule.expiration_preserved_elements = preserved;
                    }
                    _ => rule.preserved_elements.push(capture_element(reader, e)?),
                },
                Event::Empty(e) => match tag_name(&e)?.as_str() {
                    "ID" | "Prefix" | "Filter" | "Status" | "Expiration" => {}
                    _ => rule.preserved_elements.push(capture_empty(e)?),
                },
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Rule".to_string(),
                    ));
                }
                _ => {}
            }
        }

        if rule.filter.prefix.is_none() {
            rule.filter.prefix = legacy_prefix;
        }

        Ok(rule)
    }
}

impl S3Deserialize for LifecycleDocument {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let rules = deserialize_list(reader, "Rule")?;
        Ok(LifecycleDocument::from_rules(rules))
    }
}

impl S3Deserialize for VersioningConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut status = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match tag_name(&e)?.as_str() {
                    "Status" => {
                        let text = read_text_content(reader)?;
                        status = match text.trim() {
                            "Enabled" => Some(VersioningStatus::Enabled),
                            "Suspended" => Some(VersioningStatus::Suspended),
                            _ => None,
                        };
                    }
                    _ => skip_element(reader)?,
                },
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in VersioningConfiguration".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(VersioningConfiguration { status })
    }
}
