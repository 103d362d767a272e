//! XML serialization: converting model types to the documents the server accepts.
//!
//! This module provides the [`S3Serialize`] trait, the generic [`to_xml`] entry
//! point and [`serialize_lifecycle`] for lifecycle configuration bodies:
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`
//! - Timestamps: ISO 8601 with milliseconds (`2030-01-01T00:00:00.000Z`), or
//!   nanoseconds when the value has sub-millisecond precision

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use ecs_s3_model::{
    Expiration, LifecycleDocument, LifecycleRule, RuleFilter, VersioningConfiguration,
};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Root element of a lifecycle configuration document.
pub const LIFECYCLE_ROOT: &str = "LifecycleConfiguration";

/// Root element of a versioning configuration document.
pub const VERSIONING_ROOT: &str = "VersioningConfiguration";

/// Trait for serializing types to XML.
///
/// Implementors write their content as child elements inside the current XML context.
/// The root element name and namespace are handled by the top-level [`to_xml`] function.
///
/// Uses `io::Result` because `quick_xml::Writer` closures require `io::Result<()>`.
pub trait S3Serialize {
    /// Serialize this value as XML child elements into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a namespaced XML document with a plain declaration.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Serialize a lifecycle document into the body of `PUT /{bucket}?lifecycle`.
///
/// The output starts with a standalone declaration and a newline, followed by
/// the compact document. Rules keep their order; elements captured at parse
/// time are written back verbatim after the modeled fields.
///
/// # Errors
///
/// Returns `XmlError` if writing fails.
///
/// # Examples
///
/// ```
/// use ecs_s3_model::{Expiration, LifecycleDocument, LifecycleRule};
/// use ecs_s3_xml::serialize_lifecycle;
///
/// let doc = LifecycleDocument::from_rules(vec![LifecycleRule::new("r1", Expiration::Days(7))]);
/// let body = String::from_utf8(serialize_lifecycle(&doc).unwrap()).unwrap();
/// assert!(body.contains("<Rule><ID>r1</ID><Filter/><Status>Enabled</Status>"));
/// ```
pub fn serialize_lifecycle(document: &LifecycleDocument) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new(
        "1.0",
        Some("UTF-8"),
        Some("yes"),
    )))?;
    writer.get_mut().write_all(b"\n")?;

    writer
        .create_element(LIFECYCLE_ROOT)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| document.serialize_xml(w))?;

    Ok(buf)
}

// ---------------------------------------------------------------------------
// Helper functions for writing common XML patterns
// ---------------------------------------------------------------------------

/// Write a simple `<tag>text</tag>` element.
fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Write `<tag>text</tag>` only if the value is `Some`.
fn write_optional_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text_element(writer, tag, v)?;
    }
    Ok(())
}

/// Write previously captured elements as-is.
fn write_raw_elements<W: Write>(writer: &mut Writer<W>, elements: &[String]) -> io::Result<()> {
    for raw in elements {
        writer.get_mut().write_all(raw.as_bytes())?;
    }
    Ok(())
}

/// Format a `DateTime<Utc>` as ISO 8601 with a `Z` suffix.
///
/// Milliseconds are always written; nanoseconds only when they are needed to
/// keep the value exact.
fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    if dt.timestamp_subsec_nanos() % 1_000_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string()
    }
}

// ---------------------------------------------------------------------------
// S3Serialize implementations
// ---------------------------------------------------------------------------

/// Writes the action element inside `<Expiration>`.
impl S3Serialize for Expiration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        match self {
            Self::Days(days) => write_text_element(writer, "Days", &days.to_string()),
            Self::Date(date) => write_text_element(writer, "Date", &format_timestamp(date)),
            Self::ExpiredObjectDeleteMarker => {
                write_text_element(writer, "ExpiredObjectDeleteMarker", "true")
            }
        }
    }
}

impl S3Serialize for RuleFilter {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        if self.is_empty() {
            writer.create_element("Filter").write_empty()?;
            return Ok(());
        }
        writer.create_element("Filter").write_inner_content(|w| {
            write_optional_text(w, "Prefix", self.prefix.as_deref())?;
            write_raw_elements(w, &self.preserved_elements)
        })?;
        Ok(())
    }
}

impl S3Serialize for LifecycleRule {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Rule").write_inner_content(|w| {
            write_text_element(w, "ID", &self.id)?;
            self.filter.serialize_xml(w)?;
            write_text_element(w, "Status", self.status.as_str())?;
            if self.expiration.is_some() || !self.expiration_preserved_elements.is_empty() {
                w.create_element("Expiration").write_inner_content(|w| {
                    if let Some(expiration) = &self.expiration {
                        expiration.serialize_xml(w)?;
                    }
                    write_raw_elements(w, &self.expiration_preserved_elements)
                })?;
            }
            write_raw_elements(w, &self.preserved_elements)
        })?;
        Ok(())
    }
}

impl S3Serialize for LifecycleDocument {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        for rule in self.rules() {
            rule.serialize_xml(writer)?;
        }
        Ok(())
    }
}

impl S3Serialize for VersioningConfiguration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional_text(writer, "Status", self.status.as_ref().map(|s| s.as_str()))
    }
}
