//! XML error types and server error bodies.
//!
//! This module provides [`XmlError`] for serialization/deserialization failures
//! and [`ErrorBody`], the parsed form of the `<Error>` document the server
//! returns alongside non-2xx responses.

use std::io;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::deserialize::{S3Deserialize, from_xml, read_text_content, skip_element, tag_name};

/// Errors that can occur during XML serialization or deserialization.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

/// A server error document.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>NoSuchBucket</Code>
///   <Message>The specified bucket does not exist</Message>
///   <Resource>/mybucket</Resource>
///   <RequestId>0af9f5a8:17f3a3c1c2d:1e3c:4</RequestId>
/// </Error>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Resource the error refers to.
    pub resource: Option<String>,
    /// Server request id, useful when reporting problems to the operator.
    pub request_id: Option<String>,
}

impl ErrorBody {
    /// Parse an error document, returning `None` for empty or non-`<Error>` bodies.
    #[must_use]
    pub fn parse(body: &[u8]) -> Option<Self> {
        let parsed: Self = from_xml(body).ok()?;
        if parsed.code.is_empty() {
            None
        } else {
            Some(parsed)
        }
    }
}

impl S3Deserialize for ErrorBody {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut body = ErrorBody::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => match tag_name(&e)?.as_str() {
                    "Code" => body.code = read_text_content(reader)?,
                    "Message" => body.message = read_text_content(reader)?,
                    "Resource" => body.resource = Some(read_text_content(reader)?),
                    "RequestId" => body.request_id = Some(read_text_content(reader)?),
                    _ => skip_element(reader)?,
                },
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Error".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(body)
    }
}
