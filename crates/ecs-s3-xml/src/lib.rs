//! XML layer of the ECS S3 client.
//!
//! Converts between the model types in `ecs-s3-model` and the documents
//! exchanged with the server.
//!
//! # Key components
//!
//! - [`parse_lifecycle`] and [`serialize_lifecycle`] for `?lifecycle` bodies
//! - [`parse_versioning`] and [`to_xml`] for `?versioning` bodies
//! - [`ErrorBody`] for the `<Error>` document sent with failed responses
//!
//! # Conventions
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Lifecycle bodies start with
//!   `<?xml version="1.0" encoding="UTF-8" standalone="yes"?>` and a newline
//! - Timestamps: ISO 8601 format (`2030-01-01T00:00:00.000Z`)

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{S3Deserialize, from_xml, parse_lifecycle, parse_versioning};
pub use error::{ErrorBody, XmlError};
pub use serialize::{
    LIFECYCLE_ROOT, S3_NAMESPACE, S3Serialize, VERSIONING_ROOT, serialize_lifecycle, to_xml,
};
