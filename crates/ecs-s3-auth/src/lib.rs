//! Request authentication for ECS S3-compatible endpoints.
//!
//! This crate produces the headers that authenticate a request against an ECS
//! object store: the classic Signature Version 2 scheme (HMAC-SHA1 over a
//! canonical string) extended with the vendor `x-emc-*` headers.
//!
//! # Overview
//!
//! - [`sigv2::sign_v2`] is a pure function from (method, URL, headers, keys)
//!   to signed headers. It performs no I/O and keeps no state.
//! - [`RequestAuthority`] owns the endpoint and [`Credentials`], composes
//!   request URLs, injects `x-emc-namespace` and delegates to the signer.
//!
//! # Usage
//!
//! ```rust
//! use ecs_s3_auth::{Credentials, RequestAuthority, Resource};
//! use http::{HeaderMap, Method};
//!
//! let authority = RequestAuthority::new(Credentials::new(
//!     "user1",
//!     "secret",
//!     "ns1",
//!     "https://ecs.example.com:9021",
//! ));
//!
//! let signed = authority
//!     .sign(
//!         &Method::GET,
//!         &Resource::bucket("logs").with_subresource("?lifecycle"),
//!         &HeaderMap::new(),
//!         None,
//!     )
//!     .unwrap();
//! assert_eq!(signed.url, "https://ecs.example.com:9021/logs?lifecycle");
//! assert!(signed.headers.contains_key("authorization"));
//! ```
//!
//! # Modules
//!
//! - [`authority`] - URL composition and per-call namespace handling
//! - [`credentials`] - Credentials and authentication method selection
//! - [`error`] - Signing error types
//! - [`sigv2`] - Signature Version 2 string-to-sign and HMAC-SHA1 signature

pub mod authority;
pub mod credentials;
pub mod error;
pub mod sigv2;

pub use authority::{NAMESPACE_HEADER, RequestAuthority, Resource, SignedRequest};
pub use credentials::{AuthMethod, Credentials};
pub use error::AuthError;
pub use sigv2::sign_v2;
