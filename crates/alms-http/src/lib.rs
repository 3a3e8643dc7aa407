//! # alms-http
//!
//! The request pipeline for the Almoner backend.
//!
//! Every call made by the session manager and the domain stores goes
//! through [`RequestPipeline`], which:
//! - attaches `Authorization: Bearer <token>` from the [`CredentialStore`]
//! - serves repeat GETs from a short-TTL, bounded [`ResponseCache`]
//! - rewrites development media URLs to the public origin ([`MediaRewriter`])
//! - classifies every failure into an [`ErrorRecord`] ([`classify`])
//!
//! [`normalize`] turns the backend's envelope shapes into typed pages and
//! records. [`mock`] provides an in-memory transport for tests.

pub mod base;
pub mod cache;
pub mod classify;
pub mod credentials;
pub mod mock;
pub mod normalize;
pub mod pipeline;
pub mod rewrite;
pub mod transport;

mod error;

pub use base::BaseAddress;
pub use cache::{CachePolicy, ResponseCache};
pub use credentials::CredentialStore;
pub use error::{ErrorKind, ErrorRecord};
pub use normalize::Page;
pub use pipeline::{CacheMode, RequestOptions, RequestPipeline};
pub use rewrite::MediaRewriter;
pub use transport::{Method, ReqwestTransport, Transport, TransportError};
