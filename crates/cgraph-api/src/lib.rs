//! MediaWiki Action API and Wikibase API client for commonsgraph.
//!
//! Provides the adapters behind the core list, entity and label ports:
//!
//! - [`CategoryMembersSource`]: files in a category
//! - [`DepictsSearchSource`]: files whose structured data depicts an entity
//! - [`DefaultApiClient`]: batch entity resolution and label lookup
//!
//! All requests go through a retrying HTTP backend; continuation is carried
//! as the API's own `continue` object inside a
//! [`ContinuationToken`](cgraph_core::ContinuationToken).
#![deny(unsafe_code)]
// The generic backend parameter is an implementation detail; consumers use
// `DefaultApiClient` and the core port traits.
#![allow(private_interfaces, private_bounds)]

mod client;
mod config;
mod error;
mod http;
mod models;
mod parsing;
mod port;
mod sources;
mod url;

// ============================================================================
// Public API
// ============================================================================

// Client
pub use client::{ApiClient, DefaultApiClient};

// Configuration
pub use config::ApiClientConfig;

// List sources
pub use sources::{CategoryMembersSource, DepictsSearchSource};
