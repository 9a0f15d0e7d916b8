//! Client-side library to interact with the Roblox Open Cloud DataStore API.
//!
//! Standard datastores are key-value collections that live inside a universe. This crate provides a
//! thin client ([`client::OpenCloudClient`]) that signs requests with an Open Cloud API key and maps
//! responses into typed records.
//!
//! Learn more [here](https://create.roblox.com/docs/cloud/open-cloud/data-store-api-handling).

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(missing_docs)]

// Crate re-exports
pub use reqwest;

/// Implements a thin-client ([`client::OpenCloudClient`]) to access the Open Cloud DataStore API.
pub mod client;

/// Holds the configuration ([`config::ClientConfig`]) read by every outbound request.
pub mod config;

/// Implements the error types ([`error::OpenCloudError`], [`error::ValidationError`]) returned on
/// interacting with [`client::OpenCloudClient`].
pub mod error;

/// Header names and header construction shared by all requests.
pub mod headers;

/// Implements the request helper ([`http::HttpClient`]) that issues and classifies requests.
pub mod http;

/// Contains request/response types of the DataStore API.
pub mod types;
