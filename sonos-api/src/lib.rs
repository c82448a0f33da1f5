//! Typed Sonos UPnP operations
//!
//! Each operation is a stateless type implementing [`SonosOperation`];
//! [`SonosClient`] serializes it into a SOAP call through the private
//! `soap-client` crate and parses the response.
//!
//! ```rust,no_run
//! use sonos_api::SonosClient;
//!
//! let client = SonosClient::new();
//! for group in client.zone_groups("192.168.1.100:1400")? {
//!     println!("{} coordinates {} speakers", group.coordinator, group.members.len());
//! }
//! client.pause("192.168.1.100:1400")?;
//! # Ok::<(), sonos_api::ApiError>(())
//! ```

pub mod client;
pub mod error;
pub mod operation;
pub mod service;
pub mod services;

pub use client::SonosClient;
pub use error::{ApiError, Result};
pub use operation::SonosOperation;
pub use service::{Service, ServiceInfo};
pub use services::content_directory::Favorite;
pub use services::zone_group_topology::{ZoneGroup, ZoneGroupMember};
