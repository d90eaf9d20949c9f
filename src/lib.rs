//! Caching plate-information provider for lab imaging clients.
//!
//! Plate and plate-type lookups go to a slow, sometimes unreachable plate
//! service. [`PlateInfoProvider`] puts two in-memory caches in front of it:
//! a bounded per-plate cache and a shared plate-type snapshot. Both collapse
//! concurrent refreshes into one remote call and keep serving the last known
//! data when the service fails.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod plates;

pub use error::{ProviderError, RemoteError};
pub use plates::{HttpPlateService, Plate, PlateInfoProvider, PlateService, PlateType, TEST_PLATE_ID};
