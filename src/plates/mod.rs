//! Plate domain: types, the remote plate service, and the cached provider.

mod api_types;
#[cfg(test)]
pub(crate) mod mock;
mod provider;
mod service;
mod types;

pub use provider::PlateInfoProvider;
pub use service::{HttpPlateService, PlateService};
pub use types::{Plate, PlateType, TEST_PLATE_ID};
