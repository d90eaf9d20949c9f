//! Plate provider that wraps a PlateService with transparent caching.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{CacheResult, CacheSource, CacheStats, KeyedCache, SnapshotCache};
use crate::error::{require_non_empty, ProviderError};

use super::service::PlateService;
use super::types::{Plate, PlateType, TEST_PLATE_ID};

/// Plate information provider with transparent caching.
///
/// Individual plates go through a bounded keyed cache. The plate-type list
/// is a single snapshot that may be shared with other providers.
///
/// A failing plate service never turns into an error here: callers get the
/// last known data, or `None` when nothing was ever fetched. Only invalid
/// arguments are reported as errors.
pub struct PlateInfoProvider<S> {
  service: Arc<S>,
  plates: KeyedCache<Plate>,
  plate_types: Arc<SnapshotCache<PlateType>>,
}

impl<S: PlateService> PlateInfoProvider<S> {
  pub fn new(
    service: Arc<S>,
    plates: KeyedCache<Plate>,
    plate_types: Arc<SnapshotCache<PlateType>>,
  ) -> Self {
    Self {
      service,
      plates,
      plate_types,
    }
  }

  /// Plate identifier for a raw id. Plates are addressed by the id the
  /// imaging client already holds, so this is the identity.
  pub fn plate_id(&self, requester: &str, raw_id: &str) -> Result<String, ProviderError> {
    require_non_empty("requester", requester)?;
    require_non_empty("plate id", raw_id)?;
    Ok(raw_id.to_string())
  }

  /// Get a plate, or `None` if it is unknown or the service is unreachable
  /// with nothing cached.
  pub async fn plate(&self, requester: &str, plate_id: &str) -> Result<Option<Plate>, ProviderError> {
    match self.lookup_plate(requester, plate_id).await {
      Ok(result) => Ok(result.data),
      Err(ProviderError::RemoteUnavailable { .. }) => {
        debug!(requester, plate_id, "plate unavailable, returning none");
        Ok(None)
      }
      Err(err) => Err(err),
    }
  }

  /// Get a plate along with where it came from. Unlike [`plate`](Self::plate),
  /// a remote failure with nothing cached is returned as an error.
  pub async fn lookup_plate(
    &self,
    requester: &str,
    plate_id: &str,
  ) -> Result<CacheResult<Option<Plate>>, ProviderError> {
    require_non_empty("requester", requester)?;
    require_non_empty("plate id", plate_id)?;

    if plate_id == TEST_PLATE_ID {
      debug!(requester, "serving built-in test plate");
      return Ok(CacheResult::from_network(Some(Plate::test_plate())));
    }

    let service = &self.service;
    self
      .plates
      .lookup(requester, plate_id, || service.fetch_plate(requester, plate_id))
      .await
  }

  /// Get every plate type, or `None` if the list has never been fetched.
  pub async fn plate_types(
    &self,
    requester: &str,
  ) -> Result<Option<Arc<Vec<PlateType>>>, ProviderError> {
    Ok(self.lookup_plate_types(requester).await?.data)
  }

  /// Get the plate-type list along with where it came from.
  pub async fn lookup_plate_types(
    &self,
    requester: &str,
  ) -> Result<CacheResult<Option<Arc<Vec<PlateType>>>>, ProviderError> {
    require_non_empty("requester", requester)?;

    let service = &self.service;
    let result = self
      .plate_types
      .get(|| service.fetch_plate_types(requester))
      .await;
    if result.source == CacheSource::Offline {
      debug!(requester, "plate types served from last snapshot");
    }
    Ok(result)
  }

  /// Find a plate type by id within the plate-type list.
  pub async fn plate_type(
    &self,
    requester: &str,
    type_id: &str,
  ) -> Result<Option<PlateType>, ProviderError> {
    require_non_empty("requester", requester)?;
    require_non_empty("plate type id", type_id)?;

    let types = self.plate_types(requester).await?;
    match find_plate_type(types.as_deref().map(Vec::as_slice), type_id) {
      PlateTypeMatch::Found(plate_type) => Ok(Some(plate_type.clone())),
      PlateTypeMatch::NoList => {
        warn!(requester, type_id, "no plate type list available");
        Ok(None)
      }
      PlateTypeMatch::NotListed { known } => {
        warn!(requester, type_id, known, "plate type not in plate type list");
        Ok(None)
      }
    }
  }

  pub fn plate_stats(&self) -> CacheStats {
    self.plates.stats()
  }

  pub fn plate_type_stats(&self) -> CacheStats {
    self.plate_types.stats()
  }
}

#[derive(Debug, PartialEq, Eq)]
enum PlateTypeMatch<'a> {
  Found(&'a PlateType),
  /// Never fetched, or the service returned an empty list.
  NoList,
  NotListed { known: usize },
}

fn find_plate_type<'a>(types: Option<&'a [PlateType]>, type_id: &str) -> PlateTypeMatch<'a> {
  match types {
    None | Some([]) => PlateTypeMatch::NoList,
    Some(types) => match types.iter().find(|t| t.id == type_id) {
      Some(plate_type) => PlateTypeMatch::Found(plate_type),
      None => PlateTypeMatch::NotListed { known: types.len() },
    },
  }
}
