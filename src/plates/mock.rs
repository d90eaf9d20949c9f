//! In-memory plate service for tests, with call counters and scripted failures.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::service::PlateService;
use super::types::{Plate, PlateType};
use crate::error::RemoteError;

#[derive(Default)]
pub struct MockPlateService {
  plates: Mutex<HashMap<String, Plate>>,
  plate_types: Mutex<Vec<PlateType>>,
  failing: AtomicBool,
  delay: Option<Duration>,
  plate_calls: AtomicUsize,
  plate_type_calls: AtomicUsize,
}

impl MockPlateService {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every fetch sleeps this long before answering.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn with_plate(self, plate: Plate) -> Self {
    self.plates.lock().insert(plate.id.clone(), plate);
    self
  }

  pub fn with_plate_types(self, types: Vec<PlateType>) -> Self {
    *self.plate_types.lock() = types;
    self
  }

  pub fn set_plate_types(&self, types: Vec<PlateType>) {
    *self.plate_types.lock() = types;
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn plate_calls(&self) -> usize {
    self.plate_calls.load(Ordering::SeqCst)
  }

  pub fn plate_type_calls(&self) -> usize {
    self.plate_type_calls.load(Ordering::SeqCst)
  }

  async fn respond(&self) -> Result<(), RemoteError> {
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if self.failing.load(Ordering::SeqCst) {
      return Err(RemoteError::Transport("mock service offline".into()));
    }
    Ok(())
  }
}

impl PlateService for MockPlateService {
  async fn fetch_plate(&self, _requester: &str, plate_id: &str) -> Result<Option<Plate>, RemoteError> {
    self.plate_calls.fetch_add(1, Ordering::SeqCst);
    self.respond().await?;
    Ok(self.plates.lock().get(plate_id).cloned())
  }

  async fn fetch_plate_types(&self, _requester: &str) -> Result<Vec<PlateType>, RemoteError> {
    self.plate_type_calls.fetch_add(1, Ordering::SeqCst);
    self.respond().await?;
    Ok(self.plate_types.lock().clone())
  }
}

pub fn plate(id: &str, plate_type_id: &str) -> Plate {
  Plate {
    id: id.to_string(),
    barcode: format!("BC-{}", id),
    plate_type_id: plate_type_id.to_string(),
    experiment: Some("Lysozyme screen".to_string()),
    project: Some("Crystallography".to_string()),
    owner: Some("imager".to_string()),
    plate_number: Some(1),
    date_dispensed: None,
  }
}

pub fn plate_type(id: &str, name: &str) -> PlateType {
  PlateType {
    id: id.to_string(),
    name: name.to_string(),
    rows: 8,
    columns: 12,
    drops_per_well: 3,
  }
}
