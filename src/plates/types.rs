use chrono::{DateTime, Utc};
use serde::Serialize;

/// Reserved plate identifier for diagnostics and test harnesses.
///
/// Lookups with this id never reach the cache or the remote service.
pub const TEST_PLATE_ID: &str = "TEST-PLATE";

/// Plate known to the imaging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plate {
  pub id: String,
  pub barcode: String,
  pub plate_type_id: String,
  pub experiment: Option<String>,
  pub project: Option<String>,
  pub owner: Option<String>,
  pub plate_number: Option<u32>,
  pub date_dispensed: Option<DateTime<Utc>>,
}

impl Plate {
  /// Built-in plate returned for [`TEST_PLATE_ID`].
  pub fn test_plate() -> Self {
    Self {
      id: TEST_PLATE_ID.to_string(),
      barcode: TEST_PLATE_ID.to_string(),
      plate_type_id: "1".to_string(),
      experiment: Some("Diagnostics".to_string()),
      project: Some("Diagnostics".to_string()),
      owner: None,
      plate_number: Some(1),
      date_dispensed: None,
    }
  }
}

/// Plate layout definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateType {
  pub id: String,
  pub name: String,
  pub rows: u32,
  pub columns: u32,
  pub drops_per_well: u32,
}
