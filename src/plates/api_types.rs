//! Serde-deserializable types matching plate service responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{Plate, PlateType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlate {
  pub id: String,
  #[serde(default)]
  pub barcode: Option<String>,
  pub plate_type_id: String,
  pub experiment_name: Option<String>,
  pub project_name: Option<String>,
  pub user_name: Option<String>,
  pub plate_number: Option<u32>,
  pub date_dispensed: Option<DateTime<Utc>>,
}

impl From<ApiPlate> for Plate {
  fn from(api: ApiPlate) -> Self {
    Self {
      // Plates without a printed barcode are addressed by id.
      barcode: api.barcode.unwrap_or_else(|| api.id.clone()),
      id: api.id,
      plate_type_id: api.plate_type_id,
      experiment: api.experiment_name,
      project: api.project_name,
      owner: api.user_name,
      plate_number: api.plate_number,
      date_dispensed: api.date_dispensed,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlateType {
  pub id: String,
  pub name: String,
  pub num_rows: u32,
  pub num_columns: u32,
  #[serde(default = "default_drops")]
  pub num_drops: u32,
}

fn default_drops() -> u32 {
  1
}

impl From<ApiPlateType> for PlateType {
  fn from(api: ApiPlateType) -> Self {
    Self {
      id: api.id,
      name: api.name,
      rows: api.num_rows,
      columns: api.num_columns,
      drops_per_well: api.num_drops,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlateTypesResponse {
  #[serde(default)]
  pub plate_types: Vec<ApiPlateType>,
}
