//! SPIDAcalc exchange extraction.
//!
//! Walks `project.structures[]` in array order, deriving each pole's SCID
//! from its position and capturing the exact array address so accepted edits
//! can be written back to the same structure later. Loading percentages come
//! from the top-level `analysisAssets[]` table, keyed by design name and
//! structure id.

use polerec_core::{
    AttachmentRecord, CompareConfig, DocPath, FeetInches, Loading, PoleRecord, PoleSpec, Scid,
    Source, UnitPolicy,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::attrs::{number, text};
use crate::error::ExtractError;

/// Design-layer keys inside a structure.
pub const RECOMMENDED_LAYER: &str = "recommendedDesign";
pub const MEASURED_LAYER: &str = "measuredDesign";

/// Analysis-asset design names.
pub const MEASURED_DESIGN: &str = "Measured Design";
pub const RECOMMENDED_DESIGN: &str = "Recommended Design";

#[derive(Debug)]
pub struct SpidaExtractor<'a> {
    structures: &'a [Value],
    assets: &'a [Value],
    cfg: &'a CompareConfig,
}

impl<'a> SpidaExtractor<'a> {
    /// Validate the top-level shape and borrow the structure array.
    ///
    /// A document without `project.structures` is malformed and rejected
    /// outright; no partial extraction is attempted.
    pub fn new(doc: &'a Value, cfg: &'a CompareConfig) -> Result<Self, ExtractError> {
        let structures = doc
            .get("project")
            .and_then(|p| p.get("structures"))
            .and_then(Value::as_array)
            .ok_or_else(|| ExtractError::MalformedDocument {
                reason: "project.structures missing or not an array".into(),
            })?;
        // Assets usually sit at the document root; some exports nest them
        // under project.
        let assets = doc
            .get("analysisAssets")
            .or_else(|| doc.get("project").and_then(|p| p.get("analysisAssets")))
            .and_then(Value::as_array)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        Ok(SpidaExtractor {
            structures: structures.as_slice(),
            assets,
            cfg,
        })
    }

    /// One normalized record per structure, in array order.
    pub fn records(&self) -> Vec<PoleRecord> {
        let records: Vec<PoleRecord> = self
            .structures
            .iter()
            .enumerate()
            .map(|(i, s)| self.record(i, s))
            .collect();
        info!(count = records.len(), "extracted SPIDA pole records");
        records
    }

    fn record(&self, index: usize, structure: &Value) -> PoleRecord {
        let scid = Scid::from_index(index);
        let pole_number = match pole_number(structure) {
            Ok(n) => Some(n),
            Err(e) => {
                debug!(scid = %scid, error = %e, "structure has no pole number");
                None
            }
        };
        let native_id = pole_number.clone().unwrap_or_else(|| scid.to_string());
        let design = structure
            .get(RECOMMENDED_LAYER)
            .or_else(|| structure.get(MEASURED_LAYER));

        PoleRecord {
            source: Source::Spida,
            loading: self.loading(&scid, &native_id),
            pole_spec: design.and_then(|d| self.pole_spec(d)),
            com_drops: design.map(|d| self.com_drops(d)).unwrap_or_default(),
            location: location(structure),
            scid: Some(scid),
            pole_number,
            native_id,
            raw_ref: DocPath::root()
                .key("project")
                .key("structures")
                .index(index),
        }
    }

    fn pole_spec(&self, design: &Value) -> Option<PoleSpec> {
        let pole = design.get("pole")?;
        let height = length_to_height(pole.get("length")?, self.cfg.unit_policy)?;
        let class_code = pole.get("class").and_then(text)?;
        let species = pole.get("species").and_then(text)?;
        Some(PoleSpec {
            height,
            class_code,
            species,
        })
    }

    fn loading(&self, scid: &Scid, structure_id: &str) -> Option<Loading> {
        let fetch = |design: &str| match self.asset_actual(design, structure_id) {
            Ok(pct) => Some(pct),
            Err(e) => {
                debug!(scid = %scid, error = %e, "loading unavailable");
                None
            }
        };
        let existing_pct = fetch(MEASURED_DESIGN);
        let final_pct = fetch(RECOMMENDED_DESIGN);
        if existing_pct.is_none() && final_pct.is_none() {
            return None;
        }
        Some(Loading {
            existing_pct,
            final_pct,
        })
    }

    /// The `actual` loading for one pole under one analysis design, as a
    /// 0–100 percent. The stored value is a fraction in [0, 1].
    pub fn asset_actual(
        &self,
        design_name: &str,
        structure_id: &str,
    ) -> Result<f64, ExtractError> {
        let not_found = || ExtractError::AssetNotFound {
            design: design_name.to_string(),
            structure_id: structure_id.to_string(),
        };
        let asset = self
            .assets
            .iter()
            .find(|a| a.get("designName").and_then(Value::as_str) == Some(design_name))
            .ok_or_else(not_found)?;
        let entry = asset
            .get("structures")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|s| s.get("structureId").and_then(text).as_deref() == Some(structure_id))
            .ok_or_else(not_found)?;
        let actual = entry.get("actual").and_then(number).ok_or_else(not_found)?;
        Ok(polerec_core::pct_from_fraction(actual))
    }

    fn com_drops(&self, design: &Value) -> Vec<AttachmentRecord> {
        let mut drops = Vec::new();
        for att in design
            .get("attachments")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let industry = att
                .get("owner")
                .and_then(|o| o.get("industry"))
                .and_then(Value::as_str);
            if industry != Some("COMMUNICATION") {
                continue;
            }
            let Some(owner) = att.get("owner").and_then(|o| o.get("id")).and_then(text) else {
                continue;
            };
            if !owner.eq_ignore_ascii_case(&self.cfg.owner_filter) {
                continue;
            }
            let Some(kind) = att
                .get("clientItem")
                .and_then(|c| c.get("type"))
                .and_then(text)
            else {
                continue;
            };
            if !kind.to_ascii_lowercase().ends_with("drop") {
                continue;
            }
            drops.push(AttachmentRecord {
                kind,
                owner,
                height_ft: att.get("attachmentHeight").and_then(number),
                // SPIDA attachments are single-state: no proposed flag exists
                // at this layer.
                measured: true,
            });
        }
        drops
    }
}

/// Pole number with the `id` → `externalId` fallback chain.
pub fn pole_number(structure: &Value) -> Result<String, ExtractError> {
    for key in ["id", "externalId"] {
        if let Some(v) = structure.get(key).and_then(text) {
            return Ok(v);
        }
    }
    Err(ExtractError::MissingField {
        field: "structure.id / structure.externalId".into(),
    })
}

/// Convert a `length` value to a height.
///
/// Lengths are either bare numbers, interpreted under the configured unit
/// policy, or `{"unit": "METRE", "value": 16.764}` objects whose explicit
/// unit overrides the policy.
pub fn length_to_height(raw: &Value, policy: UnitPolicy) -> Option<FeetInches> {
    if let Some(obj) = raw.as_object() {
        let value = obj.get("value").and_then(number)?;
        let unit = obj.get("unit").and_then(Value::as_str).unwrap_or("");
        return if unit.to_ascii_lowercase().starts_with("met") {
            FeetInches::from_metres(value)
        } else {
            FeetInches::from_feet(value)
        };
    }
    policy.to_height(number(raw)?)
}

/// Structure coordinates, `(lat, lon)`.
///
/// GeoJSON blocks (`geographicCoordinate`, then `mapLocation`) store
/// `[lon, lat]`; flat `latitude`/`longitude` keys are the last resort.
pub fn location(structure: &Value) -> Option<(f64, f64)> {
    for key in ["geographicCoordinate", "mapLocation"] {
        if let Some(coord) = geojson_coords(structure.get(key)) {
            return Some(coord);
        }
    }
    let lat = structure.get("latitude").and_then(number);
    let lon = structure.get("longitude").and_then(number);
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    }
}

fn geojson_coords(block: Option<&Value>) -> Option<(f64, f64)> {
    let coords = block?.get("coordinates")?.as_array()?;
    if coords.len() != 2 {
        return None;
    }
    let lon = number(&coords[0])?;
    let lat = number(&coords[1])?;
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "project": {
                "structures": [
                    {
                        "id": "PL100",
                        "geographicCoordinate": {"coordinates": [-81.1, 35.2]},
                        "recommendedDesign": {
                            "pole": {"length": 15.85, "class": "2", "species": "Southern Pine"},
                            "attachments": [
                                {
                                    "owner": {"industry": "COMMUNICATION", "id": "Charter"},
                                    "clientItem": {"type": "ServiceDrop"},
                                    "attachmentHeight": 18.0
                                },
                                {
                                    "owner": {"industry": "COMMUNICATION", "id": "AT&T"},
                                    "clientItem": {"type": "ServiceDrop"}
                                },
                                {
                                    "owner": {"industry": "POWER", "id": "Charter"},
                                    "clientItem": {"type": "ServiceDrop"}
                                },
                                {
                                    "owner": {"industry": "COMMUNICATION", "id": "Charter"},
                                    "clientItem": {"type": "Bundle"}
                                }
                            ]
                        }
                    },
                    {
                        "externalId": "PL200",
                        "recommendedDesign": {
                            "pole": {"length": {"unit": "METRE", "value": 12.19},
                                     "class": "4", "species": "Western Red Cedar"}
                        }
                    }
                ]
            },
            "analysisAssets": [
                {
                    "designName": "Measured Design",
                    "structures": [
                        {"structureId": "PL100", "actual": 0.9535, "allowable": 1.0}
                    ]
                },
                {
                    "designName": "Recommended Design",
                    "structures": [
                        {"structureId": "PL100", "actual": 0.8012, "allowable": 1.0}
                    ]
                }
            ]
        })
    }

    fn extract(doc: &Value, cfg: &CompareConfig) -> Vec<PoleRecord> {
        SpidaExtractor::new(doc, cfg).unwrap().records()
    }

    #[test]
    fn malformed_document_is_fatal() {
        let cfg = CompareConfig::default();
        let err = SpidaExtractor::new(&json!({"project": {}}), &cfg).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedDocument { .. }));
        let err = SpidaExtractor::new(&json!({"project": {"structures": 7}}), &cfg).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedDocument { .. }));
    }

    #[test]
    fn scids_follow_array_order() {
        let cfg = CompareConfig::default();
        let records = extract(&doc(), &cfg);
        assert_eq!(records[0].scid.as_ref().unwrap().as_str(), "001");
        assert_eq!(records[1].scid.as_ref().unwrap().as_str(), "002");

        // Reversing the array reassigns every SCID.
        let mut reversed = doc();
        reversed["project"]["structures"]
            .as_array_mut()
            .unwrap()
            .reverse();
        let records = extract(&reversed, &cfg);
        assert_eq!(records[0].scid.as_ref().unwrap().as_str(), "001");
        assert_eq!(records[0].pole_number.as_deref(), Some("PL200"));
    }

    #[test]
    fn pole_number_falls_back_to_external_id() {
        let records = extract(&doc(), &CompareConfig::default());
        assert_eq!(records[0].pole_number.as_deref(), Some("PL100"));
        assert_eq!(records[1].pole_number.as_deref(), Some("PL200"));
    }

    #[test]
    fn missing_both_ids_is_not_fatal() {
        let doc = json!({"project": {"structures": [{"recommendedDesign": {}}]}});
        let records = extract(&doc, &CompareConfig::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pole_number, None);
        // native_id falls back to the derived SCID.
        assert_eq!(records[0].native_id, "001");
    }

    #[test]
    fn pole_spec_converts_metres_under_the_heuristic() {
        let records = extract(&doc(), &CompareConfig::default());
        let spec = records[0].pole_spec.as_ref().unwrap();
        assert_eq!(spec.height, FeetInches { feet: 52, inches: 0 });
        assert_eq!(spec.canonical(), "52'-2 Southern Pine");
    }

    #[test]
    fn unit_object_overrides_the_policy() {
        // Even with an explicit-feet policy, the METRE unit object wins.
        let cfg = CompareConfig {
            unit_policy: UnitPolicy::Explicit(polerec_core::LengthUnit::Feet),
            ..CompareConfig::default()
        };
        let records = extract(&doc(), &cfg);
        let spec = records[1].pole_spec.as_ref().unwrap();
        assert_eq!(spec.height, FeetInches { feet: 40, inches: 0 });
    }

    #[test]
    fn loading_fractions_become_percent() {
        let records = extract(&doc(), &CompareConfig::default());
        let loading = records[0].loading.as_ref().unwrap();
        assert_eq!(loading.existing_pct, Some(95.35));
        assert_eq!(loading.final_pct, Some(80.12));
    }

    #[test]
    fn missing_asset_entry_recovers_locally() {
        let records = extract(&doc(), &CompareConfig::default());
        // PL200 has no analysis entries at all.
        assert_eq!(records[1].loading, None);
    }

    #[test]
    fn com_drops_filter_owner_industry_and_type() {
        let records = extract(&doc(), &CompareConfig::default());
        let drops = &records[0].com_drops;
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].owner, "Charter");
        assert_eq!(drops[0].kind, "ServiceDrop");
        assert!(drops[0].measured);
        assert_eq!(drops[0].height_ft, Some(18.0));
    }

    #[test]
    fn owner_filter_is_configurable() {
        let cfg = CompareConfig {
            owner_filter: "at&t".into(),
            ..CompareConfig::default()
        };
        let records = extract(&doc(), &cfg);
        assert_eq!(records[0].com_drops.len(), 1);
        assert_eq!(records[0].com_drops[0].owner, "AT&T");
    }

    #[test]
    fn location_reads_geojson_order() {
        let records = extract(&doc(), &CompareConfig::default());
        // GeoJSON stores [lon, lat]; the record stores (lat, lon).
        assert_eq!(records[0].location, Some((35.2, -81.1)));
        assert_eq!(records[1].location, None);
    }

    #[test]
    fn raw_ref_addresses_the_structure() {
        let d = doc();
        let records = extract(&d, &CompareConfig::default());
        let target = records[1].raw_ref.resolve(&d).unwrap();
        assert_eq!(target.get("externalId"), Some(&json!("PL200")));
    }
}
