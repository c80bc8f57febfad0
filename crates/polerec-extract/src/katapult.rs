//! Katapult Pro job extraction.
//!
//! Walks `nodes{}` in document order. Pole identity and spec fields hide
//! behind the attribute-wrapper indirection handled by [`crate::attrs`];
//! service drops are separate "Service Location" nodes whose owning pole is
//! found by chasing section ids through `connections{}`.

use std::collections::HashMap;

use polerec_core::{
    parse_feet_inches, round2, AttachmentRecord, CompareConfig, DocPath, FeetInches, Loading,
    PoleRecord, PoleSpec, Scid, Source,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::attrs::{number, Attr};
use crate::error::ExtractError;

const SERVICE_LOCATION: &str = "Service Location";

/// Node types accepted as actual poles; anything else (anchors, references,
/// service locations) never becomes a pole record.
const POLE_NODE_TYPES: &[&str] = &["pole", "Power", "Power Transformer", "Joint", "Joint Transformer"];

/// Katapult drops have no client item; this is the kind their records carry.
const DROP_KIND: &str = "Service Drop";

/// Pole-number candidate keys, first match wins.
const POLE_NUMBER_KEYS: &[&str] = &["PL_number", "PoleNumber"];

#[derive(Debug)]
pub struct KatapultExtractor<'a> {
    nodes: &'a Map<String, Value>,
    connections: Option<&'a Map<String, Value>>,
    cfg: &'a CompareConfig,
}

impl<'a> KatapultExtractor<'a> {
    /// Validate the top-level shape and borrow the node map.
    pub fn new(doc: &'a Value, cfg: &'a CompareConfig) -> Result<Self, ExtractError> {
        let nodes = doc
            .get("nodes")
            .and_then(Value::as_object)
            .ok_or_else(|| ExtractError::MalformedDocument {
                reason: "nodes missing or not an object".into(),
            })?;
        Ok(KatapultExtractor {
            nodes,
            connections: doc.get("connections").and_then(Value::as_object),
            cfg,
        })
    }

    /// One record per main pole (pole-type node with an all-digit SCID), in
    /// document order.
    pub fn records(&self) -> Vec<PoleRecord> {
        let records = self.collect(false);
        info!(count = records.len(), "extracted Katapult pole records");
        records
    }

    /// Like [`records`](Self::records) but including reference-SCID poles
    /// (`"002.A"` style) and poles with no SCID at all.
    pub fn records_with_references(&self) -> Vec<PoleRecord> {
        self.collect(true)
    }

    fn collect(&self, include_references: bool) -> Vec<PoleRecord> {
        let drops = self.drops_by_pole();
        let mut out = Vec::new();
        for (key, node) in self.nodes {
            let Some(attrs) = node.get("attributes") else {
                continue;
            };
            if !is_pole_node(attrs) {
                continue;
            }
            let scid = Attr::of(attrs, "scid").imported_str().map(Scid::new);
            if !include_references && !scid.as_ref().is_some_and(Scid::is_main) {
                continue;
            }
            out.push(self.record(key, attrs, scid, &drops));
        }
        out
    }

    fn record(
        &self,
        key: &str,
        attrs: &Value,
        scid: Option<Scid>,
        drops: &HashMap<String, Vec<AttachmentRecord>>,
    ) -> PoleRecord {
        PoleRecord {
            source: Source::Katapult,
            native_id: key.to_string(),
            scid,
            pole_number: Attr::first_of(attrs, POLE_NUMBER_KEYS).imported_str(),
            location: location(attrs),
            pole_spec: self.pole_spec(attrs),
            loading: loading(attrs),
            com_drops: drops.get(key).cloned().unwrap_or_default(),
            raw_ref: DocPath::root().key("nodes").key(key),
        }
    }

    fn pole_spec(&self, attrs: &Value) -> Option<PoleSpec> {
        let fm = &self.cfg.field_map;
        let height = height_value(Attr::first_of(attrs, &fm.length).imported()?)?;
        let class_code = Attr::first_of(attrs, &fm.class).imported_str()?;
        let species = Attr::first_of(attrs, &fm.species).imported_str()?;
        Some(PoleSpec {
            height,
            class_code,
            species,
        })
    }

    /// Service drops grouped by owning pole node id.
    ///
    /// A drop is a Service Location node; each entry of its
    /// `measured_attachments` names a section id, and the connection holding
    /// that section links the drop node to its pole. `measured == false`
    /// marks a proposed drop, a state the SPIDA side cannot express.
    pub fn drops_by_pole(&self) -> HashMap<String, Vec<AttachmentRecord>> {
        let mut out: HashMap<String, Vec<AttachmentRecord>> = HashMap::new();
        let Some(connections) = self.connections else {
            return out;
        };

        let mut section_conn: HashMap<&str, &Value> = HashMap::new();
        for conn in connections.values() {
            for sid in conn
                .get("sections")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
                .map(|(sid, _)| sid)
            {
                section_conn.insert(sid.as_str(), conn);
            }
        }

        for (node_id, node) in self.nodes {
            let Some(attrs) = node.get("attributes") else {
                continue;
            };
            let node_type = Attr::of(attrs, "node_type").entry("button_added");
            if node_type.and_then(Value::as_str) != Some(SERVICE_LOCATION) {
                continue;
            }
            let owner = Attr::of(attrs, "node_sub_type")
                .imported_str()
                .unwrap_or_default();
            for (sid, measured) in attrs
                .get("measured_attachments")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
            {
                let Some(conn) = section_conn.get(sid.as_str()) else {
                    continue;
                };
                let a = conn.get("node_id_1").and_then(Value::as_str);
                let b = conn.get("node_id_2").and_then(Value::as_str);
                let pole = match (a, b) {
                    (Some(a), Some(b)) => {
                        if a == node_id {
                            b
                        } else {
                            a
                        }
                    }
                    _ => continue,
                };
                out.entry(pole.to_string()).or_default().push(AttachmentRecord {
                    kind: DROP_KIND.to_string(),
                    owner: owner.clone(),
                    height_ft: None,
                    measured: measured.as_bool().unwrap_or(false),
                });
            }
        }
        out
    }
}

/// Node-type gate. Absent node types are kept: older exports omit the
/// attribute on plain poles.
fn is_pole_node(attrs: &Value) -> bool {
    let attr = Attr::of(attrs, "node_type");
    let node_type = attr
        .entry("button_added")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| attr.imported_str());
    match node_type {
        Some(t) => POLE_NODE_TYPES.contains(&t.as_str()),
        None => true,
    }
}

/// Pole heights arrive either as pre-formatted `"50'-2"` strings or as bare
/// numerics in metres.
fn height_value(raw: &Value) -> Option<FeetInches> {
    if let Some(s) = raw.as_str() {
        if let Some(h) = parse_feet_inches(s) {
            return Some(h);
        }
    }
    FeetInches::from_metres(number(raw)?)
}

/// Capacity percentages are already 0–100; they are rounded, never
/// re-multiplied.
fn loading(attrs: &Value) -> Option<Loading> {
    let existing_pct = Attr::of(attrs, "existing_capacity_%")
        .single_number()
        .map(round2);
    let final_pct = Attr::of(attrs, "final_passing_capacity_%")
        .single_number()
        .map(round2);
    if existing_pct.is_none() && final_pct.is_none() {
        return None;
    }
    Some(Loading {
        existing_pct,
        final_pct,
    })
}

fn location(attrs: &Value) -> Option<(f64, f64)> {
    let lat = Attr::of(attrs, "latitude").imported().and_then(number)?;
    let lon = Attr::of(attrs, "longitude").imported().and_then(number)?;
    Some((lat, lon))
}
