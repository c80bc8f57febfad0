//! Structure-preserving patches to SPIDA documents.
//!
//! Every edit targets a leaf by the exact [`DocPath`] captured at extraction
//! time; the applier never relocates a target by key-guessing. The input
//! document is immutable: edits produce a derived copy, so a failed or
//! rejected batch never corrupts the caller's original. Edits in a batch
//! address independent leaves and are all resolved against the original
//! document, so no edit can shift another's address.

use polerec_core::{ApplyMode, DocPath, LengthUnit, PoleSpec};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::PatchError;

/// One accepted correction: an absolute target path and its new leaf value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edit {
    pub target: DocPath,
    pub value: Value,
}

impl Edit {
    /// Build an edit from a record's `raw_ref` plus a field path within it.
    pub fn at(raw_ref: &DocPath, field_path: &DocPath, value: Value) -> Self {
        Edit {
            target: raw_ref.join(field_path),
            value,
        }
    }
}

/// Result of a batch application.
#[derive(Debug)]
pub struct PatchOutcome {
    pub document: Value,
    pub applied: usize,
    /// Edits rejected in partial mode, with the reason each was skipped.
    pub skipped: Vec<(usize, PatchError)>,
}

/// Replace a single leaf, returning the derived document.
pub fn apply_edit(
    document: &Value,
    raw_ref: &DocPath,
    field_path: &DocPath,
    new_value: Value,
) -> Result<Value, PatchError> {
    let outcome = apply_batch(
        document,
        &[Edit::at(raw_ref, field_path, new_value)],
        ApplyMode::Atomic,
    )?;
    Ok(outcome.document)
}

/// Apply an ordered batch of leaf edits.
///
/// `Atomic` validates every edit against the original document first and
/// fails without producing a document; `Partial` skips offending edits and
/// reports them in the outcome.
pub fn apply_batch(
    document: &Value,
    edits: &[Edit],
    mode: ApplyMode,
) -> Result<PatchOutcome, PatchError> {
    if mode == ApplyMode::Atomic {
        for edit in edits {
            check_edit(document, edit)?;
        }
    }

    let mut derived = document.clone();
    let mut applied = 0;
    let mut skipped = Vec::new();
    for (i, edit) in edits.iter().enumerate() {
        match check_edit(document, edit) {
            Ok(()) => {
                // The check resolved the path against the original; the
                // derived copy has identical shape, so this cannot fail.
                if let Some(leaf) = edit.target.resolve_mut(&mut derived) {
                    *leaf = edit.value.clone();
                    applied += 1;
                    debug!(path = %edit.target, "applied edit");
                }
            }
            Err(e) => {
                warn!(path = %edit.target, error = %e, "skipping edit");
                skipped.push((i, e));
            }
        }
    }
    Ok(PatchOutcome {
        document: derived,
        applied,
        skipped,
    })
}

fn check_edit(document: &Value, edit: &Edit) -> Result<(), PatchError> {
    let existing = edit
        .target
        .resolve(document)
        .ok_or_else(|| PatchError::TargetNotFound {
            path: edit.target.clone(),
        })?;
    let expected = value_kind(existing);
    let got = value_kind(&edit.value);
    // A null leaf carries no shape to check against.
    if expected != "null" && expected != got {
        return Err(PatchError::InvalidEditValue {
            path: edit.target.clone(),
            expected,
            got,
        });
    }
    Ok(())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Semantic edit helpers ──

/// Write a pole spec back into a structure's recommended design.
///
/// `unit` selects the document's native length encoding; class and species
/// are written as strings. Applied atomically: either all three leaves
/// change or none do.
pub fn set_pole_spec(
    document: &Value,
    raw_ref: &DocPath,
    spec: &PoleSpec,
    unit: LengthUnit,
) -> Result<Value, PatchError> {
    let length = match unit {
        LengthUnit::Metres => spec.height.as_metres(),
        LengthUnit::Feet => spec.height.as_feet(),
    };
    let pole = DocPath::root().key("recommendedDesign").key("pole");
    let edits = [
        Edit::at(raw_ref, &pole.clone().key("length"), length.into()),
        Edit::at(
            raw_ref,
            &pole.clone().key("class"),
            spec.class_code.clone().into(),
        ),
        Edit::at(raw_ref, &pole.key("species"), spec.species.clone().into()),
    ];
    Ok(apply_batch(document, &edits, ApplyMode::Atomic)?.document)
}

/// Write a loading percent back into the matching analysis-asset entry.
///
/// The stored value is a fraction, so `pct` is divided by 100 on the way in.
pub fn set_loading(
    document: &Value,
    design_name: &str,
    structure_id: &str,
    pct: f64,
) -> Result<Value, PatchError> {
    let assets_path = DocPath::root().key("analysisAssets");
    let not_found = || PatchError::TargetNotFound {
        path: assets_path.clone(),
    };
    let assets = assets_path
        .resolve(document)
        .and_then(Value::as_array)
        .ok_or_else(not_found)?;
    let (asset_idx, asset) = assets
        .iter()
        .enumerate()
        .find(|(_, a)| a.get("designName").and_then(Value::as_str) == Some(design_name))
        .ok_or_else(not_found)?;
    let entry_idx = asset
        .get("structures")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .position(|s| {
            s.get("structureId").and_then(crate::attrs::text).as_deref() == Some(structure_id)
        })
        .ok_or_else(not_found)?;

    let target = assets_path
        .index(asset_idx)
        .key("structures")
        .index(entry_idx)
        .key("actual");
    let edits = [Edit {
        target,
        value: (pct / 100.0).into(),
    }];
    Ok(apply_batch(document, &edits, ApplyMode::Atomic)?.document)
}

/// Add or remove the owner's service-drop attachment on a structure's
/// recommended design.
///
/// Unlike the leaf edits above this inserts or removes an array element, so
/// it must not share a batch with edits addressing the same attachment
/// array.
pub fn set_com_drop(
    document: &Value,
    raw_ref: &DocPath,
    owner: &str,
    want: bool,
) -> Result<Value, PatchError> {
    let atts_path = raw_ref
        .clone()
        .key("recommendedDesign")
        .key("attachments");
    let mut derived = document.clone();
    let atts = atts_path
        .resolve_mut(&mut derived)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| PatchError::TargetNotFound {
            path: atts_path.clone(),
        })?;

    let is_owner_drop = |att: &Value| {
        att.get("owner")
            .and_then(|o| o.get("id"))
            .and_then(Value::as_str)
            .is_some_and(|id| id.eq_ignore_ascii_case(owner))
            && att
                .get("clientItem")
                .and_then(|c| c.get("type"))
                .and_then(Value::as_str)
                .is_some_and(|t| t.to_ascii_lowercase().ends_with("drop"))
    };
    let present = atts.iter().any(is_owner_drop);

    if want && !present {
        atts.push(serde_json::json!({
            "owner": {"industry": "COMMUNICATION", "id": owner},
            "clientItem": {"type": "ServiceDrop"},
            "attachmentHeight": 18.0
        }));
    } else if !want && present {
        atts.retain(|att| !is_owner_drop(att));
    }
    Ok(derived)
}
