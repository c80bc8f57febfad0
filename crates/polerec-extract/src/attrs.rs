//! Typed access to Katapult's attribute-wrapper maps.
//!
//! Every Katapult attribute value is wrapped one level deep: either
//! `{"-Imported": value}` for field-collected data or `{<attributeId>: value}`
//! under an opaque generated key. [`Attr`] expresses the intent of each read
//! (imported value, single wrapped value, candidate-key chain) instead of raw
//! nested-map indexing.
//!
//! The scalar coercers at the bottom are shared with the SPIDA extractor:
//! both schemas occasionally store numbers as strings and vice versa.

use serde_json::Value;

/// One attribute slot of a Katapult node.
pub struct Attr<'a> {
    value: Option<&'a Value>,
}

impl<'a> Attr<'a> {
    pub fn of(attributes: &'a Value, key: &str) -> Self {
        Attr {
            value: attributes.get(key),
        }
    }

    /// The first key of `keys` that is present wins.
    pub fn first_of<K: AsRef<str>>(attributes: &'a Value, keys: &[K]) -> Self {
        Attr {
            value: keys.iter().find_map(|k| attributes.get(k.as_ref())),
        }
    }

    /// Unwrap one level of attribute indirection, preferring the
    /// `"-Imported"` entry and falling back to the first value. A bare
    /// scalar (no wrapper map) is returned as-is.
    pub fn imported(&self) -> Option<&'a Value> {
        let value = self.value?;
        match value.as_object() {
            Some(map) => map.get("-Imported").or_else(|| map.values().next()),
            None => Some(value),
        }
    }

    /// The single entry of a `{<attributeId>: value}` wrapper, used by the
    /// capacity attributes. A bare scalar is returned as-is.
    pub fn single_value(&self) -> Option<&'a Value> {
        let value = self.value?;
        match value.as_object() {
            Some(map) => map.values().next(),
            None => Some(value),
        }
    }

    /// A named entry of the wrapper map, e.g. `node_type["button_added"]`.
    pub fn entry(&self, key: &str) -> Option<&'a Value> {
        self.value?.as_object()?.get(key)
    }

    pub fn imported_str(&self) -> Option<String> {
        text(self.imported()?)
    }

    pub fn single_number(&self) -> Option<f64> {
        number(self.single_value()?)
    }
}

/// Trimmed string form of a scalar value; numbers are rendered, empty
/// strings collapse to `None`.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric form of a scalar value; strings are parsed after trimming
/// whitespace and a trailing percent sign.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn imported_prefers_the_imported_key() {
        let attrs = json!({
            "PL_number": {"-Imported": "PL100", "app_added": "WRONG"}
        });
        let got = Attr::of(&attrs, "PL_number").imported_str();
        assert_eq!(got.as_deref(), Some("PL100"));
    }

    #[test]
    fn imported_falls_back_to_first_value() {
        let attrs = json!({"scid": {"-abc123": "002"}});
        assert_eq!(
            Attr::of(&attrs, "scid").imported_str().as_deref(),
            Some("002")
        );
    }

    #[test]
    fn bare_scalar_passes_through() {
        let attrs = json!({"node_type": "pole"});
        assert_eq!(
            Attr::of(&attrs, "node_type").imported_str().as_deref(),
            Some("pole")
        );
    }

    #[test]
    fn single_value_takes_the_one_entry() {
        let attrs = json!({"existing_capacity_%": {"-Oabc": 72.5}});
        assert_eq!(
            Attr::of(&attrs, "existing_capacity_%").single_number(),
            Some(72.5)
        );
    }

    #[test]
    fn first_of_chains_candidate_keys() {
        let attrs = json!({"PoleNumber": {"-Imported": "PL200"}});
        let got = Attr::first_of(&attrs, &["PL_number", "PoleNumber"]).imported_str();
        assert_eq!(got.as_deref(), Some("PL200"));
    }

    #[test]
    fn first_of_respects_order() {
        let attrs = json!({
            "PL_number": {"-Imported": "PL1"},
            "PoleNumber": {"-Imported": "PL2"}
        });
        let got = Attr::first_of(&attrs, &["PL_number", "PoleNumber"]).imported_str();
        assert_eq!(got.as_deref(), Some("PL1"));
    }

    #[test]
    fn entry_reads_named_wrapper_keys() {
        let attrs = json!({"node_type": {"button_added": "Service Location"}});
        assert_eq!(
            Attr::of(&attrs, "node_type").entry("button_added"),
            Some(&json!("Service Location"))
        );
    }

    #[test]
    fn absent_attribute_is_none() {
        let attrs = json!({});
        assert_eq!(Attr::of(&attrs, "scid").imported(), None);
        assert_eq!(Attr::of(&attrs, "scid").single_value(), None);
    }

    #[test]
    fn number_coerces_percent_strings() {
        assert_eq!(number(&json!("95.35%")), Some(95.35));
        assert_eq!(number(&json!(" 72.5 ")), Some(72.5));
        assert_eq!(number(&json!(72.5)), Some(72.5));
        assert_eq!(number(&json!("n/a")), None);
    }

    #[test]
    fn text_renders_numbers_and_trims() {
        assert_eq!(text(&json!("  PL100 ")).as_deref(), Some("PL100"));
        assert_eq!(text(&json!(302)).as_deref(), Some("302"));
        assert_eq!(text(&json!("")), None);
        assert_eq!(text(&json!(null)), None);
    }
}
