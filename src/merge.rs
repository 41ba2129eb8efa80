//! Default-filling merge of a server payload over a schema's defaults.
//!
//! Fetch responses may be partial, stale-shaped, or malformed; the merge
//! guarantees the in-memory document is always fully populated. Each
//! recognized scalar takes the server value when present and non-empty,
//! otherwise the default. List records are filled item-by-item and assigned
//! a stable identity when the payload lacks one.

use serde_json::{json, Value};
use tracing::warn;

use crate::path::{get_path, set_path, DotPath};
use crate::schema::{DocumentSchema, FieldKind, FieldSpec, ListSpec};

/// Merge `server` over the schema's default document.
///
/// Never fails: a payload that is not an object (or has wrong-typed fields)
/// degrades to defaults field-by-field with a warning.
pub fn merge_document(schema: &DocumentSchema, server: &Value) -> Value {
    let mut doc = schema.default_document();

    if !server.is_object() {
        warn!(
            schema = %schema.name,
            "server payload is not an object; keeping defaults"
        );
        return doc;
    }

    for field in &schema.fields {
        let path = match DotPath::parse(&field.name) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let incoming = get_path(server, &path);

        let merged = match &field.kind {
            FieldKind::List(spec) => merge_list(schema, field, spec, incoming),
            _ => match incoming {
                Some(v) if scalar_present(field, v) => v.clone(),
                _ => continue,
            },
        };

        // Defaults already occupy the slot, so the shape is container-safe.
        if let Err(e) = set_path(&mut doc, &path, merged) {
            warn!(schema = %schema.name, field = %field.name, error = %e, "merge skipped field");
        }
    }

    doc
}

/// Whether a server scalar should win over the default. Empty strings and
/// nulls count as absent; wrong-typed values are dropped with a warning.
fn scalar_present(field: &FieldSpec, value: &Value) -> bool {
    match (&field.kind, value) {
        (_, Value::Null) => false,
        (FieldKind::Text { .. }, Value::String(s)) => !s.is_empty(),
        (FieldKind::Media, Value::String(s)) => !s.is_empty(),
        (FieldKind::Flag { .. }, Value::Bool(_)) => true,
        (FieldKind::Number { .. }, Value::Number(_)) => true,
        (kind, other) => {
            warn!(field = %field.name, ?kind, ?other, "wrong-typed server value ignored");
            false
        }
    }
}

/// Fill each server record from the item defaults, assigning
/// `{prefix}-{index}` identities where the payload has none. A missing,
/// empty, or malformed server list falls back to the default list.
fn merge_list(
    schema: &DocumentSchema,
    field: &FieldSpec,
    spec: &ListSpec,
    incoming: Option<&Value>,
) -> Value {
    let entries = match incoming.and_then(|v| v.as_array()) {
        Some(arr) if !arr.is_empty() => arr,
        _ => return spec_default(field, spec),
    };

    let mut merged = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            warn!(
                schema = %schema.name,
                field = %field.name,
                index,
                "non-object list entry ignored"
            );
            continue;
        }

        let id = match entry.get("id").and_then(|v| v.as_str()) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("{}-{}", spec.id_prefix, index),
        };
        let mut item = spec.default_item(&id);

        for item_field in &spec.item_fields {
            let item_path = match DotPath::parse(&item_field.name) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if let Some(v) = get_path(entry, &item_path) {
                if scalar_present(item_field, v) {
                    // Slot exists from default_item, cannot mismatch.
                    let _ = set_path(&mut item, &item_path, v.clone());
                }
            }
        }

        if let Some(order) = &spec.order_field {
            let sequence = entry
                .get(order.as_str())
                .and_then(|v| v.as_u64())
                .unwrap_or(index as u64 + 1);
            item[order.as_str()] = json!(sequence);
        }

        merged.push(item);
    }

    if merged.is_empty() {
        return spec_default(field, spec);
    }
    Value::Array(merged)
}

fn spec_default(field: &FieldSpec, spec: &ListSpec) -> Value {
    // Reconstruct the default list the same way default_document does.
    let schema = DocumentSchema::new("one-field", vec![field.clone()]);
    let doc = schema.default_document();
    DotPath::parse(&field.name)
        .ok()
        .and_then(|p| get_path(&doc, &p).cloned())
        .unwrap_or_else(|| Value::Array((0..spec.default_items).map(|_| json!({})).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, PlanLimits};
    use serde_json::json;

    fn metrics_schema() -> DocumentSchema {
        DocumentSchema::new(
            "metrics",
            vec![
                FieldSpec::text("title", "Our numbers").required(),
                FieldSpec::text("accent_color", "#1a73e8"),
                FieldSpec::flag("visible", true),
                FieldSpec::media("background"),
                FieldSpec::list(
                    "metrics",
                    ListSpec::new(
                        "metric",
                        vec![
                            FieldSpec::text("label", "").required(),
                            FieldSpec::number("value", 0.0),
                        ],
                        PlanLimits::new(4, 10),
                    ),
                ),
            ],
        )
    }

    fn assert_fully_populated(schema: &DocumentSchema, doc: &Value) {
        for field in &schema.fields {
            let path = DotPath::parse(&field.name).unwrap();
            let v = get_path(doc, &path).expect("field present");
            assert!(!v.is_null(), "field {} is null", field.name);
        }
    }

    #[test]
    fn test_partial_payload_falls_back_to_defaults() {
        let schema = metrics_schema();
        let merged = merge_document(&schema, &json!({"title": "Impact"}));

        assert_eq!(merged["title"], "Impact");
        assert_eq!(merged["accent_color"], "#1a73e8");
        assert_eq!(merged["visible"], true);
        assert_eq!(merged["background"], "");
        assert_fully_populated(&schema, &merged);
    }

    #[test]
    fn test_empty_strings_and_nulls_do_not_win() {
        let schema = metrics_schema();
        let merged = merge_document(
            &schema,
            &json!({"title": "", "accent_color": null, "visible": false}),
        );

        assert_eq!(merged["title"], "Our numbers");
        assert_eq!(merged["accent_color"], "#1a73e8");
        // false is a real value, not an absence
        assert_eq!(merged["visible"], false);
    }

    #[test]
    fn test_malformed_payload_keeps_defaults() {
        let schema = metrics_schema();
        let merged = merge_document(&schema, &json!("not a document"));
        assert_eq!(merged, schema.default_document());

        let merged = merge_document(&schema, &json!({"title": 17, "visible": "yes"}));
        assert_eq!(merged["title"], "Our numbers");
        assert_eq!(merged["visible"], true);
        assert_fully_populated(&schema, &merged);
    }

    #[test]
    fn test_list_entries_are_filled_and_identified() {
        let schema = metrics_schema();
        let merged = merge_document(
            &schema,
            &json!({"metrics": [
                {"label": "Students", "value": 1200},
                {"id": "metric-kept", "value": 35}
            ]}),
        );

        let items = merged["metrics"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], "metric-0");
        assert_eq!(items[0]["label"], "Students");
        assert_eq!(items[0]["value"], 1200);
        assert_eq!(items[1]["id"], "metric-kept");
        assert_eq!(items[1]["label"], "");
    }

    #[test]
    fn test_empty_or_malformed_list_falls_back() {
        let schema = metrics_schema();

        let merged = merge_document(&schema, &json!({"metrics": []}));
        assert_eq!(merged["metrics"].as_array().unwrap().len(), 1);

        let merged = merge_document(&schema, &json!({"metrics": ["junk", 42]}));
        assert_eq!(merged["metrics"].as_array().unwrap().len(), 1);
        assert_eq!(merged["metrics"][0]["id"], "metric-0");
    }

    #[test]
    fn test_order_field_preserved_or_renumbered() {
        let schema = DocumentSchema::new(
            "tracks",
            vec![FieldSpec::list(
                "tracks",
                ListSpec::new(
                    "track",
                    vec![FieldSpec::text("name", "")],
                    PlanLimits::new(5, 20),
                )
                .with_order_field("order"),
            )],
        );
        let merged = merge_document(
            &schema,
            &json!({"tracks": [
                {"name": "a", "order": 7},
                {"name": "b"}
            ]}),
        );
        assert_eq!(merged["tracks"][0]["order"], 7);
        assert_eq!(merged["tracks"][1]["order"], 2);
    }
}
