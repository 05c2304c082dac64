//! Response normalisation: unwrap the occasional schema-echo envelope.
//!
//! Models sometimes echo the declared schema wrapper instead of instance
//! data, returning `{"properties": {"description": …, …}}` rather than the
//! flat object. The decode is therefore two-stage: a response that already
//! has the expected top-level shape passes through untouched; a response
//! whose `properties` sub-object carries *every* field the active variant
//! requires is rebuilt into the flat shape, coercing each field to its
//! declared primitive type by construction. Anything else also passes
//! through — the validator owns the shape-failure verdict.
//!
//! Every function here is pure (`Value` in, `Value` out, no I/O), mirroring
//! how the deterministic cleanup rules elsewhere in this codebase are kept
//! independently testable.

use crate::schema::SchemaDescriptor;
use serde_json::{Map, Value};

/// Expected primitive type of a schema field, used only when rebuilding an
/// enveloped response.
#[derive(Clone, Copy)]
enum Kind {
    Bool,
    Str,
    Num,
    Items,
}

fn expected_kind(field: &str) -> Kind {
    match field {
        "isInvoice" | "hourly" => Kind::Bool,
        "payRateInSubunits" => Kind::Num,
        "lineItems" => Kind::Items,
        _ => Kind::Str,
    }
}

/// Normalise a raw model response against the active schema variant.
pub fn normalize(raw: Value, descriptor: &SchemaDescriptor) -> Value {
    let Some(envelope) = schema_echo_envelope(&raw, descriptor) else {
        return raw;
    };

    let mut flat = Map::new();
    for &field in descriptor.required_fields() {
        // Presence was verified by schema_echo_envelope.
        let value = envelope.get(field).cloned().unwrap_or(Value::Null);
        flat.insert(field.to_string(), coerce(value, expected_kind(field)));
    }
    Value::Object(flat)
}

/// Return the `properties` sub-object when `raw` looks like a schema echo:
/// a top-level `properties` object containing every required field.
fn schema_echo_envelope<'a>(
    raw: &'a Value,
    descriptor: &SchemaDescriptor,
) -> Option<&'a Map<String, Value>> {
    let envelope = raw.as_object()?.get("properties")?.as_object()?;
    descriptor
        .required_fields()
        .iter()
        .all(|f| envelope.contains_key(*f))
        .then_some(envelope)
}

fn coerce(value: Value, kind: Kind) -> Value {
    match kind {
        Kind::Bool => Value::Bool(truthy(&value)),
        Kind::Str => coerce_string(value),
        Kind::Num => coerce_number(value),
        Kind::Items => coerce_items(value),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn coerce_string(value: Value) -> Value {
    match value {
        Value::String(_) => value,
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        // Null and structured values have no sensible string form; leave the
        // field effectively unset so validation reports it.
        _ => Value::Null,
    }
}

fn coerce_number(value: Value) -> Value {
    match value {
        Value::Number(_) => value,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Err(_) => Value::Null,
        },
        Value::Bool(b) => Value::Number(u8::from(b).into()),
        _ => Value::Null,
    }
}

/// Coerce each line item's fields; non-arrays and non-object items pass
/// through for the validator to reject.
fn coerce_items(value: Value) -> Value {
    let Value::Array(items) = value else {
        return value;
    };
    Value::Array(
        items
            .into_iter()
            .map(|item| match item {
                Value::Object(obj) => {
                    let mut coerced = Map::new();
                    for (k, v) in obj {
                        let kind = expected_kind(&k);
                        coerced.insert(k, coerce(v, kind));
                    }
                    Value::Object(coerced)
                }
                other => other,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaVariant;
    use serde_json::json;

    #[test]
    fn flat_response_passes_through_untouched() {
        let desc = SchemaVariant::SingleItem.descriptor();
        let raw = json!({
            "isInvoice": true, "description": "Consulting", "quantity": "10",
            "hourly": true, "payRateInSubunits": 5000, "invoiceDate": "2024-03-01",
        });
        assert_eq!(normalize(raw.clone(), desc), raw);
    }

    #[test]
    fn envelope_with_all_fields_is_flattened_and_coerced() {
        let desc = SchemaVariant::SingleItem.descriptor();
        let raw = json!({
            "properties": {
                "isInvoice": "yes",            // truthy string → true
                "description": 42,              // number → "42"
                "quantity": 10,                 // number → "10"
                "hourly": 0,                    // zero → false
                "payRateInSubunits": "5000",   // numeric string → 5000
                "invoiceDate": "2024-03-01",
            }
        });
        let flat = normalize(raw, desc);
        assert_eq!(
            flat,
            json!({
                "isInvoice": true, "description": "42", "quantity": "10",
                "hourly": false, "payRateInSubunits": 5000.0, "invoiceDate": "2024-03-01",
            })
        );
    }

    #[test]
    fn envelope_missing_a_required_field_is_not_unwrapped() {
        let desc = SchemaVariant::SingleItem.descriptor();
        let raw = json!({
            "properties": {
                "isInvoice": true, "description": "x", "quantity": "1",
                "hourly": false, "payRateInSubunits": 100,
                // invoiceDate absent
            }
        });
        assert_eq!(normalize(raw.clone(), desc), raw);
    }

    #[test]
    fn multi_item_envelope_coerces_each_line_item() {
        let desc = SchemaVariant::MultiItem.descriptor();
        let raw = json!({
            "properties": {
                "isInvoice": 1,
                "lineItems": [
                    {"description": "Design", "quantity": 3, "hourly": "yes", "payRateInSubunits": "2500"},
                ],
                "invoiceDate": "2024-02-10",
            }
        });
        let flat = normalize(raw, desc);
        assert_eq!(flat["isInvoice"], json!(true));
        assert_eq!(
            flat["lineItems"][0],
            json!({"description": "Design", "quantity": "3", "hourly": true, "payRateInSubunits": 2500.0})
        );
    }

    #[test]
    fn non_object_responses_pass_through() {
        let desc = SchemaVariant::Simplified.descriptor();
        for raw in [json!(null), json!("text"), json!([1, 2])] {
            assert_eq!(normalize(raw.clone(), desc), raw);
        }
    }

    #[test]
    fn unparsable_numeric_string_becomes_unset() {
        assert_eq!(coerce_number(json!("abc")), Value::Null);
        assert_eq!(coerce_number(json!("12.5")), json!(12.5));
    }
}
