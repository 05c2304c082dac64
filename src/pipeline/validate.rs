//! Field validation: turn a normalised response into a typed result.
//!
//! Checks run in a fixed order and the first failure wins — the caller gets
//! one specific message, never an accumulated list:
//!
//! 1. the response must be a structured object,
//! 2. an explicit `isInvoice: false` raises the not-an-invoice sentinel and
//!    skips everything else (placeholder data in that case must never leak),
//! 3. (multi-item) the line-item sequence must be non-empty,
//! 4. every pay rate must lie in [0, 100 000 000] subunits,
//! 5. every quantity must parse to a finite number in (0, 10000],
//! 6. (multi-item) every description must be a non-empty string,
//! 7. the invoice date must match `YYYY-MM-DD` literally.
//!
//! Only after all gates pass is an [`ExtractedInvoice`] constructed, with
//! the classification field stripped.

use crate::error::ExtractError;
use crate::output::{ExtractedInvoice, LineItem};
use crate::schema::{SchemaDescriptor, MAX_PAY_RATE_SUBUNITS, MAX_QUANTITY};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Validate a normalised response against the active schema variant.
pub fn validate(
    value: &Value,
    descriptor: &SchemaDescriptor,
) -> Result<ExtractedInvoice, ExtractError> {
    let obj = value.as_object().ok_or(ExtractError::UnableToAnalyze)?;

    if descriptor.classifies_invoice && obj.get("isInvoice").and_then(Value::as_bool) == Some(false)
    {
        return Err(ExtractError::NotAnInvoice);
    }

    let items: Vec<&Map<String, Value>> = if descriptor.multi_item {
        let line_items = obj
            .get("lineItems")
            .and_then(Value::as_array)
            .filter(|a| !a.is_empty())
            .ok_or(ExtractError::NoLineItems)?;
        line_items
            .iter()
            .map(|item| item.as_object().ok_or(ExtractError::UnableToAnalyze))
            .collect::<Result<_, _>>()?
    } else {
        vec![obj]
    };

    for item in &items {
        check_pay_rate(item)?;
    }
    for item in &items {
        check_quantity(item)?;
    }
    if descriptor.multi_item {
        for (index, item) in items.iter().enumerate() {
            if description_of(item).trim().is_empty() {
                return Err(ExtractError::InvalidDescription { index });
            }
        }
    }

    let invoice_date = obj
        .get("invoiceDate")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !DATE_RE.is_match(invoice_date) {
        return Err(ExtractError::InvalidDate {
            value: invoice_date.to_string(),
        });
    }

    let line_items = items
        .iter()
        .map(|item| LineItem {
            description: description_of(item).to_string(),
            quantity: quantity_of(item),
            hourly: item.get("hourly").and_then(Value::as_bool).unwrap_or(false),
            pay_rate_in_subunits: pay_rate_of(item).round() as i64,
        })
        .collect();

    Ok(ExtractedInvoice {
        line_items,
        invoice_date: invoice_date.to_string(),
    })
}

fn pay_rate_of(item: &Map<String, Value>) -> f64 {
    item.get("payRateInSubunits")
        .and_then(Value::as_f64)
        .unwrap_or(f64::NAN)
}

/// The quantity as the string form it will be forwarded in.
fn quantity_of(item: &Map<String, Value>) -> String {
    match item.get("quantity") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn description_of<'a>(item: &'a Map<String, Value>) -> &'a str {
    item.get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn check_pay_rate(item: &Map<String, Value>) -> Result<(), ExtractError> {
    let rate = pay_rate_of(item);
    // NaN fails both comparisons, so missing and non-numeric rates land here.
    if !(0.0..=MAX_PAY_RATE_SUBUNITS).contains(&rate) {
        return Err(ExtractError::InvalidPayRate { value: rate });
    }
    Ok(())
}

fn check_quantity(item: &Map<String, Value>) -> Result<(), ExtractError> {
    let text = quantity_of(item);
    let parsed = text.trim().parse::<f64>().unwrap_or(f64::NAN);
    if parsed.is_nan() || parsed <= 0.0 || parsed > MAX_QUANTITY {
        return Err(ExtractError::InvalidQuantity { value: text });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaVariant;
    use serde_json::json;

    fn single(rate: Value, quantity: Value, date: &str) -> Value {
        json!({
            "isInvoice": true,
            "description": "Consulting",
            "quantity": quantity,
            "hourly": true,
            "payRateInSubunits": rate,
            "invoiceDate": date,
        })
    }

    fn check_single(value: &Value) -> Result<ExtractedInvoice, ExtractError> {
        validate(value, SchemaVariant::SingleItem.descriptor())
    }

    #[test]
    fn valid_single_item_response_passes() {
        let invoice =
            check_single(&single(json!(5000), json!("10"), "2024-03-01")).unwrap();
        assert_eq!(invoice.line_items.len(), 1);
        let item = &invoice.line_items[0];
        assert_eq!(item.description, "Consulting");
        assert_eq!(item.quantity, "10");
        assert!(item.hourly);
        assert_eq!(item.pay_rate_in_subunits, 5000);
        assert_eq!(invoice.invoice_date, "2024-03-01");
    }

    #[test]
    fn non_object_responses_are_shape_failures() {
        for value in [json!(null), json!("nope"), json!(42), json!([])] {
            let err = validate(&value, SchemaVariant::SingleItem.descriptor()).unwrap_err();
            assert!(matches!(err, ExtractError::UnableToAnalyze), "{value}");
        }
    }

    #[test]
    fn explicit_false_classification_wins_over_everything() {
        // Rate and date are garbage; the sentinel must still be reported.
        let mut value = single(json!(-99), json!("abc"), "not-a-date");
        value["isInvoice"] = json!(false);
        let err = check_single(&value).unwrap_err();
        assert!(err.is_not_invoice());
    }

    #[test]
    fn missing_classification_field_does_not_raise_the_sentinel() {
        let mut value = single(json!(5000), json!("10"), "2024-03-01");
        value.as_object_mut().unwrap().remove("isInvoice");
        assert!(check_single(&value).is_ok());
    }

    #[test]
    fn simplified_variant_ignores_classification_entirely() {
        // Even an explicit false is not part of the simplified schema.
        let mut value = single(json!(5000), json!("10"), "2024-03-01");
        value["isInvoice"] = json!(false);
        assert!(validate(&value, SchemaVariant::Simplified.descriptor()).is_ok());
    }

    #[test]
    fn pay_rate_bounds_are_inclusive() {
        assert!(check_single(&single(json!(0), json!("1"), "2024-03-01")).is_ok());
        assert!(check_single(&single(json!(100_000_000), json!("1"), "2024-03-01")).is_ok());

        for bad in [json!(-1), json!(100_000_001), json!("5000"), Value::Null] {
            let err = check_single(&single(bad.clone(), json!("1"), "2024-03-01")).unwrap_err();
            assert!(matches!(err, ExtractError::InvalidPayRate { .. }), "{bad}");
        }
    }

    #[test]
    fn quantity_bounds_are_exclusive_zero_inclusive_top() {
        assert!(check_single(&single(json!(1), json!("1"), "2024-03-01")).is_ok());
        assert!(check_single(&single(json!(1), json!("10000"), "2024-03-01")).is_ok());

        for bad in ["0", "10001", "abc", "", "-3"] {
            let err = check_single(&single(json!(1), json!(bad), "2024-03-01")).unwrap_err();
            assert!(matches!(err, ExtractError::InvalidQuantity { .. }), "{bad}");
        }
    }

    #[test]
    fn numeric_quantity_is_accepted_and_forwarded_as_string() {
        let invoice = check_single(&single(json!(1), json!(2.5), "2024-03-01")).unwrap();
        assert_eq!(invoice.line_items[0].quantity, "2.5");
    }

    #[test]
    fn date_must_be_zero_padded_iso() {
        for bad in ["2024-1-5", "01/05/2024", "2024-03-01T00:00:00", "", "March 1"] {
            let err = check_single(&single(json!(1), json!("1"), bad)).unwrap_err();
            assert!(matches!(err, ExtractError::InvalidDate { .. }), "{bad}");
        }
        assert!(check_single(&single(json!(1), json!("1"), "2024-01-05")).is_ok());
    }

    #[test]
    fn multi_item_requires_a_non_empty_sequence() {
        let desc = SchemaVariant::MultiItem.descriptor();
        let empty = json!({"isInvoice": true, "lineItems": [], "invoiceDate": "2024-03-01"});
        assert!(matches!(
            validate(&empty, desc).unwrap_err(),
            ExtractError::NoLineItems
        ));

        let missing = json!({"isInvoice": true, "invoiceDate": "2024-03-01"});
        assert!(matches!(
            validate(&missing, desc).unwrap_err(),
            ExtractError::NoLineItems
        ));
    }

    #[test]
    fn multi_item_validates_every_line() {
        let desc = SchemaVariant::MultiItem.descriptor();
        let value = json!({
            "isInvoice": true,
            "lineItems": [
                {"description": "Design", "quantity": "3", "hourly": false, "payRateInSubunits": 2500},
                {"description": "Dev", "quantity": "0", "hourly": true, "payRateInSubunits": 9000},
            ],
            "invoiceDate": "2024-03-01",
        });
        let err = validate(&value, desc).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidQuantity { .. }), "{err}");
    }

    #[test]
    fn multi_item_rejects_blank_descriptions() {
        let desc = SchemaVariant::MultiItem.descriptor();
        let value = json!({
            "isInvoice": true,
            "lineItems": [
                {"description": "Design", "quantity": "3", "hourly": false, "payRateInSubunits": 2500},
                {"description": "   ", "quantity": "1", "hourly": false, "payRateInSubunits": 100},
            ],
            "invoiceDate": "2024-03-01",
        });
        match validate(&value, desc).unwrap_err() {
            ExtractError::InvalidDescription { index } => assert_eq!(index, 1),
            other => panic!("expected description failure, got {other}"),
        }
    }

    #[test]
    fn rate_failures_report_before_quantity_failures() {
        // Both fields are invalid; the rate check runs first.
        let err = check_single(&single(json!(-1), json!("abc"), "2024-03-01")).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidPayRate { .. }), "{err}");
    }

    #[test]
    fn fractional_rates_round_to_whole_subunits() {
        let invoice = check_single(&single(json!(1050.4), json!("1"), "2024-03-01")).unwrap();
        assert_eq!(invoice.line_items[0].pay_rate_in_subunits, 1050);
    }
}
