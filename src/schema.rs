//! Extraction schema descriptors for the three pipeline variants.
//!
//! The pipeline itself is variant-agnostic: gate, encoding, invocation,
//! normalisation, and validation all consume a [`SchemaDescriptor`] and never
//! branch on which product surface asked for the extraction. The three
//! variants differ only in cardinality (one line item vs. many) and in
//! whether the model is additionally asked to classify the document as an
//! invoice at all.
//!
//! A descriptor owns three things:
//!
//! 1. the JSON Schema handed to the model as the declared output shape, with
//!    a natural-language hint per field to bias extraction,
//! 2. the set of top-level fields a response must carry (used by the
//!    normaliser to recognise a schema-echo envelope),
//! 3. the numeric bounds the validator enforces on the populated fields.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Upper bound for a pay rate, in currency subunits (one million units).
pub const MAX_PAY_RATE_SUBUNITS: f64 = 100_000_000.0;

/// Upper bound for a quantity / hour count. The lower bound is exclusive zero.
pub const MAX_QUANTITY: f64 = 10_000.0;

/// Which extraction schema the pipeline is instantiated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaVariant {
    /// One line item plus an is-this-an-invoice classification. (default)
    #[default]
    SingleItem,
    /// An array of line items plus the invoice classification.
    MultiItem,
    /// One line item, no classification step.
    Simplified,
}

impl SchemaVariant {
    /// The static descriptor for this variant.
    pub fn descriptor(self) -> &'static SchemaDescriptor {
        match self {
            SchemaVariant::SingleItem => &SINGLE_ITEM,
            SchemaVariant::MultiItem => &MULTI_ITEM,
            SchemaVariant::Simplified => &SIMPLIFIED,
        }
    }
}

/// Shape parameters for one pipeline instantiation.
#[derive(Debug)]
pub struct SchemaDescriptor {
    /// Which variant this descriptor belongs to.
    pub variant: SchemaVariant,
    /// Whether the schema declares the `isInvoice` classification field.
    pub classifies_invoice: bool,
    /// Whether line items arrive as an array rather than flat fields.
    pub multi_item: bool,
    /// Top-level fields a conforming response must populate.
    required: &'static [&'static str],
}

static SINGLE_ITEM: SchemaDescriptor = SchemaDescriptor {
    variant: SchemaVariant::SingleItem,
    classifies_invoice: true,
    multi_item: false,
    required: &[
        "isInvoice",
        "description",
        "quantity",
        "hourly",
        "payRateInSubunits",
        "invoiceDate",
    ],
};

static MULTI_ITEM: SchemaDescriptor = SchemaDescriptor {
    variant: SchemaVariant::MultiItem,
    classifies_invoice: true,
    multi_item: true,
    required: &["isInvoice", "lineItems", "invoiceDate"],
};

static SIMPLIFIED: SchemaDescriptor = SchemaDescriptor {
    variant: SchemaVariant::Simplified,
    classifies_invoice: false,
    multi_item: false,
    required: &[
        "description",
        "quantity",
        "hourly",
        "payRateInSubunits",
        "invoiceDate",
    ],
};

// ── Per-field extraction hints ───────────────────────────────────────────
//
// These strings ride along in the JSON Schema as `description` annotations.
// They are the only prompt-engineering surface below the instruction text,
// so keep them declarative: what the field means, not how to find it.

const HINT_IS_INVOICE: &str =
    "True when the document is an invoice or a bill for services or goods; \
     false for any other kind of document.";
const HINT_DESCRIPTION: &str = "Short description of the service or product being billed.";
const HINT_QUANTITY: &str =
    "Number of units or hours billed, as a decimal string, e.g. \"10\" or \"2.5\".";
const HINT_HOURLY: &str =
    "True when the line is billed per hour, false when it is a fixed quantity.";
const HINT_PAY_RATE: &str =
    "Price per unit or per hour in the smallest currency denomination \
     (cents): 1050 means 10.50.";
const HINT_INVOICE_DATE: &str =
    "Invoice issue date in YYYY-MM-DD format. Use the current date when no \
     date is printed on the document.";
const HINT_LINE_ITEMS: &str =
    "Every individually billed service or product line on the invoice.";

impl SchemaDescriptor {
    /// Top-level fields a conforming response must populate.
    pub fn required_fields(&self) -> &'static [&'static str] {
        self.required
    }

    /// Name of the single tool the model is forced to call.
    pub fn tool_name(&self) -> &'static str {
        "record_invoice"
    }

    /// One-line tool description shown to the model.
    pub fn tool_description(&self) -> &'static str {
        "Record the structured data extracted from the uploaded document."
    }

    /// The JSON Schema declared to the model as the extraction output shape.
    pub fn json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();

        if self.classifies_invoice {
            properties.insert(
                "isInvoice".into(),
                json!({"type": "boolean", "description": HINT_IS_INVOICE}),
            );
        }

        if self.multi_item {
            properties.insert(
                "lineItems".into(),
                json!({
                    "type": "array",
                    "description": HINT_LINE_ITEMS,
                    "items": {
                        "type": "object",
                        "properties": line_item_properties(),
                        "required": ["description", "quantity", "hourly", "payRateInSubunits"],
                    },
                }),
            );
        } else {
            for (name, schema) in line_item_properties() {
                properties.insert(name, schema);
            }
        }

        properties.insert(
            "invoiceDate".into(),
            json!({"type": "string", "description": HINT_INVOICE_DATE}),
        );

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

fn line_item_properties() -> serde_json::Map<String, Value> {
    let mut m = serde_json::Map::new();
    m.insert(
        "description".into(),
        json!({"type": "string", "description": HINT_DESCRIPTION}),
    );
    m.insert(
        "quantity".into(),
        json!({"type": "string", "description": HINT_QUANTITY}),
    );
    m.insert(
        "hourly".into(),
        json!({"type": "boolean", "description": HINT_HOURLY}),
    );
    m.insert(
        "payRateInSubunits".into(),
        json!({"type": "number", "description": HINT_PAY_RATE}),
    );
    m
}
