//! Instruction text for the extraction request.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the extraction rules (subunit pricing,
//!    date fallback, classification) are stated in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the instruction without
//!    calling a model, so a prompt regression shows up as a failing assert
//!    rather than a drop in extraction quality.
//!
//! The template is fixed; the only parameter is the current date, which the
//! model uses as the `invoiceDate` fallback when the document carries no
//! printed date.

/// Fixed extraction instruction, with `{date}` as the sole placeholder.
const EXTRACTION_TEMPLATE: &str = r#"You are reading a document a user uploaded as an invoice.

Extract the billing data and record it with the provided tool. Follow these rules precisely:

1. AMOUNTS
   - Report every rate in the smallest currency denomination (cents): 10.50 becomes 1050
   - Never round amounts; transcribe exactly what the document states

2. QUANTITIES
   - Report quantities and hour counts as decimal strings, e.g. "10" or "2.5"
   - When a line is billed per hour, set hourly to true and put the hour count in quantity

3. DATES
   - Report the invoice issue date in YYYY-MM-DD format
   - If no date is printed on the document, use {date}

4. CLASSIFICATION
   - If the document is not an invoice or a bill, say so via the schema instead of inventing data

5. OUTPUT
   - Populate every declared field; do not add commentary"#;

/// Build the instruction for one extraction request.
///
/// `today` must already be formatted as `YYYY-MM-DD`; the pipeline derives it
/// from the config so tests can pin a deterministic date.
pub fn extraction_instruction(today: &str) -> String {
    EXTRACTION_TEMPLATE.replace("{date}", today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_is_substituted() {
        let prompt = extraction_instruction("2024-03-01");
        assert!(prompt.contains("use 2024-03-01"));
        assert!(!prompt.contains("{date}"));
    }

    #[test]
    fn subunit_rule_is_present() {
        let prompt = extraction_instruction("2024-03-01");
        assert!(prompt.contains("10.50 becomes 1050"));
    }
}
