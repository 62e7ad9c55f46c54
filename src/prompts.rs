//! Instruction prompt and output schema for receipt extraction.
//!
//! Centralising the prompt and the default schema here serves two purposes:
//!
//! 1. **Single source of truth** — changing what the model is asked to
//!    extract (adding a field, tweaking the worked example) requires editing
//!    exactly one place.
//!
//! 2. **Testability** — unit tests can render and inspect instructions
//!    directly without a live model, so prompt regressions are cheap to catch.
//!
//! Schema fidelity lives entirely here: the reply is never validated against
//! the schema, so the prompt is the only mechanism steering the output shape.

use serde_json::{json, Value};

/// Instruction template sent as the system message.
///
/// `{json_schema_content}` is replaced with the pretty-printed schema by
/// [`build_instructions`]. The worked example stays fixed — it teaches the
/// model the shape conventions (ISO timestamps, numeric prices, empty
/// `discounts` arrays) independently of whatever schema the caller supplies.
pub const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a world-class receipt processing expert. Your task is to accurately extract information from a receipt image, including line item totals, and provide it in a structured JSON format.

Here is an example of a desired JSON output:

```json
{
  "merchant_name": "Example Store",
  "transaction_timestamp": "2023-01-01T12:34:56",
  "currency": "USD",
  "items": [
    {
      "name": "Item 1",
      "quantity": 2,
      "unit_price": 20.00,
      "total_price": 40.00,
      "category": "Food",
      "discounts": [
        {
          "description": "10% off",
          "amount": 4.00
        }
      ]
    },
    {
      "name": "Item 2",
      "quantity": 1,
      "unit_price": 35.50,
      "total_price": 35.50,
      "category": "Beverage",
      "discounts": []
    }
  ],
  "subtotal": 75.50,
  "tax": 6.04,
  "fees": 0,
  "total": 81.54,
  "payment_method": "Credit Card",
  "receipt_id": "12345"
}
```

Please extract the information from the receipt image and provide it in the following JSON schema:

```json
{json_schema_content}
```"#;

/// Fixed user-turn text. The image attachment carries the actual content;
/// vision APIs still require a user message to respond to.
pub const USER_PROMPT: &str = "Extract the following.";

/// The built-in output schema, used when the caller supplies none.
///
/// Field names to type placeholders; nested `items` with per-item `discounts`.
/// Placeholders are guidance text for the model, not a validation contract.
pub fn default_schema() -> Value {
    json!({
        "merchant_name": "string",
        "transaction_timestamp": "string",
        "currency": "USD",
        "items": [
            {
                "name": "string",
                "quantity": "number",
                "unit_price": "number",
                "total_price": "number",
                "category": "string",
                "discounts": [
                    {
                        "description": "string",
                        "amount": "number",
                    }
                ],
            }
        ],
        "subtotal": "number",
        "tax": "number",
        "fees": "number",
        "total": "number",
        "payment_method": "string",
        "receipt_id": "string",
    })
}

/// Render the instruction text for the given schema.
///
/// Deterministic: same schema in, same string out. `serde_json`'s
/// `preserve_order` feature keeps object keys in authored order, so the
/// rendered schema reads the way it was written.
pub fn build_instructions(schema: &Value) -> String {
    let pretty = serde_json::to_string_pretty(schema)
        .unwrap_or_else(|_| schema.to_string());
    SYSTEM_PROMPT_TEMPLATE.replace("{json_schema_content}", &pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_has_expected_fields() {
        let schema = default_schema();
        let obj = schema.as_object().expect("schema is an object");
        for field in [
            "merchant_name",
            "transaction_timestamp",
            "currency",
            "items",
            "subtotal",
            "tax",
            "fees",
            "total",
            "payment_method",
            "receipt_id",
        ] {
            assert!(obj.contains_key(field), "missing field: {field}");
        }

        let item = &schema["items"][0];
        for field in ["name", "quantity", "unit_price", "total_price", "category", "discounts"] {
            assert!(item.get(field).is_some(), "missing item field: {field}");
        }
        assert!(item["discounts"][0].get("description").is_some());
        assert!(item["discounts"][0].get("amount").is_some());
    }

    #[test]
    fn instructions_embed_the_schema() {
        let rendered = build_instructions(&default_schema());
        assert!(rendered.contains("\"merchant_name\": \"string\""));
        assert!(!rendered.contains("{json_schema_content}"));
        // Worked example survives untouched
        assert!(rendered.contains("\"merchant_name\": \"Example Store\""));
    }

    #[test]
    fn instructions_are_deterministic() {
        let schema = json!({"total": "number", "vendor": "string"});
        assert_eq!(build_instructions(&schema), build_instructions(&schema));
    }

    #[test]
    fn custom_schema_replaces_default() {
        let schema = json!({"vendor": "string"});
        let rendered = build_instructions(&schema);
        assert!(rendered.contains("\"vendor\": \"string\""));
        // The schema block should hold the custom schema, not the default one
        assert!(!rendered.contains("\"receipt_id\": \"string\""));
    }
}
