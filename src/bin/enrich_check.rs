//! One-shot probe of the transaction-enrichment API.
//!
//! Fires a single enrichment request with a fixed sample transaction and
//! prints the status, headers, and body. Useful for checking that the
//! credentials in the environment are live before wiring anything else to
//! the endpoint. Unrelated to the receipt pipeline.

use anyhow::{bail, Context, Result};
use serde_json::json;

const ENRICH_URL: &str = "https://production.plaid.com/transactions/enrich";

#[tokio::main]
async fn main() -> Result<()> {
    let client_id =
        std::env::var("PLAID_CLIENT_ID").context("PLAID_CLIENT_ID is not set")?;
    let secret = std::env::var("PLAID_SECRET").context("PLAID_SECRET is not set")?;

    let payload = json!({
        "client_id": client_id,
        "secret": secret,
        "account_type": "depository",
        "transactions": [
            {
                "id": "6135818adda16500147e7c1d",
                "description": "Uniqlo",
                "amount": 84.47,
                "direction": "OUTFLOW",
                "iso_currency_code": "USD",
                "location": { "city": "McLean", "region": "VA" },
                "date_posted": "2022-07-05",
            },
        ],
    });

    println!("Making request to the transactions-enrich endpoint…");
    println!("URL: {ENRICH_URL}");
    println!("{}", "=".repeat(50));

    let response = reqwest::Client::new()
        .post(ENRICH_URL)
        .json(&payload)
        .send()
        .await
        .context("Request failed at the network layer")?;

    let status = response.status();
    println!("Status Code: {status}");
    println!("Response Headers:");
    for (name, value) in response.headers() {
        println!("  {name}: {}", value.to_str().unwrap_or("<binary>"));
    }
    println!("{}", "=".repeat(50));

    let body = response.text().await.context("Failed to read response body")?;
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(parsed) => {
            println!("Response Body:");
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Err(_) => {
            println!("Response Body (raw):");
            println!("{body}");
        }
    }

    if !status.is_success() {
        bail!("Request failed with HTTP {status}");
    }

    println!("\n✅ Request successful!");
    Ok(())
}
