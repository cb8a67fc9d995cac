use crate::core::price::PriceProvider;
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Latest prices from the Alpha Vantage `GLOBAL_QUOTE` endpoint.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("balancer/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    // Rate limiting and bad keys come back as 200s with one of these set
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    #[instrument(
        name = "AlphaVantagePriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<Decimal> {
        let url = format!(
            "{}/query?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        );
        debug!("Requesting quote for {}", symbol);

        // The URL carries the API key, keep it out of error messages
        let response = with_retry(
            || async {
                self.client
                    .get(&url)
                    .send()
                    .await
                    .map_err(reqwest::Error::without_url)
            },
            2,
            500,
        )
        .await
        .with_context(|| format!("Failed to send request for symbol: {symbol}"))?;

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for symbol: {symbol}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty response for symbol: {}", symbol));
        }

        let data: GlobalQuoteResponse = serde_json::from_str(&response_text).with_context(|| {
            format!(
                "Failed to parse quote response for symbol: {symbol}. Response: '{response_text}'"
            )
        })?;

        let price_str = data.global_quote.and_then(|q| q.price).ok_or_else(|| {
            let reason = data
                .error_message
                .or(data.note)
                .or(data.information)
                .unwrap_or_else(|| "no quote returned".to_string());
            anyhow!("No price data found for symbol: {}: {}", symbol, reason)
        })?;

        let price = Decimal::from_str(price_str.trim())
            .with_context(|| format!("Failed to parse price '{price_str}' for symbol: {symbol}"))?;
        debug!("Successfully fetched price for {}: {}", symbol, price);

        Ok(price)
    }
}
