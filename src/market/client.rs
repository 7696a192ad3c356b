//! HTTP client for the Steam Community Market `priceoverview` endpoint.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::market::models::{NormalizedName, PriceOverview, PriceQuote};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// A source of price quotes - enables mocking for tests.
///
/// Implementations never fail: every error path resolves to a quote with an
/// explicit status.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Looks up the current price for an item.
    async fn fetch(&self, name: &NormalizedName) -> PriceQuote;
}

/// What a single successful round-trip told us.
#[derive(Debug, PartialEq)]
enum Lookup {
    Priced(String),
    Unlisted,
}

/// Market HTTP client with bounded retries.
pub struct MarketClient {
    client: Client,
    base_url: String,
    country: String,
    currency: u32,
    app_id: u32,
    max_retries: u32,
    retry_backoff: Duration,
}

impl MarketClient {
    /// Creates a new market client with the given configuration.
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        Self::with_base_url(config, config.base_url.clone())
    }

    /// Creates a new market client against a custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: String) -> Result<Self, ScrapeError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| ScrapeError::Client(format!("invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| ScrapeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            currency: config.currency,
            app_id: config.app_id,
            max_retries: config.max_retries.max(1),
            retry_backoff: config.retry_backoff(),
        })
    }

    /// Full lookup URL for an item.
    fn url(&self, name: &NormalizedName) -> String {
        format!(
            "{}/market/priceoverview/?country={}&currency={}&appid={}&market_hash_name={}",
            self.base_url,
            self.country,
            self.currency,
            self.app_id,
            urlencoding::encode(name.as_str())
        )
    }

    /// One request; any error here is retryable.
    async fn lookup(&self, name: &NormalizedName) -> Result<Lookup> {
        let url = self.url(name);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 429 {
            anyhow::bail!("Rate limited by the market (429)");
        }

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        let body = response.text().await.context("Failed to read response body")?;
        let overview: PriceOverview =
            serde_json::from_str(&body).context("Malformed price overview body")?;

        if !overview.success {
            anyhow::bail!("Market reported success=false");
        }

        Ok(match overview.best_price() {
            Some(price) => Lookup::Priced(price.to_string()),
            None => Lookup::Unlisted,
        })
    }
}

#[async_trait]
impl PriceSource for MarketClient {
    async fn fetch(&self, name: &NormalizedName) -> PriceQuote {
        info!("Fetching price: {}", name);

        for attempt in 1..=self.max_retries {
            match self.lookup(name).await {
                Ok(Lookup::Priced(price)) => {
                    debug!("{} -> {}", name, price);
                    return PriceQuote::success(price);
                }
                Ok(Lookup::Unlisted) => {
                    debug!("{} has no listing", name);
                    return PriceQuote::no_listing();
                }
                Err(e) => {
                    warn!("Attempt {}/{} for '{}' failed: {:#}", attempt, self.max_retries, name, e);
                }
            }

            if attempt < self.max_retries && !self.retry_backoff.is_zero() {
                tokio::time::sleep(self.retry_backoff).await;
            }
        }

        warn!("Giving up on '{}' after {} attempts", name, self.max_retries);
        PriceQuote::fetch_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::models::QuoteStatus;
    use crate::market::normalize;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OVERVIEW_PATH: &str = "/market/priceoverview/";

    fn make_test_config() -> Config {
        Config::new().without_delays()
    }

    async fn client_for(server: &MockServer) -> MarketClient {
        MarketClient::with_base_url(&make_test_config(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_url_encoding() {
        let client =
            MarketClient::with_base_url(&make_test_config(), "http://localhost/".to_string())
                .unwrap();
        let url = client.url(&normalize("Malefic Drake's Hood"));
        assert_eq!(
            url,
            "http://localhost/market/priceoverview/?country=PH&currency=12&appid=570&market_hash_name=Malefic%20Drake%27s%20Hood"
        );
    }

    #[tokio::test]
    async fn test_max_retries_floor() {
        let mut config = make_test_config();
        config.max_retries = 0;
        let client = MarketClient::with_base_url(&config, "http://localhost".to_string()).unwrap();
        assert_eq!(client.max_retries, 1);
    }

    #[tokio::test]
    async fn test_fetch_lowest_price() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .and(query_param("country", "PH"))
            .and(query_param("currency", "12"))
            .and(query_param("appid", "570"))
            .and(query_param("market_hash_name", "Profane Union"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"lowest_price":"₱1,234.50","median_price":"₱1,100.00","volume":"3"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quote = client.fetch(&normalize("Profane Union")).await;

        assert_eq!(quote.status, QuoteStatus::Success);
        assert_eq!(quote.raw_text, "₱1,234.50");
        assert_eq!(quote.numeric_value, 1234.50);
    }

    #[tokio::test]
    async fn test_fetch_median_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success":true,"median_price":"₱85.20"}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quote = client.fetch(&normalize("Shatterblast Core")).await;

        assert_eq!(quote.status, QuoteStatus::Success);
        assert_eq!(quote.raw_text, "₱85.20");
        assert_eq!(quote.numeric_value, 85.20);
    }

    #[tokio::test]
    async fn test_fetch_no_listing_does_not_retry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quote = client.fetch(&normalize("Unlisted Thing")).await;

        assert_eq!(quote.status, QuoteStatus::NoListing);
        assert_eq!(quote.raw_text, "No price listed");
        assert_eq!(quote.numeric_value, 0.0);
    }

    #[tokio::test]
    async fn test_fetch_500_exhausts_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quote = client.fetch(&normalize("Anything")).await;

        assert_eq!(quote.status, QuoteStatus::FetchError);
        assert_eq!(quote.raw_text, "Error fetching price");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_fetch_custom_retry_count() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(ResponseTemplate::new(429))
            .expect(5)
            .mount(&server)
            .await;

        let mut config = make_test_config();
        config.max_retries = 5;
        let client = MarketClient::with_base_url(&config, server.uri()).unwrap();
        let quote = client.fetch(&normalize("Anything")).await;

        assert_eq!(quote.status, QuoteStatus::FetchError);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_fetch_success_false_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":false}"#))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quote = client.fetch(&normalize("Bad Name")).await;

        assert_eq!(quote.status, QuoteStatus::FetchError);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quote = client.fetch(&normalize("Widget")).await;

        assert_eq!(quote.status, QuoteStatus::FetchError);
    }

    #[tokio::test]
    async fn test_fetch_recovers_after_failure() {
        let server = MockServer::start().await;

        // First attempt fails, second succeeds
        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success":true,"lowest_price":"₱10.00"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quote = client.fetch(&normalize("Widget A")).await;

        assert_eq!(quote.status, QuoteStatus::Success);
        assert_eq!(quote.numeric_value, 10.0);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OVERVIEW_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success":true,"lowest_price":"₱10.00"}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let mut config = make_test_config();
        config.timeout_secs = 1;
        config.max_retries = 2;
        let client = MarketClient::with_base_url(&config, server.uri()).unwrap();
        let quote = client.fetch(&normalize("Slow Widget")).await;

        assert_eq!(quote.status, QuoteStatus::FetchError);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        // Port 1 is never bound in test environments; connection is refused
        let uri = "http://127.0.0.1:1".to_string();

        let mut config = make_test_config();
        config.max_retries = 2;
        let client = MarketClient::with_base_url(&config, uri).unwrap();
        let quote = client.fetch(&normalize("Widget")).await;

        assert_eq!(quote.status, QuoteStatus::FetchError);
    }
}
