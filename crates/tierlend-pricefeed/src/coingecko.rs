//! CoinGecko `simple/price` source
//!
//! One GET per asset: `{base}/simple/price?ids=<id>&vs_currencies=usd`,
//! answered with `{ "<id>": { "usd": <number> } }`.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tierlend_common::{AssetSymbol, PriceFeedError};
use tracing::debug;

use crate::config::PriceFeedConfig;
use crate::source::PriceSource;

#[derive(Debug, Clone)]
pub struct CoinGeckoSource {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl CoinGeckoSource {
    pub fn new(config: &PriceFeedConfig) -> Result<Self, PriceFeedError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| PriceFeedError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.fetch_timeout.as_millis() as u64,
        })
    }

    /// Request URL for one asset
    pub fn price_url(&self, asset: AssetSymbol) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            asset.coingecko_id()
        )
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch(&self, asset: AssetSymbol) -> Result<Decimal, PriceFeedError> {
        let url = self.price_url(asset);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PriceFeedError::Timeout(self.timeout_ms)
                } else {
                    PriceFeedError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceFeedError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PriceFeedError::Transport(e.to_string()))?;
        debug!(asset = %asset, bytes = body.len(), "Price response received");

        parse_simple_price(asset, &body)
    }
}

/// Extract the USD price for `asset` from a `simple/price` body
///
/// A missing entry or `null` price is `MissingPrice`; a zero or negative
/// price is `Implausible`.
pub fn parse_simple_price(asset: AssetSymbol, body: &str) -> Result<Decimal, PriceFeedError> {
    let id = asset.coingecko_id();
    let value: Value =
        serde_json::from_str(body).map_err(|e| PriceFeedError::Decode(e.to_string()))?;

    let usd = match value.get(id).and_then(|entry| entry.get("usd")) {
        None | Some(Value::Null) => return Err(PriceFeedError::MissingPrice(id.to_string())),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(PriceFeedError::Decode(format!(
                "usd price for {id} is not a number: {other}"
            )))
        }
    };

    let price = Decimal::from_str(&usd)
        .or_else(|_| Decimal::from_scientific(&usd))
        .map_err(|e| PriceFeedError::Decode(format!("{usd}: {e}")))?;

    if price <= Decimal::ZERO {
        return Err(PriceFeedError::Implausible {
            asset: asset.symbol().to_string(),
            price: usd,
        });
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port, returning the base URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn source_for(base_url: String) -> CoinGeckoSource {
        CoinGeckoSource::new(&PriceFeedConfig::default().with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_parse_price() {
        let body = r#"{"ethereum":{"usd":3120.45}}"#;
        assert_eq!(parse_simple_price(AssetSymbol::Eth, body), Ok(dec!(3120.45)));

        let body = r#"{"wrapped-bitcoin":{"usd":94850}}"#;
        assert_eq!(parse_simple_price(AssetSymbol::Wbtc, body), Ok(dec!(94850)));
    }

    #[test]
    fn test_missing_entry() {
        let body = r#"{"ethereum":{"usd":3120.45}}"#;
        assert_eq!(
            parse_simple_price(AssetSymbol::Usdc, body),
            Err(PriceFeedError::MissingPrice("usd-coin".to_string()))
        );
        assert!(matches!(
            parse_simple_price(AssetSymbol::Dai, r#"{"dai":{"usd":null}}"#),
            Err(PriceFeedError::MissingPrice(_))
        ));
        assert!(matches!(
            parse_simple_price(AssetSymbol::Dai, "{}"),
            Err(PriceFeedError::MissingPrice(_))
        ));
    }

    #[test]
    fn test_zero_price_is_implausible() {
        let body = r#"{"tether":{"usd":0}}"#;
        assert!(matches!(
            parse_simple_price(AssetSymbol::Usdt, body),
            Err(PriceFeedError::Implausible { .. })
        ));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse_simple_price(AssetSymbol::Eth, "<html>rate limited</html>"),
            Err(PriceFeedError::Decode(_))
        ));
        assert!(matches!(
            parse_simple_price(AssetSymbol::Eth, r#"{"ethereum":{"usd":"3100"}}"#),
            Err(PriceFeedError::Decode(_))
        ));
    }

    #[test]
    fn test_price_url() {
        let config = PriceFeedConfig::default().with_base_url("http://localhost:9000/api/v3/");
        let source = CoinGeckoSource::new(&config).unwrap();
        assert_eq!(
            source.price_url(AssetSymbol::Usdc),
            "http://localhost:9000/api/v3/simple/price?ids=usd-coin&vs_currencies=usd"
        );
    }

    #[tokio::test]
    async fn test_fetch_live_price() {
        let base = serve_once("200 OK", r#"{"ethereum":{"usd":3120.45}}"#).await;
        let price = source_for(base).fetch(AssetSymbol::Eth).await;
        assert_eq!(price, Ok(dec!(3120.45)));
    }

    #[tokio::test]
    async fn test_rate_limited_response_maps_to_status() {
        let base = serve_once("429 Too Many Requests", r#"{"status":"rate limited"}"#).await;
        let result = source_for(base).fetch(AssetSymbol::Eth).await;
        assert_eq!(result, Err(PriceFeedError::Status(429)));
    }

    #[tokio::test]
    async fn test_zero_price_response_is_implausible() {
        let base = serve_once("200 OK", r#"{"ethereum":{"usd":0}}"#).await;
        let result = source_for(base).fetch(AssetSymbol::Eth).await;
        assert!(matches!(result, Err(PriceFeedError::Implausible { .. })));
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_transport() {
        // Bind then release a port so nothing is listening on it
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = source_for(format!("http://{addr}")).fetch(AssetSymbol::Eth).await;
        assert!(matches!(result, Err(PriceFeedError::Transport(_))));
    }

    #[tokio::test]
    async fn test_silent_server_maps_to_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let config = PriceFeedConfig::default()
            .with_base_url(format!("http://{addr}"))
            .with_fetch_timeout(Duration::from_millis(200));
        let result = CoinGeckoSource::new(&config).unwrap().fetch(AssetSymbol::Eth).await;
        assert_eq!(result, Err(PriceFeedError::Timeout(200)));
    }
}
