use super::util::with_retry;
use crate::core::config::SourceConfig;
use crate::core::rates::{RateRecord, RateSource, parse_number};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const USER_AGENT: &str = concat!("cnb-rates/", env!("CARGO_PKG_VERSION"));

/// Index of the first data line. Line 0 is the publication date, line 1 the
/// column header.
const FIRST_DATA_LINE: usize = 2;
const FIELD_COUNT: usize = 5;

/// Fetches the Czech National Bank daily fixing feed.
///
/// The feed looks like:
///
/// ```text
/// 07 Mar 2025 #47
/// Country|Currency|Amount|Code|Rate
/// Australia|dollar|1|AUD|14.628
/// ```
pub struct CnbProvider {
    url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl CnbProvider {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(CnbProvider {
            url: config.url.clone(),
            client,
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// Returns the feed body, or `None` when the server answered with a
    /// non-success status.
    async fn fetch_text(&self) -> Result<Option<String>> {
        debug!("Requesting exchange rates from {}", self.url);

        let response = with_retry(
            || async { self.client.get(&self.url).send().await },
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .with_context(|| format!("Network error for URL: {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            error!(
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or("Unknown"),
                "Error fetching data from CNB"
            );
            return Ok(None);
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;
        let text = String::from_utf8(body.to_vec()).context("Response body is not valid UTF-8")?;

        Ok(Some(text))
    }
}

#[async_trait]
impl RateSource for CnbProvider {
    #[instrument(name = "CnbRatesFetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<RateRecord>> {
        let rates = match self.fetch_text().await {
            Ok(Some(text)) => parse_rates(&text),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = ?e, "Failed to fetch exchange rates");
                Vec::new()
            }
        };

        info!(count = rates.len(), "Fetched exchange rates");
        Ok(rates)
    }
}

/// Parses the pipe-delimited feed into records, in source order.
///
/// Feeds with fewer than three lines yield nothing. Data lines with fewer
/// than five fields are skipped. Numeric fields that fail to parse become
/// `0.0`.
pub fn parse_rates(text: &str) -> Vec<RateRecord> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= FIRST_DATA_LINE {
        warn!(lines = lines.len(), "Exchange rates feed is too short");
        return Vec::new();
    }

    lines
        .iter()
        .enumerate()
        .skip(FIRST_DATA_LINE)
        .filter_map(|(line_no, line)| parse_line(line_no + 1, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Option<RateRecord> {
    let values: Vec<&str> = line.split('|').map(str::trim).collect();
    if values.len() < FIELD_COUNT {
        debug!(line = line_no, "Skipping line with missing fields");
        return None;
    }

    Some(RateRecord {
        country: values[0].to_string(),
        currency: values[1].to_string(),
        amount: number_or_zero(line_no, "amount", values[2]),
        code: values[3].to_string(),
        rate: number_or_zero(line_no, "rate", values[4]),
    })
}

fn number_or_zero(line_no: usize, field: &str, value: &str) -> f64 {
    parse_number(value).unwrap_or_else(|| {
        warn!(line = line_no, field, value, "Unparsable number, using 0.0");
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = "07 Mar 2025 #47
Country|Currency|Amount|Code|Rate
Australia|dollar|1|AUD|14.628
Brazil|real|1|BRL|4.012
Hungary|forint|100|HUF|6.307
";

    fn source_config(url: String) -> SourceConfig {
        SourceConfig {
            url,
            timeout_secs: 2,
            retries: 0,
            retry_delay_ms: 0,
        }
    }

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/daily.txt"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[test]
    fn test_parse_rates_in_source_order() {
        let rates = parse_rates(FEED);

        assert_eq!(rates.len(), 3);
        assert_eq!(
            rates[0],
            RateRecord {
                country: "Australia".to_string(),
                currency: "dollar".to_string(),
                amount: 1.0,
                code: "AUD".to_string(),
                rate: 14.628,
            }
        );
        assert_eq!(rates[1].code, "BRL");
        assert_eq!(rates[2].code, "HUF");
        assert_eq!(rates[2].amount, 100.0);
        assert_eq!(rates[2].rate, 6.307);
    }

    #[test]
    fn test_parse_skips_short_lines() {
        let feed = "date\nheader\nAustralia|dollar|1|AUD|14.628\nbroken|line|1\n\nBrazil|real|1|BRL|4.012";
        let rates = parse_rates(feed);

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].code, "AUD");
        assert_eq!(rates[1].code, "BRL");
    }

    #[test]
    fn test_parse_too_short_feed() {
        assert!(parse_rates("").is_empty());
        assert!(parse_rates("07 Mar 2025 #47").is_empty());
        assert!(parse_rates("07 Mar 2025 #47\nCountry|Currency|Amount|Code|Rate").is_empty());
    }

    #[test]
    fn test_parse_header_only_feed_with_trailing_newline() {
        let feed = "07 Mar 2025 #47\nCountry|Currency|Amount|Code|Rate\n";
        assert!(parse_rates(feed).is_empty());
    }

    #[test]
    fn test_parse_coerces_bad_numbers_to_zero() {
        let feed = "date\nheader\nAustralia|dollar|one|AUD|n/a\n|euro|1|EUR|25.045";
        let rates = parse_rates(feed);

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].amount, 0.0);
        assert_eq!(rates[0].rate, 0.0);
        // Empty country passes through untouched
        assert_eq!(rates[1].country, "");
        assert_eq!(rates[1].rate, 25.045);
    }

    #[test]
    fn test_parse_trims_fields_and_handles_crlf() {
        let feed = "date\r\nheader\r\n  EMU | euro | 1 | EUR | 25.045 \r\n";
        let rates = parse_rates(feed);

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].country, "EMU");
        assert_eq!(rates[0].code, "EUR");
        assert_eq!(rates[0].rate, 25.045);
    }

    #[test]
    fn test_parse_keeps_extra_fields_positional() {
        let rates = parse_rates("date\nheader\nEMU|euro|1|EUR|25.045|extra");
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].rate, 25.045);
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let mock_server = create_mock_server(200, FEED).await;
        let provider =
            CnbProvider::new(&source_config(format!("{}/daily.txt", mock_server.uri()))).unwrap();

        let rates = provider.fetch().await.unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].code, "AUD");
    }

    #[tokio::test]
    async fn test_fetch_error_status_returns_empty() {
        let mock_server = create_mock_server(503, "maintenance").await;
        let provider =
            CnbProvider::new(&source_config(format!("{}/daily.txt", mock_server.uri()))).unwrap();

        let rates = provider.fetch().await.unwrap();
        assert!(rates.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_invalid_utf8_returns_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/daily.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0xfd]))
            .mount(&mock_server)
            .await;
        let provider =
            CnbProvider::new(&source_config(format!("{}/daily.txt", mock_server.uri()))).unwrap();

        let rates = provider.fetch().await.unwrap();
        assert!(rates.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_network_error_returns_empty() {
        // Nothing listens on the port once the server is dropped
        let uri = {
            let mock_server = MockServer::start().await;
            mock_server.uri()
        };
        let provider = CnbProvider::new(&source_config(format!("{uri}/daily.txt"))).unwrap();

        let rates = provider.fetch().await.unwrap();
        assert!(rates.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_timeout_returns_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/daily.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(FEED)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;
        let mut config = source_config(format!("{}/daily.txt", mock_server.uri()));
        config.timeout_secs = 1;
        let provider = CnbProvider::new(&config).unwrap();

        let rates = provider.fetch().await.unwrap();
        assert!(rates.is_empty());
    }
}
