use anyhow::{anyhow, Context, Result};

use crate::models::{KupoDatumResponse, KupoMatch, Utxo};

const RETRIES: u32 = 10;
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Thin client over a Kupo indexer's HTTP API.
#[derive(Clone)]
pub struct KupoApi {
    api_url: String,
    client: reqwest::Client,
}

impl KupoApi {
    pub fn new(api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 minutes for large queries
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(api_url, client))
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: crate::utils::remove_trailing_slash(api_url),
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_matches_url(&self, match_pattern: &str, unspent: bool) -> String {
        let base = format!("{}/matches/{}", self.api_url, match_pattern);
        if unspent {
            format!("{}?unspent", base)
        } else {
            base
        }
    }

    fn build_datum_url(&self, hash: &str) -> String {
        format!("{}/datums/{}", self.api_url, hash)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("rate_limited"));
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("kupo request {} failed", url))?;
        Ok(response.json::<T>().await?)
    }

    /// Outputs matching a Kupo pattern: an address, a `policy.name` asset,
    /// `policy.*`, or an output reference.
    pub async fn get(&self, match_pattern: &str, unspent: bool) -> Result<Vec<Utxo>> {
        let url = self.build_matches_url(match_pattern, unspent);
        let url = url.as_str();
        let matches: Vec<KupoMatch> =
            crate::utils::retry(RETRIES, RETRY_BASE_DELAY_MS, move || self.fetch(url)).await?;
        tracing::debug!(pattern = match_pattern, count = matches.len(), "kupo matches");
        Ok(matches.into_iter().map(Utxo::from).collect())
    }

    /// Datum cbor (hex) for a datum hash.
    pub async fn datum(&self, hash: &str) -> Result<String> {
        let url = self.build_datum_url(hash);
        let url = url.as_str();
        let response: Option<KupoDatumResponse> =
            crate::utils::retry(RETRIES, RETRY_BASE_DELAY_MS, move || self.fetch(url)).await?;
        response
            .map(|r| r.datum)
            .ok_or_else(|| anyhow!("no datum found for hash {}", hash))
    }
}
