use std::time::Duration;

use anyhow::{anyhow, bail, Context as _, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_INSTANCE: &str = "https://hachyderm.io";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub instance: Option<String>,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: u32,
    pub resolve: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 1,
            resolve: true,
        }
    }
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("mastodon client user agent required");
        }
        let instance = config
            .instance
            .unwrap_or_else(|| DEFAULT_INSTANCE.to_string());
        let base_url = Url::parse(&instance)
            .with_context(|| format!("mastodon: invalid instance url {instance:?}"))?;
        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    pub fn status(&self, id: &str) -> Result<Status> {
        self.get_json(&["api", "v1", "statuses", id], &[])
            .with_context(|| format!("mastodon: fetch status {id}"))
    }

    pub fn context(&self, id: &str) -> Result<Context> {
        self.get_json(&["api", "v1", "statuses", id, "context"], &[])
            .with_context(|| format!("mastodon: fetch context of {id}"))
    }

    pub fn search_statuses(&self, query: &str, opts: SearchOptions) -> Result<Vec<Status>> {
        let params = vec![
            ("q".to_string(), query.to_string()),
            ("type".to_string(), "statuses".to_string()),
            ("limit".to_string(), opts.limit.to_string()),
            ("resolve".to_string(), opts.resolve.to_string()),
        ];
        let results: SearchResults = self
            .get_json(&["api", "v2", "search"], &params)
            .context("mastodon: search statuses")?;
        Ok(results.statuses)
    }

    fn get_json<T>(&self, segments: &[&str], params: &[(String, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self.request(segments, params)?;
        let value = resp.json::<T>().context("mastodon: decode response")?;
        Ok(value)
    }

    // Segments are appended to the instance path and percent-encoded, so an
    // id can never leak into the query or fragment.
    fn request(&self, segments: &[&str], params: &[(String, String)]) -> Result<Response> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("mastodon: instance url {} cannot be a base", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }

        tracing::debug!(%url, "mastodon request");
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            match status.as_u16() {
                404 => Err(anyhow!("mastodon: not found")),
                429 => Err(anyhow!("mastodon: rate limited: {}", body)),
                _ => Err(anyhow!("mastodon: api error {}: {}", status, body)),
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub uri: String,
    pub created_at: DateTime<Utc>,
    pub account: Account,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reblogs_count: i64,
    #[serde(default)]
    pub favourites_count: Option<i64>,
    #[serde(default)]
    pub replies_count: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub in_reply_to_id: Option<String>,
    #[serde(default)]
    pub in_reply_to_account_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    pub ancestors: Vec<Status>,
    pub descendants: Vec<Status>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SearchResults {
    #[serde(default)]
    statuses: Vec<Status>,
}
