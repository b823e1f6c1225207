use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::collectors::{Collected, PostCollector};
use crate::config::BlueskyConfig;
use crate::error::AppError;
use crate::models::post::{RawPost, Source};

/// Characters that encodeURIComponent does NOT encode.
const ENCODE_URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const APP_BASE: &str = "https://bsky.app";

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    posts: Vec<PostView>,
}

#[derive(Debug, Deserialize)]
struct PostView {
    uri: String,
    author: Author,
    record: PostRecord,
}

#[derive(Debug, Deserialize)]
struct Author {
    handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    #[serde(default)]
    text: String,
    created_at: String,
}

pub struct BlueskyCollector {
    config: BlueskyConfig,
    http: reqwest::Client,
}

impl BlueskyCollector {
    pub fn new(config: BlueskyConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    async fn login(&self) -> Result<String, AppError> {
        let url = format!(
            "{}/xrpc/com.atproto.server.createSession",
            self.config.service_url
        );
        let resp = self
            .http
            .post(&url)
            .json(&SessionRequest {
                identifier: &self.config.identifier,
                password: &self.config.password,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AppError::Fetch(format!(
                "Bluesky login returned {}",
                resp.status()
            )));
        }

        let session: Session = resp.json().await?;
        Ok(session.access_jwt)
    }

    async fn search(&self, token: &str, term: &str) -> Result<Vec<PostView>, AppError> {
        let url = format!(
            "{}/xrpc/app.bsky.feed.searchPosts?q={}&limit={}",
            self.config.service_url,
            urlencoded(term),
            self.config.limit
        );
        let resp = self.http.get(&url).bearer_auth(token).send().await?;

        if !resp.status().is_success() {
            return Err(AppError::Fetch(format!(
                "search '{term}' returned {}",
                resp.status()
            )));
        }

        let data: SearchResponse = resp.json().await?;
        Ok(data.posts)
    }
}

#[async_trait]
impl PostCollector for BlueskyCollector {
    fn source(&self) -> Source {
        Source::Bluesky
    }

    async fn collect(&self) -> Result<Collected, AppError> {
        tracing::info!(
            "Scraping Bluesky ({} searches)...",
            self.config.search_terms.len()
        );
        let token = self.login().await?;

        let mut collected = Collected::default();
        let mut seen = HashSet::new();
        for term in &self.config.search_terms {
            match self.search(&token, term).await {
                Ok(views) => {
                    let fresh = views.into_iter().filter(|v| seen.insert(v.uri.clone()));
                    collected.posts.extend(fresh.filter_map(to_raw_post));
                }
                Err(e) => collected.record_failure(format!("Bluesky search '{term}'"), e),
            }
        }
        Ok(collected)
    }
}

/// URL-encode a string for use in query parameters.
fn urlencoded(s: &str) -> String {
    utf8_percent_encode(s, ENCODE_URI_COMPONENT_SET).to_string()
}

/// Bluesky has no title/body split: the post text is the title and the
/// body stays empty.
fn to_raw_post(view: PostView) -> Option<RawPost> {
    let created_at = match DateTime::parse_from_rfc3339(&view.record.created_at) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            tracing::debug!("Skipping {}: bad createdAt: {e}", view.uri);
            return None;
        }
    };
    let rkey = view.uri.rsplit('/').next().unwrap_or_default();
    Some(RawPost {
        source: Source::Bluesky,
        channel: Source::Bluesky.to_string(),
        url: format!("{APP_BASE}/profile/{}/post/{rkey}", view.author.handle),
        title: view.record.text,
        body: String::new(),
        created_at,
        author: Some(view.author.handle),
    })
}
