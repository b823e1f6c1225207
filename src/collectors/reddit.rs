use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::collectors::{Collected, PostCollector};
use crate::config::RedditConfig;
use crate::error::AppError;
use crate::models::post::{RawPost, Source};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const WEB_BASE: &str = "https://reddit.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    created_utc: f64,
    author: Option<String>,
}

pub struct RedditCollector {
    config: RedditConfig,
    http: reqwest::Client,
}

impl RedditCollector {
    pub fn new(config: RedditConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Script-app password grant.
    async fn access_token(&self) -> Result<String, AppError> {
        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AppError::Fetch(format!(
                "Reddit token endpoint returned {}",
                resp.status()
            )));
        }

        let token: TokenResponse = resp.json().await?;
        match (token.access_token, token.error) {
            (Some(t), _) => Ok(t),
            (None, Some(e)) => Err(AppError::Fetch(format!("Reddit login rejected: {e}"))),
            (None, None) => Err(AppError::Fetch(
                "Reddit token response had no access_token".to_string(),
            )),
        }
    }

    async fn fetch_subreddit(&self, token: &str, sub: &str) -> Result<Vec<RawPost>, AppError> {
        let url = format!("{API_BASE}/r/{sub}/new?limit={}", self.config.limit);
        let resp = self.http.get(&url).bearer_auth(token).send().await?;

        if !resp.status().is_success() {
            return Err(AppError::Fetch(format!("r/{sub} returned {}", resp.status())));
        }

        let listing: Listing = resp.json().await?;
        Ok(parse_listing(sub, listing))
    }
}

#[async_trait]
impl PostCollector for RedditCollector {
    fn source(&self) -> Source {
        Source::Reddit
    }

    async fn collect(&self) -> Result<Collected, AppError> {
        tracing::info!(
            "Scraping Reddit ({} subreddits)...",
            self.config.subreddits.len()
        );
        let token = self.access_token().await?;

        let mut collected = Collected::default();
        for sub in &self.config.subreddits {
            match self.fetch_subreddit(&token, sub).await {
                Ok(posts) => {
                    tracing::debug!("r/{sub}: {} posts", posts.len());
                    collected.posts.extend(posts);
                }
                Err(e) => collected.record_failure(channel(sub), e),
            }
        }
        Ok(collected)
    }
}

fn channel(sub: &str) -> String {
    format!("Reddit/r/{sub}")
}

fn parse_listing(sub: &str, listing: Listing) -> Vec<RawPost> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|child| {
            let post = child.data;
            let created_at = DateTime::from_timestamp(post.created_utc as i64, 0)?;
            Some(RawPost {
                source: Source::Reddit,
                channel: channel(sub),
                title: post.title,
                body: post.selftext,
                url: format!("{WEB_BASE}{}", post.permalink),
                created_at,
                author: post.author.filter(|a| a != "[deleted]"),
            })
        })
        .collect()
}
