//! RePORTER 検索APIクライアント
//!
//! リクエストは常に1件ずつ送り、送信前に固定の待ち時間を入れる。

pub mod strategy;
pub mod types;

pub use strategy::{bulk_request, strategies_for, SearchStrategy};
pub use types::{Criteria, SearchRequest, SearchResponse};

use crate::error::{GrantScoutError, Result};
use grant_scout_common::CandidateRecord;
use reqwest::header;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const TARGET_API_REQUEST: &str = "api_request";

/// 検索APIの境界
///
/// 条件を渡すと0件以上の候補を返すか、失敗する。
pub trait ProjectSearch {
    fn search(&self, request: &SearchRequest) -> impl Future<Output = Result<Vec<CandidateRecord>>>;
}

/// NIH RePORTER `/v2/projects/search` クライアント
pub struct ReporterClient {
    client: reqwest::Client,
    url: String,
    delay: Duration,
}

impl ReporterClient {
    pub fn new(url: impl Into<String>, delay: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            delay,
        })
    }
}

impl ProjectSearch for ReporterClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CandidateRecord>> {
        // レート制限対策
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        debug!(
            target: TARGET_API_REQUEST,
            "POST {} offset={} limit={}", self.url, request.offset, request.limit
        );

        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GrantScoutError::ApiCall(format!(
                "{}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: SearchResponse = response.json().await?;
        let projects = payload.into_records();
        debug!(target: TARGET_API_REQUEST, "received {} projects", projects.len());

        Ok(projects)
    }
}
