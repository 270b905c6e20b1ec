//! 統合テスト用の検索APIフェイク

#![allow(dead_code)]

use grant_scout::api::{ProjectSearch, SearchRequest};
use grant_scout::error::{GrantScoutError, Result};
use grant_scout::config::Config;
use grant_scout_common::{CandidateRecord, PiName};
use std::cell::RefCell;
use std::collections::VecDeque;

/// 事前に積んだ応答を順に返し、受けたリクエストを記録する
#[derive(Default)]
pub struct FakeSearch {
    responses: RefCell<VecDeque<Result<Vec<CandidateRecord>>>>,
    pub requests: RefCell<Vec<SearchRequest>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, records: Vec<CandidateRecord>) -> Self {
        self.responses.borrow_mut().push_back(Ok(records));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(GrantScoutError::ApiCall(message.to_string())));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ProjectSearch for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CandidateRecord>> {
        self.requests.borrow_mut().push(request.clone());
        // 応答を積み切ったら0件
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn record(title: &str, first: &str, last: &str, fy: i32) -> CandidateRecord {
    CandidateRecord {
        title: title.to_string(),
        abstract_text: Some(format!("Abstract of {}", title)),
        pi_names: vec![PiName::new(first, last)],
        fiscal_year: Some(fy),
        project_num: format!("5R01CA{:06}-0{}", fy, fy % 10),
        activity_code: "R01".to_string(),
        org_name: "MAYO CLINIC ROCHESTER".to_string(),
        ..Default::default()
    }
}

/// 待ち時間なし・小さいページの設定
pub fn test_config() -> Config {
    Config {
        search_delay_ms: 0,
        bulk_delay_ms: 0,
        page_size: 2,
        ..Default::default()
    }
}
