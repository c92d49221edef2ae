#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use airank_reader::error::FetchError;
use airank_reader::models::{DataFile, Metadata, RankingType, ToolRecord};
use airank_reader::Fetcher;

pub enum Reply {
    File(DataFile),
    Status(u16),
    Garbage,
}

/// Fetcher that answers from a fixed script and records every request.
pub struct ScriptedFetcher {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
    on_fetch: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            on_fetch: None,
        }
    }

    pub fn reply(mut self, path: &str, reply: Reply) -> Self {
        self.replies.insert(path.to_string(), reply);
        self
    }

    /// Runs `hook` at the start of every fetch, before the reply is produced.
    pub fn on_fetch(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_fetch = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, path: &str) -> Result<DataFile, FetchError> {
        self.calls.lock().unwrap().push(path.to_string());
        if let Some(hook) = &self.on_fetch {
            hook(path);
        }
        match self.replies.get(path) {
            Some(Reply::File(file)) => Ok(file.clone()),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                url: path.to_string(),
                status: *status,
            }),
            Some(Reply::Garbage) => Err(FetchError::Decode {
                url: path.to_string(),
                source: serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
            }),
            None => Err(FetchError::Status {
                url: path.to_string(),
                status: 404,
            }),
        }
    }

    fn base(&self) -> String {
        "scripted://".to_string()
    }
}

pub fn tool(id: &str, monthly_visits: f64) -> ToolRecord {
    ToolRecord {
        id: id.to_string(),
        name: format!("Tool {id}"),
        url: format!("https://{id}.example"),
        description: format!("{id} does things"),
        monthly_visits,
        tags: vec!["AI".to_string()],
        ..Default::default()
    }
}

pub fn regional_tool(id: &str, region: &str, region_visits: f64) -> ToolRecord {
    ToolRecord {
        top_region: Some(region.to_string()),
        top_region_share: Some(1.0),
        ..tool(id, region_visits)
    }
}

pub fn ranking_file(language: &str, ranking: RankingType, data: Vec<ToolRecord>) -> DataFile {
    DataFile {
        metadata: Metadata {
            last_updated: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            ranking_type: ranking,
            language: language.to_string(),
            total_items: data.len(),
        },
        data,
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
