//! Scripted in-memory backend for ladder tests.

use super::backend::{Backend, BackendResponse};
use super::tiers::LADDER;
use super::types::{FetchOptions, Tier};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Base options the ladder uses for `tier`.
pub(crate) fn options_for_tier(tier: Tier) -> FetchOptions {
    LADDER
        .iter()
        .find(|(t, _)| *t == tier)
        .map(|(_, options)| options.clone())
        .unwrap()
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Page(u16, &'static str),
    Network(&'static str),
    /// Never answers within any reasonable test timeout.
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub url: String,
    pub options: FetchOptions,
}

/// Hands out scripted replies in order and records every call.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<BackendResponse, BackendError> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            options: options.clone(),
        });
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Page(status, body)) => Ok(BackendResponse {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.to_string(),
            }),
            Some(Reply::Network(msg)) => Err(BackendError::Network(msg.to_string())),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(BackendError::Timeout(Duration::from_secs(3600)))
            }
            None => Err(BackendError::Network("no scripted reply left".to_string())),
        }
    }
}
