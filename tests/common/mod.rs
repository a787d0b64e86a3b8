//! Deterministic stand-ins for the playground, share services and Slack.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rustbot::bot::Dispatcher;
use rustbot::core::models::{EvaluationResult, MessageEvent, UserRecord};
use rustbot::errors::BotError;
use rustbot::playground::{Evaluate, Share, SnippetTemplate};
use rustbot::slack::Transport;

pub const TEMPLATE: &str = "fn main() {\n    $snippet\n}\n";

/// Returns the same result for every input and records the code it saw.
pub struct StubEvaluator {
    pub result: EvaluationResult,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl StubEvaluator {
    pub fn new(result: EvaluationResult) -> Self {
        Self {
            result,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Evaluate for StubEvaluator {
    async fn evaluate(&self, code: &str) -> EvaluationResult {
        self.seen.lock().unwrap().push(code.to_string());
        self.result.clone()
    }
}

pub struct StubShare {
    pub url: Option<String>,
}

#[async_trait]
impl Share for StubShare {
    async fn share(&self, _code: &str) -> Result<String, BotError> {
        self.url
            .clone()
            .ok_or_else(|| BotError::SharingError("no data.url".to_string()))
    }
}

pub fn dispatcher(result: EvaluationResult, share_url: Option<&str>) -> Dispatcher {
    Dispatcher::new(
        SnippetTemplate::new(TEMPLATE).unwrap(),
        Box::new(StubEvaluator::new(result)),
        Box::new(StubShare {
            url: share_url.map(ToString::to_string),
        }),
        1500,
    )
}

/// In-memory transport: queued event batches in, sent messages out.
#[derive(Default)]
pub struct MockTransport {
    pub connect_fails: bool,
    pub user: Option<UserRecord>,
    pub batches: VecDeque<Vec<MessageEvent>>,
    pub fail_when_drained: bool,
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub looked_up: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), BotError> {
        if self.connect_fails {
            return Err(BotError::TransportError("invalid_auth".to_string()));
        }
        Ok(())
    }

    async fn lookup_user(&self, user_id: &str) -> Result<UserRecord, BotError> {
        self.looked_up.lock().unwrap().push(user_id.to_string());
        self.user
            .clone()
            .ok_or_else(|| BotError::TransportError("user_not_found".to_string()))
    }

    async fn poll_events(&mut self) -> Result<Vec<MessageEvent>, BotError> {
        match self.batches.pop_front() {
            Some(batch) => Ok(batch),
            None if self.fail_when_drained => {
                Err(BotError::TransportError("Socket Mode stream ended".to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), BotError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}
