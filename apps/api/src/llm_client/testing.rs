//! Scripted completion client for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    ChatMessage, CompletionClient, CompletionClientFactory, CompletionError, CompletionParams,
};

/// Replays queued responses in order, counting every call and capturing its request.
/// Once the queue is drained it returns `fallback` if set, else a malformed-response error.
#[derive(Default)]
pub struct StubCompletionClient {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(Vec<ChatMessage>, CompletionParams)>>,
}

impl StubCompletionClient {
    pub fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn always(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(Vec<ChatMessage>, CompletionParams)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for StubCompletionClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), params));

        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(text) => Ok(text.clone()),
            None => Err(CompletionError::MalformedResponse(
                "stub has no scripted response".to_string(),
            )),
        }
    }
}

/// Hands out the same stub for every key and records which keys were requested.
pub struct StubClientFactory {
    pub client: Arc<StubCompletionClient>,
    keys: Mutex<Vec<String>>,
}

impl StubClientFactory {
    pub fn new(client: StubCompletionClient) -> Self {
        Self {
            client: Arc::new(client),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

impl CompletionClientFactory for StubClientFactory {
    fn for_api_key(&self, api_key: &str) -> Arc<dyn CompletionClient> {
        self.keys.lock().unwrap().push(api_key.to_string());
        self.client.clone()
    }
}
