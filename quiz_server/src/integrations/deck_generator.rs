use std::{sync::Arc, time::Duration};

use log::*;
use quiz_engine::{
    db_types::Question,
    traits::{DeckProvider, DeckProviderError, DeckRequest, GeneratedDeck},
};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::Deserialize;

use crate::config::DeckGeneratorConfig;

/// Client for the question generation service.
///
/// The service receives a [`DeckRequest`] as JSON and replies with either `{ "topic": .., "questions": [..] }` or a
/// bare array of questions.
#[derive(Clone)]
pub struct DeckGeneratorClient {
    url: String,
    timeout: Duration,
    client: Arc<Client>,
}

impl DeckGeneratorClient {
    pub fn new(config: DeckGeneratorConfig) -> Result<Self, DeckProviderError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeckProviderError::RequestFailed(e.to_string()))?;
        Ok(Self { url: config.url, timeout: config.timeout, client: Arc::new(client) })
    }
}

impl DeckProvider for DeckGeneratorClient {
    async fn generate_deck(&self, request: DeckRequest) -> Result<GeneratedDeck, DeckProviderError> {
        if self.url.is_empty() {
            return Err(DeckProviderError::RequestFailed("No deck generator is configured".into()));
        }
        trace!("🃏️ Requesting {} questions on '{}' from {}", request.count, request.subject, self.url);
        let response = self.client.post(&self.url).json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("🃏️ Deck generator did not answer within {:?}", self.timeout);
                DeckProviderError::Timeout
            } else {
                DeckProviderError::RequestFailed(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeckProviderError::RequestFailed(format!("{status}: {message}")));
        }
        let body = response.bytes().await.map_err(|e| DeckProviderError::RequestFailed(e.to_string()))?;
        parse_generated_deck(&body, &request.subject)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratorResponse {
    Deck {
        #[serde(default)]
        topic: String,
        questions: Vec<Question>,
    },
    Questions(Vec<Question>),
}

/// Parses the generator's reply. Replies without a topic are given `default_topic`.
fn parse_generated_deck(body: &[u8], default_topic: &str) -> Result<GeneratedDeck, DeckProviderError> {
    let response = serde_json::from_slice::<GeneratorResponse>(body)
        .map_err(|e| DeckProviderError::InvalidDeck(format!("Could not read generated questions. {e}")))?;
    let (topic, questions) = match response {
        GeneratorResponse::Deck { topic, questions } => (topic, questions),
        GeneratorResponse::Questions(questions) => (String::default(), questions),
    };
    let topic = if topic.trim().is_empty() { default_topic.to_string() } else { topic };
    Ok(GeneratedDeck { topic, questions })
}
