//! External classifier gateway
//!
//! The gateway is the only component that talks to the network. The engine
//! sees it through [`ClassifierGateway`]; tests substitute their own
//! implementations.

use crate::ai::client::{AiClient, Message};
use crate::ai::prompts::{ClassifyPromptBuilder, CLASSIFY_SYSTEM_PROMPT};
use crate::ai::{GatewayError, GatewayResult};
use crate::signals::SignalSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What the gateway is told about one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub identifier: String,
    /// Already truncated README
    pub readme: String,
    pub languages: BTreeMap<String, f64>,
    pub topics: Vec<String>,
}

impl GatewayRequest {
    pub fn from_signals(signals: &SignalSet) -> Self {
        Self {
            identifier: signals.identifier.clone(),
            readme: signals.readme.clone(),
            languages: signals.languages.clone(),
            topics: signals.topics.iter().cloned().collect(),
        }
    }
}

fn default_confidence() -> f64 {
    0.5
}

/// Structured classification as returned by the gateway, not yet validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub category: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// A classifier reachable over some transport
pub trait ClassifierGateway: Send + Sync {
    fn classify(&self, request: &GatewayRequest) -> GatewayResult<GatewayResponse>;

    /// Short label for logs
    fn name(&self) -> &str {
        "gateway"
    }
}

/// Production gateway backed by an LLM chat API
pub struct LlmGateway {
    client: AiClient,
    max_topics: usize,
    label: String,
}

impl LlmGateway {
    pub fn new(client: AiClient, max_topics: usize) -> Self {
        let label = format!("{}:{}", client.backend(), client.model());
        Self {
            client,
            max_topics,
            label,
        }
    }
}

impl ClassifierGateway for LlmGateway {
    fn classify(&self, request: &GatewayRequest) -> GatewayResult<GatewayResponse> {
        let prompt = ClassifyPromptBuilder::new(request)
            .max_topics(self.max_topics)
            .build();
        let reply = self
            .client
            .generate(vec![Message::user(prompt)], Some(CLASSIFY_SYSTEM_PROMPT))?;
        debug!("{}: {} replied with {} chars", request.identifier, self.label, reply.len());
        parse_response(&reply)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Parse the first JSON object found in an LLM reply.
///
/// Models often wrap JSON in prose or code fences, so everything outside the
/// outermost braces is ignored.
pub fn parse_response(reply: &str) -> GatewayResult<GatewayResponse> {
    let json = extract_json_object(reply)
        .ok_or_else(|| GatewayError::Parse("no JSON object in reply".to_string()))?;
    serde_json::from_str(json).map_err(|e| GatewayError::Parse(e.to_string()))
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let resp = parse_response(
            r#"{"category": "Web", "topics": ["flask", "rest-api"], "confidence": 0.9, "rationale": "Flask app"}"#,
        )
        .unwrap();
        assert_eq!(resp.category, "Web");
        assert_eq!(resp.topics, vec!["flask", "rest-api"]);
        assert_eq!(resp.confidence, 0.9);
        assert_eq!(resp.rationale.as_deref(), Some("Flask app"));
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let reply = "Sure! Here is the classification:\n```json\n{\"category\": \"cli tool\", \"topics\": []}\n```\nHope it helps.";
        let resp = parse_response(reply).unwrap();
        assert_eq!(resp.category, "cli tool");
        assert!(resp.topics.is_empty());
        assert_eq!(resp.confidence, 0.5);
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(parse_response("no json here"), Err(GatewayError::Parse(_))));
        assert!(matches!(parse_response("} backwards {"), Err(GatewayError::Parse(_))));
        assert!(matches!(parse_response(r#"{"topics": []}"#), Err(GatewayError::Parse(_))));
    }
}
