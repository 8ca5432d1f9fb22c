//! LLM classifier adapter
//!
//! Turns a gateway call into either a validated [`ClassificationCandidate`]
//! or an explicit [`LlmOutcome::Unavailable`]. Nothing that goes wrong on the
//! LLM path is ever surfaced as an error.

use crate::ai::gateway::{ClassifierGateway, GatewayRequest, GatewayResponse};
use crate::ai::GatewayError;
use crate::classifier::dedupe_and_cap;
use crate::models::{normalize_topic, CandidateSource, Category, ClassificationCandidate};
use crate::signals::SignalSet;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Why no LLM candidate is available
#[derive(Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    NotConfigured,
    Timeout(Duration),
    Gateway(String),
    InvalidCategory(String),
    Malformed(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NotConfigured => write!(f, "LLM not configured"),
            UnavailableReason::Timeout(d) => write!(f, "timed out after {:?}", d),
            UnavailableReason::Gateway(msg) => write!(f, "gateway error: {}", msg),
            UnavailableReason::InvalidCategory(c) => write!(f, "unrecognised category '{}'", c),
            UnavailableReason::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl From<GatewayError> for UnavailableReason {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Timeout(d) => UnavailableReason::Timeout(d),
            GatewayError::Parse(msg) => UnavailableReason::Malformed(msg),
            other => UnavailableReason::Gateway(other.to_string()),
        }
    }
}

/// Result of asking the LLM for a classification
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutcome {
    Candidate(ClassificationCandidate),
    Unavailable(UnavailableReason),
}

impl LlmOutcome {
    pub fn candidate(&self) -> Option<&ClassificationCandidate> {
        match self {
            LlmOutcome::Candidate(c) => Some(c),
            LlmOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, LlmOutcome::Candidate(_))
    }
}

/// Validate a raw gateway response into a candidate.
///
/// The category must map onto the taxonomy; confidence is clamped into
/// [0, 1] with non-finite values treated as 0; topics are normalized,
/// deduplicated by root and capped.
pub fn candidate_from_response(
    response: GatewayResponse,
    max_topics: usize,
) -> Result<ClassificationCandidate, UnavailableReason> {
    let category = Category::parse_loose(&response.category)
        .ok_or_else(|| UnavailableReason::InvalidCategory(response.category.clone()))?;

    let confidence = if response.confidence.is_finite() {
        response.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let topics = dedupe_and_cap(
        response.topics.iter().filter_map(|t| normalize_topic(t)),
        max_topics,
    );

    let rationale = response
        .rationale
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    Ok(ClassificationCandidate {
        category,
        topics,
        confidence,
        source: CandidateSource::Llm,
        rationale,
    })
}

/// Classify through `gateway` with no timeout of its own
pub fn classify_llm(
    signals: &SignalSet,
    gateway: &dyn ClassifierGateway,
    max_topics: usize,
) -> LlmOutcome {
    let request = GatewayRequest::from_signals(signals);
    let outcome = call_gateway(gateway, &request)
        .and_then(|response| candidate_from_response(response, max_topics));
    finish(&signals.identifier, gateway.name(), outcome)
}

/// One gateway call, with errors and panics folded into a reason
fn call_gateway(
    gateway: &dyn ClassifierGateway,
    request: &GatewayRequest,
) -> Result<GatewayResponse, UnavailableReason> {
    match catch_unwind(AssertUnwindSafe(|| gateway.classify(request))) {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(e.into()),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(UnavailableReason::Gateway(format!("gateway panicked: {}", msg)))
        }
    }
}

fn finish(
    identifier: &str,
    gateway: &str,
    outcome: Result<ClassificationCandidate, UnavailableReason>,
) -> LlmOutcome {
    match outcome {
        Ok(candidate) => LlmOutcome::Candidate(candidate),
        Err(reason) => {
            warn!("{}: {} unavailable ({}), using rules only", identifier, gateway, reason);
            LlmOutcome::Unavailable(reason)
        }
    }
}

/// Counting semaphore built on a bounded channel
#[derive(Clone)]
struct Permits {
    give: Sender<()>,
    take: Receiver<()>,
}

impl Permits {
    fn new(count: usize) -> Self {
        let count = count.max(1);
        let (give, take) = bounded(count);
        for _ in 0..count {
            // Capacity equals count, so this cannot block or fail
            let _ = give.try_send(());
        }
        Self { give, take }
    }

    fn acquire(&self) -> Permit {
        let _ = self.take.recv();
        Permit {
            give: self.give.clone(),
        }
    }

    /// Wait for a permit until `deadline`
    fn acquire_by(&self, deadline: Instant) -> Option<Permit> {
        self.take.recv_deadline(deadline).ok().map(|_| Permit {
            give: self.give.clone(),
        })
    }
}

/// Held for the whole gateway call, including by a worker that outlives its caller
struct Permit {
    give: Sender<()>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.give.try_send(());
    }
}

/// LLM classifier with a caller-imposed timeout and concurrency bound
#[derive(Clone)]
pub struct LlmClassifier {
    gateway: Arc<dyn ClassifierGateway>,
    timeout: Option<Duration>,
    permits: Option<Permits>,
}

impl LlmClassifier {
    pub fn new(gateway: Arc<dyn ClassifierGateway>) -> Self {
        Self {
            gateway,
            timeout: None,
            permits: None,
        }
    }

    /// Give up on a call after `timeout` and degrade to `Unavailable`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Allow at most `limit` gateway calls in flight
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.permits = Some(Permits::new(limit));
        self
    }

    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    /// Classify one repository.
    ///
    /// With a timeout, waiting for a concurrency permit counts against it and
    /// the call runs on a worker thread that keeps its permit until the
    /// gateway returns, so abandoned calls still count as in flight.
    pub fn classify(&self, signals: &SignalSet, max_topics: usize) -> LlmOutcome {
        let timeout = match self.timeout {
            Some(t) => t,
            None => {
                let _permit = self.permits.as_ref().map(Permits::acquire);
                return classify_llm(signals, self.gateway.as_ref(), max_topics);
            }
        };

        let deadline = Instant::now() + timeout;
        let permit = match &self.permits {
            Some(permits) => match permits.acquire_by(deadline) {
                Some(permit) => Some(permit),
                None => {
                    let waited = Err(UnavailableReason::Timeout(timeout));
                    return finish(&signals.identifier, self.gateway.name(), waited);
                }
            },
            None => None,
        };

        let request = GatewayRequest::from_signals(signals);
        let gateway = Arc::clone(&self.gateway);
        let (tx, rx) = bounded(1);
        let spawned = std::thread::Builder::new()
            .name("repolens-llm".to_string())
            .spawn(move || {
                let _permit = permit;
                // Receiver may be gone after a timeout
                let _ = tx.send(call_gateway(gateway.as_ref(), &request));
            });

        let outcome = match spawned {
            Err(e) => Err(UnavailableReason::Gateway(format!("could not spawn worker: {}", e))),
            Ok(_) => match rx.recv_deadline(deadline) {
                Ok(result) => result.and_then(|response| candidate_from_response(response, max_topics)),
                Err(RecvTimeoutError::Timeout) => Err(UnavailableReason::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(UnavailableReason::Gateway("gateway worker exited".to_string()))
                }
            },
        };
        finish(&signals.identifier, self.gateway.name(), outcome)
    }
}
