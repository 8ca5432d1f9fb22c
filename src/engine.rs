//! Classification and scoring engine
//!
//! Ties the components together for one repository at a time:
//!
//! ```text
//! RawSnapshot -> SignalSet -> rule candidate ─┐
//!                          -> LLM outcome ────┴─> merge -> preferred tags -> FinalTopics
//!                          -> health rules -> HealthReport
//! ```
//!
//! Configuration is validated once in [`Engine::new`]. Afterwards the engine
//! is shared immutably, so a batch can be assessed in parallel without locks.

use crate::ai::{
    AiClient, ClassifierGateway, GatewayError, GatewayResult, LlmBackend, LlmClassifier, LlmGateway,
    LlmOutcome, UnavailableReason,
};
use crate::classifier::RuleClassifier;
use crate::config::{EngineConfig, LlmSettings, UserConfig};
use crate::describe::propose_description;
use crate::error::EngineResult;
use crate::grouping::{self, CategoryBucket, CategoryGroup, GroupMember, ThemeOrder, ThemeOrders, DEFAULT_THEME};
use crate::health::{EvalContext, GradeThresholds, HealthEvaluator, HealthReport, PortfolioHealth};
use crate::merge::merge;
use crate::models::{ClassificationCandidate, MergedClassification};
use crate::preferred::{FinalTopics, PreferredTagResolver};
use crate::signals::{extract_with_limit, RawSnapshot, SignalSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-call choices that are not part of the engine configuration
#[derive(Debug, Clone)]
pub struct AssessOptions {
    /// Rule set to score against; no health report when `None`
    pub rule_set: Option<String>,
    pub theme: String,
    /// Consult the LLM classifier when one is attached
    pub use_llm: bool,
    pub ctx: EvalContext,
}

impl Default for AssessOptions {
    fn default() -> Self {
        Self {
            rule_set: Some("general".to_string()),
            theme: DEFAULT_THEME.to_string(),
            use_llm: true,
            ctx: EvalContext::default(),
        }
    }
}

/// Classification of one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub identifier: String,
    pub merged: MergedClassification,
    pub topics: FinalTopics,
    /// Why the LLM candidate was not used, when it was attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_unavailable: Option<String>,
}

/// Everything the engine says about one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub identifier: String,
    pub classification: MergedClassification,
    pub topics: FinalTopics,
    /// Final topics the repository does not carry yet
    pub new_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthReport>,
    pub bucket: CategoryBucket,
}

pub struct Engine {
    classifier: RuleClassifier,
    llm: Option<LlmClassifier>,
    resolver: PreferredTagResolver,
    health: HealthEvaluator,
    themes: ThemeOrders,
    max_topics: usize,
    readme_limit: usize,
}

impl Engine {
    /// Build an engine from validated configuration. No LLM is attached.
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let classifier = RuleClassifier::new(config.tag_tables()?)?;
        let resolver = PreferredTagResolver::new(&config.preferred_tags)
            .max_topics(config.max_topics)
            .preferred_only(config.preferred_only);
        let health = HealthEvaluator::new(config.rule_registry()?, config.grade_thresholds());
        let themes = config.theme_orders()?;

        debug!(
            "Engine ready: {} rule sets, {} themes, {} preferred tags",
            health.registry().names().len(),
            themes.names().len(),
            config.preferred_tags.len()
        );

        Ok(Self {
            classifier,
            llm: None,
            resolver,
            health,
            themes,
            max_topics: config.max_topics,
            readme_limit: config.readme_limit,
        })
    }

    /// Engine with built-in tables, rule sets and themes
    pub fn builtin() -> EngineResult<Self> {
        Self::new(&EngineConfig::default())
    }

    /// Attach an LLM classifier
    pub fn with_llm(mut self, llm: LlmClassifier) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn max_topics(&self) -> usize {
        self.max_topics
    }

    pub fn health(&self) -> &HealthEvaluator {
        &self.health
    }

    pub fn grades(&self) -> &GradeThresholds {
        self.health.grades()
    }

    pub fn themes(&self) -> &ThemeOrders {
        &self.themes
    }

    pub fn theme(&self, name: &str) -> &ThemeOrder {
        self.themes.get(name)
    }

    /// Signal extraction with the configured README limit
    pub fn extract(&self, raw: &RawSnapshot) -> EngineResult<SignalSet> {
        extract_with_limit(raw, self.readme_limit)
    }

    pub fn classify_rule(&self, signals: &SignalSet) -> ClassificationCandidate {
        self.classifier.classify(signals, self.max_topics)
    }

    /// Rule classification, merged with the LLM when `use_llm` and one is attached
    pub fn classify(&self, signals: &SignalSet, use_llm: bool) -> Classification {
        let rule = self.classify_rule(signals);
        let llm = match (&self.llm, use_llm) {
            (Some(llm), true) => llm.classify(signals, self.max_topics),
            _ => LlmOutcome::Unavailable(UnavailableReason::NotConfigured),
        };
        let llm_unavailable = match (&llm, &self.llm, use_llm) {
            (LlmOutcome::Unavailable(reason), Some(_), true) => Some(reason.to_string()),
            _ => None,
        };

        let merged = merge(&rule, &llm, self.max_topics);
        let topics = self.resolver.resolve(&merged, Some(signals));
        Classification {
            identifier: signals.identifier.clone(),
            merged,
            topics,
            llm_unavailable,
        }
    }

    /// Health report as of now
    pub fn evaluate(&self, signals: &SignalSet, rule_set: &str) -> EngineResult<HealthReport> {
        self.health.evaluate(signals, rule_set)
    }

    pub fn evaluate_with(
        &self,
        signals: &SignalSet,
        rule_set: &str,
        ctx: &EvalContext,
    ) -> EngineResult<HealthReport> {
        self.health.evaluate_with(signals, rule_set, ctx)
    }

    pub fn bucket(&self, merged: &MergedClassification, theme: &str) -> CategoryBucket {
        grouping::bucket(merged, self.themes.get(theme))
    }

    pub fn group(&self, members: &[GroupMember], theme: &str) -> Vec<CategoryGroup> {
        grouping::group(members, self.themes.get(theme))
    }

    pub fn portfolio(&self, reports: &[HealthReport], min_score: f64) -> PortfolioHealth {
        PortfolioHealth::from_reports(reports, min_score, self.health.grades())
    }

    /// Extract, classify, score and bucket one snapshot
    pub fn assess(&self, raw: &RawSnapshot, options: &AssessOptions) -> EngineResult<Assessment> {
        let signals = self.extract(raw)?;
        self.assess_signals(&signals, options)
    }

    pub fn assess_signals(&self, signals: &SignalSet, options: &AssessOptions) -> EngineResult<Assessment> {
        // Unknown rule sets fail before any gateway call is spent
        if let Some(name) = &options.rule_set {
            self.health.registry().get(name)?;
        }

        let classification = self.classify(signals, options.use_llm);
        let health = match &options.rule_set {
            Some(name) => Some(self.health.evaluate_with(signals, name, &options.ctx)?),
            None => None,
        };

        let new_topics = classification
            .topics
            .names()
            .into_iter()
            .filter(|t| !signals.topics.contains(*t))
            .map(str::to_string)
            .collect();
        let proposed_description = propose_description(signals, &classification.merged);
        let bucket = self.bucket(&classification.merged, &options.theme);

        Ok(Assessment {
            identifier: classification.identifier,
            classification: classification.merged,
            topics: classification.topics,
            new_topics,
            proposed_description,
            health,
            bucket,
        })
    }

    /// Assess many snapshots on a pool of `workers` threads.
    ///
    /// Returns one result per input, in input order.
    pub fn assess_batch(
        &self,
        snapshots: &[RawSnapshot],
        options: &AssessOptions,
        workers: usize,
    ) -> Vec<EngineResult<Assessment>> {
        let run = || -> Vec<EngineResult<Assessment>> {
            snapshots
                .par_iter()
                .map(|raw| self.assess(raw, options))
                .collect()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("repolens-worker-{}", i))
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("Failed to build worker pool ({}), using the global pool", e);
                run()
            }
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            "Assessed {} repositories ({} failed)",
            results.len() - failed,
            failed
        );
        results
    }
}

/// Build the production LLM classifier from project settings and user credentials
pub fn build_llm(settings: &LlmSettings, user: &UserConfig, max_topics: usize) -> GatewayResult<LlmClassifier> {
    let backend = settings.backend.unwrap_or_else(|| user.backend());
    let api_key = user
        .api_key_for(backend)
        .ok_or_else(|| GatewayError::MissingApiKey {
            env_var: backend.env_key().to_string(),
            signup_url: backend.signup_url().to_string(),
        })?;

    let mut ai_config = settings.ai_config(backend);
    if ai_config.model.is_none() {
        ai_config.model = user.model_for(backend).map(str::to_string);
    }
    if ai_config.api_url.is_none() && backend == LlmBackend::Ollama {
        ai_config.api_url = user.ollama_url();
    }

    let client = AiClient::new(ai_config, api_key);
    let gateway = LlmGateway::new(client, max_topics);
    info!("LLM classification enabled via {}", gateway.name());

    Ok(LlmClassifier::new(Arc::new(gateway))
        .with_timeout(settings.timeout())
        .with_max_concurrency(settings.max_concurrency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GatewayRequest, GatewayResponse};
    use crate::error::EngineError;
    use crate::models::{CandidateSource, Category, Provenance};

    struct Fixed(GatewayResponse);

    impl ClassifierGateway for Fixed {
        fn classify(&self, _: &GatewayRequest) -> GatewayResult<GatewayResponse> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    impl ClassifierGateway for Down {
        fn classify(&self, _: &GatewayRequest) -> GatewayResult<GatewayResponse> {
            Err(GatewayError::Request("connection refused".into()))
        }
    }

    fn raw(json: &str) -> RawSnapshot {
        serde_json::from_str(json).unwrap()
    }

    fn flask() -> RawSnapshot {
        raw(r#"{
            "full_name": "octo/todo-api",
            "description": "Flask REST API for todo lists",
            "languages": {"Python": 9000, "HTML": 1000},
            "readme": "A Flask app exposing a REST API backed by SQLite.",
            "topics": []
        }"#)
    }

    #[test]
    fn test_assess_rule_only() {
        let engine = Engine::builtin().unwrap();
        let options = AssessOptions {
            rule_set: Some("professional".into()),
            ..AssessOptions::default()
        };
        let a = engine.assess(&flask(), &options).unwrap();
        assert_eq!(a.identifier, "octo/todo-api");
        assert_eq!(a.classification.category, Category::Web);
        assert!(!a.classification.llm_used);
        assert!(a.new_topics.contains(&"flask".to_string()));
        assert!(a.proposed_description.is_none());
        let health = a.health.unwrap();
        assert_eq!(health.outcome("missing_license"), Some(crate::health::Outcome::Fail));
        assert_eq!(a.bucket.category, Category::Web);
    }

    #[test]
    fn test_llm_merge() {
        let engine = Engine::builtin().unwrap().with_llm(LlmClassifier::new(Arc::new(Fixed(
            GatewayResponse {
                category: "Web Application".into(),
                topics: vec!["flask".into(), "todo".into()],
                confidence: 0.95,
                rationale: None,
            },
        ))));
        let signals = engine.extract(&flask()).unwrap();
        let c = engine.classify(&signals, true);
        assert!(c.merged.llm_used);
        assert_eq!(c.merged.category_source, CandidateSource::Llm);
        assert_eq!(c.merged.confidence, 0.95);
        let todo = c.merged.topics.iter().find(|t| t.topic == "todo").unwrap();
        assert_eq!(todo.provenance, Provenance::FromLlm);
        assert!(c.llm_unavailable.is_none());
    }

    #[test]
    fn test_unavailable_llm_equals_rule_only() {
        let down = Engine::builtin()
            .unwrap()
            .with_llm(LlmClassifier::new(Arc::new(Down)));
        let plain = Engine::builtin().unwrap();
        let signals = plain.extract(&flask()).unwrap();

        let degraded = down.classify(&signals, true);
        let rule_only = plain.classify(&signals, true);
        assert_eq!(degraded.merged, rule_only.merged);
        assert_eq!(degraded.topics, rule_only.topics);
        assert!(degraded.llm_unavailable.is_some());
        assert!(rule_only.llm_unavailable.is_none());
    }

    #[test]
    fn test_no_llm_flag_skips_gateway() {
        let engine = Engine::builtin()
            .unwrap()
            .with_llm(LlmClassifier::new(Arc::new(Down)));
        let signals = engine.extract(&flask()).unwrap();
        let c = engine.classify(&signals, false);
        assert!(!c.merged.llm_used);
        assert!(c.llm_unavailable.is_none());
    }

    #[test]
    fn test_unknown_rule_set_is_fatal() {
        let engine = Engine::builtin().unwrap();
        let options = AssessOptions {
            rule_set: Some("nope".into()),
            ..AssessOptions::default()
        };
        assert!(matches!(
            engine.assess(&flask(), &options),
            Err(EngineError::UnknownRuleSet { .. })
        ));
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_errors() {
        let engine = Engine::builtin().unwrap();
        let snapshots = vec![
            flask(),
            raw(r#"{"description": "no identifier"}"#),
            raw(r#"{"full_name": "octo/dotfiles"}"#),
        ];
        let results = engine.assess_batch(&snapshots, &AssessOptions::default(), 2);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().identifier, "octo/todo-api");
        assert!(matches!(results[1], Err(EngineError::MalformedSnapshot { .. })));
        assert_eq!(results[2].as_ref().unwrap().identifier, "octo/dotfiles");
    }

    #[test]
    fn test_without_health() {
        let engine = Engine::builtin().unwrap();
        let options = AssessOptions {
            rule_set: None,
            ..AssessOptions::default()
        };
        assert!(engine.assess(&flask(), &options).unwrap().health.is_none());
    }

    #[test]
    fn test_build_llm_requires_key() {
        let settings = LlmSettings {
            enabled: true,
            backend: Some(LlmBackend::OpenRouter),
            ..LlmSettings::default()
        };
        let user = UserConfig::default();
        assert!(matches!(
            build_llm(&settings, &user, 10),
            Err(GatewayError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_build_llm_ollama_needs_no_key() {
        let settings = LlmSettings {
            enabled: true,
            backend: Some(LlmBackend::Ollama),
            ..LlmSettings::default()
        };
        let llm = build_llm(&settings, &UserConfig::default(), 10).unwrap();
        assert!(llm.gateway_name().starts_with("ollama:"));
    }
}
