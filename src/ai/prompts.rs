//! Prompt templates for LLM classification

use crate::ai::GatewayRequest;
use crate::models::Category;

/// System prompt for the classification call
pub const CLASSIFY_SYSTEM_PROMPT: &str = "You are a software librarian who classifies GitHub \
repositories. You answer with a single JSON object and nothing else. Topics are short, \
lowercase and hyphenated, name technologies or purposes, and never repeat the repository \
owner or name.";

/// Builds the user prompt for one classification request
pub struct ClassifyPromptBuilder<'a> {
    request: &'a GatewayRequest,
    max_topics: usize,
}

impl<'a> ClassifyPromptBuilder<'a> {
    pub fn new(request: &'a GatewayRequest) -> Self {
        Self {
            request,
            max_topics: crate::models::DEFAULT_MAX_TOPICS,
        }
    }

    pub fn max_topics(mut self, max_topics: usize) -> Self {
        self.max_topics = max_topics;
        self
    }

    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("## Repository\n{}\n\n", self.request.identifier));

        prompt.push_str("## Languages\n");
        if self.request.languages.is_empty() {
            prompt.push_str("(none reported)\n");
        } else {
            let mut languages: Vec<(&String, &f64)> = self.request.languages.iter().collect();
            languages.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (language, share) in languages {
                prompt.push_str(&format!("- {}: {:.1}%\n", language, share * 100.0));
            }
        }
        prompt.push('\n');

        prompt.push_str("## Existing topics\n");
        if self.request.topics.is_empty() {
            prompt.push_str("(none)\n");
        } else {
            prompt.push_str(&self.request.topics.join(", "));
            prompt.push('\n');
        }
        prompt.push('\n');

        prompt.push_str("## README\n");
        if self.request.readme.trim().is_empty() {
            prompt.push_str("(no README)\n");
        } else {
            prompt.push_str("```\n");
            prompt.push_str(&self.request.readme);
            prompt.push_str("\n```\n");
        }
        prompt.push('\n');

        let categories: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
        prompt.push_str(&format!(
            "## Task\nChoose exactly one category from: {}.\n\
             Suggest up to {} topics, most relevant first.\n\
             Rate your confidence from 0.0 to 1.0.\n\n",
            categories.join(", "),
            self.max_topics
        ));

        prompt.push_str(
            "Respond with JSON only:\n\
             {\"category\": \"...\", \"topics\": [\"...\"], \"confidence\": 0.0, \"rationale\": \"one sentence\"}\n",
        );

        prompt
    }
}
