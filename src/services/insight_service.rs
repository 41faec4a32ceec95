use std::future::Future;

use tracing::{error, warn};

use crate::clients::gemini_client::GeminiClient;
use crate::models::{Block, BlockType};

pub const MISSING_KEY_MESSAGE: &str = "Error: API Key is missing. Please check your configuration.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "I'm having trouble analyzing this right now.";
pub const FAILURE_MESSAGE: &str = "Failed to generate insight. Check logs for details.";

const TEMPERATURE: f32 = 0.3;

const SYSTEM_INSTRUCTION: &str = "\
You are a senior principal engineer and thoughtful technical collaborator acting as a \"second brain\" for a developer.
Your goal is to help the user think clearly, spot edge cases, and maintain context.
- You are NOT a code generator autopilot. Do not write large blocks of code unless specifically asked for a snippet or example.
- Focus on architectural implications, logic gaps, and clarifying requirements.
- If the user logs a decision, challenge it gently if you see flaws.
- If the user is stuck, offer a Socratic question.
- Keep responses concise, high-signal, and professional.
- Use Markdown for formatting.";

/// Produces a short piece of advice about a stream of blocks.
///
/// Never fails: problems come back as a readable message instead.
pub trait InsightGenerator {
    fn generate_insight(&self, blocks: &[Block], query: Option<&str>) -> impl Future<Output = String> + Send;
}

fn label(block_type: BlockType) -> &'static str {
    match block_type {
        BlockType::Note => "[NOTE]",
        BlockType::Task => "[TASK]",
        BlockType::Decision => "[DECISION LOG]",
        BlockType::AiInsight => "[PREVIOUS AI INSIGHT]",
        BlockType::AiUserMsg => "[USER QUESTION]",
    }
}

pub fn build_context(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| format!("{}\n{}\n---", label(b.block_type()), b.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(blocks: &[Block], query: Option<&str>) -> String {
    let context = build_context(blocks);
    match query {
        Some(query) => format!("Context:\n{}\n\nUser Question: {}", context, query),
        None => format!(
            "Analyze the current thought stream below and provide a brief insight, a potential risk, \
             or a clarifying question to help move the developer forward. Do not just summarize.\n\nContext:\n{}",
            context
        ),
    }
}

/// Insight generator backed by Gemini. Without an API key every request
/// answers with [`MISSING_KEY_MESSAGE`].
#[derive(Debug, Clone, Default)]
pub struct InsightService {
    client: Option<GeminiClient>,
}

impl InsightService {
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }

    pub fn from_config(api_key: Option<&str>, model: &str) -> Self {
        let Some(key) = api_key.filter(|k| !k.is_empty()) else {
            warn!("No Gemini API key configured; AI insights are disabled");
            return Self::default();
        };
        match GeminiClient::new(key.to_string(), model.to_string()) {
            Ok(client) => Self::new(Some(client)),
            Err(e) => {
                error!("Failed to build Gemini client: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }
}

impl InsightGenerator for InsightService {
    async fn generate_insight(&self, blocks: &[Block], query: Option<&str>) -> String {
        let Some(client) = &self.client else {
            return MISSING_KEY_MESSAGE.to_string();
        };
        let prompt = build_prompt(blocks, query);
        match client.generate(SYSTEM_INSTRUCTION, &prompt, TEMPERATURE).await {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_RESPONSE_MESSAGE.to_string(),
            Err(e) => {
                error!("Gemini API error: {}", e);
                FAILURE_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockKind;

    #[test]
    fn context_labels_each_block() {
        let blocks = vec![
            Block::new(BlockKind::Note, "cache keys"),
            Block::new(BlockKind::AiUserMsg, "what breaks?"),
        ];
        assert_eq!(build_context(&blocks), "[NOTE]\ncache keys\n---\n[USER QUESTION]\nwhat breaks?\n---");
    }

    #[test]
    fn prompt_with_query_ends_with_the_question() {
        let blocks = vec![Block::new(BlockKind::task(), "migrate")];
        let prompt = build_prompt(&blocks, Some("order?"));
        assert!(prompt.starts_with("Context:\n[TASK]\nmigrate"));
        assert!(prompt.ends_with("User Question: order?"));
    }

    #[test]
    fn review_prompt_asks_for_more_than_a_summary() {
        let prompt = build_prompt(&[], None);
        assert!(prompt.contains("Do not just summarize."));
    }

    #[tokio::test]
    async fn missing_key_degrades_to_message() {
        let service = InsightService::from_config(None, "gemini-2.5-flash");
        assert!(!service.is_enabled());
        assert_eq!(service.generate_insight(&[], None).await, MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn unreachable_service_degrades_to_message() {
        let client = GeminiClient::with_base_url("http://127.0.0.1:1".into(), "key".into(), "m".into()).unwrap();
        let service = InsightService::new(Some(client));
        assert_eq!(service.generate_insight(&[], Some("hi")).await, FAILURE_MESSAGE);
    }
}
