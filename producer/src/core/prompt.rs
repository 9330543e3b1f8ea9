//! Prompt construction per category

use shared::Category;

use super::processor::{ANSWER_MARKER, QUESTION_MARKER};

pub const DEFAULT_DATASET_NAME: &str = "OpenLLM-QA";

/// Builds the request prompt for a category (pure)
#[derive(Debug, Clone)]
pub struct PromptHandler {
    dataset_name: String,
}

impl PromptHandler {
    pub fn new() -> Self {
        Self::with_dataset_name(DEFAULT_DATASET_NAME)
    }

    pub fn with_dataset_name(name: impl Into<String>) -> Self {
        Self { dataset_name: name.into() }
    }

    pub fn build_prompt(&self, category: &Category) -> String {
        format!(
            "You are contributing to the dataset '{dataset}'.\n\
             Write exactly one clear, useful question about the topic: **{category}**.\n\
             Then answer it in detailed, friendly, fluent English.\n\n\
             Use this format and nothing else:\n\
             {q} <question>\n\
             {a} <answer>",
            dataset = self.dataset_name,
            category = category,
            q = QUESTION_MARKER,
            a = ANSWER_MARKER,
        )
    }
}

impl Default for PromptHandler {
    fn default() -> Self {
        Self::new()
    }
}
