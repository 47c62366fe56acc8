//! Prompt construction and the generator seam.
//!
//! docrag stops at the prompt: the generative call itself belongs to an
//! external collaborator behind the [`Generator`] trait, which owns its own
//! retry and backoff policy.

use anyhow::Result;
use async_trait::async_trait;

/// Fixed wording around the context block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: String,
    pub instructions: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: "Eres un asistente conciso. Responde SOLO usando la información del CONTEXTO. \
                     Si no está en el contexto, di que no lo sabes."
                .to_string(),
            instructions: "Responde en español.".to_string(),
        }
    }
}

impl PromptTemplate {
    /// Lay out system text, context, question, and instructions as
    /// bracketed sections separated by blank lines.
    pub fn render(&self, query: &str, context: &str) -> String {
        format!(
            "[SISTEMA]\n{}\n\n[CONTEXTO]\n{}\n\n[PREGUNTA]\n{}\n\n[INSTRUCCIONES]\n{}",
            self.system, context, query, self.instructions
        )
    }
}

/// Render a prompt with the default template.
pub fn build_prompt(query: &str, context: &str) -> String {
    PromptTemplate::default().render(query, context)
}

/// A text generator that turns a prompt into an answer.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
