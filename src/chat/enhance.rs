use serde::Deserialize;

use crate::ai::llm::{ChatMessage, ChatModel, CompletionRequest};

/// Where the user is, where they want to go, and what work they want.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserContext {
    pub country: Option<String>,
    pub country_choice: Option<String>,
    pub job_choice: Option<String>,
}

impl UserContext {
    fn field(value: &Option<String>) -> &str {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
    }

    pub fn country(&self) -> &str {
        Self::field(&self.country)
    }

    pub fn country_choice(&self) -> &str {
        Self::field(&self.country_choice)
    }

    pub fn job_choice(&self) -> &str {
        Self::field(&self.job_choice)
    }
}

/// Instructions for rewriting a user's message into a specific, actionable query.
pub fn enhancement_prompt(ctx: &UserContext) -> String {
    let country = ctx.country();
    format!(
        "You are a prompt enhancer helping migrant workers from Bangladesh (who may not be \
         familiar with how to ask questions effectively in chatbots) ask better questions to an \
         AI assistant. The user is currently in {country}. Your job is to rewrite their input so \
         that the AI gives very specific, detailed, and actionable answers.\n\n\
         The improved prompt should:\n\
         1. Clarify the original request without changing the meaning.\n\
         2. Be written in simple English. The user may prompt in Bangla, so you should translate \
         it to English.\n\
         3. Ask for exact, step-by-step help, not general advice.\n\
         4. If relevant, request real contact information, such as:\n   \
            - Names of offices or people to contact\n   \
            - Physical addresses\n   \
            - Phone numbers\n   \
            - Email addresses\n\
         5. Consider the user's current location ({country}) when enhancing the prompt.\n\
         6. If it is relevant, you may use the information that the user wants to go to \
         ({country_choice}) and work in {job_choice}.\n\
         7. If the user's prompt is a single word like \"yes\", \"no\", \"ok\", \"thanks\", \
         \"hello\" etc. just return the same prompt.\n\n\
         Output ONLY the improved prompt, nothing else. If the user's prompt does not need any \
         improvement, just return the same prompt.",
        country = country,
        country_choice = ctx.country_choice(),
        job_choice = ctx.job_choice(),
    )
}

/// System instruction for the answering model. Fixes the reply language.
pub fn answer_prompt(ctx: &UserContext) -> String {
    format!(
        "You are a helpful assistant for migrant workers from Bangladesh. You MUST answer in \
         Bangla, even if user asks in English. For context, user is currently in {}, and wants \
         to go to {} and work in {}.",
        ctx.country(),
        ctx.country_choice(),
        ctx.job_choice(),
    )
}

/// Outcome of the best-effort rewrite step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enhancement {
    Rewritten(String),
    /// The rewrite failed; carry on with the user's own words.
    Fallback { original: String, reason: String },
}

impl Enhancement {
    /// The text to send on.
    pub fn content(&self) -> &str {
        match self {
            Self::Rewritten(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            Self::Rewritten(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }
}

/// Ask `model` to rewrite `latest`. Never fails: errors and blank answers
/// become [`Enhancement::Fallback`].
pub async fn enhance(
    model: &dyn ChatModel,
    model_name: &str,
    ctx: &UserContext,
    latest: &str,
) -> Enhancement {
    let request = CompletionRequest::new(
        model_name,
        vec![
            ChatMessage::system(enhancement_prompt(ctx)),
            ChatMessage::user(latest),
        ],
    );

    match model.complete(request).await {
        Ok(text) if !text.trim().is_empty() => Enhancement::Rewritten(text.trim().to_string()),
        Ok(_) => Enhancement::Fallback {
            original: latest.to_string(),
            reason: "empty rewrite".to_string(),
        },
        Err(e) => Enhancement::Fallback {
            original: latest.to_string(),
            reason: format!("{:#}", e),
        },
    }
}
