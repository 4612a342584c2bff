use crate::ai::llm::{ChatMessage, ChatModel, CompletionRequest};

pub const DEFAULT_TITLE: &str = "New Conversation";

/// Output budget for a title; a few words in Bangla.
const TITLE_MAX_TOKENS: u32 = 20;

const TITLE_INSTRUCTIONS: &str = "You are a helpful assistant that creates Bangla titles for \
    conversations. You will be given a user's message and you will need to create a Bangla title \
    for the conversation. Create a very short title in Bangla (maximum 3-4 words) that captures \
    the essence of the user's message. Be extremely concise while remaining descriptive.";

/// Ask the model for a short subject line; any failure yields [`DEFAULT_TITLE`].
pub async fn generate_title(model: &dyn ChatModel, model_name: &str, first_message: &str) -> String {
    if first_message.trim().is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    let request = CompletionRequest::new(
        model_name,
        vec![
            ChatMessage::system(TITLE_INSTRUCTIONS),
            ChatMessage::user(first_message),
        ],
    )
    .with_max_tokens(TITLE_MAX_TOKENS);

    match model.complete(request).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => DEFAULT_TITLE.to_string(),
        Err(e) => {
            tracing::error!("Error generating title: {:#}", e);
            DEFAULT_TITLE.to_string()
        }
    }
}
