use anyhow::{Context, Result};
use async_openai::{Client, config::OpenAIConfig, types::CreateChatCompletionRequestArgs};

/// Chat-completion client bound to one endpoint and one model.
///
/// Used for both response generation and judge calls; every call is a
/// single blocking await with no retry and no timeout.
pub struct CompletionClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl CompletionClient {
    /// Create a client for the given endpoint, key, and model
    pub fn new(api_endpoint: &str, api_key: &str, model: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_endpoint);

        Self {
            client: Client::with_config(openai_config),
            model: model.to_string(),
        }
    }

    /// Send one user message and return the generated text
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;

        Ok(Self::extract_content(response))
    }

    /// Build a single-user-message chat completion request
    fn build_request(&self, prompt: &str) -> Result<async_openai::types::CreateChatCompletionRequest> {
        let user_message: async_openai::types::ChatCompletionRequestMessage =
            async_openai::types::ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .context("Failed to build user message")?
                .into();

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([user_message])
            .build()
            .context("Failed to build chat completion request")
    }

    /// Pull the first choice's content out of the API response
    fn extract_content(response: async_openai::types::CreateChatCompletionResponse) -> String {
        match response.choices.first() {
            Some(choice) => match &choice.message.content {
                Some(content) => content.clone(),
                None => String::new(),
            },
            None => String::new(),
        }
    }
}
