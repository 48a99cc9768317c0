//! Completion provider abstraction.

use std::sync::Arc;

use rig::completion::{AssistantContent, CompletionModel as RigCompletionModel};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, openai};

use crate::error::{Error, Result};
use crate::request::OracleRequest;

/// Completion provider that wraps rig completion model implementations.
///
/// This is a cheaply cloneable wrapper around an `Arc<CompletionService>`.
#[derive(Clone)]
pub struct CompletionProvider(Arc<CompletionService>);

pub(crate) enum CompletionService {
    OpenAi {
        model: openai::CompletionModel,
        model_name: String,
    },
    Anthropic {
        model: anthropic::completion::CompletionModel,
        model_name: String,
    },
}

impl CompletionProvider {
    /// Creates an OpenAI completion provider with a specific model.
    pub fn openai(api_key: &str, model: &str) -> Result<Self> {
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::provider("openai", e))?
            .completions_api();
        Ok(Self(Arc::new(CompletionService::OpenAi {
            model: client.completion_model(model),
            model_name: model.to_string(),
        })))
    }

    /// Creates an Anthropic completion provider with a specific model.
    pub fn anthropic(api_key: &str, model: &str) -> Result<Self> {
        let client =
            anthropic::Client::new(api_key).map_err(|e| Error::provider("anthropic", e))?;
        Ok(Self(Arc::new(CompletionService::Anthropic {
            model: client.completion_model(model),
            model_name: model.to_string(),
        })))
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        match self.0.as_ref() {
            CompletionService::OpenAi { model_name, .. } => model_name,
            CompletionService::Anthropic { model_name, .. } => model_name,
        }
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.as_ref() {
            CompletionService::OpenAi { .. } => "openai",
            CompletionService::Anthropic { .. } => "anthropic",
        }
    }

    /// Sends a completion request built from an oracle request.
    pub async fn complete(&self, request: &OracleRequest) -> Result<String> {
        match self.0.as_ref() {
            CompletionService::OpenAi { model, .. } => {
                send_request(model, "openai", request).await
            }
            CompletionService::Anthropic { model, .. } => {
                send_request(model, "anthropic", request).await
            }
        }
    }
}

async fn send_request<M>(
    model: &M,
    provider: &'static str,
    request: &OracleRequest,
) -> Result<String>
where
    M: RigCompletionModel,
{
    let mut builder = model
        .completion_request(request.prompt.as_str())
        .max_tokens(request.max_tokens);
    if let Some(system) = &request.system {
        builder = builder.preamble(system.clone());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| Error::provider(provider, e))?;
    Ok(extract_text_content(&response.choice))
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            CompletionService::OpenAi { model_name, .. } => f
                .debug_struct("CompletionProvider::OpenAi")
                .field("model", model_name)
                .finish(),
            CompletionService::Anthropic { model_name, .. } => f
                .debug_struct("CompletionProvider::Anthropic")
                .field("model", model_name)
                .finish(),
        }
    }
}
