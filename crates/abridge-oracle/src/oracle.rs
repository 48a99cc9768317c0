//! The oracle trait seam.

use async_trait::async_trait;

use crate::TRACING_TARGET;
use crate::error::Result;
use crate::provider::CompletionProvider;
use crate::request::OracleRequest;
use crate::response::OracleResponse;

/// A text-generation capability invoked by the pipeline.
///
/// Each call site builds an [`OracleRequest`] and treats the response as an
/// opaque payload to decode and validate. Implementations must be safe to
/// invoke concurrently, even though the chapter pass never does.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Performs one completion call.
    async fn invoke(&self, request: &OracleRequest) -> Result<OracleResponse>;
}

/// An oracle backed by a rig completion provider.
#[derive(Debug, Clone)]
pub struct RigOracle {
    provider: CompletionProvider,
}

impl RigOracle {
    /// Creates an oracle over a completion provider.
    pub fn new(provider: CompletionProvider) -> Self {
        Self { provider }
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &CompletionProvider {
        &self.provider
    }
}

#[async_trait]
impl Oracle for RigOracle {
    #[tracing::instrument(
        skip(self, request),
        fields(
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            kind = %request.kind.as_ref(),
            stage = request.stage,
        ),
        target = TRACING_TARGET,
    )]
    async fn invoke(&self, request: &OracleRequest) -> Result<OracleResponse> {
        let text = self.provider.complete(request).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            response_bytes = text.len(),
            "Completion call finished"
        );
        Ok(OracleResponse::new(text))
    }
}
