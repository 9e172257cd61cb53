use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::GenerationError;
use crate::log::Transcript;
use crate::prompt::GenerationRequest;

pub mod gemini;

/// One generation call: prompt in, extracted HTML out.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn send(&self, api_key: &str, req: &GenerationRequest) -> Result<String, GenerationError>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config, transcript: Option<Transcript>) -> Result<DynProvider> {
    match cfg.provider {
        ProviderKind::Gemini => {
            let mut p = gemini::GeminiProvider::new(
                cfg.endpoint.clone(),
                cfg.model.clone(),
                cfg.timeout_secs.map(Duration::from_secs),
            )?;
            if let Some(t) = transcript {
                p = p.with_transcript(t);
            }
            Ok(Box::new(p))
        }
    }
}
