//! # LLM Providers
//!
//! Maps the configured provider name onto a `rig` provider client.
//! Credentials are passed through as given; a bad key fails on the first request.

use anyhow::{Result, bail};
use rig::client::CompletionClient;
use rig::providers::{anthropic, gemini, groq, openai, xai, zai};

use crate::domain::config::ModelSettings;
use crate::domain::traits::LanguageModel;
use crate::infrastructure::llm::client::RigModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Groq,
    Gemini,
    Xai,
    Zai,
}

impl Provider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "groq" => Some(Provider::Groq),
            "gemini" | "google" => Some(Provider::Gemini),
            "xai" | "grok" => Some(Provider::Xai),
            "zai" | "zhipu" | "zhipuai" => Some(Provider::Zai),
            _ => None,
        }
    }
}

/// Build the model reference for `settings`.
pub fn create_model(settings: &ModelSettings) -> Result<Box<dyn LanguageModel>> {
    let Some(provider) = Provider::from_name(&settings.provider) else {
        bail!("Unsupported model provider: {:?}", settings.provider);
    };
    let name = settings.model_name.as_str();
    let temperature = Some(settings.temperature);

    let model: Box<dyn LanguageModel> = match provider {
        Provider::OpenAi => {
            let client = openai::Client::new(&settings.api_key);
            Box::new(RigModel::new(client.completion_model(name), name, temperature))
        }
        Provider::Anthropic => {
            let client = anthropic::Client::new(&settings.api_key);
            Box::new(RigModel::new(client.completion_model(name), name, temperature))
        }
        Provider::Groq => {
            let client = groq::Client::new(&settings.api_key);
            Box::new(RigModel::new(client.completion_model(name), name, temperature))
        }
        Provider::Gemini => {
            let client = gemini::Client::new(&settings.api_key);
            Box::new(RigModel::new(client.completion_model(name), name, temperature))
        }
        Provider::Xai => {
            let client = xai::Client::new(&settings.api_key);
            Box::new(RigModel::new(client.completion_model(name), name, temperature))
        }
        Provider::Zai => {
            let client = zai::Client::new(&settings.api_key);
            Box::new(RigModel::new(client.completion_model(name), name, temperature))
        }
    };

    tracing::info!("Using {:?} model {}", provider, name);
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> ModelSettings {
        ModelSettings {
            provider: provider.into(),
            model_name: "gpt-4.1-mini".into(),
            api_key: String::new(),
            temperature: 0.3,
        }
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::from_name("OpenAI"), Some(Provider::OpenAi));
        assert_eq!(Provider::from_name("groq"), Some(Provider::Groq));
        assert_eq!(Provider::from_name("anthropic"), Some(Provider::Anthropic));
        assert_eq!(Provider::from_name("gemini"), Some(Provider::Gemini));
        assert_eq!(Provider::from_name("google"), Some(Provider::Gemini));
        assert_eq!(Provider::from_name("xai"), Some(Provider::Xai));
        assert_eq!(Provider::from_name("Grok"), Some(Provider::Xai));
        assert_eq!(Provider::from_name("zai"), Some(Provider::Zai));
        assert_eq!(Provider::from_name("zhipuai"), Some(Provider::Zai));
        assert_eq!(Provider::from_name("mistral"), None);
    }

    #[test]
    fn test_every_provider_builds_a_model() {
        for (provider, model_name) in [
            ("openai", "gpt-4.1-mini"),
            ("anthropic", "claude-sonnet-4-5"),
            ("groq", "llama-3.3-70b-versatile"),
            ("gemini", "gemini-2.5-flash"),
            ("xai", "grok-4"),
            ("zai", "glm-4.7"),
        ] {
            let mut settings = settings(provider);
            settings.model_name = model_name.into();
            let model = create_model(&settings).unwrap();
            assert_eq!(model.model_name(), model_name, "provider {}", provider);
        }
    }

    #[test]
    fn test_unsupported_provider_fails() {
        assert!(create_model(&settings("mistral")).is_err());
        assert!(create_model(&settings("")).is_err());
    }

    #[test]
    fn test_empty_api_key_is_passed_through() {
        let model = create_model(&settings("openai")).unwrap();
        assert_eq!(model.model_name(), "gpt-4.1-mini");
    }
}
