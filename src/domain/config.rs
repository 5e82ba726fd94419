//! # Configuration
//!
//! Resolves the runtime mode, the Coral connection parameters and the model settings
//! from the process environment. In development mode a local `.env` file is merged first.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::traits::EnvSource;
use crate::strings::prompts::AGENT_DESCRIPTION;

pub const RUNTIME_VAR: &str = "CORAL_ORCHESTRATION_RUNTIME";
pub const SSE_URL_VAR: &str = "CORAL_SSE_URL";
pub const AGENT_ID_VAR: &str = "CORAL_AGENT_ID";
pub const MODEL_PROVIDER_VAR: &str = "MODEL_PROVIDER";
pub const MODEL_NAME_VAR: &str = "MODEL_NAME";
pub const API_KEY_VAR: &str = "API_KEY";
pub const MODEL_TEMPERATURE_VAR: &str = "MODEL_TEMPERATURE";
pub const MODEL_TOKEN_VAR: &str = "MODEL_TOKEN";
pub const PROJECT_DIR_VAR: &str = "PROJECT_DIR";

/// How the agent was launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Docker,
    Executable,
    Development,
}

impl RuntimeMode {
    /// Anything other than `docker` or `executable` (including unset) is development.
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("docker") => RuntimeMode::Docker,
            Some("executable") => RuntimeMode::Executable,
            _ => RuntimeMode::Development,
        }
    }

    pub fn is_deployed(&self) -> bool {
        !matches!(self, RuntimeMode::Development)
    }
}

/// Read the runtime mode and, in development mode, merge the local `.env` file.
pub fn resolve_runtime(env: &mut impl EnvSource) -> RuntimeMode {
    let mode = RuntimeMode::from_value(env.var(RUNTIME_VAR).as_deref());
    if !mode.is_deployed() {
        match env.load_dotenv() {
            Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
            Ok(None) => info!("No .env file found, using process environment"),
            Err(e) => warn!("Failed to load .env file: {:#}", e),
        }
    }
    mode
}

/// Parameters identifying this agent to the Coral server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationParams {
    pub base_url: String,
    pub agent_id: String,
    pub agent_description: String,
}

impl CoordinationParams {
    /// Missing values are kept empty; the transport reports the failure.
    pub fn from_env(env: &impl EnvSource) -> Self {
        Self {
            base_url: env.var(SSE_URL_VAR).unwrap_or_default(),
            agent_id: env.var(AGENT_ID_VAR).unwrap_or_default(),
            agent_description: AGENT_DESCRIPTION.to_string(),
        }
    }

    /// `{base_url}?agentId=…&agentDescription=…` with form-encoded values.
    pub fn connection_url(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("agentId", &self.agent_id)
            .append_pair("agentDescription", &self.agent_description)
            .finish();
        format!("{}?{}", self.base_url, query)
    }
}

/// Fields of the model reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub provider: String,
    pub model_name: String,
    pub api_key: String,
    pub temperature: f64,
}

impl ModelSettings {
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        let raw = require(env, MODEL_TEMPERATURE_VAR)?;
        let temperature = raw.trim().parse::<f64>().with_context(|| {
            format!("{} must be a floating-point number, got {:?}", MODEL_TEMPERATURE_VAR, raw)
        })?;

        Ok(Self {
            provider: env.var(MODEL_PROVIDER_VAR).unwrap_or_default(),
            model_name: env.var(MODEL_NAME_VAR).unwrap_or_default(),
            api_key: env.var(API_KEY_VAR).unwrap_or_default(),
            temperature,
        })
    }
}

/// Everything needed to construct the chat agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: ModelSettings,
    /// Context budget in tokens. A zero or negative `MODEL_TOKEN` disables trimming.
    pub token_limit: Option<usize>,
}

impl AgentSettings {
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        let model = ModelSettings::from_env(env)?;
        let raw = require(env, MODEL_TOKEN_VAR)?;
        let token_limit = raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{} must be an integer, got {:?}", MODEL_TOKEN_VAR, raw))?;
        let token_limit = usize::try_from(token_limit).ok().filter(|limit| *limit > 0);

        Ok(Self { model, token_limit })
    }
}

fn require(env: &impl EnvSource, key: &str) -> Result<String> {
    env.var(key)
        .with_context(|| format!("Environment variable {} is not set", key))
}

/// Process-level settings assembled at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: RuntimeMode,
    pub coordination: CoordinationParams,
    pub project_dir: Option<PathBuf>,
    pub poll_interval: Duration,
    pub code_timeout: Duration,
}

impl AppConfig {
    /// `cli_project_dir` wins over `PROJECT_DIR`; relative paths are made absolute
    /// against the directory the process started in.
    pub fn resolve(
        env: &mut impl EnvSource,
        cli_project_dir: Option<PathBuf>,
        poll_interval: Duration,
        code_timeout: Duration,
    ) -> Result<Self> {
        let mode = resolve_runtime(env);
        let coordination = CoordinationParams::from_env(env);
        let project_dir = cli_project_dir
            .or_else(|| {
                env.var(PROJECT_DIR_VAR)
                    .filter(|dir| !dir.trim().is_empty())
                    .map(PathBuf::from)
            })
            .map(|dir| std::path::absolute(&dir))
            .transpose()
            .context("Failed to resolve project directory")?;

        Ok(Self {
            mode,
            coordination,
            project_dir,
            poll_interval,
            code_timeout,
        })
    }
}

/// Make `dir` the process working directory for the rest of the run.
///
/// A missing directory is reported as a warning and the change is still attempted,
/// so the failure surfaces from the change itself. Returns the previous directory.
pub fn enter_project_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        warn!("Project directory {} does not exist", dir.display());
    }
    let previous = std::env::current_dir().context("Failed to read current directory")?;
    std::env::set_current_dir(dir)
        .with_context(|| format!("Failed to change working directory to {}", dir.display()))?;
    info!("Working directory set to {}", dir.display());
    Ok(previous)
}

/// The real process environment, backed by `dotenvy` for `.env` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn load_dotenv(&mut self) -> Result<Option<PathBuf>> {
        match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e).context("Malformed .env file"),
        }
    }
}

/// An in-memory environment. `dotenv` entries are merged on `load_dotenv`
/// without overriding values that are already set.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    pub vars: std::collections::HashMap<String, String>,
    pub dotenv: Option<std::collections::HashMap<String, String>>,
    pub dotenv_loaded: bool,
}

#[cfg(test)]
impl MapEnv {
    pub fn new<K: Into<String>, V: Into<String>>(vars: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Default::default()
        }
    }

    pub fn with_dotenv<K: Into<String>, V: Into<String>>(
        mut self,
        vars: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.dotenv = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }
}

#[cfg(test)]
impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn load_dotenv(&mut self) -> Result<Option<PathBuf>> {
        self.dotenv_loaded = true;
        let Some(file) = &self.dotenv else {
            return Ok(None);
        };
        for (key, value) in file {
            self.vars
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(Some(PathBuf::from(".env")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_env(temperature: &str, tokens: &str) -> MapEnv {
        MapEnv::new([
            (MODEL_PROVIDER_VAR, "openai"),
            (MODEL_NAME_VAR, "gpt-4.1-mini"),
            (API_KEY_VAR, "sk-test"),
            (MODEL_TEMPERATURE_VAR, temperature),
            (MODEL_TOKEN_VAR, tokens),
        ])
    }

    #[test]
    fn test_runtime_mode_defaults_to_development() {
        assert_eq!(RuntimeMode::from_value(None), RuntimeMode::Development);
        assert_eq!(RuntimeMode::from_value(Some("devmode")), RuntimeMode::Development);
        assert_eq!(RuntimeMode::from_value(Some("docker")), RuntimeMode::Docker);
        assert_eq!(RuntimeMode::from_value(Some("executable")), RuntimeMode::Executable);
    }

    #[test]
    fn test_development_loads_dotenv_before_reading_connection() {
        let mut env = MapEnv::default().with_dotenv([
            (SSE_URL_VAR, "http://localhost:5555/sse"),
            (AGENT_ID_VAR, "coding1"),
        ]);

        let mode = resolve_runtime(&mut env);
        let params = CoordinationParams::from_env(&env);

        assert_eq!(mode, RuntimeMode::Development);
        assert!(env.dotenv_loaded);
        assert_eq!(params.base_url, "http://localhost:5555/sse");
        assert_eq!(params.agent_id, "coding1");
    }

    #[test]
    fn test_deployed_modes_skip_dotenv() {
        for runtime in ["docker", "executable"] {
            let mut env = MapEnv::new([
                (RUNTIME_VAR, runtime),
                (SSE_URL_VAR, "http://coral:5555/sse"),
                (AGENT_ID_VAR, "coding1"),
            ])
            .with_dotenv([(AGENT_ID_VAR, "from-file")]);

            let mode = resolve_runtime(&mut env);
            let params = CoordinationParams::from_env(&env);

            assert!(mode.is_deployed());
            assert!(!env.dotenv_loaded);
            assert_eq!(params.agent_id, "coding1");
            assert_eq!(params.base_url, "http://coral:5555/sse");
        }
    }

    #[test]
    fn test_connection_url_encodes_params() {
        let mut env = MapEnv::new([(SSE_URL_VAR, "http://x/sse"), (AGENT_ID_VAR, "coding1")]);
        resolve_runtime(&mut env);
        let params = CoordinationParams::from_env(&env);

        assert_eq!(
            params.connection_url(),
            "http://x/sse?agentId=coding1&agentDescription=\
             A+coding+agent+that+can+write+code%2C+make+necessary+changes+and+correction+to+code\
             +if+there+is+any+error+according+to+the+library%2Fdocumentation+provided."
        );
        assert!(!params.connection_url().contains(' '));
    }

    #[test]
    fn test_missing_connection_values_pass_through_empty() {
        let params = CoordinationParams::from_env(&MapEnv::default());
        assert!(params.connection_url().starts_with("?agentId=&agentDescription="));
    }

    #[test]
    fn test_agent_settings_parse() {
        let settings = AgentSettings::from_env(&model_env("0.3", "16000")).unwrap();
        assert_eq!(settings.token_limit, Some(16000));
        assert_eq!(settings.model.temperature, 0.3);
        assert_eq!(settings.model.provider, "openai");
    }

    #[test]
    fn test_agent_settings_reject_bad_numbers() {
        assert!(AgentSettings::from_env(&model_env("warm", "16000")).is_err());
        assert!(AgentSettings::from_env(&model_env("0.3", "lots")).is_err());
        assert!(AgentSettings::from_env(&model_env("0.3", "16000.5")).is_err());
        assert!(AgentSettings::from_env(&MapEnv::default()).is_err());
    }

    #[test]
    fn test_non_positive_token_limit_disables_trimming() {
        for raw in ["-1", "0", " -16000 "] {
            let settings = AgentSettings::from_env(&model_env("0.3", raw)).unwrap();
            assert_eq!(settings.token_limit, None);
        }
    }

    #[test]
    fn test_missing_api_key_is_not_checked() {
        let mut env = model_env("0", "8000");
        env.vars.remove(API_KEY_VAR);
        let settings = AgentSettings::from_env(&env).unwrap();
        assert_eq!(settings.model.api_key, "");
    }

    #[test]
    fn test_project_dir_cli_overrides_env() {
        let mut env = MapEnv::new([(RUNTIME_VAR, "docker"), (PROJECT_DIR_VAR, "/srv/from-env")]);
        let config = AppConfig::resolve(
            &mut env,
            Some(PathBuf::from("/srv/from-cli")),
            Duration::from_secs(10),
            Duration::from_secs(120),
        )
        .unwrap();
        assert_eq!(config.project_dir, Some(PathBuf::from("/srv/from-cli")));

        let config = AppConfig::resolve(
            &mut env,
            None,
            Duration::from_secs(10),
            Duration::from_secs(120),
        )
        .unwrap();
        assert_eq!(config.project_dir, Some(PathBuf::from("/srv/from-env")));
    }

    #[test]
    fn test_enter_missing_project_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let before = std::env::current_dir().unwrap();

        assert!(enter_project_dir(&missing).is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
