// src/settings.rs
// Command-line and environment configuration.

use crate::error::ConfigError;
use crate::panel::Intent;
use crate::remote_api::ConfigUpdate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_PANEL_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser, Debug)]
#[command(
    name = "ollama-remote-panel",
    version,
    about = "Terminal control panel for an ollama-remote daemon"
)]
pub struct Cli {
    /// Panel base URL; a `t` query parameter is used as the token
    #[arg(long, env = "OLLAMA_REMOTE_URL", default_value = DEFAULT_PANEL_URL)]
    pub url: String,

    /// Access token sent with every request
    #[arg(long, env = "OLLAMA_REMOTE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File holding the last model and prompt
    #[arg(long, env = "OLLAMA_REMOTE_STATE")]
    pub state_file: Option<PathBuf>,

    /// Per-request timeout; calls wait indefinitely when unset
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write logs here while the TUI is running
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List installed models
    List,
    /// Run a prompt against a model
    Run {
        model: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Pull a model
    Pull { model: String },
    /// Show or change the daemon configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Command {
    /// The intent a headless invocation performs. Model names are trimmed
    /// the same way the TUI inputs are.
    pub fn into_intent(self) -> Intent {
        match self {
            Command::List => Intent::ListModels,
            Command::Run { model, prompt } => Intent::RunPrompt {
                model: model.trim().to_string(),
                prompt: prompt.join(" "),
            },
            Command::Pull { model } => Intent::PullModel {
                model: model.trim().to_string(),
            },
            Command::Config {
                action: ConfigAction::Show,
            } => Intent::LoadConfig,
            Command::Config {
                action: ConfigAction::Set(args),
            } => Intent::SaveConfig(args.into()),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    Show,
    Set(ConfigSetArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSetArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub lang: Option<String>,
    #[arg(long)]
    pub mode: Option<String>,
    #[arg(long)]
    pub ollama_exe: Option<String>,
    #[arg(long = "unsafe")]
    pub unsafe_mode: Option<bool>,
    #[arg(long)]
    pub no_proxy_auto: Option<bool>,
}

impl From<ConfigSetArgs> for ConfigUpdate {
    fn from(args: ConfigSetArgs) -> Self {
        ConfigUpdate {
            host: args.host,
            lang: args.lang,
            mode: args.mode,
            ollama_exe: args.ollama_exe,
            unsafe_mode: args.unsafe_mode,
            no_proxy_auto: args.no_proxy_auto,
        }
    }
}

/// Validated connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: Url,
    pub token: String,
    pub state_file: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let raw = cli.url.trim();
        let mut base_url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_string()));
        }

        let url_token = base_url
            .query_pairs()
            .find(|(k, _)| k == "t")
            .map(|(_, v)| v.into_owned());
        let token = cli
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or(url_token)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        base_url.set_query(None);
        base_url.set_fragment(None);

        let state_file = cli.state_file.clone().or_else(default_state_file);

        Ok(Self {
            base_url,
            token,
            state_file,
            timeout: cli.timeout_secs.map(Duration::from_secs),
        })
    }
}

fn default_state_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ollama-remote").join("ui-state.json"))
}
