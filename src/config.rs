use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::chat::{DEFAULT_RESPONSES, ReplyPolicy};
use crate::controller::WidgetSettings;
use crate::error::WidgetError;
use crate::reveal::RevealPolicy;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Fixed seed for reply delays and picks
    #[arg(long, env = "WIDGET_SEED")]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub reveal: RevealConfig,
    pub page: PageConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub seed: Option<u64>,
    pub session_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub reply_delay_min_ms: u64,
    pub reply_delay_jitter_ms: u64,
    #[serde(default = "default_responses")]
    pub responses: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RevealConfig {
    pub threshold_divisor: f64,
    pub stagger_ms: u64,
    pub offset_px: f64,
    pub transition_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PageConfig {
    pub viewport_height: f64,
}

fn default_responses() -> Vec<String> {
    DEFAULT_RESPONSES.iter().map(ToString::to_string).collect()
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = defaults(Config::builder())?;

        // Explicit file must exist; the working-directory one is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // WIDGET_SERVER__PORT=8000, WIDGET_REVEAL__STAGGER_MS=50, ...
        builder = builder.add_source(
            Environment::with_prefix("WIDGET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(seed) = cli.seed {
            builder = builder.set_override("server.seed", seed)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Built-in defaults only, ignoring files, environment and arguments.
    pub fn from_defaults() -> Result<Self, config::ConfigError> {
        defaults(Config::builder())?.build()?.try_deserialize()
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.server.session_timeout_secs)
    }

    /// Validated widget behavior derived from the `chat` and `reveal` sections.
    pub fn widget_settings(&self) -> Result<WidgetSettings, WidgetError> {
        let reply = ReplyPolicy::new(
            Duration::from_millis(self.chat.reply_delay_min_ms),
            Duration::from_millis(self.chat.reply_delay_jitter_ms),
            self.chat.responses.clone(),
        )?;
        let reveal = RevealPolicy::new(
            self.reveal.threshold_divisor,
            Duration::from_millis(self.reveal.stagger_ms),
            self.reveal.offset_px,
            Duration::from_millis(self.reveal.transition_ms),
        )?;
        Ok(WidgetSettings { reply, reveal })
    }
}

fn defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.session_timeout_secs", 30 * 60)?
        .set_default("chat.reply_delay_min_ms", 1500)?
        .set_default("chat.reply_delay_jitter_ms", 1000)?
        .set_default("chat.responses", default_responses())?
        .set_default("reveal.threshold_divisor", 1.3)?
        .set_default("reveal.stagger_ms", 100)?
        .set_default("reveal.offset_px", 20.0)?
        .set_default("reveal.transition_ms", 500)?
        .set_default("page.viewport_height", 800.0)
}
