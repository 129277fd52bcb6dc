pub mod generate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "adforge")]
#[command(about = "Resilient generation backend for marketing campaign ideation")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// TOML configuration file (defaults to $ADFORGE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Attempts per call, including the first
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Backoff base delay in milliseconds
    #[arg(long, global = true)]
    pub base_delay_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate free-form text
    Text {
        /// Prompt text
        prompt: String,
        /// Model override
        #[arg(short, long)]
        model: Option<String>,
        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f32>,
    },
    /// Generate structured JSON output
    Json {
        /// Prompt text
        prompt: String,
        /// JSON schema file constraining the output
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Model override
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Generate an image
    Image {
        /// Prompt text
        prompt: String,
        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,
        /// Use the pro image model
        #[arg(long)]
        pro: bool,
        /// Aspect ratio, e.g. 1:1 or 9:16
        #[arg(long, default_value = "1:1")]
        aspect_ratio: String,
        /// Reference image (file path or data URL)
        #[arg(short, long)]
        reference: Option<String>,
    },
    /// Show the effective configuration
    Config {
        /// Also write the settings (without the API key) to this TOML file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        let rt = Runtime::new()?;

        rt.block_on(async {
            match self.command {
                Commands::Text {
                    prompt,
                    model,
                    temperature,
                } => generate::handle_text_command(&config, prompt, model, temperature).await,
                Commands::Json {
                    prompt,
                    schema,
                    model,
                } => generate::handle_json_command(&config, prompt, schema, model).await,
                Commands::Image {
                    prompt,
                    output,
                    pro,
                    aspect_ratio,
                    reference,
                } => {
                    generate::handle_image_command(
                        &config,
                        prompt,
                        output,
                        pro,
                        aspect_ratio,
                        reference,
                    )
                    .await
                }
                Commands::Config { write } => generate::handle_config_command(&config, write),
            }
        })
    }

    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;

        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(base_delay_ms) = self.base_delay_ms {
            config.retry.base_delay = Duration::from_millis(base_delay_ms);
        }

        config.validate()?;
        Ok(config)
    }
}
