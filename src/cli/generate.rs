use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::services::google_ai::{CallRequest, GoogleAiClient, ImageModel, InlineData};
use crate::services::{extract_json_value, GenerationService};

fn build_service(config: &AppConfig) -> Result<GenerationService<GoogleAiClient>> {
    let client = GoogleAiClient::new(config.google_ai_config()?)?;
    Ok(GenerationService::new(client, config.retry))
}

/// Token cancelled on Ctrl-C so an in-flight retry sequence stops at its
/// next suspension point.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling request");
            trigger.cancel();
        }
    });
    token
}

fn print_usage(input_tokens: u32, output_tokens: u32) {
    eprintln!("Tokens: {input_tokens} in / {output_tokens} out");
}

pub async fn handle_text_command(
    config: &AppConfig,
    prompt: String,
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<()> {
    let service = build_service(config)?;

    let mut request = CallRequest::text(model.unwrap_or_else(|| config.text_model.clone()), prompt);
    if let Some(temperature) = temperature {
        request = request.with_temperature(temperature);
    }

    let result = service
        .call_with_retry_cancellable(&request, &ctrl_c_token())
        .await?;

    println!("{}", result.text);
    print_usage(result.usage.input_tokens, result.usage.output_tokens);
    Ok(())
}

pub async fn handle_json_command(
    config: &AppConfig,
    prompt: String,
    schema: Option<PathBuf>,
    model: Option<String>,
) -> Result<()> {
    let service = build_service(config)?;

    let mut request = CallRequest::text(model.unwrap_or_else(|| config.text_model.clone()), prompt);
    if let Some(schema_path) = schema {
        request = request.with_response_schema(load_schema(&schema_path)?);
    }

    let result = service
        .call_with_retry_cancellable(&request, &ctrl_c_token())
        .await?;

    let value = extract_json_value(&result.text);
    if value.as_object().is_some_and(|object| object.is_empty()) {
        eprintln!("Warning: the model returned no usable JSON");
    }

    println!("{}", serde_json::to_string_pretty(&value)?);
    print_usage(result.usage.input_tokens, result.usage.output_tokens);
    Ok(())
}

pub async fn handle_image_command(
    config: &AppConfig,
    prompt: String,
    output: PathBuf,
    pro: bool,
    aspect_ratio: String,
    reference: Option<String>,
) -> Result<()> {
    let service = build_service(config)?;
    let image_model = if pro { ImageModel::Pro } else { config.image_model };

    let mut request = CallRequest::text(image_model.model_id(), prompt).with_aspect_ratio(aspect_ratio);
    if let Some(reference) = reference {
        request = request
            .with_reference_image(load_reference(&reference)?)
            .with_text("Use the subject in the provided image as reference.");
    }

    let token = ctrl_c_token();
    let result = service.call_with_retry_cancellable(&request, &token).await?;

    let image = result
        .inline_data
        .context("The model returned no image data")?;
    fs::write(&output, image.decode()?)
        .with_context(|| format!("Failed to write image: {}", output.display()))?;

    println!("Saved {} image to {}", image.mime_type, output.display());
    print_usage(result.usage.input_tokens, result.usage.output_tokens);
    Ok(())
}

pub fn handle_config_command(config: &AppConfig, write: Option<PathBuf>) -> Result<()> {
    println!("API key:          {}", config.masked_api_key());
    println!("Base URL:         {}", config.base_url);
    println!("Text model:       {}", config.text_model);
    println!("Image model:      {}", config.image_model.model_id());
    println!("Request timeout:  {}s", config.request_timeout.as_secs());
    println!("Concurrency:      {}", config.max_concurrent_requests);
    println!("Max attempts:     {}", config.retry.max_attempts);
    println!("Base delay:       {}ms", config.retry.base_delay.as_millis());

    let delays: Vec<String> = config
        .retry
        .delays()
        .iter()
        .map(|delay| format!("{}ms", delay.as_millis()))
        .collect();
    if !delays.is_empty() {
        println!("Backoff schedule: {}", delays.join(", "));
    }

    if let Some(path) = write {
        config.to_file_config().save_to_file(&path)?;
        println!("Wrote configuration to {}", path.display());
    }
    Ok(())
}

fn load_schema(path: &Path) -> Result<serde_json::Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse schema file: {}", path.display()))
}

/// A data URL is used as-is; anything else is read as an image file.
fn load_reference(reference: &str) -> Result<InlineData> {
    if reference.starts_with("data:") {
        return Ok(InlineData::from_data_url(reference));
    }

    let path = Path::new(reference);
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read reference image: {}", path.display()))?;
    Ok(InlineData::from_bytes(mime_type_for(path), &bytes))
}

fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}
