//! Vision Roof Analysis
//!
//! Sends a rooftop image to an OpenAI-compatible chat completions endpoint
//! and converts the reply into a [`RoofDescription`]. Any supplier failure
//! falls back to the demo roof so the analysis can still run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::VisionConfig;
use crate::error::{AnalysisError, Result};
use crate::pipeline::{Provenance, SourcedRoof};
use crate::roof::{self, RoofDescription};

const ROOF_PROMPT: &str = r#"Analyze this satellite or aerial image of a rooftop for solar panel installation potential.
Reply with a single JSON object with this structure:

{
  "roof_analysis": {
    "roof_area_sqm": <estimated total roof area in square meters>,
    "usable_area_sqm": <area suitable for solar panels>,
    "roof_shape": "<rectangular/L-shaped/complex/irregular>",
    "roof_material": "<asphalt_shingles/tile/metal/flat_membrane/other>",
    "roof_condition": "<excellent/good/fair/poor>"
  },
  "orientation_analysis": {
    "primary_roof_direction": "<north/northeast/east/southeast/south/southwest/west/northwest>",
    "roof_tilt_estimate": <angle in degrees, 0-60>,
    "multiple_orientations": <true/false>
  },
  "obstructions": {
    "chimneys": <count>,
    "vents": <count>,
    "skylights": <count>,
    "hvac_units": <count>,
    "satellite_dishes": <count>,
    "other_obstructions": ["<other obstructions>"]
  },
  "shading_analysis": {
    "overall_shading_impact": "<none/minimal/low/moderate/high>"
  }
}

Be precise and realistic. Consider standard residential roof sizes and solar installation requirements."#;

// ===================== ERRORS =====================

/// Failures of the vision supplier; all of them trigger the demo fallback
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vision service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed vision response: {0}")]
    MalformedResponse(String),

    #[error("vision record rejected: {0}")]
    InvalidRecord(#[from] AnalysisError),
}

// ===================== IMAGE UPLOAD =====================

/// Validated image ready for upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

impl ImageUpload {
    /// Check extension and size of in-memory image data
    pub fn from_bytes(file_name: &str, bytes: Vec<u8>, max_bytes: u64) -> Result<Self> {
        let ext = Path::new(file_name).extension().and_then(|e| e.to_str()).unwrap_or("");
        let mime_type = mime_for_extension(ext).ok_or_else(|| {
            AnalysisError::invalid("image.extension", ext, "expected jpg, jpeg, png or tiff")
        })?;
        if bytes.len() as u64 > max_bytes {
            return Err(AnalysisError::invalid(
                "image.size_bytes",
                bytes.len(),
                format!("exceeds limit of {} bytes", max_bytes),
            ));
        }
        if bytes.is_empty() {
            return Err(AnalysisError::invalid("image.size_bytes", 0, "image file is empty"));
        }
        Ok(Self { file_name: file_name.to_string(), mime_type, bytes })
    }

    /// Read an image file, checking the size before loading it
    pub fn from_path(path: &Path, max_bytes: u64) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(AnalysisError::invalid(
                "image.size_bytes",
                size,
                format!("exceeds limit of {} bytes", max_bytes),
            ));
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Self::from_bytes(name, fs::read(path)?, max_bytes)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

// ===================== ANALYZERS =====================

/// Anything that can turn a roof image into a roof description
pub trait RoofAnalyzer {
    /// Model identifier recorded in the report provenance
    fn model(&self) -> &str;

    fn analyze(&self, image: &ImageUpload) -> std::result::Result<RoofDescription, VisionError>;
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Text between the first '{' and the last '}' of a model reply
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Client for the OpenRouter chat completions API
pub struct OpenRouterAnalyzer {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenRouterAnalyzer {
    pub fn new(api_key: &str, config: &VisionConfig) -> std::result::Result<Self, VisionError> {
        if api_key.trim().is_empty() {
            return Err(VisionError::MissingApiKey);
        }
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

impl RoofAnalyzer for OpenRouterAnalyzer {
    fn model(&self) -> &str {
        &self.model
    }

    fn analyze(&self, image: &ImageUpload) -> std::result::Result<RoofDescription, VisionError> {
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": ROOF_PROMPT },
                    { "type": "image_url", "image_url": { "url": image.data_url() } }
                ]
            }],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        debug!(endpoint = %self.endpoint, model = %self.model, bytes = image.bytes.len(), "sending image");
        let response = self.client.post(&self.endpoint).bearer_auth(&self.api_key).json(&body).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(VisionError::Status { status: status.as_u16(), body });
        }

        let reply: ChatResponse = response.json()?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| VisionError::MalformedResponse("reply has no choices".into()))?;

        let object = extract_json_object(&content)
            .ok_or_else(|| VisionError::MalformedResponse("reply contains no JSON object".into()))?;
        Ok(roof::parse_roof_record(object)?)
    }
}

// ===================== ACQUISITION =====================

/// Where the roof description should come from
#[derive(Debug, Clone, PartialEq)]
pub enum RoofSource {
    File(PathBuf),
    Image(PathBuf),
    Demo,
}

/// Run the analyzer, substituting the demo roof on any supplier failure
pub fn analyze_or_fallback(upload: &ImageUpload, analyzer: Option<&dyn RoofAnalyzer>) -> SourcedRoof {
    let outcome = match analyzer {
        Some(a) => a.analyze(upload).map(|roof| (roof, a.model().to_string())),
        None => Err(VisionError::MissingApiKey),
    };

    match outcome {
        Ok((roof, model)) => {
            info!(model = %model, image = %upload.file_name, "roof analyzed from image");
            SourcedRoof { roof, provenance: Provenance::Vision { model } }
        }
        Err(e) => {
            warn!(error = %e, "image analysis unavailable, using demo roof");
            SourcedRoof {
                roof: RoofDescription::demo_fixture(),
                provenance: Provenance::Fallback { reason: e.to_string() },
            }
        }
    }
}

/// Obtain a roof description from a file, an image or the demo fixture
///
/// Only local input problems (unreadable file, bad record, bad image) are
/// errors; vision failures fall back to the demo roof.
pub fn acquire_roof(
    source: &RoofSource,
    analyzer: Option<&dyn RoofAnalyzer>,
    config: &VisionConfig,
) -> Result<SourcedRoof> {
    match source {
        RoofSource::Demo => {
            Ok(SourcedRoof { roof: RoofDescription::demo_fixture(), provenance: Provenance::Demo })
        }
        RoofSource::File(path) => {
            let text = fs::read_to_string(path)?;
            let roof = roof::parse_roof_record(&text)?;
            debug!(path = %path.display(), "roof loaded from file");
            Ok(SourcedRoof { roof, provenance: Provenance::File { path: path.display().to_string() } })
        }
        RoofSource::Image(path) => {
            let upload = ImageUpload::from_path(path, config.max_image_bytes)?;
            Ok(analyze_or_fallback(&upload, analyzer))
        }
    }
}

// ===================== TESTS =====================
