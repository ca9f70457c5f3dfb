use serde::{Deserialize, Serialize};
use crate::error::{DrawingError, Result};
use crate::types::{SURFACE_HEIGHT, SURFACE_WIDTH};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        SurfaceSize { width: SURFACE_WIDTH, height: SURFACE_HEIGHT }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct EngineConfig {
    /// Drawings collection; saves POST here, loads GET `{persistence_url}/{name}`.
    pub persistence_url: String,
    pub assistant_url: String,
    pub surface: SurfaceSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            persistence_url: "https://localhost:44381/api/drawings".to_string(),
            assistant_url: "https://localhost:44381/OPenAI/send".to_string(),
            surface: SurfaceSize::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<EngineConfig> {
        let config: EngineConfig = serde_json::from_str(json)?;
        if config.surface.width == 0 || config.surface.height == 0 {
            return Err(DrawingError::InvalidConfig(format!(
                "surface must be non-empty, got {}x{}",
                config.surface.width, config.surface.height
            )));
        }
        Ok(config)
    }

    fn collection_url(&self) -> &str {
        self.persistence_url.trim_end_matches('/')
    }

    pub fn save_url(&self) -> String {
        self.collection_url().to_string()
    }

    pub fn load_url(&self, name: &str) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(name))
    }
}
