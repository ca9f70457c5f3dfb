pub mod types;
pub mod error;
pub mod config;
pub mod normalize;
pub mod store;
pub mod render;
pub mod raster;
pub mod canvas;
pub mod io;
pub mod session;
pub mod commands;
pub mod engine;

pub use engine::DrawingEngine;
pub use error::{DrawingError, Result};
pub use config::EngineConfig;
pub use normalize::{normalize, normalize_all};
pub use store::ShapeStore;
pub use render::{render, Surface, Unrenderable};
pub use raster::Raster;
pub use session::{DrawingSession, Notice};
pub use types::*;
