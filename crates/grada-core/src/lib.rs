pub mod backend;
pub mod color;
pub mod cpu;
pub mod history;
pub mod image_buf;
pub mod lut;
pub mod pipeline;
pub mod preset;
pub mod settings;

pub use backend::{CancelToken, Cancelled, RenderBackend};
pub use cpu::CpuBackend;
pub use history::ColorGradingHistory;
pub use image_buf::ImageBuf;
pub use lut::Lut3d;
pub use pipeline::{KernelParams, Pipeline};
pub use preset::{ColorGradingPreset, PresetCategory, PresetLibrary};
pub use settings::{ColorGradingSettings, SettingsPatch};
