mod color_wheels;
mod contrast;
mod exposure;
mod hsl;
mod lut;
mod presence;
mod shadows_highlights;
mod tone_curve;
mod tone_mapping;
mod vibrance;
mod vignette;
mod white_balance;
mod whites_blacks;

pub use color_wheels::{ColorWheels, wheel_offsets};
pub use contrast::Contrast;
pub use exposure::Exposure;
pub use hsl::Hsl;
pub use lut::LutBlend;
pub use presence::Presence;
pub use shadows_highlights::ShadowsHighlights;
pub use tone_curve::{CURVE_TABLE_SIZE, CurveTable, ToneCurve};
pub use tone_mapping::{ToneMap, uncharted2_curve};
pub use vibrance::Vibrance;
pub use vignette::{Vignette, vignette_squash};
pub use white_balance::{WhiteBalance, white_balance_shifts};
pub use whites_blacks::WhitesBlacks;
