//! Sample-level arithmetic shared by the sink and its backends.
//!
//! - Stereo-to-mono downmix
//! - Sample format conversion (i16 → f32) for float output devices
//! - Linear start/stop ramps
//!
//! All integer division here rounds toward negative infinity, so the downmix
//! and both ramps agree on how odd and negative values are treated.

mod convert;
mod fade;

pub use convert::{downmix, i16_to_f32};
pub use fade::{fade_in, fade_out_step};
