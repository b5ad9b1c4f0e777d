//! The interchangeable cartoonization model builds.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// One of the pre-trained cartoonization models.
///
/// All variants share the same input/output shape and produce the same kind
/// of output; they only trade accuracy for size and speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum ModelVariant {
    /// 32-bit float weights.
    #[value(name = "fp32", alias = "full", alias = "full-precision")]
    FullPrecision,
    /// 16-bit float weights.
    #[value(name = "fp16", alias = "float16")]
    Float16,
    /// 8-bit integer quantized weights.
    #[default]
    #[value(name = "int8")]
    Int8,
}

impl ModelVariant {
    pub const ALL: [Self; 3] = [Self::FullPrecision, Self::Float16, Self::Int8];

    /// Get the filename for this model variant.
    #[must_use]
    pub const fn filename(&self) -> &'static str {
        match self {
            Self::FullPrecision => "whitebox_cartoon_gan_fp32.onnx",
            Self::Float16 => "whitebox_cartoon_gan_fp16.onnx",
            Self::Int8 => "whitebox_cartoon_gan_int8.onnx",
        }
    }

    /// Short name used on the command line.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FullPrecision => "fp32",
            Self::Float16 => "fp16",
            Self::Int8 => "int8",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unknown model variant name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model variant {0:?} (expected fp32, fp16 or int8)")]
pub struct ParseVariantError(String);

impl FromStr for ModelVariant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fp32" | "full" | "full-precision" => Ok(Self::FullPrecision),
            "fp16" | "float16" => Ok(Self::Float16),
            "int8" => Ok(Self::Int8),
            _ => Err(ParseVariantError(s.to_string())),
        }
    }
}
