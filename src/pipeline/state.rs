use std::fmt;

/// Stage the controller is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Nothing is displayed.
    #[default]
    Empty,
    /// A picked image is displayed.
    SourceLoaded,
    /// The displayed image is model output.
    Cartoonized,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::SourceLoaded => "source loaded",
            Self::Cartoonized => "cartoonized",
        })
    }
}
