//! Model variants, the on-disk model store and inference.

mod invoker;
mod store;
mod variant;

pub use invoker::{Inference, ModelHandle, OnnxInvoker};
pub use store::ModelStore;
pub use variant::{ModelVariant, ParseVariantError};
