//! Running a model variant over one tensor image.

use ort::session::Session;
use ort::value::Tensor;

use ndarray::Array4;

use crate::error::{Error, Result};
use crate::image::{TensorImage, RGB_CHANNELS};

use super::{ModelStore, ModelVariant};

/// Stylizes tensor images with one of the model variants.
pub trait Inference {
    /// Run `variant` over `image` and return the cartoonized tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or inference fails.
    fn infer(&self, variant: ModelVariant, image: &TensorImage) -> Result<TensorImage>;
}

/// A loaded model. Native resources are released when it is closed or dropped.
pub struct ModelHandle {
    variant: ModelVariant,
    session: Session,
}

impl ModelHandle {
    pub(crate) fn new(variant: ModelVariant, session: Session) -> Self {
        Self { variant, session }
    }

    #[must_use]
    pub const fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Run the model on a single image.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output is not an
    /// NHWC RGB tensor.
    pub fn process(&mut self, image: &TensorImage) -> Result<TensorImage> {
        let input_value =
            Tensor::from_array(image.data().clone()).map_err(|source| Error::Inference { source })?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        // Get first output
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "cartoonized image output".to_string(),
                actual: "no output".to_string(),
            })?;

        let data = extract_array4(&output)?;

        if data.dim().3 != RGB_CHANNELS {
            return Err(Error::ShapeMismatch {
                expected: "NHWC tensor with 3 channels".to_string(),
                actual: format!("{:?}", data.shape()),
            });
        }

        Ok(TensorImage::new(data, image.source_dims()))
    }

    /// Release the model.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        tracing::debug!("Released {} model", self.variant);
    }
}

/// Loads a fresh ONNX session for every call and releases it before
/// returning.
#[derive(Debug, Clone)]
pub struct OnnxInvoker {
    store: ModelStore,
}

impl OnnxInvoker {
    #[must_use]
    pub const fn new(store: ModelStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &ModelStore {
        &self.store
    }
}

impl Inference for OnnxInvoker {
    fn infer(&self, variant: ModelVariant, image: &TensorImage) -> Result<TensorImage> {
        tracing::info!("Running {variant} model...");

        let mut handle = self.store.open(variant)?;
        let output = handle.process(image);
        handle.close();

        output
    }
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    tracing::debug!("Model output shape {dims:?}");

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}
