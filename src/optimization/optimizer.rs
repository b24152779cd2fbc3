use crate::error::Result;

/// An update rule applied to a flat parameter buffer.
pub trait Optimizer {
    /// Applies one update step.
    ///
    /// # Errors
    /// Returns `SizeMismatch` if `grad` and `params` disagree in
    /// length, or if either disagrees with the optimizer's state.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;
}
