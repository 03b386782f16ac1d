use crate::{Result, arch::Params};

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
    /// Moves the parameters along the given gradient.
    ///
    /// # Arguments
    /// * `grad` - The log likelihood gradient estimated on the current batch.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// An error if there's a mismatch in the shapes of `grad` and `params`.
    fn update_params(&mut self, grad: &Params, params: &mut Params) -> Result<()>;
}
