use ndarray::{linalg, prelude::*};
use rand::Rng;

use super::activations::sigmoid;
use crate::{
    RbmErr, Result,
    initialization::{ParamGen, RandParamGen},
};

/// The parameters of an RBM: the weight matrix connecting both layers and one bias per unit.
///
/// The same type holds the optimizer's velocity buffers, which share every shape with the
/// parameters they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    w: Array2<f32>,
    hb: Array1<f32>,
    vb: Array1<f32>,
}

impl Params {
    /// The name of the weight matrix.
    pub const W: &'static str = "W";
    /// The name of the hidden bias vector.
    pub const HB: &'static str = "hb";
    /// The name of the visible bias vector.
    pub const VB: &'static str = "vb";

    /// Draws the initial parameters of a model.
    ///
    /// The weights are sampled row major from `Normal(0, w_init_std)` and both biases start
    /// at zero.
    ///
    /// # Arguments
    /// * `n_visible` - The amount of visible units.
    /// * `n_hidden` - The amount of hidden units.
    /// * `w_init_std` - The standard deviation of the weights' distribution.
    /// * `rng` - The model's random number generator.
    ///
    /// # Returns
    /// The freshly initialized parameters or an error if the distribution is invalid.
    pub fn init<R>(n_visible: usize, n_hidden: usize, w_init_std: f32, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let w_size = n_visible * n_hidden;
        let weights = RandParamGen::normal(rng, w_size, 0., w_init_std)?
            .sample(w_size)
            .unwrap_or_default();

        let drawn = weights.len();
        let w = Array2::from_shape_vec((n_visible, n_hidden), weights).map_err(|_| {
            RbmErr::ShapeMismatch {
                what: Self::W,
                got: drawn,
                expected: w_size,
            }
        })?;

        Ok(Self {
            w,
            hb: Array1::zeros(n_hidden),
            vb: Array1::zeros(n_visible),
        })
    }

    /// Returns parameters of the given dimensions filled with zeros.
    pub fn zeros(n_visible: usize, n_hidden: usize) -> Self {
        Self {
            w: Array2::zeros((n_visible, n_hidden)),
            hb: Array1::zeros(n_hidden),
            vb: Array1::zeros(n_visible),
        }
    }

    /// Builds the parameters from already existing arrays.
    ///
    /// # Returns
    /// An error if the biases don't match the dimensions of `w`.
    pub fn from_parts(w: Array2<f32>, hb: Array1<f32>, vb: Array1<f32>) -> Result<Self> {
        let (n_visible, n_hidden) = w.dim();

        if hb.len() != n_hidden {
            return Err(RbmErr::ShapeMismatch {
                what: Self::HB,
                got: hb.len(),
                expected: n_hidden,
            });
        }

        if vb.len() != n_visible {
            return Err(RbmErr::ShapeMismatch {
                what: Self::VB,
                got: vb.len(),
                expected: n_visible,
            });
        }

        Ok(Self { w, hb, vb })
    }

    pub fn n_visible(&self) -> usize {
        self.w.nrows()
    }

    pub fn n_hidden(&self) -> usize {
        self.w.ncols()
    }

    pub fn w(&self) -> ArrayView2<'_, f32> {
        self.w.view()
    }

    pub fn hb(&self) -> ArrayView1<'_, f32> {
        self.hb.view()
    }

    pub fn vb(&self) -> ArrayView1<'_, f32> {
        self.vb.view()
    }

    /// Looks a parameter up by its stable name.
    ///
    /// # Arguments
    /// * `name` - One of `Params::W`, `Params::HB` or `Params::VB`.
    ///
    /// # Returns
    /// A dynamic dimensional view of the parameter or `None` for unknown names.
    pub fn get(&self, name: &str) -> Option<ArrayViewD<'_, f32>> {
        match name {
            Self::W => Some(self.w.view().into_dyn()),
            Self::HB => Some(self.hb.view().into_dyn()),
            Self::VB => Some(self.vb.view().into_dyn()),
            _ => None,
        }
    }

    /// Iterates over the three parameters paired with their names.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ArrayViewD<'_, f32>)> {
        [
            (Self::W, self.w.view().into_dyn()),
            (Self::HB, self.hb.view().into_dyn()),
            (Self::VB, self.vb.view().into_dyn()),
        ]
        .into_iter()
    }

    /// Mutable access to the three parameters at once, in `W`, `hb`, `vb` order.
    pub(crate) fn parts_mut(&mut self) -> (&mut Array2<f32>, &mut Array1<f32>, &mut Array1<f32>) {
        (&mut self.w, &mut self.hb, &mut self.vb)
    }

    /// Computes `vW + hb`.
    pub fn hidden_pre(&self, v: ArrayView2<f32>) -> Array2<f32> {
        let mut z = Array2::zeros((v.nrows(), self.n_hidden()));
        linalg::general_mat_mul(1.0, &v, &self.w, 0.0, &mut z);
        z += &self.hb;
        z
    }

    /// Computes the hidden activation probabilities `σ(vW + hb)`.
    pub fn hidden_probs(&self, v: ArrayView2<f32>) -> Array2<f32> {
        self.hidden_pre(v).mapv_into(sigmoid)
    }

    /// Computes `hWᵀ + vb`.
    pub fn visible_pre(&self, h: ArrayView2<f32>) -> Array2<f32> {
        let mut z = Array2::zeros((h.nrows(), self.n_visible()));
        linalg::general_mat_mul(1.0, &h, &self.w.t(), 0.0, &mut z);
        z += &self.vb;
        z
    }

    /// Returns the name of the first parameter holding a NaN or infinite value, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.iter()
            .find(|(_, p)| p.iter().any(|x| !x.is_finite()))
            .map(|(name, _)| name)
    }
}
