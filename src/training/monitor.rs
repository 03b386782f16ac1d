use std::fmt::{self, Display};

use ndarray::ArrayView2;

use crate::arch::{Params, UnitKind, VisibleUnits};

/// Statistics recorded at the end of a training epoch.
///
/// This type keeps fields private to allow evolving the internal counters
/// without breaking the public API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    epoch: usize,
    msre: f32,
    free_energy: Option<FreeEnergyReport>,
}

impl EpochStats {
    /// Creates a new `EpochStats`.
    ///
    /// # Args
    /// * `epoch` - The cumulative epoch count once this epoch finished, starting at 1.
    /// * `msre` - The mean squared reconstruction error over the epoch's batches.
    /// * `free_energy` - The free energy diagnostics, if they were computed this epoch.
    ///
    /// # Returns
    /// An `EpochStats` instance containing the provided values.
    pub fn new(epoch: usize, msre: f32, free_energy: Option<FreeEnergyReport>) -> Self {
        Self {
            epoch,
            msre,
            free_energy,
        }
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn msre(&self) -> f32 {
        self.msre
    }

    pub fn free_energy(&self) -> Option<FreeEnergyReport> {
        self.free_energy
    }
}

impl Display for EpochStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {}: msre={:.6}", self.epoch, self.msre)?;

        if let Some(report) = self.free_energy {
            write!(f, " {report}")?;
        }

        Ok(())
    }
}

/// Mean free energy over the training data and, optionally, over held out data.
///
/// A validation free energy that keeps growing apart from the training one is a sign of
/// overfitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeEnergyReport {
    train: f32,
    val: Option<f32>,
}

impl FreeEnergyReport {
    /// Computes the mean free energy of `x` and `x_val` under the current parameters.
    pub fn compute(
        units: UnitKind,
        params: &Params,
        x: ArrayView2<f32>,
        x_val: Option<ArrayView2<f32>>,
    ) -> Self {
        Self {
            train: mean_free_energy(units, params, x),
            val: x_val.map(|x_val| mean_free_energy(units, params, x_val)),
        }
    }

    pub fn train(&self) -> f32 {
        self.train
    }

    pub fn val(&self) -> Option<f32> {
        self.val
    }

    /// Returns `mean F(x_val) - mean F(x)`.
    pub fn gap(&self) -> Option<f32> {
        self.val.map(|val| val - self.train)
    }
}

impl Display for FreeEnergyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F(train)={:.4}", self.train)?;

        if let (Some(val), Some(gap)) = (self.val, self.gap()) {
            write!(f, " F(val)={val:.4} gap={gap:.4}")?;
        }

        Ok(())
    }
}

/// The mean free energy of the rows of `x`. Empty inputs yield NaN.
pub fn mean_free_energy(units: UnitKind, params: &Params, x: ArrayView2<f32>) -> f32 {
    units.free_energy(params, x).mean().unwrap_or(f32::NAN)
}
