mod momentum;
mod optimizer;

pub use momentum::GradientAscentWithMomentum;
pub use optimizer::Optimizer;
