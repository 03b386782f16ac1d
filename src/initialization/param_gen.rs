/// A source of initial parameter values, consumed in row major order.
pub trait ParamGen {
    /// Draws the next values, at most `n` of them.
    ///
    /// Generators hold a fixed budget of values; a shorter sample means the budget ran out
    /// while filling this request.
    ///
    /// # Returns
    /// `None` once there's nothing left to draw.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;
}
