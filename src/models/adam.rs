//! Adam optimizer over flat parameter slices.

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// First/second moment state for one parameter slice.
#[derive(Debug, Clone)]
pub struct AdamState {
    m: Vec<f64>,
    v: Vec<f64>,
}

impl AdamState {
    pub fn new(len: usize) -> Self {
        Self {
            m: vec![0.0; len],
            v: vec![0.0; len],
        }
    }

    /// Apply one bias-corrected Adam update; `step` is 1-based.
    pub fn update(&mut self, param: &mut [f64], grad: &[f64], learning_rate: f64, step: i32) {
        let bias1 = 1.0 - BETA1.powi(step);
        let bias2 = 1.0 - BETA2.powi(step);

        for i in 0..param.len() {
            let g = grad[i];
            self.m[i] = BETA1 * self.m[i] + (1.0 - BETA1) * g;
            self.v[i] = BETA2 * self.v[i] + (1.0 - BETA2) * g * g;
            let m_hat = self.m[i] / bias1;
            let v_hat = self.v[i] / bias2;
            param[i] -= learning_rate * m_hat / (v_hat.sqrt() + EPSILON);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_by_learning_rate() {
        // With bias correction the first step is lr * sign(g).
        let mut state = AdamState::new(2);
        let mut p = [1.0, 1.0];
        state.update(&mut p, &[0.3, -5.0], 0.1, 1);
        assert!((p[0] - 0.9).abs() < 1e-6);
        assert!((p[1] - 1.1).abs() < 1e-6);
    }

    #[test]
    fn minimizes_a_quadratic() {
        // f(x) = (x - 3)^2
        let mut state = AdamState::new(1);
        let mut x = [0.0];
        for step in 1..=2000 {
            let g = [2.0 * (x[0] - 3.0)];
            state.update(&mut x, &g, 0.05, step);
        }
        assert!((x[0] - 3.0).abs() < 1e-2, "x = {}", x[0]);
    }
}
