//! Adam优化器（编码器监督预训练用）

use ndarray::ArrayD;

use super::base::{Optimizer, Param};

/// Adam优化器
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    /// 一阶矩估计（按参数槽位）
    m: Vec<ArrayD<f32>>,
    /// 二阶矩估计（按参数槽位）
    v: Vec<ArrayD<f32>>,
    /// 时间步
    t: usize,
}

impl Adam {
    /// 创建Adam优化器
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    /// 使用默认超参数创建Adam优化器
    pub fn new_default(learning_rate: f32) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Param<'_>]) {
        self.t += 1;
        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);
        let (beta1, beta2) = (self.beta1, self.beta2);

        for (slot, param) in params.iter_mut().enumerate() {
            if self.m.len() <= slot {
                self.m.push(ArrayD::zeros(param.grad.raw_dim()));
                self.v.push(ArrayD::zeros(param.grad.raw_dim()));
            }

            // m = β1·m + (1-β1)·g
            let m = &mut self.m[slot];
            m.zip_mut_with(&param.grad, |m, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
            });
            // v = β2·v + (1-β2)·g²
            let v = &mut self.v[slot];
            v.zip_mut_with(&param.grad, |v, &g| {
                *v = beta2 * *v + (1.0 - beta2) * g * g;
            });

            // θ -= α · m̂ / (√v̂ + ε)
            let lr = self.learning_rate;
            let eps = self.epsilon;
            let mut update = m.clone();
            update.zip_mut_with(v, |u, &vv| {
                let m_hat = *u / bias1;
                let v_hat = vv / bias2;
                *u = lr * m_hat / (v_hat.sqrt() + eps);
            });
            param.value.zip_mut_with(&update, |p, &u| *p -= u);
        }
    }

    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
