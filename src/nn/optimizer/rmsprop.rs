//! RMSProp优化器
//!
//! GAN的判别器用RMSProp比Adam更容易收敛（原始DCGAN论文用Adam，
//! 此处沿用带学习率衰减的RMSProp）。

use ndarray::ArrayD;

use super::base::{Optimizer, Param};

/// RMSProp优化器
///
/// 更新规则：
/// - `lr_t = lr / (1 + decay·t)`
/// - `cache = ρ·cache + (1-ρ)·g²`
/// - `θ = θ - lr_t · g / (√cache + ε)`
pub struct RmsProp {
    learning_rate: f32,
    /// 每步学习率衰减系数
    decay: f32,
    rho: f32,
    epsilon: f32,
    /// 梯度平方的滑动平均（按参数槽位）
    cache: Vec<ArrayD<f32>>,
    /// 时间步
    t: usize,
}

impl RmsProp {
    /// 创建RMSProp优化器
    pub fn new(learning_rate: f32, decay: f32) -> Self {
        Self {
            learning_rate,
            decay,
            rho: 0.9,
            epsilon: 1e-7,
            cache: Vec::new(),
            t: 0,
        }
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, params: &mut [Param<'_>]) {
        let lr_t = self.learning_rate / (1.0 + self.decay * self.t as f32);
        self.t += 1;
        let (rho, eps) = (self.rho, self.epsilon);

        for (slot, param) in params.iter_mut().enumerate() {
            if self.cache.len() <= slot {
                self.cache.push(ArrayD::zeros(param.grad.raw_dim()));
            }
            let cache = &mut self.cache[slot];

            // cache = ρ·cache + (1-ρ)·g²
            cache.zip_mut_with(&param.grad, |c, &g| {
                *c = rho * *c + (1.0 - rho) * g * g;
            });

            // θ -= lr_t · g / (√cache + ε)
            let mut update = param.grad.to_owned();
            update.zip_mut_with(cache, |u, &c| *u = lr_t * *u / (c.sqrt() + eps));
            param.value.zip_mut_with(&update, |v, &u| *v -= u);
        }
    }

    fn reset(&mut self) {
        self.cache.clear();
        self.t = 0;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
