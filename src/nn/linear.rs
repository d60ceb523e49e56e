//! Linear（全连接）层
//!
//! 计算 `output = x @ W + b`，并持有自身的参数梯度。
//! 反向传播分两条路径：
//! - [`Linear::backward`]：累积参数梯度并返回输入梯度（可训练路径）
//! - [`Linear::backward_through`]：只回传输入梯度，不触碰参数梯度（冻结路径）

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::Rng;

use super::optimizer::Param;

/// Linear（全连接）层
///
/// # 输入/输出形状
/// - 输入：`[batch_size, in_features]`
/// - 输出：`[batch_size, out_features]`
pub struct Linear {
    /// 权重参数 `[in_features, out_features]`
    w: Array2<f32>,
    /// 偏置参数 `[out_features]`
    b: Array1<f32>,
    /// 权重梯度（与`w`同形）
    grad_w: Array2<f32>,
    /// 偏置梯度（与`b`同形）
    grad_b: Array1<f32>,
    /// 前向输入缓存（反向传播计算`grad_w`时使用）
    input_cache: Option<Array2<f32>>,
}

impl Linear {
    /// 创建新的Linear层
    ///
    /// 权重使用Kaiming均匀初始化（适合ReLU族激活），偏置零初始化。
    /// 随机性全部来自显式传入的`rng`，便于确定性重放。
    pub fn new(rng: &mut StdRng, in_features: usize, out_features: usize) -> Self {
        let bound = (6.0 / in_features as f32).sqrt();
        let w = Array2::from_shape_fn((in_features, out_features), |_| {
            rng.gen_range(-bound..bound)
        });
        Self {
            grad_w: Array2::zeros((in_features, out_features)),
            grad_b: Array1::zeros(out_features),
            b: Array1::zeros(out_features),
            w,
            input_cache: None,
        }
    }

    /// 前向传播：`x @ W + b`
    ///
    /// 输入会被缓存用于随后的反向传播。纯前向（推理）重复调用
    /// 只会覆盖缓存，不影响参数，因此推理是幂等的。
    pub fn forward(&mut self, x: &Array2<f32>) -> Array2<f32> {
        let out = x.dot(&self.w) + &self.b;
        self.input_cache = Some(x.clone());
        out
    }

    /// 反向传播（可训练路径）
    ///
    /// 依据最近一次前向的输入缓存，将`dW`与`db`累积到自身梯度，
    /// 并返回关于输入的梯度。
    pub fn backward(&mut self, grad_out: &Array2<f32>) -> Array2<f32> {
        let x = self
            .input_cache
            .as_ref()
            .expect("Linear反向传播前须先前向传播");
        self.grad_w += &x.t().dot(grad_out);
        self.grad_b += &grad_out.sum_axis(Axis(0));
        grad_out.dot(&self.w.t())
    }

    /// 反向传播（冻结路径）
    ///
    /// 只把梯度透传回输入，自身参数与参数梯度均不变。
    pub fn backward_through(&self, grad_out: &Array2<f32>) -> Array2<f32> {
        grad_out.dot(&self.w.t())
    }

    /// 清零参数梯度
    pub fn zero_grad(&mut self) {
        self.grad_w.fill(0.0);
        self.grad_b.fill(0.0);
    }

    /// 以（值，梯度）视图对的形式暴露参数，供优化器更新
    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        vec![
            Param {
                value: self.w.view_mut().into_dyn(),
                grad: self.grad_w.view().into_dyn(),
            },
            Param {
                value: self.b.view_mut().into_dyn(),
                grad: self.grad_b.view().into_dyn(),
            },
        ]
    }

    /// 输入特征维度
    pub fn in_features(&self) -> usize {
        self.w.shape()[0]
    }

    /// 输出特征维度
    pub fn out_features(&self) -> usize {
        self.w.shape()[1]
    }

    /// 权重（快照保存用）
    pub fn weights(&self) -> &Array2<f32> {
        &self.w
    }

    /// 偏置（快照保存用）
    pub fn bias(&self) -> &Array1<f32> {
        &self.b
    }

    /// 整体替换权重与偏置（快照加载用；形状校验由调用方负责）
    pub fn set_weights(&mut self, w: Array2<f32>, b: Array1<f32>) {
        self.w = w;
        self.b = b;
    }
}
