//! 激活函数
//!
//! 所有激活的反向传播都只依赖前向的**输出**（而非输入），
//! 因此`Dense`只需缓存激活后的结果即可。

use ndarray::{Array2, Axis};

/// 激活函数种类
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    /// max(0, x)
    Relu,
    /// x>0 ? x : alpha*x（GAN判别器惯用alpha=0.2）
    LeakyRelu(f32),
    /// 1/(1+e^-x)，输出保证在(0,1)
    Sigmoid,
    /// 按行归一化的softmax，每行和为1
    Softmax,
}

impl Activation {
    /// 前向传播
    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        match self {
            Self::Relu => x.mapv(|v| v.max(0.0)),
            Self::LeakyRelu(alpha) => {
                let a = *alpha;
                x.mapv(|v| if v > 0.0 { v } else { a * v })
            }
            Self::Sigmoid => x.mapv(|v| 1.0 / (1.0 + (-v).exp())),
            Self::Softmax => {
                let mut out = x.clone();
                for mut row in out.axis_iter_mut(Axis(0)) {
                    // 按行减最大值防止上溢
                    let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    row.mapv_inplace(|v| v / sum);
                }
                out
            }
        }
    }

    /// 反向传播
    ///
    /// # 参数
    /// - `out`: 前向的输出（缓存）
    /// - `grad_out`: 关于输出的梯度
    ///
    /// # 返回
    /// 关于输入的梯度
    pub fn backward(&self, out: &Array2<f32>, grad_out: &Array2<f32>) -> Array2<f32> {
        match self {
            Self::Relu => {
                let mut grad = grad_out.clone();
                grad.zip_mut_with(out, |g, &y| {
                    if y <= 0.0 {
                        *g = 0.0;
                    }
                });
                grad
            }
            // alpha>0时leaky_relu保号，可由输出符号还原分支
            Self::LeakyRelu(alpha) => {
                let a = *alpha;
                let mut grad = grad_out.clone();
                grad.zip_mut_with(out, |g, &y| {
                    if y <= 0.0 {
                        *g *= a;
                    }
                });
                grad
            }
            Self::Sigmoid => {
                let mut grad = grad_out.clone();
                grad.zip_mut_with(out, |g, &y| *g *= y * (1.0 - y));
                grad
            }
            Self::Softmax => {
                // 完整雅可比：dx_i = p_i * (g_i - Σ_j g_j p_j)
                let mut grad = Array2::zeros(grad_out.raw_dim());
                for ((mut gx, p), g) in grad
                    .axis_iter_mut(Axis(0))
                    .zip(out.axis_iter(Axis(0)))
                    .zip(grad_out.axis_iter(Axis(0)))
                {
                    let dot: f32 = g.iter().zip(p.iter()).map(|(a, b)| a * b).sum();
                    for ((x, &pi), &gi) in gx.iter_mut().zip(p.iter()).zip(g.iter()) {
                        *x = pi * (gi - dot);
                    }
                }
                grad
            }
        }
    }
}
