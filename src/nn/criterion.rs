//! 损失函数
//!
//! 每个损失同时返回标量损失值与关于**预测值**的梯度，
//! 调用方将该梯度直接喂给网络的反向传播（穿过末端的
//! sigmoid/softmax激活后即得到熟悉的`(p - t) / batch`形式）。

use ndarray::Array2;

/// 数值稳定用的下限
pub const EPS: f32 = 1e-7;

/// 二元交叉熵（对sigmoid输出）
///
/// `L = -mean(t·ln p + (1-t)·ln(1-p))`，对全部元素取均值。
///
/// # 返回
/// `(损失值, dL/dp)`
pub fn bce(pred: &Array2<f32>, target: &Array2<f32>) -> (f32, Array2<f32>) {
    debug_assert_eq!(pred.shape(), target.shape());
    let n = pred.len() as f32;
    let mut loss = 0.0;
    let mut grad = Array2::zeros(pred.raw_dim());
    for ((g, &p), &t) in grad.iter_mut().zip(pred.iter()).zip(target.iter()) {
        let p_c = p.clamp(EPS, 1.0 - EPS);
        loss -= t * p_c.ln() + (1.0 - t) * (1.0 - p_c).ln();
        *g = (p_c - t) / (p_c * (1.0 - p_c)).max(EPS) / n;
    }
    (loss / n, grad)
}

/// 均方误差
///
/// `L = mean((p - t)²)`，对全部元素取均值。
///
/// # 返回
/// `(损失值, dL/dp)`
pub fn mse(pred: &Array2<f32>, target: &Array2<f32>) -> (f32, Array2<f32>) {
    debug_assert_eq!(pred.shape(), target.shape());
    let n = pred.len() as f32;
    let diff = pred - target;
    let loss = diff.mapv(|d| d * d).sum() / n;
    let grad = diff.mapv(|d| 2.0 * d / n);
    (loss, grad)
}

/// 多分类交叉熵（对softmax输出、one-hot目标）
///
/// `L = -mean_batch(Σ_d t·ln p)`。
///
/// # 返回
/// `(损失值, dL/dp)`；该梯度穿过softmax反向传播后即`(p - t) / batch`
pub fn categorical_cross_entropy(pred: &Array2<f32>, target: &Array2<f32>) -> (f32, Array2<f32>) {
    debug_assert_eq!(pred.shape(), target.shape());
    let batch = pred.shape()[0] as f32;
    let mut loss = 0.0;
    let mut grad = Array2::zeros(pred.raw_dim());
    for ((g, &p), &t) in grad.iter_mut().zip(pred.iter()).zip(target.iter()) {
        let p_c = p.max(EPS);
        loss -= t * p_c.ln();
        *g = -t / p_c / batch;
    }
    (loss / batch, grad)
}
