//! 隐码采样
//!
//! 所有采样都从显式传入的`rng`抽取，不存在隐藏的全局随机状态，
//! 进程启动时重设种子即可确定性重放整个训练。

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;

/// 采样均匀噪声码 `[batch, dim]`，取值[0,1)
pub fn uniform_noise(rng: &mut StdRng, batch: usize, dim: usize) -> Array2<f32> {
    Array2::from_shape_fn((batch, dim), |_| rng.gen_range(0.0..1.0f32))
}

/// 均匀随机采样one-hot类别码 `[batch, num_labels]`
pub fn random_one_hot(rng: &mut StdRng, batch: usize, num_labels: usize) -> Array2<f32> {
    let mut out = Array2::zeros((batch, num_labels));
    for i in 0..batch {
        out[[i, rng.gen_range(0..num_labels)]] = 1.0;
    }
    out
}

/// 构造整批同一类别的one-hot码 `[batch, num_labels]`
pub fn constant_one_hot(label: usize, batch: usize, num_labels: usize) -> Array2<f32> {
    assert!(label < num_labels, "类别{label}超出字母表大小{num_labels}");
    let mut out = Array2::zeros((batch, num_labels));
    for i in 0..batch {
        out[[i, label]] = 1.0;
    }
    out
}

/// 构造常数填充的隐码 `[batch, dim]`（推理时覆盖噪声用）
pub fn filled_code(value: f32, batch: usize, dim: usize) -> Array2<f32> {
    Array2::from_elem((batch, dim), value)
}
