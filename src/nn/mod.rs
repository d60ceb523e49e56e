//! 稠密网络底座
//!
//! 为上层的六个网络（G0/G1/D0/D1/E0/E1）提供最小可用的构件：
//! 线性层、激活函数、损失函数与优化器。所有计算基于`ndarray`，
//! 前向缓存由各层自行持有，反向传播手工推导（无计算图）。

mod activation;
mod criterion;
mod dense;
mod linear;
pub mod optimizer;

pub use activation::Activation;
pub use criterion::{bce, categorical_cross_entropy, mse, EPS};
pub use dense::{Dense, DenseLayer};
pub use linear::Linear;
pub use optimizer::{Adam, Optimizer, Param, RmsProp};

#[cfg(test)]
mod tests;
