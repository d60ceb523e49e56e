//! 稠密堆叠单元测试
//!
//! 除形状与梯度路径外，还在一个微型回归问题上训练整个堆叠，
//! 验证前向-反向-更新的闭环确实在降低损失。

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::nn::optimizer::{Adam, Optimizer};
use crate::nn::{mse, Activation, Dense};

#[test]
fn test_dense_forward_shape() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut net = Dense::new(
        &mut rng,
        &[4, 8, 2],
        &[Some(Activation::Relu), Some(Activation::Sigmoid)],
    );
    assert_eq!(net.in_features(), 4);
    assert_eq!(net.out_features(), 2);

    let x = Array2::from_elem((3, 4), 0.5);
    let out = net.forward(&x);
    assert_eq!(out.shape(), &[3, 2]);
}

#[test]
fn test_dense_params_stable_order() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut net = Dense::new(
        &mut rng,
        &[4, 8, 2],
        &[Some(Activation::Relu), None],
    );

    // 逐层W、b的稳定顺序是优化器槽位状态的前提
    let params = net.params_mut();
    assert_eq!(params.len(), 4);
    assert_eq!(params[0].value.shape(), &[4, 8]);
    assert_eq!(params[1].value.shape(), &[8]);
    assert_eq!(params[2].value.shape(), &[8, 2]);
    assert_eq!(params[3].value.shape(), &[2]);
}

#[test]
fn test_dense_backward_through_leaves_grads_untouched() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut net = Dense::new(
        &mut rng,
        &[3, 5, 1],
        &[Some(Activation::LeakyRelu(0.2)), Some(Activation::Sigmoid)],
    );

    let x = Array2::from_elem((2, 3), 0.3);
    net.forward(&x);
    let grad_in = net.backward_through(&Array2::from_elem((2, 1), 1.0));
    assert_eq!(grad_in.shape(), &[2, 3]);

    for param in net.params_mut() {
        assert!(param.grad.iter().all(|&g| g == 0.0));
    }
}

#[test]
fn test_dense_training_reduces_regression_loss() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut net = Dense::new(
        &mut rng,
        &[2, 8, 1],
        &[Some(Activation::Relu), None],
    );
    let mut optim = Adam::new_default(0.01);

    // 目标函数 y = x0 + x1
    let x = Array2::from_shape_fn((32, 2), |_| rng.gen_range(0.0..1.0f32));
    let y = Array2::from_shape_fn((32, 1), |(i, _)| x[[i, 0]] + x[[i, 1]]);

    let (initial_loss, _) = mse(&net.forward(&x), &y);
    for _ in 0..200 {
        let pred = net.forward(&x);
        let (_, grad) = mse(&pred, &y);
        net.zero_grad();
        net.backward(&grad);
        optim.step(&mut net.params_mut());
    }
    let (final_loss, _) = mse(&net.forward(&x), &y);

    assert!(
        final_loss < initial_loss * 0.5,
        "200步后损失未下降：{initial_loss} -> {final_loss}"
    );
}
