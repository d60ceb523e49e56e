//! 激活函数单元测试
//!
//! 反向传播只依赖前向输出这一约定在此逐一验证。

use approx::assert_abs_diff_eq;
use ndarray::{array, Axis};

use crate::nn::{categorical_cross_entropy, Activation};

#[test]
fn test_relu_forward_backward() {
    let x = array![[-1.0, 0.0, 2.0]];
    let out = Activation::Relu.forward(&x);
    assert_eq!(out, array![[0.0, 0.0, 2.0]]);

    let grad = Activation::Relu.backward(&out, &array![[1.0, 1.0, 1.0]]);
    assert_eq!(grad, array![[0.0, 0.0, 1.0]]);
}

#[test]
fn test_leaky_relu_negative_slope() {
    let act = Activation::LeakyRelu(0.2);
    let x = array![[-1.0, 3.0]];
    let out = act.forward(&x);
    assert_abs_diff_eq!(out[[0, 0]], -0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(out[[0, 1]], 3.0, epsilon = 1e-6);

    // 负分支由输出符号还原
    let grad = act.backward(&out, &array![[1.0, 1.0]]);
    assert_abs_diff_eq!(grad[[0, 0]], 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(grad[[0, 1]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_sigmoid_forward_backward() {
    let x = array![[0.0]];
    let out = Activation::Sigmoid.forward(&x);
    assert_abs_diff_eq!(out[[0, 0]], 0.5, epsilon = 1e-6);

    // σ'(0) = σ(0)·(1-σ(0)) = 0.25
    let grad = Activation::Sigmoid.backward(&out, &array![[1.0]]);
    assert_abs_diff_eq!(grad[[0, 0]], 0.25, epsilon = 1e-6);
}

#[test]
fn test_sigmoid_output_in_open_interval() {
    let x = array![[-50.0, 0.0, 50.0]];
    let out = Activation::Sigmoid.forward(&x);
    assert!(out.iter().all(|&v| v > 0.0 && v < 1.0));
}

#[test]
fn test_softmax_rows_sum_to_one() {
    let x = array![[1.0, 2.0, 3.0], [100.0, 100.0, 100.0]];
    let out = Activation::Softmax.forward(&x);
    for row in out.axis_iter(Axis(0)) {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-5);
    }
    // 等logits → 均匀分布
    assert_abs_diff_eq!(out[[1, 0]], 1.0 / 3.0, epsilon = 1e-5);
}

#[test]
fn test_softmax_backward_with_cross_entropy_grad() {
    // 交叉熵梯度穿过softmax雅可比后应恢复(p - t) / batch
    let logits = array![[1.0, -0.5, 0.3], [0.0, 2.0, -1.0]];
    let target = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let p = Activation::Softmax.forward(&logits);

    let (_, grad_p) = categorical_cross_entropy(&p, &target);
    let grad_logits = Activation::Softmax.backward(&p, &grad_p);

    let expected = (&p - &target) / 2.0;
    for (&g, &e) in grad_logits.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(g, e, epsilon = 1e-5);
    }
}
