//! 网络封装单元测试
//!
//! 覆盖形状校验、推理幂等、判别器训练步的副作用边界与
//! 冻结透传的不变量。

use rand::rngs::StdRng;
use rand::SeedableRng;

use ndarray::{Array2, Axis};

use crate::errors::ModelError;
use crate::stacked::{
    uniform_noise, Discriminator0, Encoder0, Encoder1, Generator0, Generator1, StackedGanConfig,
};

fn cfg() -> StackedGanConfig {
    StackedGanConfig::tiny("network_test")
}

#[test]
fn test_g1_forward_shape() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut g1 = Generator1::new(&mut rng, &cfg);

    let labels = crate::stacked::random_one_hot(&mut rng, 8, cfg.num_labels);
    let z1 = uniform_noise(&mut rng, 8, cfg.z_dim);
    let fc3 = g1.forward(&labels, &z1).unwrap();
    assert_eq!(fc3.shape(), &[8, cfg.feature_dim]);
}

#[test]
fn test_g1_rejects_wrong_label_width() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut g1 = Generator1::new(&mut rng, &cfg);

    let bad_labels = Array2::zeros((8, cfg.num_labels + 1));
    let z1 = uniform_noise(&mut rng, 8, cfg.z_dim);
    let err = g1.forward(&bad_labels, &z1).unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { .. }));
}

#[test]
fn test_g0_rejects_mismatched_batch() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut g0 = Generator0::new(&mut rng, &cfg);

    let fc3 = uniform_noise(&mut rng, 8, cfg.feature_dim);
    let z0 = uniform_noise(&mut rng, 4, cfg.z_dim);
    let err = g0.forward(&fc3, &z0).unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { .. }));
}

#[test]
fn test_g0_output_in_unit_interval() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut g0 = Generator0::new(&mut rng, &cfg);

    let fc3 = uniform_noise(&mut rng, 8, cfg.feature_dim);
    let z0 = uniform_noise(&mut rng, 8, cfg.z_dim);
    let images = g0.forward(&fc3, &z0).unwrap();
    // 末端sigmoid保证像素落在(0,1)
    assert!(images.iter().all(|&v| v > 0.0 && v < 1.0));
}

#[test]
fn test_inference_is_idempotent() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut g0 = Generator0::new(&mut rng, &cfg);

    let fc3 = uniform_noise(&mut rng, 4, cfg.feature_dim);
    let z0 = uniform_noise(&mut rng, 4, cfg.z_dim);
    let first = g0.forward(&fc3, &z0).unwrap();
    let second = g0.forward(&fc3, &z0).unwrap();
    // 纯前向不改参数，重复调用逐位相同
    assert_eq!(first, second);
}

#[test]
fn test_d0_train_step_updates_own_params() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut d0 = Discriminator0::new(&mut rng, &cfg);

    let before = d0.nets()[0].layers()[0].linear().weights().clone();
    let images = uniform_noise(&mut rng, 8, cfg.image_dim);
    let y = Array2::ones((8, 1));
    let z = uniform_noise(&mut rng, 8, cfg.z_dim);
    let report = d0.train_on_batch(&images, &y, &z).unwrap();

    assert!(report.total.is_finite());
    assert!(report.adversarial > 0.0);
    assert!(report.latent >= 0.0);
    assert!(report.consistency.is_none());
    assert_ne!(&before, d0.nets()[0].layers()[0].linear().weights());
}

#[test]
fn test_d0_train_rejects_mismatched_z_target_batch() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut d0 = Discriminator0::new(&mut rng, &cfg);

    let images = uniform_noise(&mut rng, 8, cfg.image_dim);
    let y = Array2::ones((8, 1));
    // z目标batch维与图像不一致
    let z = uniform_noise(&mut rng, 4, cfg.z_dim);
    let err = d0.train_on_batch(&images, &y, &z).unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { .. }));
}

#[test]
fn test_d0_backward_through_keeps_params_bitwise() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut d0 = Discriminator0::new(&mut rng, &cfg);

    let images = uniform_noise(&mut rng, 8, cfg.image_dim);
    let (prob, z_rec) = d0.forward(&images).unwrap();

    let before: Vec<Array2<f32>> = d0
        .nets()
        .iter()
        .flat_map(|n| n.layers().iter().map(|l| l.linear().weights().clone()))
        .collect();

    let grad = d0.backward_through(&prob, &z_rec);
    assert_eq!(grad.shape(), images.shape());

    let after: Vec<Array2<f32>> = d0
        .nets()
        .iter()
        .flat_map(|n| n.layers().iter().map(|l| l.linear().weights().clone()))
        .collect();
    // 冻结透传前后参数逐位相同
    assert_eq!(before, after);
}

#[test]
fn test_e1_outputs_distribution() {
    let cfg = cfg();
    let mut rng = StdRng::seed_from_u64(42);
    let mut e0 = Encoder0::new(&mut rng, &cfg);
    let mut e1 = Encoder1::new(&mut rng, &cfg);

    let images = uniform_noise(&mut rng, 8, cfg.image_dim);
    let fc3 = e0.forward(&images).unwrap();
    let probs = e1.forward(&fc3).unwrap();

    assert_eq!(probs.shape(), &[8, cfg.num_labels]);
    for row in probs.axis_iter(Axis(0)) {
        assert!((row.sum() - 1.0).abs() < 1e-5);
    }
}
