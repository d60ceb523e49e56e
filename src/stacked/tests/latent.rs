//! 隐码采样单元测试

use ndarray::Axis;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::stacked::{constant_one_hot, filled_code, random_one_hot, uniform_noise};

#[test]
fn test_uniform_noise_shape_and_range() {
    let mut rng = StdRng::seed_from_u64(42);
    let z = uniform_noise(&mut rng, 8, 50);
    assert_eq!(z.shape(), &[8, 50]);
    assert!(z.iter().all(|&v| (0.0..1.0).contains(&v)));
}

#[test]
fn test_uniform_noise_deterministic_replay() {
    let mut rng_a = StdRng::seed_from_u64(7);
    let mut rng_b = StdRng::seed_from_u64(7);
    assert_eq!(
        uniform_noise(&mut rng_a, 4, 10),
        uniform_noise(&mut rng_b, 4, 10)
    );
}

#[test]
fn test_random_one_hot_rows_valid() {
    let mut rng = StdRng::seed_from_u64(42);
    let labels = random_one_hot(&mut rng, 32, 10);
    assert_eq!(labels.shape(), &[32, 10]);
    for row in labels.axis_iter(Axis(0)) {
        assert_eq!(row.sum(), 1.0);
        assert!(row.iter().all(|&v| v == 0.0 || v == 1.0));
    }
}

#[test]
fn test_constant_one_hot() {
    let labels = constant_one_hot(3, 4, 10);
    for row in labels.axis_iter(Axis(0)) {
        assert_eq!(row[3], 1.0);
        assert_eq!(row.sum(), 1.0);
    }
}

#[test]
#[should_panic(expected = "超出字母表大小")]
fn test_constant_one_hot_rejects_out_of_range() {
    constant_one_hot(10, 4, 10);
}

#[test]
fn test_filled_code() {
    let z = filled_code(0.7, 3, 5);
    assert_eq!(z.shape(), &[3, 5]);
    assert!(z.iter().all(|&v| v == 0.7));
}
