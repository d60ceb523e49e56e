//! 样本网格渲染单元测试

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use crate::errors::ModelError;
use crate::stacked::{render_grid, Generator0, Generator1, SampleSeed, StackedGanConfig};

fn cfg() -> StackedGanConfig {
    StackedGanConfig::tiny("sampler_test")
}

#[test]
fn test_render_grid_writes_png() {
    let cfg = cfg();
    let dir = tempdir().unwrap();
    let model_name = dir.path().join("grids");
    let model_name = model_name.to_str().unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let mut g0 = Generator0::new(&mut rng, &cfg);
    let mut g1 = Generator1::new(&mut rng, &cfg);
    let seed = SampleSeed::random(&mut rng, cfg.grid_samples, cfg.num_labels, cfg.z_dim);

    let path = render_grid(&mut g0, &mut g1, &seed, 500, model_name).unwrap();

    assert!(path.ends_with("00500.png"));
    assert!(path.exists());
    // 4样本2×2平铺、16维图像4×4边长 → 8×8网格
    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), (8, 8));
}

#[test]
fn test_render_grid_rejects_non_square_batch() {
    let cfg = cfg();
    let dir = tempdir().unwrap();
    let model_name = dir.path().join("grids");
    let model_name = model_name.to_str().unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let mut g0 = Generator0::new(&mut rng, &cfg);
    let mut g1 = Generator1::new(&mut rng, &cfg);
    // 3不是完全平方数
    let seed = SampleSeed::random(&mut rng, 3, cfg.num_labels, cfg.z_dim);

    let err = render_grid(&mut g0, &mut g1, &seed, 1, model_name).unwrap_err();
    assert!(matches!(err, ModelError::SampleRender(_)));
}

#[test]
fn test_render_grid_rejects_non_square_image() {
    let mut cfg = cfg();
    cfg.image_dim = 12;
    let dir = tempdir().unwrap();
    let model_name = dir.path().join("grids");
    let model_name = model_name.to_str().unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let mut g0 = Generator0::new(&mut rng, &cfg);
    let mut g1 = Generator1::new(&mut rng, &cfg);
    let seed = SampleSeed::random(&mut rng, cfg.grid_samples, cfg.num_labels, cfg.z_dim);

    let err = render_grid(&mut g0, &mut g1, &seed, 1, model_name).unwrap_err();
    assert!(matches!(err, ModelError::SampleRender(_)));
}
