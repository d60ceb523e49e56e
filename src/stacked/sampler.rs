//! 样本网格渲染
//!
//! 训练观测用：用固定的（类别码, z0, z1）种子经G1→G0生成一批图像，
//! 平铺为方形网格写出PNG到`<model_name>/<step:05>.png`。
//! 渲染只为可观测性服务，与训练正确性无关。

use std::path::{Path, PathBuf};

use image::GrayImage;
use ndarray::Array2;
use rand::rngs::StdRng;

use crate::errors::ModelError;

use super::latent::{random_one_hot, uniform_noise};
use super::network::{Generator0, Generator1};

/// 固定的观测种子（整个训练期复用同一份）
pub struct SampleSeed {
    /// one-hot类别码 `[n, num_labels]`
    pub labels: Array2<f32>,
    /// 像素层噪声 `[n, z_dim]`
    pub z0: Array2<f32>,
    /// 特征层噪声 `[n, z_dim]`
    pub z1: Array2<f32>,
}

impl SampleSeed {
    /// 随机抽取一份观测种子
    pub fn random(rng: &mut StdRng, n: usize, num_labels: usize, z_dim: usize) -> Self {
        Self {
            labels: random_one_hot(rng, n, num_labels),
            z0: uniform_noise(rng, n, z_dim),
            z1: uniform_noise(rng, n, z_dim),
        }
    }

    /// 用调用方给定的隐码构造观测种子
    pub fn new(labels: Array2<f32>, z0: Array2<f32>, z1: Array2<f32>) -> Self {
        Self { labels, z0, z1 }
    }
}

/// 生成一张样本网格并写盘
///
/// # 返回
/// 写出的PNG路径 `<model_name>/<step:05>.png`
pub fn render_grid(
    g0: &mut Generator0,
    g1: &mut Generator1,
    seed: &SampleSeed,
    step: usize,
    model_name: &str,
) -> Result<PathBuf, ModelError> {
    let fc3 = g1.forward(&seed.labels, &seed.z1)?;
    let images = g0.forward(&fc3, &seed.z0)?;

    let n = images.shape()[0];
    let image_dim = images.shape()[1];
    let side = (image_dim as f64).sqrt() as usize;
    if side * side != image_dim {
        return Err(ModelError::SampleRender(format!(
            "图像维度{image_dim}不是完全平方数，无法按方形栅格渲染"
        )));
    }
    let rows = (n as f64).sqrt() as usize;
    if rows * rows != n {
        return Err(ModelError::SampleRender(format!(
            "样本数{n}不是完全平方数，无法平铺为方形网格"
        )));
    }

    let mut grid = GrayImage::new((rows * side) as u32, (rows * side) as u32);
    for (idx, row) in images.outer_iter().enumerate() {
        let (tile_y, tile_x) = (idx / rows, idx % rows);
        for y in 0..side {
            for x in 0..side {
                let v = (row[y * side + x] * 255.0).clamp(0.0, 255.0) as u8;
                grid.put_pixel(
                    (tile_x * side + x) as u32,
                    (tile_y * side + y) as u32,
                    image::Luma([v]),
                );
            }
        }
    }

    std::fs::create_dir_all(model_name)?;
    let path = Path::new(model_name).join(format!("{step:05}.png"));
    grid.save(&path)
        .map_err(|e| ModelError::SampleRender(format!("{}: {e}", path.display())))?;
    Ok(path)
}
