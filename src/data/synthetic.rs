//! 确定性合成数据集
//!
//! 供冒烟测试与`--dry-run`使用：每个类别一个固定模板图案，
//! 样本在模板上叠加小幅均匀噪声后截断回[0,1]。
//! 只用于验证训练管线本身，不用于正式训练。

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Dataset;

/// 按类别模板生成的合成"数字"数据集
#[derive(Debug, Clone)]
pub struct SyntheticDigits {
    images: Array2<f32>,
    labels: Array2<f32>,
    num_labels: usize,
}

impl SyntheticDigits {
    /// 生成合成数据集
    ///
    /// # 参数
    /// - `seed`: 决定模板与噪声的种子（同种子同数据）
    /// - `samples`: 样本数
    /// - `image_dim`: 展平后的图像维度
    /// - `num_labels`: 类别数
    pub fn new(seed: u64, samples: usize, image_dim: usize, num_labels: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        // 每个类别一个固定模板
        let templates =
            Array2::from_shape_fn((num_labels, image_dim), |_| rng.gen_range(0.0..1.0f32));

        let mut images = Array2::zeros((samples, image_dim));
        let mut labels = Array2::zeros((samples, num_labels));
        for i in 0..samples {
            let class = i % num_labels;
            labels[[i, class]] = 1.0;
            for j in 0..image_dim {
                let noise = rng.gen_range(-0.05..0.05f32);
                images[[i, j]] = (templates[[class, j]] + noise).clamp(0.0, 1.0);
            }
        }

        Self {
            images,
            labels,
            num_labels,
        }
    }
}

impl Dataset for SyntheticDigits {
    fn len(&self) -> usize {
        self.images.shape()[0]
    }

    fn num_labels(&self) -> usize {
        self.num_labels
    }

    fn images(&self) -> &Array2<f32> {
        &self.images
    }

    fn labels(&self) -> &Array2<f32> {
        &self.labels
    }
}
