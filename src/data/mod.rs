//! 数据集协作方
//!
//! 向训练编排器提供归一化后的定形数组：图像`[N, 784]`（像素在[0,1]）
//! 与one-hot标签`[N, num_labels]`。标签字母表大小在启动时从数据集读取。

mod error;
mod mnist;
mod synthetic;

pub use error::DataError;
pub use mnist::MnistDataset;
pub use synthetic::SyntheticDigits;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;

/// 训练编排器消费的数据集接口
///
/// 实现方保证：`images()`形状`[N, image_dim]`且像素在[0,1]，
/// `labels()`形状`[N, num_labels]`且每行one-hot。
pub trait Dataset {
    /// 样本数量
    fn len(&self) -> usize;

    /// 数据集是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 标签字母表大小
    fn num_labels(&self) -> usize;

    /// 全部图像 `[N, image_dim]`
    fn images(&self) -> &Array2<f32>;

    /// 全部one-hot标签 `[N, num_labels]`
    fn labels(&self) -> &Array2<f32>;

    /// 有放回地均匀抽取一个批量
    ///
    /// 随机性全部来自显式传入的`rng`。
    fn sample_batch(&self, rng: &mut StdRng, batch_size: usize) -> (Array2<f32>, Array2<f32>) {
        let images = self.images();
        let labels = self.labels();
        let image_dim = images.shape()[1];
        let label_dim = labels.shape()[1];
        let mut batch_images = Array2::zeros((batch_size, image_dim));
        let mut batch_labels = Array2::zeros((batch_size, label_dim));
        for i in 0..batch_size {
            let idx = rng.gen_range(0..self.len());
            batch_images.row_mut(i).assign(&images.row(idx));
            batch_labels.row_mut(i).assign(&labels.row(idx));
        }
        (batch_images, batch_labels)
    }
}
