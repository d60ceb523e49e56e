//! MNIST手写数字数据集
//!
//! IDX二进制格式解析（裸文件或.gz均可），像素归一化到[0,1]，
//! 标签one-hot编码，缺失文件可选自动下载到用户缓存目录。

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use ndarray::Array2;

use super::error::DataError;
use super::Dataset;

/// 下载镜像（AWS S3；原官网yann.lecun.com不稳定）
const MIRROR: &str = "https://ossci-datasets.s3.amazonaws.com/mnist/";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// 图像边长
pub const IMAGE_SIDE: usize = 28;
/// 展平后的图像维度（28×28×1，单通道）
pub const IMAGE_DIM: usize = IMAGE_SIDE * IMAGE_SIDE;
/// 标签字母表大小
pub const NUM_LABELS: usize = 10;

/// MNIST手写数字数据集（训练集60,000 / 测试集10,000）
///
/// 图像已展平为`[N, 784]`并归一化到[0,1]，标签已one-hot编码为`[N, 10]`。
#[derive(Debug, Clone)]
pub struct MnistDataset {
    images: Array2<f32>,
    labels: Array2<f32>,
}

impl MnistDataset {
    /// 加载指定的数据划分
    ///
    /// `root`为None时使用默认缓存目录；`download`为true时下载缺失文件。
    pub fn load(root: Option<&str>, train: bool, download: bool) -> Result<Self, DataError> {
        let dir = match root {
            Some(p) => PathBuf::from(p),
            None => default_data_dir().join("mnist"),
        };
        let prefix = if train { "train" } else { "t10k" };

        let images_path = locate_or_fetch(&dir, &format!("{prefix}-images-idx3-ubyte"), download)?;
        let labels_path = locate_or_fetch(&dir, &format!("{prefix}-labels-idx1-ubyte"), download)?;

        let images = parse_idx_images(&images_path)?;
        let digits = parse_idx_labels(&labels_path)?;
        if images.shape()[0] != digits.len() {
            return Err(DataError::FormatError(format!(
                "图像数({})与标签数({})不一致",
                images.shape()[0],
                digits.len()
            )));
        }

        let mut labels = Array2::zeros((digits.len(), NUM_LABELS));
        for (i, &d) in digits.iter().enumerate() {
            labels[[i, d as usize]] = 1.0;
        }

        Ok(Self { images, labels })
    }

    /// 训练集（默认路径，自动下载）
    pub fn train() -> Result<Self, DataError> {
        Self::load(None, true, true)
    }

    /// 测试集（默认路径，自动下载）
    pub fn test() -> Result<Self, DataError> {
        Self::load(None, false, true)
    }
}

impl Dataset for MnistDataset {
    fn len(&self) -> usize {
        self.images.shape()[0]
    }

    fn num_labels(&self) -> usize {
        NUM_LABELS
    }

    fn images(&self) -> &Array2<f32> {
        &self.images
    }

    fn labels(&self) -> &Array2<f32> {
        &self.labels
    }
}

/// 默认数据目录：`<用户缓存目录>/stacked_gan/datasets`
pub fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stacked_gan")
        .join("datasets")
}

/// 在数据目录内定位IDX文件（裸文件优先，其次.gz），必要时下载
fn locate_or_fetch(dir: &Path, name: &str, download: bool) -> Result<PathBuf, DataError> {
    let plain = dir.join(name);
    if plain.exists() {
        return Ok(plain);
    }
    let gz = dir.join(format!("{name}.gz"));
    if gz.exists() {
        return Ok(gz);
    }
    if !download {
        return Err(DataError::FileNotFound(plain));
    }

    std::fs::create_dir_all(dir)?;
    let url = format!("{MIRROR}{name}.gz");
    println!("正在下载 {url} ...");

    let response = ureq::get(&url)
        .call()
        .map_err(|e| DataError::DownloadError(format!("HTTP请求失败: {e}")))?;
    if response.status() != 200 {
        return Err(DataError::DownloadError(format!(
            "HTTP状态码: {}",
            response.status()
        )));
    }
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| DataError::DownloadError(format!("读取响应失败: {e}")))?;
    std::fs::write(&gz, &body)?;

    println!("下载完成: {}", gz.display());
    Ok(gz)
}

/// 按扩展名打开裸文件或gz解压读取器
fn open_idx(path: &Path) -> Result<Box<dyn Read>, DataError> {
    let file = File::open(path).map_err(|_| DataError::FileNotFound(path.to_path_buf()))?;
    let reader = BufReader::new(file);
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// 读取一个大端序u32头部字段
fn read_be_u32(reader: &mut dyn Read) -> Result<u32, DataError> {
    let mut word = [0u8; 4];
    reader
        .read_exact(&mut word)
        .map_err(|e| DataError::FormatError(format!("读取头部失败: {e}")))?;
    Ok(u32::from_be_bytes(word))
}

/// 解析IDX图像文件
///
/// 头部依次为magic(2051)、图像数、行数、列数（均为大端序u32），
/// 其后是逐字节像素数据。
fn parse_idx_images(path: &Path) -> Result<Array2<f32>, DataError> {
    let mut reader = open_idx(path)?;

    let magic = read_be_u32(&mut reader)?;
    if magic != IMAGES_MAGIC {
        return Err(DataError::FormatError(format!(
            "无效的magic number: {magic}（期望{IMAGES_MAGIC}）"
        )));
    }
    let count = read_be_u32(&mut reader)? as usize;
    let rows = read_be_u32(&mut reader)? as usize;
    let cols = read_be_u32(&mut reader)? as usize;
    if rows != IMAGE_SIDE || cols != IMAGE_SIDE {
        return Err(DataError::FormatError(format!(
            "无效的图像尺寸: {rows}×{cols}（期望28×28）"
        )));
    }

    let mut raw = vec![0u8; count * IMAGE_DIM];
    reader
        .read_exact(&mut raw)
        .map_err(|e| DataError::FormatError(format!("读取像素数据失败: {e}")))?;

    // [0,255] → [0,1]
    let pixels = raw.into_iter().map(|p| f32::from(p) / 255.0).collect();
    Array2::from_shape_vec((count, IMAGE_DIM), pixels)
        .map_err(|e| DataError::FormatError(format!("构造图像数组失败: {e}")))
}

/// 解析IDX标签文件
///
/// 头部依次为magic(2049)、标签数，其后是逐字节标签值（0..=9）。
fn parse_idx_labels(path: &Path) -> Result<Vec<u8>, DataError> {
    let mut reader = open_idx(path)?;

    let magic = read_be_u32(&mut reader)?;
    if magic != LABELS_MAGIC {
        return Err(DataError::FormatError(format!(
            "无效的magic number: {magic}（期望{LABELS_MAGIC}）"
        )));
    }
    let count = read_be_u32(&mut reader)? as usize;

    let mut labels = vec![0u8; count];
    reader
        .read_exact(&mut labels)
        .map_err(|e| DataError::FormatError(format!("读取标签数据失败: {e}")))?;

    if let Some(&bad) = labels.iter().find(|&&l| l as usize >= NUM_LABELS) {
        return Err(DataError::FormatError(format!("非法标签值: {bad}")));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    use super::*;

    /// 手工构造IDX图像文件字节
    fn idx_image_bytes(num_images: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2051u32.to_be_bytes());
        bytes.extend_from_slice(&(num_images as u32).to_be_bytes());
        bytes.extend_from_slice(&(IMAGE_SIDE as u32).to_be_bytes());
        bytes.extend_from_slice(&(IMAGE_SIDE as u32).to_be_bytes());
        for i in 0..num_images * IMAGE_DIM {
            bytes.push((i % 256) as u8);
        }
        bytes
    }

    fn idx_label_bytes(labels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2049u32.to_be_bytes());
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn test_parse_idx_images_normalizes_pixels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("images-idx3-ubyte");
        std::fs::write(&path, idx_image_bytes(2)).unwrap();

        let images = parse_idx_images(&path).unwrap();
        assert_eq!(images.shape(), &[2, IMAGE_DIM]);
        assert!(images.iter().all(|&v| (0.0..=1.0).contains(&v)));
        // 像素255 → 1.0
        assert_eq!(images[[0, 255]], 1.0);
    }

    #[test]
    fn test_parse_idx_images_from_gz() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("images-idx3-ubyte.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&idx_image_bytes(1)).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let images = parse_idx_images(&path).unwrap();
        assert_eq!(images.shape(), &[1, IMAGE_DIM]);
    }

    #[test]
    fn test_parse_idx_images_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad");
        let mut bytes = idx_image_bytes(1);
        bytes[3] = 0;
        std::fs::write(&path, bytes).unwrap();

        let err = parse_idx_images(&path).unwrap_err();
        assert!(matches!(err, DataError::FormatError(_)));
    }

    #[test]
    fn test_parse_idx_labels_rejects_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labels");
        std::fs::write(&path, idx_label_bytes(&[0, 3, 10])).unwrap();

        let err = parse_idx_labels(&path).unwrap_err();
        assert!(matches!(err, DataError::FormatError(_)));
    }

    #[test]
    fn test_load_from_local_idx_files() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("train-images-idx3-ubyte"),
            idx_image_bytes(4),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("train-labels-idx1-ubyte"),
            idx_label_bytes(&[0, 1, 2, 9]),
        )
        .unwrap();

        let data = MnistDataset::load(dir.path().to_str(), true, false).unwrap();
        assert_eq!(data.len(), 4);
        // one-hot编码
        assert_eq!(data.labels()[[3, 9]], 1.0);
        assert_eq!(data.labels().row(3).sum(), 1.0);
    }

    #[test]
    fn test_load_missing_file_without_download() {
        let dir = tempdir().unwrap();
        let err = MnistDataset::load(dir.path().to_str(), true, false).unwrap_err();
        assert!(matches!(err, DataError::FileNotFound(_)));
    }
}
