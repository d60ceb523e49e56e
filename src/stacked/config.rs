//! 训练配置

/// 两级GAN的全部超参数
///
/// 默认值即正式训练配置（28×28 MNIST、256维特征、50维噪声、
/// 40000步）。测试用[`StackedGanConfig::tiny`]构造小型网络。
#[derive(Debug, Clone)]
pub struct StackedGanConfig {
    /// 展平后的图像维度（28×28×1 = 784）
    pub image_dim: usize,
    /// 特征向量（fc3）维度
    pub feature_dim: usize,
    /// 噪声码z0/z1的维度
    pub z_dim: usize,
    /// 标签字母表大小
    pub num_labels: usize,
    /// 批大小
    pub batch_size: usize,
    /// 对抗训练总步数
    pub train_steps: usize,
    /// 样本网格/快照间隔（步）
    pub save_interval: usize,
    /// 判别器学习率（对抗复合体自动取半）
    pub lr: f32,
    /// 每步学习率衰减（对抗复合体自动取半）
    pub lr_decay: f32,
    /// G1隐藏层宽度
    pub g1_hidden: usize,
    /// G0隐藏层宽度
    pub g0_hidden: usize,
    /// 判别器躯干宽度
    pub d_hidden: usize,
    /// E0隐藏层宽度
    pub e0_hidden: usize,
    /// 编码器预训练轮数
    pub encoder_epochs: usize,
    /// 编码器预训练学习率（Adam）
    pub encoder_lr: f32,
    /// 观测网格的样本数（须为完全平方数）
    pub grid_samples: usize,
    /// 模型名（输出目录与快照文件前缀）
    pub model_name: String,
}

impl Default for StackedGanConfig {
    fn default() -> Self {
        Self {
            image_dim: 784,
            feature_dim: 256,
            z_dim: 50,
            num_labels: 10,
            batch_size: 64,
            train_steps: 40000,
            save_interval: 500,
            lr: 2e-4,
            lr_decay: 6e-8,
            g1_hidden: 512,
            g0_hidden: 512,
            d_hidden: 256,
            e0_hidden: 512,
            encoder_epochs: 10,
            encoder_lr: 1e-3,
            grid_samples: 16,
            model_name: "stackedgan_mnist".to_string(),
        }
    }
}

impl StackedGanConfig {
    /// 小型配置（冒烟测试/dry-run）
    ///
    /// 各维度缩小一个量级，几秒内可在调试构建下跑完整管线。
    pub fn tiny(model_name: &str) -> Self {
        Self {
            image_dim: 16,
            feature_dim: 8,
            z_dim: 4,
            num_labels: 4,
            batch_size: 8,
            train_steps: 20,
            save_interval: 10,
            g1_hidden: 16,
            g0_hidden: 16,
            d_hidden: 8,
            e0_hidden: 16,
            encoder_epochs: 2,
            grid_samples: 4,
            model_name: model_name.to_string(),
            ..Self::default()
        }
    }
}
