//! stacked_gan命令行入口
//!
//! 默认执行完整管线：下载/加载MNIST → 编码器预训练 → 40000步
//! 对抗训练。`--generator`切换到推理模式，只加载生成器快照渲染
//! 一张网格即退出。

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use stacked_gan::data::{Dataset, MnistDataset, SyntheticDigits};
use stacked_gan::errors::ModelError;
use stacked_gan::stacked::{
    constant_one_hot, filled_code, load_generators, random_one_hot, render_grid, uniform_noise,
    SampleSeed, StackedGan, StackedGanConfig,
};

#[derive(Parser, Debug)]
#[command(name = "stacked_gan", about = "MNIST两级GAN的训练与推理")]
struct Args {
    /// 生成器快照前缀（推理模式：加载<前缀>-g0.npz/<前缀>-g1.npz，渲染一张网格后退出）
    #[arg(short, long)]
    generator: Option<String>,

    /// 编码器快照前缀（跳过预训练，加载<前缀>-encoder.npz）
    #[arg(short, long)]
    encoder: Option<String>,

    /// 固定生成数字的类别（0..=9，推理模式用）
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=9))]
    digit: Option<u8>,

    /// 用常数填满特征层噪声z1（推理模式用）
    #[arg(short = 'a', long)]
    code1: Option<f32>,

    /// 用常数填满像素层噪声z0（推理模式用）
    #[arg(short = 'b', long)]
    code2: Option<f32>,

    /// 随机种子
    #[arg(short, long, default_value_t = 1138)]
    seed: u64,

    /// 冒烟模式：小型网络 + 合成数据，几秒内跑完整管线
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("错误: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), ModelError> {
    let mut rng = StdRng::seed_from_u64(args.seed);

    let cfg = if args.dry_run {
        StackedGanConfig::tiny("stackedgan_dry_run")
    } else {
        StackedGanConfig::default()
    };

    if let Some(prefix) = &args.generator {
        return infer(&cfg, prefix, &args, &mut rng);
    }

    if args.dry_run {
        let train = SyntheticDigits::new(7, 256, cfg.image_dim, cfg.num_labels);
        let test = SyntheticDigits::new(8, 64, cfg.image_dim, cfg.num_labels);
        return train_pipeline(cfg, &train, &test, args.encoder.as_deref(), &mut rng);
    }

    let train = MnistDataset::train()?;
    let test = MnistDataset::test()?;
    train_pipeline(cfg, &train, &test, args.encoder.as_deref(), &mut rng)
}

fn train_pipeline(
    mut cfg: StackedGanConfig,
    train: &dyn Dataset,
    test: &dyn Dataset,
    encoder_prefix: Option<&str>,
    rng: &mut StdRng,
) -> Result<(), ModelError> {
    // 标签字母表大小以数据集为准
    cfg.num_labels = train.num_labels();
    let mut gan = StackedGan::new(cfg, rng);

    match encoder_prefix {
        Some(prefix) => {
            gan.load_encoder(prefix)?;
            let accuracy = gan.evaluate_encoder(test)?;
            println!("已加载编码器{prefix}，测试集精度: {:.1}%", 100.0 * accuracy);
        }
        None => {
            gan.pretrain_encoder(train, test, rng)?;
        }
    }

    gan.train(train, rng)
}

/// 推理模式：加载生成器快照，按指令合成一张样本网格
fn infer(
    cfg: &StackedGanConfig,
    prefix: &str,
    args: &Args,
    rng: &mut StdRng,
) -> Result<(), ModelError> {
    let (mut g0, mut g1) = load_generators(cfg, prefix)?;

    let n = cfg.grid_samples;
    let labels = match args.digit {
        Some(d) => constant_one_hot(d as usize, n, cfg.num_labels),
        None => random_one_hot(rng, n, cfg.num_labels),
    };
    let z1 = match args.code1 {
        Some(v) => filled_code(v, n, cfg.z_dim),
        None => uniform_noise(rng, n, cfg.z_dim),
    };
    let z0 = match args.code2 {
        Some(v) => filled_code(v, n, cfg.z_dim),
        None => uniform_noise(rng, n, cfg.z_dim),
    };

    let seed = SampleSeed::new(labels, z0, z1);
    let path = render_grid(&mut g0, &mut g1, &seed, 0, &cfg.model_name)?;
    println!("样本网格已写出: {}", path.display());
    Ok(())
}
