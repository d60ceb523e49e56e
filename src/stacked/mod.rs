//! 两级GAN核心：网络封装、冻结视图、对抗复合体与训练编排器
//!
//! 组成（自底向上）：
//! - [`network`]：六个网络（E0/E1/G0/G1/D0/D1）与[`Frozen`]能力视图
//! - [`composite`]：对抗复合体A0=D0∘G0(+E0)、A1=D1∘G1(+E1)
//! - [`trainer`]：交替极小极大调度的训练编排器
//! - [`sampler`]：固定种子的样本网格渲染
//! - [`checkpoint`]：整网npz快照

mod checkpoint;
mod composite;
mod config;
mod latent;
mod network;
mod sampler;
mod trainer;

pub use checkpoint::{checkpoint_path, load_generators, load_network, save_network};
pub use composite::{Adversarial0, Adversarial1};
pub use config::StackedGanConfig;
pub use latent::{constant_one_hot, filled_code, random_one_hot, uniform_noise};
pub use network::{
    Discriminator0, Discriminator1, Encoder0, Encoder1, Frozen, Generator0, Generator1, LossReport,
};
pub use sampler::{render_grid, SampleSeed};
pub use trainer::{StackedGan, StepReport};

#[cfg(test)]
mod tests;
