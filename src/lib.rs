//! # Stacked GAN
//!
//! 本crate在MNIST上训练一个两级（stacked）生成对抗网络：
//! 生成任务被拆解为两层隐表示——粗粒度的256维特征层（fc3）与像素层。
//! 六个可训练网络（生成器G0/G1、判别器D0/D1、编码器E0/E1）被组合成
//! 两个对抗复合体A0/A1，按固定的交替极小极大调度逐步更新。
//!
//! 模块划分：
//! - [`nn`]：稠密网络底座（线性层、激活、损失、优化器）
//! - [`data`]：MNIST数据集与合成数据集
//! - [`stacked`]：六网络封装、冻结视图、复合体与训练编排器
//! - [`errors`]：crate级错误类型

pub mod data;
pub mod errors;
pub mod nn;
pub mod stacked;
