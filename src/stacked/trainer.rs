//! 训练编排器
//!
//! 交替极小极大调度：每步先更新两个判别器（D1→D0），再更新两个
//! 对抗复合体（A1→A0）。次序是硬约束：
//! - 第i步的D更新必须先于A更新；
//! - A1必须先于喂给A0的假特征重采样——A0的训练批依赖G1的最新参数。
//!
//! 单线程同步执行，一步的四个变更子步全部完成才进入下一步；
//! 不支持步中取消，唯一的检查点边界是固定的保存间隔。

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{concatenate, Array2, Axis};
use rand::rngs::StdRng;

use crate::data::Dataset;
use crate::errors::ModelError;
use crate::nn::optimizer::{Adam, Optimizer};
use crate::nn::categorical_cross_entropy;

use super::checkpoint::{checkpoint_path, load_network, save_network};
use super::composite::{Adversarial0, Adversarial1};
use super::config::StackedGanConfig;
use super::latent::{random_one_hot, uniform_noise};
use super::network::{
    Discriminator0, Discriminator1, Encoder0, Encoder1, Frozen, Generator0, Generator1, LossReport,
};
use super::sampler::{render_grid, SampleSeed};

/// 一个训练步的四份损失报告
#[derive(Debug, Clone, Copy)]
pub struct StepReport {
    pub d1: LossReport,
    pub d0: LossReport,
    pub a1: LossReport,
    pub a0: LossReport,
}

/// 两级GAN：六网络 + 两复合体 + 编排逻辑
///
/// 生命周期：`new`构造全部网络并完成冻结视图与复合体的接线；
/// `pretrain_encoder`（或`load_encoder`）让E0/E1就位；
/// `train`执行固定步数的对抗训练。
pub struct StackedGan {
    cfg: StackedGanConfig,
    e0: Rc<RefCell<Encoder0>>,
    e1: Rc<RefCell<Encoder1>>,
    g0: Rc<RefCell<Generator0>>,
    g1: Rc<RefCell<Generator1>>,
    d0: Rc<RefCell<Discriminator0>>,
    d1: Rc<RefCell<Discriminator1>>,
    a0: Adversarial0,
    a1: Adversarial1,
}

impl StackedGan {
    /// 构造整套网络
    ///
    /// 复合体在此一次性接线（构造期冻结）；对抗复合体的学习率与
    /// 衰减取判别器的一半。
    pub fn new(cfg: StackedGanConfig, rng: &mut StdRng) -> Self {
        let e0 = Rc::new(RefCell::new(Encoder0::new(rng, &cfg)));
        let e1 = Rc::new(RefCell::new(Encoder1::new(rng, &cfg)));
        let g0 = Rc::new(RefCell::new(Generator0::new(rng, &cfg)));
        let g1 = Rc::new(RefCell::new(Generator1::new(rng, &cfg)));
        let d0 = Rc::new(RefCell::new(Discriminator0::new(rng, &cfg)));
        let d1 = Rc::new(RefCell::new(Discriminator1::new(rng, &cfg)));

        let a0 = Adversarial0::new(
            Rc::clone(&g0),
            Frozen::new(Rc::clone(&d0)),
            Frozen::new(Rc::clone(&e0)),
            cfg.lr * 0.5,
            cfg.lr_decay * 0.5,
        );
        let a1 = Adversarial1::new(
            Rc::clone(&g1),
            Frozen::new(Rc::clone(&d1)),
            Frozen::new(Rc::clone(&e1)),
            cfg.lr * 0.5,
            cfg.lr_decay * 0.5,
        );

        Self {
            cfg,
            e0,
            e1,
            g0,
            g1,
            d0,
            d1,
            a0,
            a1,
        }
    }

    /// 配置
    pub fn config(&self) -> &StackedGanConfig {
        &self.cfg
    }

    /// 校验数据集标签字母表与配置一致
    fn check_alphabet(&self, data: &dyn Dataset) -> Result<(), ModelError> {
        if data.num_labels() != self.cfg.num_labels {
            return Err(ModelError::shape_mismatch(
                "数据集标签字母表",
                &[self.cfg.num_labels],
                &[data.num_labels()],
            ));
        }
        Ok(())
    }

    /// 编码器监督预训练（E1∘E0联合，分类交叉熵 + Adam）
    ///
    /// 对抗训练开始前执行一次；结束后保存`<model_name>-encoder.npz`
    /// 并返回测试集精度。
    pub fn pretrain_encoder(
        &mut self,
        train: &dyn Dataset,
        test: &dyn Dataset,
        rng: &mut StdRng,
    ) -> Result<f32, ModelError> {
        self.check_alphabet(train)?;
        let b = self.cfg.batch_size;
        let num_batches = (train.len() / b).max(1);
        let mut optim = Adam::new_default(self.cfg.encoder_lr);

        for epoch in 0..self.cfg.encoder_epochs {
            let mut loss_sum = 0.0;
            for _ in 0..num_batches {
                let (images, labels) = train.sample_batch(rng, b);

                let mut e0 = self.e0.borrow_mut();
                let mut e1 = self.e1.borrow_mut();
                let fc3 = e0.forward(&images)?;
                let probs = e1.forward(&fc3)?;
                let (loss, grad) = categorical_cross_entropy(&probs, &labels);
                loss_sum += loss;

                e0.zero_grad();
                e1.zero_grad();
                let grad_fc3 = e1.backward(&grad);
                e0.backward(&grad_fc3);

                let mut params = e0.params_mut();
                params.extend(e1.params_mut());
                optim.step(&mut params);
            }
            println!(
                "encoder epoch {}/{}: loss {:.6}",
                epoch + 1,
                self.cfg.encoder_epochs,
                loss_sum / num_batches as f32
            );
        }

        save_network(
            &checkpoint_path(&self.cfg.model_name, "encoder"),
            &[
                ("e0", self.e0.borrow().net()),
                ("e1", self.e1.borrow().net()),
            ],
        )?;

        let accuracy = self.evaluate_encoder(test)?;
        println!("encoder测试集精度: {:.1}%", 100.0 * accuracy);
        Ok(accuracy)
    }

    /// 加载预训练编码器快照（`<prefix>-encoder.npz`）
    pub fn load_encoder(&mut self, prefix: &str) -> Result<(), ModelError> {
        let mut e0 = self.e0.borrow_mut();
        let mut e1 = self.e1.borrow_mut();
        load_network(
            &checkpoint_path(prefix, "encoder"),
            &mut [("e0", e0.net_mut()), ("e1", e1.net_mut())],
        )
    }

    /// 冻结编码器栈的分类推理：E1(E0(图像)) → 类别概率
    pub fn classify(&self, images: &Array2<f32>) -> Result<Array2<f32>, ModelError> {
        let fc3 = self.e0.borrow_mut().forward(images)?;
        self.e1.borrow_mut().forward(&fc3)
    }

    /// 编码器栈在数据集上的分类精度
    pub fn evaluate_encoder(&self, data: &dyn Dataset) -> Result<f32, ModelError> {
        let probs = self.classify(data.images())?;
        let labels = data.labels();
        let mut correct = 0usize;
        for (p, t) in probs.outer_iter().zip(labels.outer_iter()) {
            let pred = argmax(p.as_slice().expect("概率行须连续"));
            let truth = argmax(t.as_slice().expect("标签行须连续"));
            if pred == truth {
                correct += 1;
            }
        }
        Ok(correct as f32 / labels.shape()[0] as f32)
    }

    /// 执行一个完整训练步（四个变更子步）
    ///
    /// 批内真半与假半各`batch_size`个样本。返回四份损失报告。
    pub fn train_step(
        &mut self,
        data: &dyn Dataset,
        rng: &mut StdRng,
    ) -> Result<StepReport, ModelError> {
        self.check_alphabet(data)?;
        let b = self.cfg.batch_size;
        let z_dim = self.cfg.z_dim;
        let num_labels = self.cfg.num_labels;

        // ---------- 特征层（stack 1）：更新D1 ----------
        let (real_images, _real_labels) = data.sample_batch(rng, b);
        let real_fc3 = self.e0.borrow_mut().forward(&real_images)?;
        // 真实图像没有"真z1"，此处对真半批回归的是刚抽的无依据噪声，
        // 沿用原设计的已知近似（见DESIGN.md），不在此悄悄更改语义
        let real_z1 = uniform_noise(rng, b, z_dim);

        let fake_z1 = uniform_noise(rng, b, z_dim);
        let fake_labels = random_one_hot(rng, b, num_labels);
        let fake_fc3 = self.g1.borrow_mut().forward(&fake_labels, &fake_z1)?;

        let fc3 = concatenate(Axis(0), &[real_fc3.view(), fake_fc3.view()])
            .expect("真假特征批拼接失败");
        let z1_target = concatenate(Axis(0), &[real_z1.view(), fake_z1.view()])
            .expect("z1目标拼接失败");
        // 前半真（1）后半假（0）
        let y = Array2::from_shape_fn((2 * b, 1), |(i, _)| if i < b { 1.0 } else { 0.0 });

        let d1_report = self.d1.borrow_mut().train_on_batch(&fc3, &y, &z1_target)?;

        // ---------- 像素层（stack 0）：更新D0 ----------
        let real_z0 = uniform_noise(rng, b, z_dim);
        let fake_z0 = uniform_noise(rng, b, z_dim);
        let fake_images = self.g0.borrow_mut().forward(&fake_fc3, &fake_z0)?;

        let x = concatenate(Axis(0), &[real_images.view(), fake_images.view()])
            .expect("真假图像批拼接失败");
        let z0_target = concatenate(Axis(0), &[real_z0.view(), fake_z0.view()])
            .expect("z0目标拼接失败");

        let d0_report = self.d0.borrow_mut().train_on_batch(&x, &y, &z0_target)?;

        // ---------- 对抗阶段：A1先行（推进G1） ----------
        let adv_z1 = uniform_noise(rng, b, z_dim);
        let adv_labels = random_one_hot(rng, b, num_labels);
        let a1_report = self.a1.train_on_batch(&adv_labels, &adv_z1)?;

        // 用刚更新过的G1重采假特征，再推进G0
        let adv_fc3 = self.g1.borrow_mut().forward(&adv_labels, &adv_z1)?;
        let adv_z0 = uniform_noise(rng, b, z_dim);
        let a0_report = self.a0.train_on_batch(&adv_fc3, &adv_z0)?;

        Ok(StepReport {
            d1: d1_report,
            d0: d0_report,
            a1: a1_report,
            a0: a0_report,
        })
    }

    /// 对抗训练主循环
    ///
    /// 每`save_interval`步以及最后一步渲染一次固定种子的样本网格；
    /// 最后一步持久化G0/G1快照。
    pub fn train(&mut self, data: &dyn Dataset, rng: &mut StdRng) -> Result<(), ModelError> {
        // 观测种子在循环前抽取一次，整个训练期固定
        let seed = SampleSeed::random(
            rng,
            self.cfg.grid_samples,
            self.cfg.num_labels,
            self.cfg.z_dim,
        );

        for i in 0..self.cfg.train_steps {
            let report = self.train_step(data, rng)?;
            println!(
                "{i}: [d1 loss: {:.6}] [d0 loss: {:.6}] [a1 loss: {:.6}] [a0 loss: {:.6}]",
                report.d1.total, report.d0.total, report.a1.total, report.a0.total
            );

            let last = i + 1 == self.cfg.train_steps;
            if (i + 1) % self.cfg.save_interval == 0 || last {
                render_grid(
                    &mut self.g0.borrow_mut(),
                    &mut self.g1.borrow_mut(),
                    &seed,
                    i + 1,
                    &self.cfg.model_name,
                )?;
            }
            if last {
                self.save_generators()?;
            }
        }
        Ok(())
    }

    /// 持久化G0/G1快照到`<model_name>-g0.npz` / `<model_name>-g1.npz`
    pub fn save_generators(&self) -> Result<(), ModelError> {
        save_network(
            &checkpoint_path(&self.cfg.model_name, "g0"),
            &[("net", self.g0.borrow().net())],
        )?;
        save_network(
            &checkpoint_path(&self.cfg.model_name, "g1"),
            &[("net", self.g1.borrow().net())],
        )
    }

    /// 共享参数仓句柄（测试与观测用）
    pub fn g0(&self) -> Rc<RefCell<Generator0>> {
        Rc::clone(&self.g0)
    }

    pub fn g1(&self) -> Rc<RefCell<Generator1>> {
        Rc::clone(&self.g1)
    }

    pub fn d0(&self) -> Rc<RefCell<Discriminator0>> {
        Rc::clone(&self.d0)
    }

    pub fn d1(&self) -> Rc<RefCell<Discriminator1>> {
        Rc::clone(&self.d1)
    }

    pub fn e0(&self) -> Rc<RefCell<Encoder0>> {
        Rc::clone(&self.e0)
    }

    pub fn e1(&self) -> Rc<RefCell<Encoder1>> {
        Rc::clone(&self.e1)
    }

    /// 对抗复合体（测试冻结不变量用）
    pub fn a0_mut(&mut self) -> &mut Adversarial0 {
        &mut self.a0
    }

    pub fn a1_mut(&mut self) -> &mut Adversarial1 {
        &mut self.a1
    }
}

/// 行内最大值下标
fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}
