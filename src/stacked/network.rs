//! 六个网络的封装
//!
//! 每个网络对外只暴露`forward`与（判别器的）`train_on_batch`；
//! 参数变更只发生在自己的优化器步内，编排器从不直接改参数。
//!
//! 冻结语义在**构造期**完成：复合体不持有子网络本体，而是持有
//! [`Frozen`]视图——该视图只暴露前向与梯度透传，`train_on_batch`
//! 在类型层面不可达，因此"复合体训练步改动非自有参数"无从发生。
//! 参数按引用共享（`Rc<RefCell<_>>`）：同一参数仓被独立网络与其
//! 复合体内嵌共同引用，唯一写者是拥有者自己的训练步。

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{concatenate, Array2, Axis};
use rand::rngs::StdRng;

use crate::errors::ModelError;
use crate::nn::optimizer::{Optimizer, Param, RmsProp};
use crate::nn::{bce, mse, Activation, Dense};

use super::config::StackedGanConfig;

/// 一次训练步的损失报告
#[derive(Debug, Clone, Copy)]
pub struct LossReport {
    /// 各项等权求和
    pub total: f32,
    /// 真假判别项（二元交叉熵）
    pub adversarial: f32,
    /// 噪声码重建项（均方误差）
    pub latent: f32,
    /// 复合体特有的解码一致性项（特征/类别可恢复）
    pub consistency: Option<f32>,
}

/// 校验二维批量形状
fn check_shape(what: &str, x: &Array2<f32>, dim: usize) -> Result<(), ModelError> {
    if x.shape()[1] != dim {
        return Err(ModelError::shape_mismatch(
            what,
            &[x.shape()[0], dim],
            x.shape(),
        ));
    }
    Ok(())
}

/// 校验两个批量的batch维一致
fn check_batch(what: &str, a: &Array2<f32>, b: &Array2<f32>) -> Result<(), ModelError> {
    if a.shape()[0] != b.shape()[0] {
        return Err(ModelError::shape_mismatch(what, a.shape(), b.shape()));
    }
    Ok(())
}

// ==================== 生成器 ====================

/// 生成器G1：（类别码, 噪声码z1）→ 合成特征向量
///
/// 无独立训练步，只经复合体A1间接更新。
pub struct Generator1 {
    net: Dense,
    num_labels: usize,
    z_dim: usize,
}

impl Generator1 {
    pub fn new(rng: &mut StdRng, cfg: &StackedGanConfig) -> Self {
        let net = Dense::new(
            rng,
            &[
                cfg.num_labels + cfg.z_dim,
                cfg.g1_hidden,
                cfg.g1_hidden,
                cfg.feature_dim,
            ],
            &[
                Some(Activation::Relu),
                Some(Activation::Relu),
                Some(Activation::Relu),
            ],
        );
        Self {
            net,
            num_labels: cfg.num_labels,
            z_dim: cfg.z_dim,
        }
    }

    /// 前向传播：`[batch, num_labels]` + `[batch, z_dim]` → `[batch, feature_dim]`
    pub fn forward(
        &mut self,
        labels: &Array2<f32>,
        z1: &Array2<f32>,
    ) -> Result<Array2<f32>, ModelError> {
        check_shape("G1类别码", labels, self.num_labels)?;
        check_shape("G1噪声码z1", z1, self.z_dim)?;
        check_batch("G1输入batch", labels, z1)?;
        let input = concatenate(Axis(1), &[labels.view(), z1.view()])
            .expect("G1输入拼接失败");
        Ok(self.net.forward(&input))
    }

    /// 反向传播（复合体A1调用），关于拼接输入的梯度被丢弃
    pub fn backward(&mut self, grad_out: &Array2<f32>) {
        let _ = self.net.backward(grad_out);
    }

    pub fn zero_grad(&mut self) {
        self.net.zero_grad();
    }

    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        self.net.params_mut()
    }

    /// 内部堆叠（快照保存/加载用）
    pub fn net(&self) -> &Dense {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut Dense {
        &mut self.net
    }
}

/// 生成器G0：（特征向量, 噪声码z0）→ 合成图像
///
/// 末端sigmoid保证像素落在[0,1]。只经复合体A0间接更新。
pub struct Generator0 {
    net: Dense,
    feature_dim: usize,
    z_dim: usize,
}

impl Generator0 {
    pub fn new(rng: &mut StdRng, cfg: &StackedGanConfig) -> Self {
        let net = Dense::new(
            rng,
            &[cfg.feature_dim + cfg.z_dim, cfg.g0_hidden, cfg.image_dim],
            &[Some(Activation::Relu), Some(Activation::Sigmoid)],
        );
        Self {
            net,
            feature_dim: cfg.feature_dim,
            z_dim: cfg.z_dim,
        }
    }

    /// 前向传播：`[batch, feature_dim]` + `[batch, z_dim]` → `[batch, image_dim]`
    pub fn forward(
        &mut self,
        fc3: &Array2<f32>,
        z0: &Array2<f32>,
    ) -> Result<Array2<f32>, ModelError> {
        check_shape("G0特征向量", fc3, self.feature_dim)?;
        check_shape("G0噪声码z0", z0, self.z_dim)?;
        check_batch("G0输入batch", fc3, z0)?;
        let input = concatenate(Axis(1), &[fc3.view(), z0.view()])
            .expect("G0输入拼接失败");
        Ok(self.net.forward(&input))
    }

    /// 反向传播（复合体A0调用）
    pub fn backward(&mut self, grad_out: &Array2<f32>) {
        let _ = self.net.backward(grad_out);
    }

    pub fn zero_grad(&mut self) {
        self.net.zero_grad();
    }

    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        self.net.params_mut()
    }

    pub fn net(&self) -> &Dense {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut Dense {
        &mut self.net
    }
}

// ==================== 判别器 ====================

/// 判别器D0：图像 → (真实概率, z0重建)
///
/// 共享躯干 + 两个头；z重建头即InfoGAN里的Q网络。
pub struct Discriminator0 {
    trunk: Dense,
    source_head: Dense,
    z_head: Dense,
    optim: RmsProp,
    image_dim: usize,
    z_dim: usize,
}

impl Discriminator0 {
    pub fn new(rng: &mut StdRng, cfg: &StackedGanConfig) -> Self {
        Self {
            trunk: Dense::new(
                rng,
                &[cfg.image_dim, cfg.d_hidden],
                &[Some(Activation::LeakyRelu(0.2))],
            ),
            source_head: Dense::new(rng, &[cfg.d_hidden, 1], &[Some(Activation::Sigmoid)]),
            z_head: Dense::new(rng, &[cfg.d_hidden, cfg.z_dim], &[Some(Activation::Sigmoid)]),
            optim: RmsProp::new(cfg.lr, cfg.lr_decay),
            image_dim: cfg.image_dim,
            z_dim: cfg.z_dim,
        }
    }

    /// 前向传播：图像 → (`[batch,1]`真实概率, `[batch,z_dim]`z0重建)
    pub fn forward(
        &mut self,
        images: &Array2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>), ModelError> {
        check_shape("D0图像", images, self.image_dim)?;
        let h = self.trunk.forward(images);
        Ok((self.source_head.forward(&h), self.z_head.forward(&h)))
    }

    /// 判别器训练步
    ///
    /// 损失 = BCE(真实概率, y) + MSE(z0重建, z0目标)，等权求和。
    /// 副作用：更新自身参数。
    pub fn train_on_batch(
        &mut self,
        images: &Array2<f32>,
        y: &Array2<f32>,
        z_target: &Array2<f32>,
    ) -> Result<LossReport, ModelError> {
        check_shape("D0真假标签", y, 1)?;
        check_shape("D0的z0目标", z_target, self.z_dim)?;
        check_batch("D0训练batch", images, y)?;
        check_batch("D0的z0目标batch", images, z_target)?;
        let (prob, z_rec) = self.forward(images)?;

        let (l_adv, g_prob) = bce(&prob, y);
        let (l_z, g_z) = mse(&z_rec, z_target);

        self.trunk.zero_grad();
        self.source_head.zero_grad();
        self.z_head.zero_grad();
        let grad_h = self.source_head.backward(&g_prob) + self.z_head.backward(&g_z);
        let _ = self.trunk.backward(&grad_h);

        let Self {
            trunk,
            source_head,
            z_head,
            optim,
            ..
        } = self;
        let mut params = trunk.params_mut();
        params.extend(source_head.params_mut());
        params.extend(z_head.params_mut());
        optim.step(&mut params);

        Ok(LossReport {
            total: l_adv + l_z,
            adversarial: l_adv,
            latent: l_z,
            consistency: None,
        })
    }

    /// 冻结路径的梯度透传：由两个头的输出梯度求关于输入图像的梯度
    ///
    /// 不触碰任何参数梯度，供复合体A0回传用。
    pub fn backward_through(
        &self,
        grad_prob: &Array2<f32>,
        grad_z: &Array2<f32>,
    ) -> Array2<f32> {
        let grad_h =
            self.source_head.backward_through(grad_prob) + self.z_head.backward_through(grad_z);
        self.trunk.backward_through(&grad_h)
    }

    /// 内部堆叠（快照与测试用），顺序：躯干、真假头、z头
    pub fn nets(&self) -> [&Dense; 3] {
        [&self.trunk, &self.source_head, &self.z_head]
    }
}

/// 判别器D1：特征向量 → (真实概率, z1重建)
///
/// 与D0同构，工作在256维特征层。
pub struct Discriminator1 {
    trunk: Dense,
    source_head: Dense,
    z_head: Dense,
    optim: RmsProp,
    feature_dim: usize,
    z_dim: usize,
}

impl Discriminator1 {
    pub fn new(rng: &mut StdRng, cfg: &StackedGanConfig) -> Self {
        Self {
            trunk: Dense::new(
                rng,
                &[cfg.feature_dim, cfg.d_hidden],
                &[Some(Activation::LeakyRelu(0.2))],
            ),
            source_head: Dense::new(rng, &[cfg.d_hidden, 1], &[Some(Activation::Sigmoid)]),
            z_head: Dense::new(rng, &[cfg.d_hidden, cfg.z_dim], &[Some(Activation::Sigmoid)]),
            optim: RmsProp::new(cfg.lr, cfg.lr_decay),
            feature_dim: cfg.feature_dim,
            z_dim: cfg.z_dim,
        }
    }

    /// 前向传播：特征 → (`[batch,1]`真实概率, `[batch,z_dim]`z1重建)
    pub fn forward(
        &mut self,
        features: &Array2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>), ModelError> {
        check_shape("D1特征向量", features, self.feature_dim)?;
        let h = self.trunk.forward(features);
        Ok((self.source_head.forward(&h), self.z_head.forward(&h)))
    }

    /// 判别器训练步：BCE + MSE，等权求和
    pub fn train_on_batch(
        &mut self,
        features: &Array2<f32>,
        y: &Array2<f32>,
        z_target: &Array2<f32>,
    ) -> Result<LossReport, ModelError> {
        check_shape("D1真假标签", y, 1)?;
        check_shape("D1的z1目标", z_target, self.z_dim)?;
        check_batch("D1训练batch", features, y)?;
        check_batch("D1的z1目标batch", features, z_target)?;
        let (prob, z_rec) = self.forward(features)?;

        let (l_adv, g_prob) = bce(&prob, y);
        let (l_z, g_z) = mse(&z_rec, z_target);

        self.trunk.zero_grad();
        self.source_head.zero_grad();
        self.z_head.zero_grad();
        let grad_h = self.source_head.backward(&g_prob) + self.z_head.backward(&g_z);
        let _ = self.trunk.backward(&grad_h);

        let Self {
            trunk,
            source_head,
            z_head,
            optim,
            ..
        } = self;
        let mut params = trunk.params_mut();
        params.extend(source_head.params_mut());
        params.extend(z_head.params_mut());
        optim.step(&mut params);

        Ok(LossReport {
            total: l_adv + l_z,
            adversarial: l_adv,
            latent: l_z,
            consistency: None,
        })
    }

    /// 冻结路径的梯度透传（复合体A1用）
    pub fn backward_through(
        &self,
        grad_prob: &Array2<f32>,
        grad_z: &Array2<f32>,
    ) -> Array2<f32> {
        let grad_h =
            self.source_head.backward_through(grad_prob) + self.z_head.backward_through(grad_z);
        self.trunk.backward_through(&grad_h)
    }

    pub fn nets(&self) -> [&Dense; 3] {
        [&self.trunk, &self.source_head, &self.z_head]
    }
}

// ==================== 编码器 ====================

/// 编码器E0：图像 → 特征向量（fc3）
///
/// 对抗训练开始前监督预训练（或加载快照），其后只读。
pub struct Encoder0 {
    net: Dense,
    image_dim: usize,
}

impl Encoder0 {
    pub fn new(rng: &mut StdRng, cfg: &StackedGanConfig) -> Self {
        Self {
            net: Dense::new(
                rng,
                &[cfg.image_dim, cfg.e0_hidden, cfg.feature_dim],
                &[Some(Activation::Relu), Some(Activation::Relu)],
            ),
            image_dim: cfg.image_dim,
        }
    }

    /// 前向传播：`[batch, image_dim]` → `[batch, feature_dim]`
    pub fn forward(&mut self, images: &Array2<f32>) -> Result<Array2<f32>, ModelError> {
        check_shape("E0图像", images, self.image_dim)?;
        Ok(self.net.forward(images))
    }

    /// 反向传播（仅预训练期使用）
    pub fn backward(&mut self, grad_out: &Array2<f32>) {
        let _ = self.net.backward(grad_out);
    }

    /// 冻结路径的梯度透传（复合体A0的一致性分支）
    pub fn backward_through(&self, grad_out: &Array2<f32>) -> Array2<f32> {
        self.net.backward_through(grad_out)
    }

    pub fn zero_grad(&mut self) {
        self.net.zero_grad();
    }

    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        self.net.params_mut()
    }

    pub fn net(&self) -> &Dense {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut Dense {
        &mut self.net
    }
}

/// 编码器E1：特征向量 → 类别概率（softmax归一，每行和为1）
pub struct Encoder1 {
    net: Dense,
    feature_dim: usize,
}

impl Encoder1 {
    pub fn new(rng: &mut StdRng, cfg: &StackedGanConfig) -> Self {
        Self {
            net: Dense::new(
                rng,
                &[cfg.feature_dim, cfg.num_labels],
                &[Some(Activation::Softmax)],
            ),
            feature_dim: cfg.feature_dim,
        }
    }

    /// 前向传播：`[batch, feature_dim]` → `[batch, num_labels]`
    pub fn forward(&mut self, features: &Array2<f32>) -> Result<Array2<f32>, ModelError> {
        check_shape("E1特征向量", features, self.feature_dim)?;
        Ok(self.net.forward(features))
    }

    /// 反向传播（仅预训练期使用），返回关于特征的梯度供E0续传
    pub fn backward(&mut self, grad_out: &Array2<f32>) -> Array2<f32> {
        self.net.backward(grad_out)
    }

    /// 冻结路径的梯度透传（复合体A1的一致性分支）
    pub fn backward_through(&self, grad_out: &Array2<f32>) -> Array2<f32> {
        self.net.backward_through(grad_out)
    }

    pub fn zero_grad(&mut self) {
        self.net.zero_grad();
    }

    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        self.net.params_mut()
    }

    pub fn net(&self) -> &Dense {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut Dense {
        &mut self.net
    }
}

// ==================== 冻结视图 ====================

/// 网络的只前向（ForwardOnly）能力视图
///
/// 复合体通过此视图内嵌它不拥有的网络：只暴露前向与梯度透传，
/// 训练步在类型层面不可达。底层参数仓与独立网络共享
/// （`Rc<RefCell<_>>`引用而非拷贝），拥有者的更新对所有内嵌立即可见。
pub struct Frozen<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Frozen<T> {
    /// 由共享参数仓构造冻结视图
    pub fn new(inner: Rc<RefCell<T>>) -> Self {
        Self { inner }
    }
}

impl Frozen<Discriminator0> {
    pub fn forward(
        &self,
        images: &Array2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>), ModelError> {
        self.inner.borrow_mut().forward(images)
    }

    pub fn backward_through(
        &self,
        grad_prob: &Array2<f32>,
        grad_z: &Array2<f32>,
    ) -> Array2<f32> {
        self.inner.borrow().backward_through(grad_prob, grad_z)
    }
}

impl Frozen<Discriminator1> {
    pub fn forward(
        &self,
        features: &Array2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>), ModelError> {
        self.inner.borrow_mut().forward(features)
    }

    pub fn backward_through(
        &self,
        grad_prob: &Array2<f32>,
        grad_z: &Array2<f32>,
    ) -> Array2<f32> {
        self.inner.borrow().backward_through(grad_prob, grad_z)
    }
}

impl Frozen<Encoder0> {
    pub fn forward(&self, images: &Array2<f32>) -> Result<Array2<f32>, ModelError> {
        self.inner.borrow_mut().forward(images)
    }

    pub fn backward_through(&self, grad_out: &Array2<f32>) -> Array2<f32> {
        self.inner.borrow().backward_through(grad_out)
    }
}

impl Frozen<Encoder1> {
    pub fn forward(&self, features: &Array2<f32>) -> Result<Array2<f32>, ModelError> {
        self.inner.borrow_mut().forward(features)
    }

    pub fn backward_through(&self, grad_out: &Array2<f32>) -> Array2<f32> {
        self.inner.borrow().backward_through(grad_out)
    }
}
