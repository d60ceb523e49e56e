//! 对抗复合体
//!
//! A0 = D0∘G0（附E0一致性分支），A1 = D1∘G1（附E1一致性分支）。
//! 复合体是普通结构体：持有生成器的共享参数仓与非自有网络的
//! [`Frozen`]视图，自身不另持参数。生成器的优化器由复合体拥有——
//! 生成器没有独立训练步，它的"train step"就是复合体的。

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::Array2;

use crate::errors::ModelError;
use crate::nn::optimizer::{Optimizer, RmsProp};
use crate::nn::{bce, categorical_cross_entropy, mse};

use super::network::{
    Discriminator0, Discriminator1, Encoder0, Encoder1, Frozen, Generator0, Generator1, LossReport,
};

/// 复合体A0：像素层的生成器训练单元
///
/// 训练目标：`[全1, 输入z0, 输入fc3]`，
/// 损失 = BCE（骗过D0）+ MSE（z0可重建）+ MSE（特征经E0可恢复）。
/// 该步只更新G0的参数（D0、E0冻结）。
pub struct Adversarial0 {
    g0: Rc<RefCell<Generator0>>,
    d0: Frozen<Discriminator0>,
    e0: Frozen<Encoder0>,
    optim: RmsProp,
}

impl Adversarial0 {
    /// 构造复合体（D0/E0须已通过冻结视图传入）
    pub fn new(
        g0: Rc<RefCell<Generator0>>,
        d0: Frozen<Discriminator0>,
        e0: Frozen<Encoder0>,
        lr: f32,
        lr_decay: f32,
    ) -> Self {
        Self {
            g0,
            d0,
            e0,
            optim: RmsProp::new(lr, lr_decay),
        }
    }

    /// 复合体训练步：只有G0的参数发生变化
    pub fn train_on_batch(
        &mut self,
        fc3: &Array2<f32>,
        z0: &Array2<f32>,
    ) -> Result<LossReport, ModelError> {
        let fake_images = self.g0.borrow_mut().forward(fc3, z0)?;
        let (prob, z_rec) = self.d0.forward(&fake_images)?;
        let feat_rec = self.e0.forward(&fake_images)?;

        // 目标：全1（冒充真）、输入z0、输入fc3
        let ones = Array2::ones((fake_images.shape()[0], 1));
        let (l_adv, g_prob) = bce(&prob, &ones);
        let (l_z, g_z) = mse(&z_rec, z0);
        let (l_feat, g_feat) = mse(&feat_rec, fc3);

        // 冻结透传：梯度穿过D0与E0汇聚到生成图像上
        let grad_images =
            self.d0.backward_through(&g_prob, &g_z) + self.e0.backward_through(&g_feat);

        let mut g0 = self.g0.borrow_mut();
        g0.zero_grad();
        g0.backward(&grad_images);
        self.optim.step(&mut g0.params_mut());

        Ok(LossReport {
            total: l_adv + l_z + l_feat,
            adversarial: l_adv,
            latent: l_z,
            consistency: Some(l_feat),
        })
    }
}

/// 复合体A1：特征层的生成器训练单元
///
/// 训练目标：`[全1, 输入z1, 输入类别码]`，
/// 损失 = BCE + MSE + 多分类交叉熵（类别经E1可恢复）。
/// 该步只更新G1的参数（D1、E1冻结）。
pub struct Adversarial1 {
    g1: Rc<RefCell<Generator1>>,
    d1: Frozen<Discriminator1>,
    e1: Frozen<Encoder1>,
    optim: RmsProp,
}

impl Adversarial1 {
    pub fn new(
        g1: Rc<RefCell<Generator1>>,
        d1: Frozen<Discriminator1>,
        e1: Frozen<Encoder1>,
        lr: f32,
        lr_decay: f32,
    ) -> Self {
        Self {
            g1,
            d1,
            e1,
            optim: RmsProp::new(lr, lr_decay),
        }
    }

    /// 复合体训练步：只有G1的参数发生变化
    pub fn train_on_batch(
        &mut self,
        labels: &Array2<f32>,
        z1: &Array2<f32>,
    ) -> Result<LossReport, ModelError> {
        let fake_fc3 = self.g1.borrow_mut().forward(labels, z1)?;
        let (prob, z_rec) = self.d1.forward(&fake_fc3)?;
        let label_rec = self.e1.forward(&fake_fc3)?;

        let ones = Array2::ones((fake_fc3.shape()[0], 1));
        let (l_adv, g_prob) = bce(&prob, &ones);
        let (l_z, g_z) = mse(&z_rec, z1);
        let (l_cls, g_cls) = categorical_cross_entropy(&label_rec, labels);

        let grad_fc3 =
            self.d1.backward_through(&g_prob, &g_z) + self.e1.backward_through(&g_cls);

        let mut g1 = self.g1.borrow_mut();
        g1.zero_grad();
        g1.backward(&grad_fc3);
        self.optim.step(&mut g1.params_mut());

        Ok(LossReport {
            total: l_adv + l_z + l_cls,
            adversarial: l_adv,
            latent: l_z,
            consistency: Some(l_cls),
        })
    }
}
