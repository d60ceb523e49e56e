//! 优化器基础trait与参数视图

use ndarray::{ArrayViewD, ArrayViewMutD};

/// 一个可训练参数的（值，梯度）视图对
///
/// 优化器按槽位（在`params`切片中的下标）维护动量等状态，
/// 因此调用方必须以**稳定顺序**收集参数。
pub struct Param<'a> {
    /// 参数值（原地更新）
    pub value: ArrayViewMutD<'a, f32>,
    /// 已累积的梯度（只读）
    pub grad: ArrayViewD<'a, f32>,
}

/// 优化器核心trait
///
/// 训练循环形如：
/// ```ignore
/// net.zero_grad();
/// let grad = ...;          // 前向 + 损失
/// net.backward(&grad);     // 累积参数梯度
/// optim.step(&mut net.params_mut());  // 只改参数，不做前向/反向
/// ```
pub trait Optimizer {
    /// 用已累积的梯度原地更新一组参数
    fn step(&mut self, params: &mut [Param<'_>]);

    /// 重置累积状态（动量、时间步等）
    fn reset(&mut self);

    /// 获取学习率
    fn learning_rate(&self) -> f32;

    /// 设置学习率
    fn set_learning_rate(&mut self, lr: f32);
}
