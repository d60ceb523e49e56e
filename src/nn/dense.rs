//! 稠密层堆叠
//!
//! `Dense`是若干"Linear + 可选激活"的顺序组合，是六个网络共用的躯干。
//! 与[`Linear`](super::Linear)一致，反向传播分可训练/冻结两条路径。

use ndarray::Array2;
use rand::rngs::StdRng;

use super::optimizer::Param;
use super::{Activation, Linear};

/// 一段"Linear + 可选激活"
pub struct DenseLayer {
    linear: Linear,
    activation: Option<Activation>,
    /// 激活输出缓存（激活反向传播只依赖输出）
    act_cache: Option<Array2<f32>>,
}

impl DenseLayer {
    /// 所属线性层
    pub fn linear(&self) -> &Linear {
        &self.linear
    }

    /// 所属线性层（可变）
    pub fn linear_mut(&mut self) -> &mut Linear {
        &mut self.linear
    }
}

/// 顺序堆叠的稠密网络
pub struct Dense {
    layers: Vec<DenseLayer>,
}

impl Dense {
    /// 创建稠密堆叠
    ///
    /// # 参数
    /// - `rng`: 显式随机数发生器（参数初始化）
    /// - `dims`: 各层维度，如`&[784, 512, 256]`表示两层：784→512→256
    /// - `acts`: 每层的激活（长度须为`dims.len() - 1`）
    pub fn new(rng: &mut StdRng, dims: &[usize], acts: &[Option<Activation>]) -> Self {
        assert_eq!(
            acts.len(),
            dims.len() - 1,
            "激活数量须与层数一致：{}层却给了{}个激活",
            dims.len() - 1,
            acts.len()
        );
        let layers = dims
            .windows(2)
            .zip(acts.iter())
            .map(|(d, act)| DenseLayer {
                linear: Linear::new(rng, d[0], d[1]),
                activation: *act,
                act_cache: None,
            })
            .collect();
        Self { layers }
    }

    /// 前向传播
    pub fn forward(&mut self, x: &Array2<f32>) -> Array2<f32> {
        let mut cur = x.clone();
        for layer in &mut self.layers {
            cur = layer.linear.forward(&cur);
            if let Some(act) = layer.activation {
                cur = act.forward(&cur);
                layer.act_cache = Some(cur.clone());
            }
        }
        cur
    }

    /// 反向传播（可训练路径）：累积各层参数梯度，返回输入梯度
    pub fn backward(&mut self, grad_out: &Array2<f32>) -> Array2<f32> {
        let mut grad = grad_out.clone();
        for layer in self.layers.iter_mut().rev() {
            if let Some(act) = layer.activation {
                let out = layer
                    .act_cache
                    .as_ref()
                    .expect("Dense反向传播前须先前向传播");
                grad = act.backward(out, &grad);
            }
            grad = layer.linear.backward(&grad);
        }
        grad
    }

    /// 反向传播（冻结路径）：只透传输入梯度，参数与参数梯度均不变
    pub fn backward_through(&self, grad_out: &Array2<f32>) -> Array2<f32> {
        let mut grad = grad_out.clone();
        for layer in self.layers.iter().rev() {
            if let Some(act) = layer.activation {
                let out = layer
                    .act_cache
                    .as_ref()
                    .expect("Dense冻结反向传播前须先前向传播");
                grad = act.backward(out, &grad);
            }
            grad = layer.linear.backward_through(&grad);
        }
        grad
    }

    /// 清零所有参数梯度
    pub fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            layer.linear.zero_grad();
        }
    }

    /// 以稳定顺序暴露全部参数视图（逐层：W、b）
    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.linear.params_mut())
            .collect()
    }

    /// 层列表（快照保存/加载用）
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// 层列表（可变）
    pub fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    /// 首层输入维度
    pub fn in_features(&self) -> usize {
        self.layers[0].linear.in_features()
    }

    /// 末层输出维度
    pub fn out_features(&self) -> usize {
        self.layers[self.layers.len() - 1].linear.out_features()
    }
}
