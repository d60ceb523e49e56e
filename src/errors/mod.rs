//! crate级错误类型定义
//!
//! 错误分类遵循"立即致命"策略：离线训练任务没有重试或部分恢复，
//! 崩溃后从最近一次快照重启即隐式的恢复模型。

use crate::data::DataError;
use thiserror::Error;

/// 模型相关错误
#[derive(Debug, Error)]
pub enum ModelError {
    /// 批量形状与网络声明的输入/输出形状不一致（致命，终止当前步）
    #[error("形状不匹配（{what}）：期望 {expected:?}，实际 {got:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 预训练权重文件缺失或拓扑不兼容（启动期致命，不回退到随机初始化）
    #[error("快照加载失败: {0}")]
    CheckpointLoad(String),

    /// 快照写入失败
    #[error("快照保存失败: {0}")]
    CheckpointSave(String),

    /// 样本网格渲染失败
    #[error("样本渲染失败: {0}")]
    SampleRender(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据集错误
    #[error("数据集错误: {0}")]
    Data(#[from] DataError),
}

impl ModelError {
    /// 构造形状不匹配错误的便捷方法
    pub fn shape_mismatch(what: &str, expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            what: what.to_string(),
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}
