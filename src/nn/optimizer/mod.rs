//! 优化器
//!
//! 每个网络拥有独立的优化器实例；编排器从不直接改参数，
//! 参数变更只发生在各网络自己的`train_on_batch`内部。

mod adam;
mod base;
mod rmsprop;

pub use adam::Adam;
pub use base::{Optimizer, Param};
pub use rmsprop::RmsProp;
