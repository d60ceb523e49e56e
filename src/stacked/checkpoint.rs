//! 整网快照
//!
//! 每个网络的全部参数以npz格式整体保存/加载到
//! `<model_name>-<role>.npz`；没有部分或带版本的格式。
//! 加载时逐层校验数组名与形状，拓扑不符立即失败，
//! 不回退到随机初始化。

use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::errors::ModelError;
use crate::nn::Dense;

use super::config::StackedGanConfig;
use super::network::{Generator0, Generator1};

/// 快照文件路径：`<model_name>-<role>.npz`
pub fn checkpoint_path(model_name: &str, role: &str) -> PathBuf {
    PathBuf::from(format!("{model_name}-{role}.npz"))
}

/// 把一组命名稠密堆叠写为单个npz快照
///
/// 数组命名：`<段名>_l<层号>_w` / `<段名>_l<层号>_b`。
pub fn save_network(path: &Path, parts: &[(&str, &Dense)]) -> Result<(), ModelError> {
    let file = File::create(path)?;
    let mut npz = NpzWriter::new(file);
    for (prefix, dense) in parts {
        for (i, layer) in dense.layers().iter().enumerate() {
            npz.add_array(format!("{prefix}_l{i}_w"), layer.linear().weights())
                .map_err(|e| ModelError::CheckpointSave(format!("{}: {e}", path.display())))?;
            npz.add_array(format!("{prefix}_l{i}_b"), layer.linear().bias())
                .map_err(|e| ModelError::CheckpointSave(format!("{}: {e}", path.display())))?;
        }
    }
    npz.finish()
        .map_err(|e| ModelError::CheckpointSave(format!("{}: {e}", path.display())))?;
    Ok(())
}

/// 从npz快照恢复一组命名稠密堆叠
///
/// 目标网络须已按同一拓扑构造；任何数组缺失或形状不符都返回
/// [`ModelError::CheckpointLoad`]。
pub fn load_network(path: &Path, parts: &mut [(&str, &mut Dense)]) -> Result<(), ModelError> {
    let file = File::open(path)
        .map_err(|e| ModelError::CheckpointLoad(format!("{}: {e}", path.display())))?;
    let mut npz = NpzReader::new(file)
        .map_err(|e| ModelError::CheckpointLoad(format!("{}: {e}", path.display())))?;

    for (prefix, dense) in parts.iter_mut() {
        for (i, layer) in dense.layers_mut().iter_mut().enumerate() {
            let w_name = format!("{prefix}_l{i}_w");
            let b_name = format!("{prefix}_l{i}_b");
            let w: Array2<f32> = npz
                .by_name(&w_name)
                .map_err(|e| ModelError::CheckpointLoad(format!("缺少数组{w_name}: {e}")))?;
            let b: Array1<f32> = npz
                .by_name(&b_name)
                .map_err(|e| ModelError::CheckpointLoad(format!("缺少数组{b_name}: {e}")))?;

            let expected_w = [layer.linear().in_features(), layer.linear().out_features()];
            if w.shape() != expected_w {
                return Err(ModelError::CheckpointLoad(format!(
                    "拓扑不符：{w_name}期望形状{expected_w:?}，快照内为{:?}",
                    w.shape()
                )));
            }
            if b.len() != expected_w[1] {
                return Err(ModelError::CheckpointLoad(format!(
                    "拓扑不符：{b_name}期望长度{}，快照内为{}",
                    expected_w[1],
                    b.len()
                )));
            }
            layer.linear_mut().set_weights(w, b);
        }
    }
    Ok(())
}

/// 按前缀加载一对预训练生成器（推理模式用）
///
/// 读取`<prefix>-g0.npz`与`<prefix>-g1.npz`；网络先按配置拓扑
/// 构造再整体覆盖权重，因此快照须与配置拓扑一致。
pub fn load_generators(
    cfg: &StackedGanConfig,
    prefix: &str,
) -> Result<(Generator0, Generator1), ModelError> {
    // 初始化权重随后整体被快照覆盖，种子无意义
    let mut rng = StdRng::seed_from_u64(0);
    let mut g0 = Generator0::new(&mut rng, cfg);
    let mut g1 = Generator1::new(&mut rng, cfg);
    load_network(&checkpoint_path(prefix, "g0"), &mut [("net", g0.net_mut())])?;
    load_network(&checkpoint_path(prefix, "g1"), &mut [("net", g1.net_mut())])?;
    Ok((g0, g1))
}
