//! NodeBlueprint - Config Loader 输出
//!
//! 描述一个分发节点的完整配置：节点名称、分发器构造参数、端口队列参数。

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{out_port_names, InPort, PortName, StreamShape};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的节点配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NodeBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 节点设置
    #[validate(nested)]
    pub node: NodeConfig,

    /// 分发器构造参数
    #[validate(nested)]
    pub distributor: DistributorConfig,

    /// 输出端口队列设置
    #[serde(default)]
    #[validate(nested)]
    pub ports: PortQueueConfig,
}

/// 节点设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NodeConfig {
    /// 节点名称 (日志/指标标签)
    #[validate(length(min = 1, message = "node name cannot be empty"))]
    pub name: String,
}

/// 分发器构造参数
///
/// 对应图构造请求：流形状、输出端口数量、是否拆分注册端口。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DistributorConfig {
    /// 输出消息端口数量 (0..=4)
    #[validate(range(max = 4, message = "at most 4 output ports are supported"))]
    pub num_out_ports: usize,

    /// 是否为注册消息使用独立的 `dist_all` 输入端口
    #[serde(default)]
    pub split_registration: bool,

    /// 随机数种子 (None = 使用系统熵)
    #[serde(default)]
    pub seed: Option<u64>,

    /// 样本流形状 (输入输出相同)
    #[serde(default)]
    #[validate(nested)]
    pub shape: StreamShape,
}

impl DistributorConfig {
    /// 创建仅含消息端口的配置 (无样本流)
    pub fn new(num_out_ports: usize) -> Self {
        Self {
            shape: StreamShape::empty(),
            num_out_ports,
            split_registration: false,
            seed: None,
        }
    }

    /// 设置样本流形状
    pub fn with_shape(mut self, shape: StreamShape) -> Self {
        self.shape = shape;
        self
    }

    /// 启用拆分注册模式
    pub fn with_split_registration(mut self, split: bool) -> Self {
        self.split_registration = split;
        self
    }

    /// 设置随机数种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 输入端口 (拆分模式下额外包含 `dist_all`)
    pub fn in_ports(&self) -> Vec<InPort> {
        if self.split_registration {
            vec![InPort::Random, InPort::All]
        } else {
            vec![InPort::Random]
        }
    }

    /// 输出端口名称
    pub fn out_port_names(&self) -> Vec<PortName> {
        out_port_names(self.num_out_ports)
    }
}

/// 输出端口队列设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PortQueueConfig {
    /// 每个输出端口的队列容量
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "queue_capacity must be > 0"))]
    pub queue_capacity: usize,
}

impl Default for PortQueueConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}
