//! # Distributor
//!
//! 事件分发节点。
//!
//! 负责：
//! - 普通事件随机分发到一个输出端口
//! - 注册事件广播到全部输出端口
//! - 样本流原样透传
//! - 分发计数 (供监控/测试读取)

pub mod distributor;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod node;

pub use contracts::{InPort, Message, MessagePublisher, OutPortId, PortName, PortRegistry};
pub use distributor::{Delivery, Distributor, OutputPort};
pub use error::{BufferDirection, DistributorError};
pub use handle::{ChannelRegistry, PortHandle, PortReceiver};
pub use metrics::{DistributorMetrics, DistributorSnapshot, PortMetrics, PortSnapshot};
pub use node::{DistributorNode, NodeInput, NodeReport, SampleBlock};
