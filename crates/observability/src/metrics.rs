//! 分发节点指标收集模块
//!
//! 记录分发计数，并统计各输出端口之间的负载分布。

use metrics::{counter, gauge, histogram};

/// 记录随机分发数
pub fn record_events_distributed(node: &str, count: u64) {
    counter!("es_distributor_events_distributed_total", "node" => node.to_string())
        .increment(count);
}

/// 记录注册广播数 (每次广播计 1，与扇出宽度无关)
pub fn record_events_registered(node: &str, count: u64) {
    counter!("es_distributor_events_registered_total", "node" => node.to_string())
        .increment(count);
}

/// 记录样本透传数
pub fn record_samples_passed(node: &str, items: u64) {
    counter!("es_distributor_samples_total", "node" => node.to_string()).increment(items);
}

/// 记录失败调用 (kind: "dispatch" / "work")
pub fn record_dispatch_error(node: &str, kind: &str, count: u64) {
    if count > 0 {
        counter!(
            "es_distributor_errors_total",
            "node" => node.to_string(),
            "kind" => kind.to_string()
        )
        .increment(count);
    }
}

/// 记录输出端口队列满导致的丢弃
pub fn record_port_dropped(node: &str, port: &str, dropped: u64) {
    if dropped > 0 {
        counter!(
            "es_distributor_port_dropped_total",
            "node" => node.to_string(),
            "port" => port.to_string()
        )
        .increment(dropped);
    }
}

/// 记录各端口的累计投递数
///
/// `port_names` 与 `deliveries` 按端口序号对齐。
pub fn record_port_deliveries(node: &str, port_names: &[String], deliveries: &[u64]) {
    for (name, count) in port_names.iter().zip(deliveries) {
        gauge!(
            "es_distributor_port_deliveries",
            "node" => node.to_string(),
            "port" => name.clone()
        )
        .set(*count as f64);
    }
    if let Some(max) = deliveries.iter().max() {
        histogram!("es_distributor_port_deliveries_max", "node" => node.to_string())
            .record(*max as f64);
    }
}

/// 端口负载均衡聚合器
///
/// 输入每个端口的投递数，输出离散程度摘要。随机分发下各端口应接近均匀。
#[derive(Debug, Clone, Default)]
pub struct PortBalanceAggregator {
    /// 各端口投递数 (按端口序号)
    deliveries: Vec<(String, u64)>,
    /// 投递数统计
    stats: RunningStats,
}

impl PortBalanceAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个端口的投递数
    pub fn push(&mut self, port: impl Into<String>, delivered: u64) {
        self.deliveries.push((port.into(), delivered));
        self.stats.push(delivered as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> BalanceSummary {
        let total: u64 = self.deliveries.iter().map(|(_, n)| n).sum();
        let stats = StatsSummary::from(&self.stats);
        let imbalance = if stats.count > 0 && stats.mean > 0.0 {
            (stats.max - stats.min) / stats.mean
        } else {
            0.0
        };
        BalanceSummary {
            total,
            ports: self.deliveries.clone(),
            stats,
            imbalance,
        }
    }
}

/// 负载均衡摘要
#[derive(Debug, Clone, Default)]
pub struct BalanceSummary {
    /// 总投递数
    pub total: u64,
    /// 各端口投递数
    pub ports: Vec<(String, u64)>,
    /// 投递数统计
    pub stats: StatsSummary,
    /// (max - min) / mean，0 表示完全均匀
    pub imbalance: f64,
}

impl std::fmt::Display for BalanceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Port Balance Summary ===")?;
        writeln!(f, "Total deliveries: {}", self.total)?;
        for (port, count) in &self.ports {
            let share = if self.total > 0 {
                *count as f64 / self.total as f64 * 100.0
            } else {
                0.0
            };
            writeln!(f, "  {}: {} ({:.2}%)", port, count, share)?;
        }
        writeln!(f, "Per-port: {}", self.stats)?;
        writeln!(f, "Imbalance: {:.3}", self.imbalance)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
