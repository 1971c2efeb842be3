//! Simulation orchestrator - wires a distributor node to synthetic traffic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{InPort, Message, NodeBlueprint, StreamShape, REGISTER_HANDLER_TAG};
use distributor::{
    ChannelRegistry, Distributor, DistributorMetrics, DistributorNode, NodeInput, PortReceiver,
    SampleBlock,
};

use super::stats::{PortTally, RunStats, SampleTally, SentTally};

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Node configuration
    pub blueprint: NodeBlueprint,
    /// Plain events sent to `dist_random`
    pub events: u64,
    /// Handler registrations sent ahead of the events
    pub registrations: u64,
    /// Items per sample block (0 = no sample traffic)
    pub items_per_block: usize,
    /// Sample blocks interleaved with the events
    pub blocks: u64,
    /// Node input queue capacity
    pub buffer_size: usize,
    /// Optional timeout for feeding the node
    pub timeout: Option<Duration>,
    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Drives one distributor node end to end
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run the simulation to completion
    ///
    /// 1. Build the channel registry and the distributor
    /// 2. Start one consumer per output port plus the sample consumer
    /// 3. Feed registrations, events and sample blocks
    /// 4. Close the node input and collect every tally
    #[instrument(name = "simulation_run", skip(self), fields(node = %self.config.blueprint.node.name))]
    pub async fn run(self) -> Result<RunStats> {
        let start = Instant::now();
        let SimulationConfig {
            blueprint,
            events,
            registrations,
            items_per_block,
            blocks,
            buffer_size,
            timeout,
            metrics_port,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
        }

        let node_name = blueprint.node.name.clone();
        let mut registry = ChannelRegistry::new(blueprint.ports.queue_capacity);
        let distributor = Distributor::new(blueprint.distributor.clone(), &mut registry)
            .context("Failed to construct distributor")?;

        let counters = Arc::clone(distributor.metrics());
        let port_names: Vec<String> = distributor
            .output_ports()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let plan = TrafficPlan {
            events,
            registrations,
            items_per_block,
            blocks: if items_per_block == 0 { 0 } else { blocks },
            split_registration: distributor.split_registration(),
        };
        let shape = distributor.shape().clone();

        info!(
            outputs = ?port_names,
            events,
            registrations,
            blocks = plan.blocks,
            "Starting simulation"
        );

        let consumers: Vec<JoinHandle<PortTally>> = registry
            .take_receivers()
            .into_iter()
            .map(spawn_port_consumer)
            .collect();

        let (input_tx, input_rx) = mpsc::channel(buffer_size.max(1));
        let (sample_tx, sample_rx) = mpsc::channel(buffer_size.max(1));
        let sample_consumer = spawn_sample_consumer(sample_rx);
        let node = DistributorNode::new(distributor, input_rx)
            .with_sample_output(sample_tx)
            .spawn();
        let monitor = spawn_monitor(node_name.clone(), port_names, counters);

        let feed = plan.feed(input_tx, &shape);
        let sent = match timeout {
            Some(limit) => tokio::time::timeout(limit, feed)
                .await
                .context("Simulation timed out while feeding the node")??,
            None => feed.await?,
        };
        debug!(?sent, "Traffic fed, waiting for node to drain");

        let report = node.await.context("Distributor node task failed")?;
        monitor.abort();

        let mut ports = Vec::with_capacity(consumers.len());
        for consumer in consumers {
            ports.push(consumer.await.context("Port consumer task failed")?);
        }
        let samples = sample_consumer
            .await
            .context("Sample consumer task failed")?;

        record_run_metrics(&node_name, &report, &ports);

        Ok(RunStats {
            node: node_name,
            duration: start.elapsed(),
            sent,
            report,
            ports,
            samples,
        })
    }
}

/// Synthetic traffic shape
#[derive(Debug, Clone, Copy)]
struct TrafficPlan {
    events: u64,
    registrations: u64,
    items_per_block: usize,
    blocks: u64,
    split_registration: bool,
}

impl TrafficPlan {
    /// Send all traffic, then close the node input by dropping `tx`
    async fn feed(self, tx: mpsc::Sender<NodeInput>, shape: &StreamShape) -> Result<SentTally> {
        let mut sent = SentTally::default();

        let registration_port = if self.split_registration {
            InPort::All
        } else {
            InPort::Random
        };
        for i in 0..self.registrations {
            let message = Message::classify(Some(REGISTER_HANDLER_TAG), format!("handler-{i}"));
            send(&tx, NodeInput::Message {
                port: registration_port,
                message,
            })
            .await?;
            sent.registrations += 1;
        }

        let block_every = if self.blocks > 0 {
            (self.events / self.blocks).max(1)
        } else {
            0
        };

        for i in 0..self.events {
            let message = Message::classify(None, format!("event-{i}"));
            send(&tx, NodeInput::Message {
                port: InPort::Random,
                message,
            })
            .await?;
            sent.events += 1;

            if block_every > 0 && sent.blocks < self.blocks && (i + 1) % block_every == 0 {
                send(&tx, NodeInput::Samples(self.sample_block(shape, sent.blocks))).await?;
                sent.blocks += 1;
            }
        }

        while sent.blocks < self.blocks {
            send(&tx, NodeInput::Samples(self.sample_block(shape, sent.blocks))).await?;
            sent.blocks += 1;
        }

        Ok(sent)
    }

    fn sample_block(&self, shape: &StreamShape, seq: u64) -> SampleBlock {
        let streams = (0..shape.stream_count())
            .map(|stream| {
                let len = shape.bytes_for(stream, self.items_per_block).unwrap_or(0);
                (0..len)
                    .map(|b| (b as u64).wrapping_add(seq) as u8)
                    .collect()
            })
            .collect();

        SampleBlock {
            item_count: self.items_per_block,
            streams,
        }
    }
}

async fn send(tx: &mpsc::Sender<NodeInput>, input: NodeInput) -> Result<()> {
    tx.send(input)
        .await
        .map_err(|_| anyhow!("Distributor node stopped accepting input"))
}

fn spawn_port_consumer(mut receiver: PortReceiver) -> JoinHandle<PortTally> {
    tokio::spawn(async move {
        let mut tally = PortTally {
            port: receiver.name().to_string(),
            ..Default::default()
        };

        while let Some(message) = receiver.recv().await {
            match message {
                Message::Event(_) => tally.events += 1,
                Message::RegisterHandler(_) => tally.registrations += 1,
            }
        }

        tally.dropped = receiver.metrics().dropped_count();
        if tally.dropped > 0 {
            warn!(port = %tally.port, dropped = tally.dropped, "Port queue overflowed");
        }
        debug!(port = %tally.port, events = tally.events, "Port consumer finished");
        tally
    })
}

fn spawn_sample_consumer(mut rx: mpsc::Receiver<SampleBlock>) -> JoinHandle<SampleTally> {
    tokio::spawn(async move {
        let mut tally = SampleTally::default();
        while let Some(block) = rx.recv().await {
            tally.blocks += 1;
            tally.items += block.item_count as u64;
            tally.bytes += block.streams.iter().map(|s| s.len() as u64).sum::<u64>();
        }
        tally
    })
}

/// Periodically publish live counters while the node runs
fn spawn_monitor(
    node: String,
    port_names: Vec<String>,
    counters: Arc<DistributorMetrics>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            let snapshot = counters.snapshot();
            observability::record_port_deliveries(&node, &port_names, &snapshot.port_deliveries);
            debug!(
                distributed = snapshot.events_distributed,
                registered = snapshot.events_registered,
                sample_time = snapshot.sample_time,
                "Distributor progress"
            );
        }
    })
}

fn record_run_metrics(node: &str, report: &distributor::NodeReport, ports: &[PortTally]) {
    let counters = &report.counters;
    observability::record_events_distributed(node, counters.events_distributed);
    observability::record_events_registered(node, counters.events_registered);
    observability::record_samples_passed(node, counters.sample_time);
    observability::record_dispatch_error(node, "dispatch", report.dispatch_errors);
    observability::record_dispatch_error(node, "work", report.work_errors);
    observability::record_port_deliveries(node, &report.port_names, &counters.port_deliveries);
    for tally in ports {
        observability::record_port_dropped(node, &tally.port, tally.dropped);
    }
}
