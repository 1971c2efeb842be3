//! Channel-backed port registry - a host stand-in for message routing
//!
//! Each output endpoint becomes a bounded tokio channel. The distributor
//! publishes through a `PortHandle`; the downstream consumer reads from the
//! matching `PortReceiver`.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use contracts::{ContractError, InPort, Message, MessagePublisher, OutPortId, PortName, PortRegistry};

use crate::metrics::PortMetrics;

/// Publish side of an output endpoint
pub struct PortHandle {
    /// Endpoint name
    name: PortName,
    /// Channel to the consumer
    tx: mpsc::Sender<Message>,
    /// Shared metrics
    metrics: Arc<PortMetrics>,
}

impl PortHandle {
    /// Get current metrics
    pub fn metrics(&self) -> &Arc<PortMetrics> {
        &self.metrics
    }
}

impl MessagePublisher for PortHandle {
    fn port_name(&self) -> &PortName {
        &self.name
    }

    /// Send a message to the consumer (non-blocking)
    ///
    /// A full queue drops the message; the consumer is never awaited.
    fn publish(&self, message: Message) -> Result<(), ContractError> {
        match self.tx.try_send(message) {
            Ok(()) => {
                self.metrics.inc_published_count();
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(m)) => {
                self.metrics.inc_dropped_count();
                warn!(port = %self.name, kind = m.kind(), "Queue full, message dropped");
                Err(ContractError::PortFull {
                    port: self.name.to_string(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(port = %self.name, "Port consumer closed unexpectedly");
                Err(ContractError::PortClosed {
                    port: self.name.to_string(),
                })
            }
        }
    }
}

/// Consumer side of an output endpoint
pub struct PortReceiver {
    id: OutPortId,
    name: PortName,
    rx: mpsc::Receiver<Message>,
    metrics: Arc<PortMetrics>,
}

impl PortReceiver {
    pub fn id(&self) -> OutPortId {
        self.id
    }

    pub fn name(&self) -> &PortName {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<PortMetrics> {
        &self.metrics
    }

    /// Wait for the next message; `None` once every publisher is gone
    pub async fn recv(&mut self) -> Option<Message> {
        let message = self.rx.recv().await;
        self.metrics.set_queue_len(self.rx.len());
        message
    }

    /// Take everything currently queued without waiting
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.rx.len());
        while let Ok(message) = self.rx.try_recv() {
            out.push(message);
        }
        self.metrics.set_queue_len(0);
        out
    }
}

/// Port registry that wires every output endpoint to a bounded channel
pub struct ChannelRegistry {
    queue_capacity: usize,
    inputs: Vec<InPort>,
    receivers: Vec<PortReceiver>,
}

impl ChannelRegistry {
    /// Create a registry whose output queues hold `queue_capacity` messages
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity: queue_capacity.max(1),
            inputs: Vec::new(),
            receivers: Vec::new(),
        }
    }

    /// Declared inbound endpoints, in declaration order
    pub fn inputs(&self) -> &[InPort] {
        &self.inputs
    }

    /// Hand the consumer ends over, in output port order
    pub fn take_receivers(&mut self) -> Vec<PortReceiver> {
        std::mem::take(&mut self.receivers)
    }
}

impl PortRegistry for ChannelRegistry {
    type Publisher = PortHandle;

    fn register_input(&mut self, port: InPort) -> Result<(), ContractError> {
        if self.inputs.contains(&port) {
            return Err(ContractError::port_registration(
                port.name(),
                "input port declared twice",
            ));
        }
        debug!(port = %port, "Input port registered");
        self.inputs.push(port);
        Ok(())
    }

    fn register_output(
        &mut self,
        id: OutPortId,
        name: &PortName,
    ) -> Result<PortHandle, ContractError> {
        if self.receivers.iter().any(|r| r.name == *name) {
            return Err(ContractError::port_registration(
                name.as_str(),
                "output port declared twice",
            ));
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let metrics = Arc::new(PortMetrics::new());

        self.receivers.push(PortReceiver {
            id,
            name: name.clone(),
            rx,
            metrics: Arc::clone(&metrics),
        });
        debug!(port = %name, id = id.index(), "Output port registered");

        Ok(PortHandle {
            name: name.clone(),
            tx,
            metrics,
        })
    }
}
