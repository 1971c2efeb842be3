//! Distributor - random/broadcast message dispatch plus sample passthrough

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, trace};
use validator::Validate;

use contracts::{
    ContractError, DistributorConfig, InPort, Message, MessagePublisher, OutPortId, PortName,
    PortRegistry, StreamShape, MAX_STREAMS,
};

use crate::error::{BufferDirection, DistributorError};
use crate::metrics::{DistributorMetrics, DistributorSnapshot};

/// An outbound endpoint declared at construction
pub struct OutputPort<P> {
    id: OutPortId,
    name: PortName,
    publisher: P,
}

impl<P> OutputPort<P> {
    pub fn id(&self) -> OutPortId {
        self.id
    }

    pub fn name(&self) -> &PortName {
        &self.name
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

/// Where a message went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Published to exactly one port
    Routed(OutPortId),
    /// Published to every port
    Broadcast { fanout: usize },
}

/// Event distribution node
///
/// Ordinary events go to one output port picked uniformly at random;
/// handler registrations go to every output port. Sample streams pass
/// through untouched.
///
/// Calls are expected one at a time; the host serializes them.
pub struct Distributor<P: MessagePublisher> {
    shape: StreamShape,
    split_registration: bool,
    input_ports: Vec<InPort>,
    output_ports: Vec<OutputPort<P>>,
    rng: StdRng,
    metrics: Arc<DistributorMetrics>,
}

impl<P: MessagePublisher> Distributor<P> {
    /// Validate the configuration and declare every endpoint with the host
    ///
    /// # Errors
    /// - Out-of-range port count or malformed stream shape
    /// - Host refused an endpoint declaration
    #[instrument(
        name = "distributor_new",
        skip(config, registry),
        fields(
            num_out_ports = config.num_out_ports,
            split_registration = config.split_registration,
            streams = config.shape.stream_count()
        )
    )]
    pub fn new<R>(config: DistributorConfig, registry: &mut R) -> Result<Self, DistributorError>
    where
        R: PortRegistry<Publisher = P>,
    {
        config
            .validate()
            .map_err(|e| ContractError::from_validation("distributor", &e))?;

        let input_ports = config.in_ports();
        for port in &input_ports {
            registry.register_input(*port)?;
        }

        let output_ports = config
            .out_port_names()
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let id = OutPortId(index);
                let publisher = registry.register_output(id, &name)?;
                Ok(OutputPort {
                    id,
                    name,
                    publisher,
                })
            })
            .collect::<Result<Vec<_>, ContractError>>()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        info!(
            inputs = ?input_ports,
            outputs = ?output_ports.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "Distributor ports registered"
        );

        Ok(Self {
            metrics: Arc::new(DistributorMetrics::new(output_ports.len())),
            shape: config.shape,
            split_registration: config.split_registration,
            input_ports,
            output_ports,
            rng,
        })
    }

    /// Deliver a message that arrived on `port`
    pub fn handle_message(
        &mut self,
        port: InPort,
        message: Message,
    ) -> Result<Delivery, DistributorError> {
        match port {
            InPort::Random => self.dist_random(message),
            InPort::All if self.split_registration => Ok(Delivery::Broadcast {
                fanout: self.dist_all(message),
            }),
            InPort::All => Err(DistributorError::PortNotRegistered { port }),
        }
    }

    /// General inbound path
    ///
    /// Outside split mode a registration is redirected to [`Self::dist_all`].
    /// Everything else goes to one port chosen uniformly at random.
    ///
    /// # Errors
    /// `NoOutputPorts` when the node declared zero output ports; counters are untouched.
    pub fn dist_random(&mut self, message: Message) -> Result<Delivery, DistributorError> {
        if !self.split_registration && message.is_registration() {
            let fanout = self.dist_all(message);
            return Ok(Delivery::Broadcast { fanout });
        }

        if self.output_ports.is_empty() {
            return Err(DistributorError::NoOutputPorts);
        }

        let index = self.rng.random_range(0..self.output_ports.len());
        let port = &self.output_ports[index];
        trace!(port = %port.name, kind = message.kind(), "Routing message");
        self.publish_to(port, message);
        self.metrics.inc_events_distributed();

        Ok(Delivery::Routed(port.id))
    }

    /// Registration path: publish to every port in declaration order
    ///
    /// Content is not inspected. Counts one registration per call.
    /// Returns the number of ports the message was handed to.
    pub fn dist_all(&mut self, message: Message) -> usize {
        debug!(
            fanout = self.output_ports.len(),
            kind = message.kind(),
            "Broadcasting message"
        );
        for port in &self.output_ports {
            self.publish_to(port, message.clone());
        }
        self.metrics.inc_events_registered();
        self.output_ports.len()
    }

    /// Streaming passthrough
    ///
    /// Copies `item_count * item_size(i)` bytes from `inputs[i]` to
    /// `outputs[i]` for every declared stream and returns `item_count`.
    /// Every buffer is checked before any byte is copied, so a failing call
    /// leaves outputs and `sample_time` untouched.
    pub fn work(
        &mut self,
        item_count: usize,
        inputs: &[&[u8]],
        outputs: &mut [&mut [u8]],
    ) -> Result<usize, DistributorError> {
        let streams = self.shape.stream_count();
        if inputs.len() != streams || outputs.len() != streams {
            return Err(DistributorError::StreamCountMismatch {
                expected: streams,
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }

        let mut spans = [0usize; MAX_STREAMS];
        for (stream, (input, output)) in inputs.iter().zip(outputs.iter()).enumerate() {
            let required = self
                .shape
                .bytes_for(stream, item_count)
                .ok_or(DistributorError::ItemCountOverflow { stream, item_count })?;
            if input.len() < required {
                return Err(DistributorError::invalid_buffer(
                    stream,
                    BufferDirection::Input,
                    required,
                    input.len(),
                ));
            }
            if output.len() < required {
                return Err(DistributorError::invalid_buffer(
                    stream,
                    BufferDirection::Output,
                    required,
                    output.len(),
                ));
            }
            spans[stream] = required;
        }

        for (stream, (input, output)) in inputs.iter().zip(outputs.iter_mut()).enumerate() {
            let len = spans[stream];
            output[..len].copy_from_slice(&input[..len]);
        }

        self.metrics.advance_sample_time(item_count as u64);
        Ok(item_count)
    }

    /// Number of broadcast (registration) calls so far
    pub fn events_registered(&self) -> u64 {
        self.metrics.events_registered()
    }

    /// Number of randomly routed messages so far
    pub fn events_distributed(&self) -> u64 {
        self.metrics.events_distributed()
    }

    /// Items passed through the streaming path so far
    pub fn sample_time(&self) -> u64 {
        self.metrics.sample_time()
    }

    pub fn split_registration(&self) -> bool {
        self.split_registration
    }

    pub fn shape(&self) -> &StreamShape {
        &self.shape
    }

    pub fn input_ports(&self) -> &[InPort] {
        &self.input_ports
    }

    pub fn output_ports(&self) -> &[OutputPort<P>] {
        &self.output_ports
    }

    /// Shared counters, readable from other tasks
    pub fn metrics(&self) -> &Arc<DistributorMetrics> {
        &self.metrics
    }

    pub fn snapshot(&self) -> DistributorSnapshot {
        self.metrics.snapshot()
    }

    fn publish_to(&self, port: &OutputPort<P>, message: Message) {
        self.metrics.inc_port_deliveries(port.id.index());
        if let Err(e) = port.publisher.publish(message) {
            self.metrics.inc_publish_failures();
            debug!(port = %port.name, error = %e, "Publish refused by host");
        }
    }
}
