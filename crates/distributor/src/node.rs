//! DistributorNode - host loop that serializes calls into a Distributor

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{InPort, Message, MessagePublisher};

use crate::distributor::Distributor;
use crate::error::{BufferDirection, DistributorError};
use crate::metrics::DistributorSnapshot;

/// Owned sample buffers for one transfer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBlock {
    /// Items per stream
    pub item_count: usize,
    /// One byte buffer per stream
    pub streams: Vec<Vec<u8>>,
}

/// One call delivered by the host
#[derive(Debug, Clone)]
pub enum NodeInput {
    /// Message arriving on an inbound endpoint
    Message { port: InPort, message: Message },
    /// Streaming transfer call
    Samples(SampleBlock),
}

/// Final counters of a node run
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeReport {
    /// Distributor counters at shutdown
    pub counters: DistributorSnapshot,
    /// Output port names, in index order
    pub port_names: Vec<String>,
    /// Messages the distributor refused
    pub dispatch_errors: u64,
    /// Transfer calls the distributor refused
    pub work_errors: u64,
}

/// Runs one distributor off a single inbound channel
///
/// Exactly one call is in flight at a time: messages and transfer calls are
/// handled in arrival order by one task.
pub struct DistributorNode<P: MessagePublisher> {
    distributor: Distributor<P>,
    input_rx: mpsc::Receiver<NodeInput>,
    sample_tx: Option<mpsc::Sender<SampleBlock>>,
    dispatch_errors: u64,
    work_errors: u64,
}

impl<P: MessagePublisher> DistributorNode<P> {
    pub fn new(distributor: Distributor<P>, input_rx: mpsc::Receiver<NodeInput>) -> Self {
        Self {
            distributor,
            input_rx,
            sample_tx: None,
            dispatch_errors: 0,
            work_errors: 0,
        }
    }

    /// Forward produced sample blocks downstream
    pub fn with_sample_output(mut self, sample_tx: mpsc::Sender<SampleBlock>) -> Self {
        self.sample_tx = Some(sample_tx);
        self
    }

    pub fn distributor(&self) -> &Distributor<P> {
        &self.distributor
    }

    /// Run the node main loop
    ///
    /// Returns when the input channel is closed.
    #[instrument(name = "distributor_node_run", skip(self))]
    pub async fn run(mut self) -> NodeReport {
        info!(
            outputs = self.distributor.output_ports().len(),
            split_registration = self.distributor.split_registration(),
            "Distributor node started"
        );

        let mut call_count: u64 = 0;

        while let Some(input) = self.input_rx.recv().await {
            call_count += 1;
            match input {
                NodeInput::Message { port, message } => self.deliver(port, message),
                NodeInput::Samples(block) => self.transfer(block).await,
            }

            if call_count.is_multiple_of(1000) {
                debug!(calls = call_count, "Distributor node progress");
            }
        }

        let report = self.report();
        info!(
            calls = call_count,
            distributed = report.counters.events_distributed,
            registered = report.counters.events_registered,
            sample_time = report.counters.sample_time,
            "Distributor node input closed, shutting down"
        );
        report
    }

    fn deliver(&mut self, port: InPort, message: Message) {
        if let Err(e) = self.distributor.handle_message(port, message) {
            self.dispatch_errors += 1;
            warn!(port = %port, error = %e, "Message dispatch failed");
        }
    }

    async fn transfer(&mut self, block: SampleBlock) {
        match self.process_samples(&block) {
            Ok(produced) => {
                let closed = match &self.sample_tx {
                    Some(tx) => tx.send(produced).await.is_err(),
                    None => false,
                };
                if closed {
                    warn!("Sample consumer closed, further blocks are discarded");
                    self.sample_tx = None;
                }
            }
            Err(e) => {
                self.work_errors += 1;
                warn!(items = block.item_count, error = %e, "Transfer call failed");
            }
        }
    }

    /// Run one transfer call into freshly allocated output buffers
    ///
    /// Output buffers are sized only after the inputs proved large enough,
    /// so a bogus `item_count` fails with `InvalidBuffer` before allocating.
    pub fn process_samples(&mut self, block: &SampleBlock) -> Result<SampleBlock, DistributorError> {
        let shape = self.distributor.shape();
        if block.streams.len() != shape.stream_count() {
            return Err(DistributorError::StreamCountMismatch {
                expected: shape.stream_count(),
                inputs: block.streams.len(),
                outputs: block.streams.len(),
            });
        }

        let mut outputs: Vec<Vec<u8>> = Vec::with_capacity(block.streams.len());
        for (stream, input) in block.streams.iter().enumerate() {
            let required = shape.bytes_for(stream, block.item_count).ok_or(
                DistributorError::ItemCountOverflow {
                    stream,
                    item_count: block.item_count,
                },
            )?;
            if input.len() < required {
                return Err(DistributorError::invalid_buffer(
                    stream,
                    BufferDirection::Input,
                    required,
                    input.len(),
                ));
            }
            outputs.push(vec![0u8; required]);
        }

        let inputs: Vec<&[u8]> = block.streams.iter().map(Vec::as_slice).collect();
        let mut output_refs: Vec<&mut [u8]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
        let item_count = self
            .distributor
            .work(block.item_count, &inputs, &mut output_refs)?;

        Ok(SampleBlock {
            item_count,
            streams: outputs,
        })
    }

    fn report(&self) -> NodeReport {
        NodeReport {
            counters: self.distributor.snapshot(),
            port_names: self
                .distributor
                .output_ports()
                .iter()
                .map(|p| p.name().to_string())
                .collect(),
            dispatch_errors: self.dispatch_errors,
            work_errors: self.work_errors,
        }
    }
}

impl<P: MessagePublisher + Send + 'static> DistributorNode<P> {
    /// Spawn the node as a background task
    pub fn spawn(self) -> JoinHandle<NodeReport> {
        tokio::spawn(async move { self.run().await })
    }
}
