//! Host routing seam
//!
//! The distributor never owns a queue. It declares endpoints through a
//! `PortRegistry` provided by the host and publishes through the handles the
//! registry hands back.

use crate::{ContractError, InPort, Message, OutPortId, PortName};

/// Outbound publish handle
///
/// Publishing is fire-and-forget: implementations must not block waiting
/// for the consumer. Flow control belongs to the host queue.
pub trait MessagePublisher {
    /// Endpoint name (used for logging/metrics)
    fn port_name(&self) -> &PortName;

    /// Hand a message to the host for delivery
    ///
    /// # Errors
    /// Returns the delivery refusal reported by the host (queue full, consumer gone)
    fn publish(&self, message: Message) -> Result<(), ContractError>;
}

/// Host message-routing subsystem
pub trait PortRegistry {
    /// Handle type returned for each outbound endpoint
    type Publisher: MessagePublisher;

    /// Declare an inbound endpoint
    fn register_input(&mut self, port: InPort) -> Result<(), ContractError>;

    /// Declare an outbound endpoint and return its publish handle
    fn register_output(
        &mut self,
        id: OutPortId,
        name: &PortName,
    ) -> Result<Self::Publisher, ContractError>;
}
