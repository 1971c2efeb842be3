//! Simulation run statistics.

use std::time::Duration;

use serde::Serialize;

use distributor::NodeReport;
use observability::{BalanceSummary, PortBalanceAggregator};

/// Traffic handed to the node
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SentTally {
    pub events: u64,
    pub registrations: u64,
    pub blocks: u64,
}

/// What one output port consumer received
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortTally {
    pub port: String,
    pub events: u64,
    pub registrations: u64,
    /// Messages lost to a full queue
    pub dropped: u64,
}

/// What the downstream sample consumer received
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SampleTally {
    pub blocks: u64,
    pub items: u64,
    pub bytes: u64,
}

/// Statistics from a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Node name from configuration
    pub node: String,

    /// Wall time from setup to the last consumer finishing
    pub duration: Duration,

    /// Traffic fed into the node
    pub sent: SentTally,

    /// Node counters at shutdown
    pub report: NodeReport,

    /// Per-port consumer tallies, in port order
    pub ports: Vec<PortTally>,

    /// Sample passthrough tally
    pub samples: SampleTally,
}

impl RunStats {
    /// Messages handled per second
    pub fn throughput(&self) -> f64 {
        let handled = self.sent.events + self.sent.registrations;
        if self.duration.as_secs_f64() > 0.0 {
            handled as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// How evenly random dispatch spread events over the ports
    pub fn balance(&self) -> BalanceSummary {
        let mut aggregator = PortBalanceAggregator::new();
        for tally in &self.ports {
            aggregator.push(tally.port.clone(), tally.events);
        }
        aggregator.summary()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let counters = &self.report.counters;

        println!("\n=== Distributor Run: {} ===\n", self.node);

        println!("Overview");
        println!("  Duration: {:.3}s", self.duration.as_secs_f64());
        println!("  Throughput: {:.0} msg/s", self.throughput());
        println!(
            "  Sent: {} events, {} registrations, {} sample blocks",
            self.sent.events, self.sent.registrations, self.sent.blocks
        );

        println!("\nCounters");
        println!("  events_distributed: {}", counters.events_distributed);
        println!("  events_registered: {}", counters.events_registered);
        println!("  sample_time: {}", counters.sample_time);
        println!("  publish_failures: {}", counters.publish_failures);
        println!("  dispatch errors: {}", self.report.dispatch_errors);
        println!("  work errors: {}", self.report.work_errors);

        if self.ports.is_empty() {
            println!("\nNo output ports");
        } else {
            println!("\nPorts");
            for tally in &self.ports {
                println!(
                    "  {}: {} events, {} registrations, {} dropped",
                    tally.port, tally.events, tally.registrations, tally.dropped
                );
            }
            println!();
            print!("{}", self.balance());
        }

        if self.samples.blocks > 0 {
            println!(
                "\nSamples: {} blocks, {} items, {} bytes forwarded",
                self.samples.blocks, self.samples.items, self.samples.bytes
            );
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> RunStats {
        RunStats {
            node: "dist0".into(),
            duration: Duration::from_millis(500),
            sent: SentTally {
                events: 90,
                registrations: 10,
                blocks: 0,
            },
            report: NodeReport::default(),
            ports: vec![
                PortTally {
                    port: "dist_out0".into(),
                    events: 30,
                    registrations: 10,
                    dropped: 0,
                },
                PortTally {
                    port: "dist_out1".into(),
                    events: 60,
                    registrations: 10,
                    dropped: 0,
                },
            ],
            samples: SampleTally::default(),
        }
    }

    #[test]
    fn test_throughput() {
        assert!((stats().throughput() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_balance_uses_event_counts() {
        let balance = stats().balance();
        assert_eq!(balance.total, 90);
        assert!((balance.imbalance - 0.6666666666).abs() < 1e-6);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(stats()).unwrap();
        assert_eq!(json["ports"][1]["events"], 60);
        assert_eq!(json["sent"]["registrations"], 10);
    }
}
