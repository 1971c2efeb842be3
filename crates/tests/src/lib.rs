//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置文件 -> 分发节点 e2e 测试
//! - 分发语义 (随机分发 / 广播 / 透传) 的跨 crate 验证

#[cfg(test)]
mod contract_tests {
    use contracts::{out_port_names, InPort, Message, REGISTER_HANDLER_TAG};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_endpoint_names() {
        assert_eq!(InPort::Random.name(), "dist_random");
        assert_eq!(InPort::All.name(), "dist_all");
        assert_eq!(out_port_names(1), vec!["dist_out"]);
        for count in 2..=4 {
            let names = out_port_names(count);
            assert_eq!(names.len(), count);
            for (i, name) in names.iter().enumerate() {
                assert_eq!(name.as_str(), format!("dist_out{i}"));
            }
        }
    }

    #[test]
    fn test_boundary_classification() {
        assert!(Message::classify(Some(REGISTER_HANDLER_TAG), "h").is_registration());
        assert!(!Message::classify(Some("ES_EVENT"), "e").is_registration());
        assert!(!Message::classify(None, "e").is_registration());
    }
}

#[cfg(test)]
mod e2e_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DistributorConfig, InPort, Message, StreamShape, REGISTER_HANDLER_TAG};
    use distributor::{
        ChannelRegistry, Distributor, DistributorError, DistributorNode, NodeInput, PortReceiver,
        SampleBlock,
    };
    use observability::PortBalanceAggregator;
    use tokio::sync::mpsc;

    fn build(config: DistributorConfig) -> (Distributor<distributor::PortHandle>, Vec<PortReceiver>) {
        let mut registry = ChannelRegistry::new(1024);
        let distributor = Distributor::new(config, &mut registry).unwrap();
        let receivers = registry.take_receivers();
        (distributor, receivers)
    }

    /// End-to-end test: 3 ports, combined registration, 100 events then one registration
    ///
    /// 验证：
    /// 1. 每个事件恰好投递到一个端口
    /// 2. 注册消息广播到全部端口
    /// 3. 计数器与端口实际收到的消息一致
    #[tokio::test]
    async fn test_e2e_events_then_registration() {
        let (distributor, mut receivers) = build(DistributorConfig::new(3).with_seed(2024));

        let (tx, rx) = mpsc::channel(128);
        let node = DistributorNode::new(distributor, rx).spawn();

        for i in 0..100 {
            tx.send(NodeInput::Message {
                port: InPort::Random,
                message: Message::classify(None, format!("event-{i}")),
            })
            .await
            .unwrap();
        }
        tx.send(NodeInput::Message {
            port: InPort::Random,
            message: Message::classify(Some(REGISTER_HANDLER_TAG), "handler"),
        })
        .await
        .unwrap();
        drop(tx);

        let report = node.await.unwrap();
        assert_eq!(report.counters.events_distributed, 100);
        assert_eq!(report.counters.events_registered, 1);
        assert_eq!(report.dispatch_errors, 0);

        let mut aggregator = PortBalanceAggregator::new();
        let mut received_events = Vec::new();
        for receiver in receivers.iter_mut() {
            let messages = receiver.drain();
            received_events.extend(
                messages
                    .iter()
                    .filter(|m| !m.is_registration())
                    .map(|m| m.envelope().to_vec()),
            );
            assert_eq!(
                messages.last().map(|m| &m.envelope()[..]),
                Some(&b"handler"[..])
            );
            let registrations = messages.iter().filter(|m| m.is_registration()).count();
            assert_eq!(registrations, 1, "port {}", receiver.name());
            // registration arrived last on every port
            assert!(messages.last().unwrap().is_registration());
            aggregator.push(receiver.name().to_string(), (messages.len() - 1) as u64);
        }

        let balance = aggregator.summary();
        assert_eq!(balance.total, 100);

        // every event arrives exactly once with its envelope untouched
        received_events.sort();
        let mut expected: Vec<_> = (0..100)
            .map(|i| format!("event-{i}").into_bytes())
            .collect();
        expected.sort();
        assert_eq!(received_events, expected);
        assert_eq!(
            report.counters.port_deliveries.iter().sum::<u64>(),
            100 + 3
        );
    }

    #[tokio::test]
    async fn test_e2e_split_mode_never_broadcasts_on_random() {
        let config = DistributorConfig::new(2)
            .with_split_registration(true)
            .with_seed(9);
        let (distributor, mut receivers) = build(config);

        let (tx, rx) = mpsc::channel(16);
        let node = DistributorNode::new(distributor, rx).spawn();

        // registration-shaped message on dist_random is routed, not broadcast
        tx.send(NodeInput::Message {
            port: InPort::Random,
            message: Message::register_handler("h0"),
        })
        .await
        .unwrap();
        tx.send(NodeInput::Message {
            port: InPort::All,
            message: Message::register_handler("h1"),
        })
        .await
        .unwrap();
        drop(tx);

        let report = node.await.unwrap();
        assert_eq!(report.counters.events_distributed, 1);
        assert_eq!(report.counters.events_registered, 1);

        let total: usize = receivers.iter_mut().map(|r| r.drain().len()).sum();
        assert_eq!(total, 1 + 2);
    }

    #[tokio::test]
    async fn test_e2e_all_port_rejected_in_combined_mode() {
        let (distributor, _receivers) = build(DistributorConfig::new(2).with_seed(1));

        let (tx, rx) = mpsc::channel(4);
        let node = DistributorNode::new(distributor, rx).spawn();
        tx.send(NodeInput::Message {
            port: InPort::All,
            message: Message::register_handler("h"),
        })
        .await
        .unwrap();
        drop(tx);

        let report = node.await.unwrap();
        assert_eq!(report.dispatch_errors, 1);
        assert_eq!(report.counters.events_registered, 0);
    }

    #[test]
    fn test_each_port_count_distributes_only_to_declared_ports() {
        for count in 1..=4usize {
            let (mut distributor, mut receivers) =
                build(DistributorConfig::new(count).with_seed(count as u64));

            for i in 0..count {
                distributor
                    .dist_random(Message::event(format!("e{i}")))
                    .unwrap();
            }

            assert_eq!(distributor.events_distributed(), count as u64);
            let delivered: usize = receivers.iter_mut().map(|r| r.drain().len()).sum();
            assert_eq!(delivered, count);
        }
    }

    #[test]
    fn test_zero_ports() {
        let (mut distributor, receivers) = build(DistributorConfig::new(0).with_seed(3));
        assert!(receivers.is_empty());

        let err = distributor.dist_random(Message::event("e")).unwrap_err();
        assert!(matches!(err, DistributorError::NoOutputPorts));
        assert_eq!(distributor.events_distributed(), 0);

        assert_eq!(distributor.dist_all(Message::register_handler("h")), 0);
        assert_eq!(distributor.events_registered(), 1);
    }

    #[tokio::test]
    async fn test_e2e_passthrough_through_node() {
        let config = DistributorConfig::new(1)
            .with_shape(StreamShape::new(vec![1, 2, 4, 8]))
            .with_seed(5);
        let (distributor, _receivers) = build(config);

        let (tx, rx) = mpsc::channel(4);
        let (sample_tx, mut sample_rx) = mpsc::channel(4);
        let node = DistributorNode::new(distributor, rx)
            .with_sample_output(sample_tx)
            .spawn();

        let item_count = 5;
        let block = SampleBlock {
            item_count,
            streams: [1usize, 2, 4, 8]
                .iter()
                .map(|size| (0..size * item_count).map(|b| b as u8).collect())
                .collect(),
        };
        tx.send(NodeInput::Samples(block.clone())).await.unwrap();
        tx.send(NodeInput::Samples(block.clone())).await.unwrap();
        drop(tx);

        let report = node.await.unwrap();
        assert_eq!(report.counters.sample_time, 10);
        assert_eq!(sample_rx.recv().await, Some(block.clone()));
        assert_eq!(sample_rx.recv().await, Some(block));
    }

    /// Config file -> NodeBlueprint -> running node
    #[tokio::test]
    async fn test_e2e_from_config() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[node]
name = "dist-e2e"

[distributor]
num_out_ports = 4
split_registration = true
seed = 11

[distributor.shape]
item_sizes = [4]

[ports]
queue_capacity = 256
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let mut registry = ChannelRegistry::new(blueprint.ports.queue_capacity);
        let distributor = Distributor::new(blueprint.distributor.clone(), &mut registry).unwrap();
        assert_eq!(registry.inputs(), &[InPort::Random, InPort::All]);

        let mut receivers = registry.take_receivers();
        let names: Vec<String> = receivers.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["dist_out0", "dist_out1", "dist_out2", "dist_out3"]);

        let (tx, rx) = mpsc::channel(64);
        let node = DistributorNode::new(distributor, rx).spawn();
        for i in 0..200 {
            tx.send(NodeInput::Message {
                port: InPort::Random,
                message: Message::event(format!("e{i}")),
            })
            .await
            .unwrap();
        }
        drop(tx);

        let report = node.await.unwrap();
        assert_eq!(report.counters.events_distributed, 200);

        let delivered: Vec<usize> = receivers.iter_mut().map(|r| r.drain().len()).collect();
        assert_eq!(delivered.iter().sum::<usize>(), 200);
        // 200 draws over 4 ports: every port is hit
        assert!(delivered.iter().all(|&n| n > 0), "{delivered:?}");
    }

    #[test]
    fn test_counters_never_decrease() {
        let (mut distributor, _receivers) = build(DistributorConfig::new(2).with_seed(4));
        let mut last = distributor.snapshot();
        assert_eq!(last.events_distributed, 0);
        assert_eq!(last.events_registered, 0);
        assert_eq!(last.sample_time, 0);

        for i in 0..20 {
            if i % 5 == 0 {
                distributor.dist_all(Message::register_handler("h"));
            } else {
                distributor.dist_random(Message::event("e")).unwrap();
            }
            distributor.work(i, &[], &mut []).unwrap();

            let now = distributor.snapshot();
            assert!(now.events_distributed >= last.events_distributed);
            assert!(now.events_registered >= last.events_registered);
            assert!(now.sample_time >= last.sample_time);
            last = now;
        }
    }
}
