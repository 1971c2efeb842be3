//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (validator derive)：端口数量 <= 4、流数量 <= 4、item 宽度 > 0、队列容量 > 0
//! - 节点名称只含 ASCII 字母数字、`_`、`-` (用作日志/指标标签)

use ::validator::Validate;

use contracts::{ContractError, NodeBlueprint};

/// 校验 NodeBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &NodeBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_node_name(blueprint)?;
    Ok(())
}

/// 字段级规则
fn validate_fields(blueprint: &NodeBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::from_validation("", &e))
}

/// 校验节点名称字符集
fn validate_node_name(blueprint: &NodeBlueprint) -> Result<(), ContractError> {
    let name = &blueprint.node.name;
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(ContractError::config_validation(
            "node.name",
            format!("invalid character {bad:?} in node name '{name}'"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, DistributorConfig, NodeConfig, PortQueueConfig, StreamShape,
    };

    fn minimal_blueprint() -> NodeBlueprint {
        NodeBlueprint {
            version: ConfigVersion::V1,
            node: NodeConfig {
                name: "dist0".into(),
            },
            distributor: DistributorConfig::new(3).with_shape(StreamShape::new(vec![8, 4])),
            ports: PortQueueConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_zero_ports_is_valid() {
        let mut bp = minimal_blueprint();
        bp.distributor.num_out_ports = 0;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_too_many_ports() {
        let mut bp = minimal_blueprint();
        bp.distributor.num_out_ports = 5;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("distributor.num_out_ports"), "got: {err}");
        assert!(err.contains("at most 4 output ports"), "got: {err}");
    }

    #[test]
    fn test_too_many_streams() {
        let mut bp = minimal_blueprint();
        bp.distributor.shape = StreamShape::new(vec![4; 5]);
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("at most 4 streams"), "got: {err}");
    }

    #[test]
    fn test_zero_item_size() {
        let mut bp = minimal_blueprint();
        bp.distributor.shape = StreamShape::new(vec![4, 0]);
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("item size must be > 0"), "got: {err}");
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut bp = minimal_blueprint();
        bp.ports.queue_capacity = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("queue_capacity"), "got: {err}");
    }

    #[test]
    fn test_empty_node_name() {
        let mut bp = minimal_blueprint();
        bp.node.name = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_bad_node_name() {
        let mut bp = minimal_blueprint();
        bp.node.name = "dist 0".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("node.name"), "got: {err}");
    }
}
