//! 节点配置解析
//!
//! TOML 为主，JSON 用于机器生成的配置。解析错误会带上格式名，
//! 并提示节点配置必需的 `[node]` / `[distributor]` 段。

use contracts::{ContractError, NodeBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式 (不区分大小写)
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 解析 TOML 节点配置
pub fn parse_toml(content: &str) -> Result<NodeBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| node_parse_error(ConfigFormat::Toml, e))
}

/// 解析 JSON 节点配置
pub fn parse_json(content: &str) -> Result<NodeBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| node_parse_error(ConfigFormat::Json, e))
}

/// 根据格式解析节点配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<NodeBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

fn node_parse_error<E>(format: ConfigFormat, err: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let text = err.to_string();
    let hint = if text.contains("missing field `node`") {
        " (the [node] section with a `name` is required)"
    } else if text.contains("missing field `distributor`") {
        " (the [distributor] section with `num_out_ports` is required)"
    } else {
        ""
    };
    ContractError::ConfigParse {
        message: format!("invalid {} node config: {text}{hint}", format.label()),
        source: Some(Box::new(err)),
    }
}
