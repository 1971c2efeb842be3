//! # Config Loader
//!
//! 分发节点配置加载。
//!
//! 负责：
//! - 读取 TOML / JSON 配置文件
//! - 字段级与语义校验
//! - 产出 `NodeBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("distributor.toml")).unwrap();
//! for name in blueprint.distributor.out_port_names() {
//!     println!("{name}");
//! }
//! ```

mod parser;
mod validator;

pub use contracts::NodeBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Node configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a node blueprint from disk
    ///
    /// The format follows the file extension (`.toml` / `.json`).
    /// Fails on unknown extensions, unreadable files, syntax errors and
    /// validation errors, in that order.
    pub fn load_from_path(path: &Path) -> Result<NodeBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and validate an in-memory document
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<NodeBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Render a blueprint as TOML
    pub fn to_toml(blueprint: &NodeBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Render a blueprint as JSON
    pub fn to_json(blueprint: &NodeBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!("{}: missing file extension", path.display()))
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}
