//! 配置解析模块
//!
//! 支持 JSON (主要，兼容裸数组) 和 TOML 格式。

use contracts::{ContractError, DestinationConfig, MuxConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON 格式 (默认)
    Json,
    /// TOML 格式
    Toml,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 JSON 格式配置
///
/// 顶层既可以是目标数组，也可以是带 `destinations` 字段的对象。
pub fn parse_json(content: &str) -> Result<MuxConfig, ContractError> {
    let map_err = |e: serde_json::Error| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    };

    if content.trim_start().starts_with('[') {
        let destinations: Vec<DestinationConfig> = serde_json::from_str(content).map_err(map_err)?;
        Ok(MuxConfig { destinations })
    } else {
        serde_json::from_str(content).map_err(map_err)
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<MuxConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<MuxConfig, ContractError> {
    match format {
        ConfigFormat::Json => parse_json(content),
        ConfigFormat::Toml => parse_toml(content),
    }
}
