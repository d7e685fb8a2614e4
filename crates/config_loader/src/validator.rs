//! 配置校验模块
//!
//! 校验规则：
//! - url 非空
//! - url 可解析，scheme 受支持
//! - 网络类目标必须带端口

use contracts::{ContractError, MuxConfig};
use validator::Validate;

/// 校验 MuxConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &MuxConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_endpoints(config)?;
    Ok(())
}

/// 字段级校验 (derive)
fn validate_fields(config: &MuxConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("destinations", e.to_string()))
}

/// 校验每个目标的 url
fn validate_endpoints(config: &MuxConfig) -> Result<(), ContractError> {
    for (idx, destination) in config.destinations.iter().enumerate() {
        if let Err(e) = destination.endpoint() {
            let message = match e {
                ContractError::ConfigValidation { message, .. } => message,
                other => other.to_string(),
            };
            return Err(ContractError::config_validation(
                format!("destinations[{idx}].url"),
                message,
            ));
        }
    }
    Ok(())
}
