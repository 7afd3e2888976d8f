//! Drive 模块错误类型定义

use crate::config::ConfigError;
use sumo_esc::EscError;
use thiserror::Error;

/// Drive 模块错误类型
///
/// 控制核心在运行期不产生自己的错误：输入越界一律就地夹取。这里
/// 聚合的是初始化期的配置错误和 ESC 后端透传上来的写入错误。
#[derive(Error, Debug)]
pub enum DriveError {
    /// 配置错误（fatal-at-init，运行中不会出现）
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// ESC 层错误
    #[error("ESC error: {0}")]
    Esc(#[from] EscError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_error() {
        let err: DriveError = ConfigError::InvalidTick(0).into();
        let msg = format!("{err}");
        assert!(msg.contains("Config error") && msg.contains("tick_ms"));
    }

    #[test]
    fn test_from_esc_error() {
        let esc = EscError::Backend("channel offline".to_string());
        let err: DriveError = esc.into();
        assert!(matches!(err, DriveError::Esc(_)));
    }
}
