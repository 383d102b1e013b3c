//! 奖励引擎错误类型
//!
//! 规则封顶、卡片不支持某展示口径等属于正常的评估结果，不在此处建模；
//! 这里只包含需要调用方处理的失败（配置加载、档案持久化、非法输入）。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML 解析错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("不支持的配置文件格式: {0}")]
    UnsupportedFormat(String),

    #[error("卡片不存在: {0}")]
    CardNotFound(String),

    #[error("无效的交易金额: {0}")]
    InvalidAmount(f64),

    #[error("无效的展示口径: {0}")]
    InvalidDisplayMode(String),

    #[error("自选类别分配超出额度: 已分配 {allocated}, 额度 {budget}")]
    InvalidAllocation { allocated: u64, budget: u32 },

    #[error("未配置等级计划")]
    TierProgramMissing,

    #[error("档案写入失败: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, RewardError>;

impl RewardError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::CardNotFound(_) => "CARD_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidDisplayMode(_) => "INVALID_DISPLAY_MODE",
            Self::InvalidAllocation { .. } => "INVALID_ALLOCATION",
            Self::TierProgramMissing => "TIER_PROGRAM_MISSING",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(RewardError::CardNotFound("x".into()).code(), "CARD_NOT_FOUND");
        assert_eq!(
            RewardError::InvalidAllocation {
                allocated: 6,
                budget: 5
            }
            .code(),
            "INVALID_ALLOCATION"
        );
    }
}
