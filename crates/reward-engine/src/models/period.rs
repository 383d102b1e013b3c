//! 计数重置周期
//!
//! 引擎不判断计数是否已过期，只把周期信息交给外部调度器。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Monthly,
    Quarterly,
    Yearly,
    /// 推广活动期内有效，活动结束后不再累计
    Campaign,
    /// 只在等级晋升时归零
    Tier,
    /// 永不重置
    Lifetime,
}

/// 周期锚点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnchorRef {
    /// 自然月/季/年
    Calendar,
    /// 账单日
    StatementDay { day: u8 },
    /// 固定起始日期
    Date { date: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpec {
    pub period: PeriodType,
    #[serde(default = "default_anchor")]
    pub anchor: AnchorRef,
}

fn default_anchor() -> AnchorRef {
    AnchorRef::Calendar
}

impl PeriodSpec {
    pub fn new(period: PeriodType, anchor: AnchorRef) -> Self {
        Self { period, anchor }
    }

    pub fn monthly() -> Self {
        Self::new(PeriodType::Monthly, AnchorRef::Calendar)
    }

    pub fn tier() -> Self {
        Self::new(PeriodType::Tier, AnchorRef::Calendar)
    }
}

impl Default for PeriodSpec {
    fn default() -> Self {
        Self::monthly()
    }
}
