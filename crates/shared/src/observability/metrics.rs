//! 指标描述模块
//!
//! 基于 metrics crate 记录引擎级指标。此处只注册描述信息，
//! recorder/exporter 由宿主进程安装；未安装时所有指标调用为空操作。

/// 规则评估次数
pub const EVALUATIONS_TOTAL: &str = "reward_evaluations_total";
/// 单次全卡评估耗时
pub const EVALUATION_DURATION_SECONDS: &str = "reward_evaluation_duration_seconds";
/// 账本提交次数
pub const COMMITS_TOTAL: &str = "reward_commits_total";
/// 账本提交失败次数
pub const COMMIT_FAILURES_TOTAL: &str = "reward_commit_failures_total";
/// 等级晋升次数
pub const TIER_ADVANCES_TOTAL: &str = "reward_tier_advances_total";
/// 配置审计发现的问题数
pub const AUDIT_FINDINGS_TOTAL: &str = "reward_audit_findings_total";

/// 注册引擎指标描述
pub fn describe_engine_metrics(service_name: &str) {
    metrics::describe_counter!(EVALUATIONS_TOTAL, "Total number of card reward evaluations");
    metrics::describe_histogram!(
        EVALUATION_DURATION_SECONDS,
        "Duration of evaluating all owned cards for one transaction"
    );
    metrics::describe_counter!(COMMITS_TOTAL, "Total number of committed transactions");
    metrics::describe_counter!(COMMIT_FAILURES_TOTAL, "Total number of failed commits");
    metrics::describe_counter!(TIER_ADVANCES_TOTAL, "Total number of tier advances");
    metrics::describe_counter!(AUDIT_FINDINGS_TOTAL, "Configuration audit findings");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}
