//! 规则评估性能基准测试
//!
//! 针对单卡评估、全卡评估排序与账本提交进行性能测试。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use reward_engine::test_utils::{sample_config, sample_settings};
use reward_engine::{
    DisplayMode, LedgerCommitter, Profile, RewardCatalog, RewardEngine, RuleDefinition,
    RuleEvaluator, UsageLedger,
};
use std::hint::black_box;

/// 单卡评估基准
fn bench_single_card(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_card");

    let catalog = RewardCatalog::build(sample_config());
    let evaluator = RuleEvaluator::new(&catalog);
    let ledger = UsageLedger::new();
    let settings = sample_settings();

    for card_id in ["everyday", "dining_reward", "voyage"] {
        let card = catalog.card(card_id).expect("sample card");
        group.bench_with_input(BenchmarkId::new("evaluate", card_id), card, |b, card| {
            b.iter(|| {
                evaluator.evaluate(
                    black_box(1000.0),
                    black_box("dining"),
                    DisplayMode::Cash,
                    card,
                    &ledger,
                    &settings,
                )
            })
        });
    }

    group.finish();
}

/// 全卡评估与排序基准，规则数量递增
fn bench_evaluate_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_all");

    for extra_rules in [0usize, 10, 50] {
        let mut config = sample_config();
        for i in 0..extra_rules {
            let id = format!("extra_{}", i);
            config.rules.push(
                RuleDefinition::flat(&id, 0.001, &["dining", "online"])
                    .with_spending_cap(format!("extra_cap_{}", i), 5000.0),
            );
            config.cards[0].rules.push(id);
        }

        let engine = RewardEngine::new(config);
        let profile = Profile::new(sample_settings());

        group.bench_with_input(
            BenchmarkId::new("rules", extra_rules),
            &extra_rules,
            |b, _| {
                b.iter(|| {
                    engine.evaluate_all(
                        black_box(1000.0),
                        black_box("online_travel"),
                        DisplayMode::Cash,
                        &profile,
                    )
                })
            },
        );
    }

    group.finish();
}

/// 账本提交（不落盘）基准
fn bench_apply(c: &mut Criterion) {
    let engine = RewardEngine::new(sample_config());
    let profile = Profile::new(sample_settings());
    let result = engine
        .evaluate_card("voyage", 1000.0, "travel", DisplayMode::Miles, &profile)
        .expect("evaluate voyage");

    c.bench_function("apply_commit", |b| {
        b.iter(|| {
            let mut staged = profile.clone();
            LedgerCommitter::apply(black_box(&result), &mut staged)
        })
    });
}

criterion_group!(benches, bench_single_card, bench_evaluate_all, bench_apply);
criterion_main!(benches);
