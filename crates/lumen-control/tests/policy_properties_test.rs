// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property tests for the decision layer: scoring purity, hysteresis spacing
//! between transitions, and convergence of strategy migration.

use lumen_control::{
    ComplexityLevel, ComplexityScorer, PolicyConfig, PolicyInputs, SnapEpsilon,
    StrategyMigration, StrategyPolicy,
};
use lumen_core::control::{OptimizationStrategy, ShadowQuality, StrategyPresets};
use lumen_core::scene::{LightCounts, SceneStats};
use proptest::prelude::*;

fn complexity_level() -> impl Strategy<Value = ComplexityLevel> {
    prop_oneof![
        Just(ComplexityLevel::Low),
        Just(ComplexityLevel::Medium),
        Just(ComplexityLevel::High),
        Just(ComplexityLevel::VeryHigh),
    ]
}

fn scene_stats() -> impl Strategy<Value = SceneStats> {
    (
        0u32..50_000,
        0u32..512,
        0u32..2_000_000,
        0u32..1000,
        0u32..1000,
        proptest::array::uniform5(0u32..20),
        0u32..100,
    )
        .prop_map(
            |(particles, field, triangles, draws, materials, lights, shadows)| SceneStats {
                particle_count: particles,
                field_resolution: field,
                triangle_count: triangles,
                draw_call_objects: draws,
                material_count: materials,
                lights: LightCounts {
                    ambient: lights[0],
                    hemisphere: lights[1],
                    directional: lights[2],
                    point: lights[3],
                    spot: lights[4],
                },
                shadow_casters: shadows,
            },
        )
}

fn valid_strategy() -> impl Strategy<Value = OptimizationStrategy> {
    (
        100u32..=20_000,
        8u32..=256,
        0.25f32..=1.0,
        0.5f32..=3.0,
        0.0f32..=60.0,
        prop_oneof![
            Just(ShadowQuality::Off),
            Just(ShadowQuality::Low),
            Just(ShadowQuality::Medium),
            Just(ShadowQuality::High),
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(particles, field, scale, ratio, skip, shadow, lod, culling)| OptimizationStrategy {
                particle_budget: particles,
                field_resolution: field,
                render_scale: scale,
                shadow_quality: shadow,
                pixel_ratio: ratio,
                frame_skip_threshold: skip,
                enable_lod: lod,
                enable_culling: culling,
            },
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// ComplexityScorer
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_analyze_is_pure(stats in scene_stats(), noise in proptest::collection::vec(scene_stats(), 0..8)) {
        let mut scorer = ComplexityScorer::default();
        let first = scorer.analyze(&stats);

        // Observing unrelated scenes must not influence a later analysis.
        for other in &noise {
            scorer.observe(other);
        }
        let second = scorer.analyze(&stats);
        let fresh = ComplexityScorer::default().analyze(&stats);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &fresh);
        prop_assert!((0.0..=100.0).contains(&first.score));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StrategyPolicy hysteresis
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_no_two_transitions_within_cooldown(
        steps in proptest::collection::vec((0u64..3000, 0.0f32..120.0, complexity_level()), 1..200),
    ) {
        let config = PolicyConfig::default();
        let cooldown = config.cooldown_period_ms;
        let mut policy = StrategyPolicy::new(config, StrategyPresets::default());

        let mut now = 0u64;
        let mut switches = Vec::new();
        for (dt, fps, complexity) in steps {
            now += dt;
            let inputs = PolicyInputs { avg_fps: fps, sample_count: 1, complexity, stability: 0.0 };
            if let Some(t) = policy.evaluate(now, &inputs) {
                switches.push(t.at_ms);
            }
            policy.step();
        }

        for pair in switches.windows(2) {
            prop_assert!(pair[1] - pair[0] >= cooldown, "switches at {} and {}", pair[0], pair[1]);
        }
        prop_assert!(policy.transitions().count() <= 20);
    }
}

#[test]
fn test_same_inputs_same_decisions() {
    let run = || {
        let mut policy = StrategyPolicy::default();
        let mut decisions = Vec::new();
        for i in 0..40u64 {
            let fps = [18.0, 40.0, 58.0, 25.0][(i % 4) as usize];
            let complexity = [ComplexityLevel::High, ComplexityLevel::Medium][(i % 3 == 0) as usize];
            let inputs = PolicyInputs { avg_fps: fps, sample_count: 3, complexity, stability: 0.0 };
            decisions.push(policy.evaluate(i * 700, &inputs).map(|t| (t.at_ms, t.to)));
        }
        decisions
    };
    assert_eq!(run(), run());
}

// ─────────────────────────────────────────────────────────────────────────────
// StrategyMigration convergence
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_migration_converges(
        from in valid_strategy(),
        to in valid_strategy(),
        speed in 0.01f32..=1.0,
    ) {
        let mut migration = StrategyMigration::new(from, speed, SnapEpsilon::default());
        migration.restart(to.clone());

        let bound = (10.0 / speed).ceil() as u32 + 300;
        let mut ticks = 0;
        while !migration.apply_gradual_adjustment() {
            ticks += 1;
            prop_assert!(ticks <= bound, "no convergence after {} ticks at speed {}", ticks, speed);
        }
        prop_assert_eq!(migration.current(), &to);
    }
}
