//! Step machine behavior of a single leg against scripted ground.

use approx::assert_relative_eq;
use nalgebra::Vector3;

use strider_core::config::StepConfig;
use strider_core::pose::{Pose, pose_at, position};
use strider_core::sensor::NoGround;
use strider_gait::{Leg, LegEvent, TickContext};
use strider_test_utils::{CountingSensor, FixedSensor, ScriptedSensor, contact_at, leg_at};

const DT: f32 = 0.02;

fn body() -> Pose {
    pose_at(Vector3::new(0.0, 1.0, 0.0))
}

fn ctx() -> TickContext {
    TickContext::new(DT, body())
}

fn with_threshold(leg: Leg, step_distance: f32) -> Leg {
    leg.with_step_config(StepConfig {
        step_distance,
        ..StepConfig::default()
    })
}

#[test]
fn far_contact_steps_immediately_and_lands_exactly() {
    let mut leg = with_threshold(leg_at("a", [0.0; 3], [0.0; 3]), 0.5);
    let sensor = FixedSensor::at(Vector3::new(1.0, 0.0, 0.0));

    assert_eq!(leg.tick(&ctx(), &sensor), LegEvent::StepStarted);

    let duration = leg.config().step_duration;
    let mut ticks = 1;
    loop {
        let event = leg.tick(&ctx(), &sensor);
        ticks += 1;
        if event == LegEvent::StepFinished {
            break;
        }
        assert_eq!(event, LegEvent::Stepping);
        assert!(ticks < 100, "step never finished");
    }
    #[allow(clippy::cast_precision_loss)]
    let simulated = (ticks - 1) as f32 * DT;
    assert!(simulated >= duration - 1e-6);

    let foot = leg.foot_target().unwrap();
    assert_eq!(position(foot), Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(leg.committed(), Some(foot));
    assert!(!leg.is_stepping());
}

#[test]
fn arc_peaks_at_step_height_mid_step() {
    let cfg = StepConfig {
        step_distance: 0.5,
        step_duration: 0.2,
        step_height: 0.3,
        ..StepConfig::default()
    };
    let mut leg = leg_at("a", [0.0; 3], [0.0; 3]).with_step_config(cfg);
    let sensor = FixedSensor::at(Vector3::new(1.0, 0.0, 0.0));
    let ctx = TickContext::new(0.05, body());

    // samples t = 0, 0.25, 0.5
    leg.tick(&ctx, &sensor);
    leg.tick(&ctx, &sensor);
    leg.tick(&ctx, &sensor);

    let foot = position(leg.foot_target().unwrap());
    assert_relative_eq!(foot.x, 0.5, epsilon = 1e-5);
    assert_relative_eq!(foot.y, 0.3, epsilon = 1e-5);
}

#[test]
fn only_one_step_at_a_time() {
    let mut leg = with_threshold(leg_at("a", [0.0; 3], [0.0; 3]), 0.5);
    let first = Vector3::new(1.0, 0.0, 0.0);
    let sensor = CountingSensor::new(ScriptedSensor::new([Some(contact_at(first))]));

    assert_eq!(leg.tick(&ctx(), &sensor), LegEvent::StepStarted);
    assert_eq!(sensor.calls(), 1);

    let mut started = 0;
    while leg.is_stepping() {
        if leg.tick(&ctx(), &sensor) == LegEvent::StepStarted {
            started += 1;
        }
    }
    assert_eq!(started, 0);
    // a stepping leg does not sense
    assert_eq!(sensor.calls(), 1);
    assert_eq!(position(leg.foot_target().unwrap()), first);
}

#[test]
fn frozen_without_contact_or_rest() {
    let start = leg_at("a", [0.0; 3], [0.3, -0.2, 0.7]);
    let mut leg = start.clone();
    leg.tick(&ctx(), &NoGround);
    let after_first = *leg.foot_target().unwrap();
    for _ in 1..100 {
        assert_eq!(leg.tick(&ctx(), &NoGround), LegEvent::Idle);
    }
    assert_eq!(*leg.foot_target().unwrap(), after_first);
    assert_eq!(leg.foot_target(), start.foot_target());
}

#[test]
fn idle_foot_converges_monotonically_to_rest() {
    let rest = pose_at(Vector3::new(0.4, -0.8, 0.2));
    let mut leg = leg_at("a", [0.0; 3], [-1.0, 0.5, 1.5]).with_rest(rest);
    let goal = position(&(body() * rest));

    let mut last = (position(leg.foot_target().unwrap()) - goal).norm();
    for _ in 0..60 {
        leg.tick(&ctx(), &NoGround);
        let gap = (position(leg.foot_target().unwrap()) - goal).norm();
        assert!(gap <= last, "gap grew from {last} to {gap}");
        last = gap;
    }
    assert!(last < 1e-3);
}

#[test]
fn near_contact_eases_back_to_committed() {
    let mut leg = with_threshold(leg_at("a", [0.0; 3], [0.0; 3]), 0.5);
    // foot starts at the committed pose, contact close by: no step
    let sensor = FixedSensor::at(Vector3::new(0.2, 0.0, 0.0));
    for _ in 0..10 {
        assert_eq!(leg.tick(&ctx(), &sensor), LegEvent::Idle);
    }
    assert_eq!(position(leg.foot_target().unwrap()), Vector3::zeros());
}

#[test]
fn contact_after_miss_triggers_step() {
    let mut leg = with_threshold(leg_at("a", [0.0; 3], [0.0; 3]), 0.5);
    let far = contact_at(Vector3::new(0.0, 0.0, 2.0));
    let sensor = ScriptedSensor::new([None, None, Some(far)]);
    assert_eq!(leg.tick(&ctx(), &sensor), LegEvent::Idle);
    assert_eq!(leg.tick(&ctx(), &sensor), LegEvent::Idle);
    assert_eq!(leg.tick(&ctx(), &sensor), LegEvent::StepStarted);
    assert_eq!(leg.step().map(|s| position(&s.destination)), Some(far.point));
}
