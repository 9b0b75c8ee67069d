use serde_json::json;

use crate::pipeline::{Density, SignalPlan};
use crate::Error;

/// Human-facing side channel for cycle events. Fire and forget: nothing here
/// returns, and nothing here may influence the control loop.
/// Lane numbers are reported 1-based.
pub trait Announcer {
    fn lane_observed(&mut self, cycle: u64, lane: usize, vehicles: u32, density: Density);
    fn lane_skipped(&mut self, cycle: u64, lane: usize, error: &Error, fallback: Density);
    fn plan_ready(&mut self, cycle: u64, plan: &SignalPlan);
    fn lane_green(&mut self, cycle: u64, lane: usize, green_secs: u64);
}

impl<A: Announcer + ?Sized> Announcer for Box<A> {
    fn lane_observed(&mut self, cycle: u64, lane: usize, vehicles: u32, density: Density) {
        (**self).lane_observed(cycle, lane, vehicles, density)
    }
    fn lane_skipped(&mut self, cycle: u64, lane: usize, error: &Error, fallback: Density) {
        (**self).lane_skipped(cycle, lane, error, fallback)
    }
    fn plan_ready(&mut self, cycle: u64, plan: &SignalPlan) {
        (**self).plan_ready(cycle, plan)
    }
    fn lane_green(&mut self, cycle: u64, lane: usize, green_secs: u64) {
        (**self).lane_green(cycle, lane, green_secs)
    }
}

pub struct ConsoleAnnouncer;

impl Announcer for ConsoleAnnouncer {
    fn lane_observed(&mut self, _cycle: u64, lane: usize, vehicles: u32, density: Density) {
        println!("Lane {}: {} vehicles, density {}", lane + 1, vehicles, density);
    }

    fn lane_skipped(&mut self, _cycle: u64, lane: usize, error: &Error, fallback: Density) {
        println!(
            "Lane {}: no observation ({}), holding {} fallback",
            lane + 1,
            error,
            fallback
        );
    }

    fn plan_ready(&mut self, _cycle: u64, plan: &SignalPlan) {
        println!("Generated signals (seconds of green time): {:?}", plan);
    }

    fn lane_green(&mut self, _cycle: u64, lane: usize, green_secs: u64) {
        println!("Lane {} green for {} seconds", lane + 1, green_secs);
    }
}

/// One JSON object per event on stdout, for piping into something else.
pub struct JsonAnnouncer;

impl Announcer for JsonAnnouncer {
    fn lane_observed(&mut self, cycle: u64, lane: usize, vehicles: u32, density: Density) {
        println!(
            "{}",
            json!({
                "event": "lane_observed",
                "cycle": cycle,
                "lane": lane + 1,
                "vehicles": vehicles,
                "density": density,
            })
        );
    }

    fn lane_skipped(&mut self, cycle: u64, lane: usize, error: &Error, fallback: Density) {
        println!(
            "{}",
            json!({
                "event": "lane_skipped",
                "cycle": cycle,
                "lane": lane + 1,
                "reason": error.to_string(),
                "fallback": fallback,
            })
        );
    }

    fn plan_ready(&mut self, cycle: u64, plan: &SignalPlan) {
        println!(
            "{}",
            json!({
                "event": "plan_ready",
                "cycle": cycle,
                "green_secs": plan,
            })
        );
    }

    fn lane_green(&mut self, cycle: u64, lane: usize, green_secs: u64) {
        println!(
            "{}",
            json!({
                "event": "lane_green",
                "cycle": cycle,
                "lane": lane + 1,
                "green_secs": green_secs,
            })
        );
    }
}

/// For headless runs.
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn lane_observed(&mut self, _cycle: u64, _lane: usize, _vehicles: u32, _density: Density) {}
    fn lane_skipped(&mut self, _cycle: u64, _lane: usize, _error: &Error, _fallback: Density) {}
    fn plan_ready(&mut self, _cycle: u64, _plan: &SignalPlan) {}
    fn lane_green(&mut self, _cycle: u64, _lane: usize, _green_secs: u64) {}
}
