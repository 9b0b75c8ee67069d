use std::collections::BTreeMap;

use crate::pipeline::Density;
use crate::Error;

/// Green time per density, in whole seconds.
pub type GreenTimes = BTreeMap<Density, u64>;

/// Green seconds per lane, index-aligned with the densities it was planned from.
pub type SignalPlan = Vec<u64>;

pub fn default_green_times() -> GreenTimes {
    GreenTimes::from([
        (Density::Low, 30),
        (Density::Medium, 45),
        (Density::High, 60),
    ])
}

/// Maps each lane density to its configured green time, preserving lane order.
/// A density missing from the table is a configuration error and yields no
/// partial plan.
pub fn plan(densities: &[Density], green_times: &GreenTimes) -> crate::Result<SignalPlan> {
    densities
        .iter()
        .map(|density| {
            green_times.get(density).copied().ok_or_else(|| {
                Error::Configuration(format!("no green time configured for {} density", density))
            })
        })
        .collect()
}
