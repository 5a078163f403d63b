use models::{BoostOptions, OptionFlag};
use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;

const HOURS_PER_DAY: u64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Hours,
    Days,
}

/// Which expedite add-on shaped the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pace {
    Standard,
    Priority,
    SuperExpress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub value: u64,
    pub unit: DurationUnit,
    pub pace: Pace,
    pub label: String,
}

/// Estimated time to climb from `start` to `target`.
///
/// Expedited estimates are always in hours. Super Express is checked before
/// Priority, so it wins when both are enabled.
pub fn estimate_duration(
    start: u32,
    target: u32,
    options: &BoostOptions,
    config: &PricingConfig,
) -> DurationEstimate {
    let points = u64::from(target.saturating_sub(start));
    let points_per_hour = u64::from(config.block_size) * u64::from(config.blocks_per_hour);

    if options.contains(OptionFlag::SuperExpress) {
        let hours = scaled_hours(points, points_per_hour, config.super_express_time_percent);
        return expedited(hours, Pace::SuperExpress, "Super Express");
    }
    if options.contains(OptionFlag::Priority) {
        let hours = scaled_hours(points, points_per_hour, config.priority_time_percent);
        return expedited(hours, Pace::Priority, "Priority");
    }

    if points < HOURS_PER_DAY * points_per_hour {
        let hours = points.div_ceil(points_per_hour);
        DurationEstimate {
            value: hours,
            unit: DurationUnit::Hours,
            pace: Pace::Standard,
            label: format!("~{}", plural(hours, DurationUnit::Hours)),
        }
    } else {
        let days = points.div_ceil(HOURS_PER_DAY * points_per_hour);
        DurationEstimate {
            value: days,
            unit: DurationUnit::Days,
            pace: Pace::Standard,
            label: format!("~{}", plural(days, DurationUnit::Days)),
        }
    }
}

// ceil(points / points_per_hour * percent / 100) without going through floats
fn scaled_hours(points: u64, points_per_hour: u64, percent: u32) -> u64 {
    (points * u64::from(percent)).div_ceil(points_per_hour * 100)
}

fn expedited(hours: u64, pace: Pace, tag: &str) -> DurationEstimate {
    DurationEstimate {
        value: hours,
        unit: DurationUnit::Hours,
        pace,
        label: format!("~{} ({tag})", plural(hours, DurationUnit::Hours)),
    }
}

fn plural(value: u64, unit: DurationUnit) -> String {
    let word = match (unit, value) {
        (DurationUnit::Hours, 1) => "hour",
        (DurationUnit::Hours, _) => "hours",
        (DurationUnit::Days, 1) => "day",
        (DurationUnit::Days, _) => "days",
    };
    format!("{value} {word}")
}
