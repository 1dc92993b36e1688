use serde::{Deserialize, Serialize};

/// Derived percentages shared by single-record views and match totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub hitting_percentage: f64,
    pub pass_rating: f64,
    pub service_percentage: f64,
}

/// (kills - errors) / attempts, three decimals. Negative when errors outnumber kills.
pub fn hitting_percentage(kills: u32, kill_errors: u32, attack_attempts: u32) -> f64 {
    if attack_attempts == 0 {
        return 0.0;
    }
    let net = f64::from(kills) - f64::from(kill_errors);
    round_half_up(net / f64::from(attack_attempts), 3)
}

/// Weighted reception average on the 0-3 scale, two decimals.
pub fn pass_rating(three_pass: u32, two_pass: u32, one_pass: u32, zero_pass: u32) -> f64 {
    let total =
        u64::from(three_pass) + u64::from(two_pass) + u64::from(one_pass) + u64::from(zero_pass);
    if total == 0 {
        return 0.0;
    }
    // zero passes add nothing to the score but still count toward the total
    let score = 3 * u64::from(three_pass) + 2 * u64::from(two_pass) + u64::from(one_pass);
    round_half_up(score as f64 / total as f64, 2)
}

/// Share of serves that stayed in play, three decimals.
pub fn service_percentage(service_attempt: u32, service_error: u32) -> f64 {
    if service_attempt == 0 {
        return 0.0;
    }
    let good = f64::from(service_attempt) - f64::from(service_error);
    round_half_up(good / f64::from(service_attempt), 3)
}

/// Rounds half toward positive infinity at `places` decimals.
pub fn round_half_up(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale + 0.5).floor() / scale
}
