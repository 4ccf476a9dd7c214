//! Seeded synthetic landings for fixtures, benches and demo runs. The
//! simulator itself is deterministic replay; randomness stops here.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, LogNormal, Poisson};

use crate::landings::Landing;

/// Shape of a synthetic fleet-year.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub seed: u64,
    pub start_year: i32,
    pub years: u32,
    pub vessels: usize,
    /// Chance a vessel lands on any given fishing day.
    pub trip_probability: f64,
    /// Ln-space parameters of the per-trip pollock weight (metric tons).
    pub pollock_mu: f64,
    pub pollock_sigma: f64,
    /// Expected chinook per ton of pollock, by season. B-season encounter
    /// rates run well above A-season ones, mirroring the fall migration.
    pub encounter_rate: [f64; 2],
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            seed: 42,
            start_year: 2001,
            years: 3,
            vessels: 12,
            trip_probability: 0.35,
            pollock_mu: 5.0,
            pollock_sigma: 0.5,
            encounter_rate: [0.005, 0.025],
        }
    }
}

const COOPS: [&str; 3] = ["AKP", "UCB", "NPF"];

/// A-season window: Jan 20 through the June boundary; B season: the
/// boundary through Oct 30. Fishing pauses between seasons in the data the
/// same way it does on the water.
const A_OPEN: (u32, u32) = (1, 20);
const A_CLOSE: (u32, u32) = (4, 30);
const B_OPEN: (u32, u32) = (6, 11);
const B_CLOSE: (u32, u32) = (10, 30);

/// Generate a date-ordered landings table. Same config, same output.
pub fn generate_landings(config: &SynthConfig) -> Vec<Landing> {
    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
    let pollock_dist = LogNormal::new(config.pollock_mu, config.pollock_sigma)
        .expect("invalid LogNormal params");

    let mut out = Vec::new();
    let mut ticket = 0u64;

    for y in 0..config.years {
        let year = config.start_year + y as i32;
        for (window, rate) in [
            ((A_OPEN, A_CLOSE), config.encounter_rate[0]),
            ((B_OPEN, B_CLOSE), config.encounter_rate[1]),
        ] {
            let (open, close) = window;
            for (month, day) in days_between(year, open, close) {
                for v in 0..config.vessels {
                    if !rng.random_bool(config.trip_probability) {
                        continue;
                    }
                    let pollock = pollock_dist.sample(&mut rng);
                    let lambda = rate * pollock;
                    let chinook = if lambda > 0.0 {
                        Poisson::new(lambda).expect("invalid Poisson lambda").sample(&mut rng)
                    } else {
                        0.0
                    };
                    ticket += 1;
                    out.push(Landing {
                        year,
                        month,
                        day,
                        ticket: format!("S{ticket:06}"),
                        vessel: format!("VESSEL {:02}", v + 1),
                        coop: COOPS[v % COOPS.len()].to_string(),
                        pollock,
                        chinook,
                    });
                }
            }
        }
    }
    out
}

fn days_between(year: i32, open: (u32, u32), close: (u32, u32)) -> Vec<(u32, u32)> {
    let month_len = |m: u32| match m {
        2 if crate::calendar::is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    let mut days = Vec::new();
    let (mut month, mut day) = open;
    loop {
        days.push((month, day));
        if (month, day) == close {
            return days;
        }
        day += 1;
        if day > month_len(month) {
            day = 1;
            month += 1;
        }
    }
}
