use itec::landings::Landing;
use itec::synth::{SynthConfig, generate_landings};

pub struct Scenario {
    pub years: u32,
    pub vessels: usize,
    pub trip_probability: f64,
}

pub const SMALL: Scenario = Scenario { years: 1, vessels: 8, trip_probability: 0.25 };

pub const MEDIUM: Scenario = Scenario { years: 3, vessels: 30, trip_probability: 0.40 };

pub const LARGE: Scenario = Scenario { years: 8, vessels: 90, trip_probability: 0.55 };

pub fn make_landings(scenario: &Scenario) -> Vec<Landing> {
    generate_landings(&SynthConfig {
        years: scenario.years,
        vessels: scenario.vessels,
        trip_probability: scenario.trip_probability,
        ..SynthConfig::default()
    })
}
