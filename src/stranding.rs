use crate::fleet::Fleet;
use crate::market::CreditPool;
use crate::types::{Day, Season};

/// Linear forecast of remaining B-season bycatch from bycatch to date.
/// Empirically fit against historical seasons; a policy parameter, not a
/// derived quantity.
const FORECAST_SLOPE: f64 = 9.0;
const FORECAST_INTERCEPT: f64 = 5000.0;

/// Mid-B-season one-shot controller for the dynamic-savings stranding rate.
///
/// On the precomputed trigger day it re-forecasts remaining bycatch demand
/// against total credit supply and resets the stranding rate, releasing
/// previously held credit where the new rate no longer justifies it. Fires
/// exactly once per year; later days are no-ops.
#[derive(Debug)]
pub struct StrandingController {
    trigger_day: Option<Day>,
    fired: bool,
}

impl StrandingController {
    pub fn new(trigger_day: Option<Day>) -> Self {
        StrandingController { trigger_day, fired: false }
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Run the reset if `day` is the trigger day and the controller has not
    /// fired yet. Returns the new stranding rate when it fires.
    pub fn on_day(
        &mut self,
        day: Day,
        fleet: &Fleet,
        pool: &mut CreditPool,
        stranding_limit: f64,
    ) -> Option<f64> {
        if self.fired || self.trigger_day != Some(day) {
            return None;
        }
        self.fired = true;

        let bycatch_to_date: f64 =
            fleet.vessels.iter().map(|v| v.season(Season::B).actual_bycatch).sum();
        let supply: f64 =
            pool.available + fleet.vessels.iter().map(|v| v.credits).sum::<f64>();
        let forecast = bycatch_to_date * FORECAST_SLOPE + FORECAST_INTERCEPT;

        if forecast > supply {
            // Supply is tight: nothing should be stranded.
            pool.available += pool.held;
            pool.held = 0.0;
            return Some(0.0);
        }

        let rate = (supply - forecast) / supply;
        if rate > stranding_limit {
            return Some(stranding_limit);
        }

        // Credit held so far was withheld at the opening limit; release the
        // share the lower rate no longer justifies.
        let new_held = if stranding_limit > 0.0 {
            pool.held / stranding_limit * rate
        } else {
            0.0
        };
        pool.available += pool.held - new_held;
        pool.held = new_held;
        Some(rate)
    }
}
