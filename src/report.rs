use std::io::{self, Write};

use serde::Serialize;

use crate::calendar;
use crate::fleet::VesselRegistry;
use crate::simulation::{AnnualSummary, YearOutcome};
use crate::types::Season;

/// One NDJSON row: a vessel's simulated season, flattened for downstream
/// analysis tooling.
#[derive(Debug, Serialize)]
pub struct VesselSeasonRecord<'a> {
    pub year: i32,
    pub season: Season,
    pub vessel: &'a str,
    pub coop: &'a str,
    pub pollock: f64,
    pub bycatch: f64,
    pub uncaught_pollock: f64,
    pub bycatch_rate: Option<f64>,
    pub credit_factor: f64,
    pub credits: i64,
    pub z: Option<f64>,
    pub q: Option<f64>,
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_default()
}

/// Daily credit supply/demand table: one row per day with fleet aggregates,
/// a blank line separating the A and B seasons.
pub fn write_daily_report<W: Write>(w: &mut W, outcome: &YearOutcome) -> io::Result<()> {
    writeln!(
        w,
        "Date,Vessels (out of credits),Pollock,Pollock (cum),Bycatch,Bycatch (cum),Bycatch Rate"
    )?;

    let fleet = &outcome.fleet;
    for day in 0..fleet.num_days {
        if day == fleet.b_start {
            writeln!(w)?;
        }
        let season = fleet.season_of(crate::types::Day(day));

        let mut pollock = 0.0;
        let mut bycatch = 0i64;
        let mut cum_pollock = 0.0;
        let mut cum_bycatch = 0.0;
        let mut out_count = 0usize;
        for vessel in &fleet.vessels {
            pollock += vessel.pollock[day];
            bycatch += vessel.bycatch[day];
            cum_pollock += vessel.cum_pollock[day];
            cum_bycatch += vessel.cum_bycatch[day];
            if let Some(out) = vessel.season(season).out_day
                && out.0 <= day
            {
                out_count += 1;
            }
        }
        let rate = if pollock > 0.0 { bycatch as f64 / pollock } else { 0.0 };

        writeln!(
            w,
            "{},{},{:.3},{:.3},{},{:.3},{:.6}",
            calendar::day_label(fleet.start_day + day as u32, fleet.year.0),
            out_count,
            pollock,
            cum_pollock,
            bycatch,
            cum_bycatch,
            rate,
        )?;
    }
    Ok(())
}

/// Per-vessel season summary: A, B and combined columns, plus a fleet
/// TOTAL row. Season cells are blank for vessels absent from that season.
pub fn write_vessel_report<W: Write>(
    w: &mut W,
    outcome: &YearOutcome,
    registry: &VesselRegistry,
) -> io::Result<()> {
    writeln!(w, ",,A Season,,,,,,,,B Season,,,,,,,,{}", outcome.year)?;
    let season_cols = "Pollock,Bycatch,Uncaught Pollock,Bycatch Rate,Credit Factor,Credits,z-score,q-value";
    writeln!(
        w,
        "Vessel Name,Coop,{season_cols},{season_cols},Pollock,Bycatch,Uncaught Pollock,Bycatch Rate,Credits"
    )?;

    let fleet = &outcome.fleet;
    for vessel in &fleet.vessels {
        let key = registry.key(vessel.id);
        write!(w, "{},{}", key.name, key.coop)?;
        for season in Season::BOTH {
            let side = vessel.season(season);
            if side.pollock > 0.0 {
                write!(
                    w,
                    ",{:.3},{:.3},{:.3},{},{:.6},{},{},{}",
                    side.actual_pollock,
                    side.actual_bycatch,
                    side.uncaught_pollock,
                    fmt_opt(side.actual_rate),
                    side.credit_factor,
                    side.init_credits,
                    fmt_opt(side.z),
                    fmt_opt(side.q),
                )?;
            } else {
                write!(w, ",,,,,,,,")?;
            }
        }
        let a = vessel.season(Season::A);
        let b = vessel.season(Season::B);
        let pollock = a.actual_pollock + b.actual_pollock;
        let bycatch = a.actual_bycatch + b.actual_bycatch;
        let rate = if pollock > 0.0 { bycatch / pollock } else { 0.0 };
        writeln!(
            w,
            ",{:.3},{:.3},{:.3},{:.6},{}",
            pollock,
            bycatch,
            a.uncaught_pollock + b.uncaught_pollock,
            rate,
            a.init_credits + b.init_credits,
        )?;
    }

    // Fleet totals.
    let mut pollock = [0.0f64; 2];
    let mut bycatch = [0.0f64; 2];
    let mut uncaught = [0.0f64; 2];
    let mut credits = [0i64; 2];
    for vessel in &fleet.vessels {
        for season in Season::BOTH {
            let i = season.index();
            let side = vessel.season(season);
            pollock[i] += side.actual_pollock;
            bycatch[i] += side.actual_bycatch;
            uncaught[i] += side.uncaught_pollock;
            credits[i] += side.init_credits;
        }
    }
    writeln!(w)?;
    write!(w, "TOTAL,")?;
    for i in 0..2 {
        let rate = if pollock[i] > 0.0 { bycatch[i] / pollock[i] } else { 0.0 };
        write!(
            w,
            ",{:.3},{:.3},{:.3},{:.6},,{},,",
            pollock[i], bycatch[i], uncaught[i], rate, credits[i]
        )?;
    }
    let total_pollock = pollock[0] + pollock[1];
    let total_bycatch = bycatch[0] + bycatch[1];
    let rate = if total_pollock > 0.0 { total_bycatch / total_pollock } else { 0.0 };
    writeln!(
        w,
        ",{:.3},{:.3},{:.3},{:.6},{}",
        total_pollock,
        total_bycatch,
        uncaught[0] + uncaught[1],
        rate,
        credits[0] + credits[1],
    )
}

/// Cross-year annual summary, tab-separated like the historical log.
pub fn write_annual_summary<W: Write>(w: &mut W, summaries: &[AnnualSummary]) -> io::Result<()> {
    writeln!(
        w,
        "year\ttarget level\tcredits distributed\tcredits used\tcredits transferred\tcredits held\ttotal bycatch (original)"
    )?;
    for s in summaries {
        writeln!(
            w,
            "{}\t{:.1}\t{:.0}\t{:.1}\t{:.1}\t{:.1}\t{:.1}",
            s.year,
            s.target_level,
            s.credits_distributed,
            s.credits_used,
            s.credits_transferred,
            s.credits_held,
            s.original_bycatch,
        )?;
    }
    Ok(())
}

/// Cross-year unfished-pollock table.
pub fn write_unfished_report<W: Write>(w: &mut W, outcomes: &[YearOutcome]) -> io::Result<()> {
    writeln!(w, "year,unfished pollock (A),unfished pollock (B)")?;
    for outcome in outcomes {
        let mut uncaught = [0.0f64; 2];
        for vessel in &outcome.fleet.vessels {
            for season in Season::BOTH {
                uncaught[season.index()] += vessel.season(season).uncaught_pollock;
            }
        }
        writeln!(w, "{},{:.3},{:.3}", outcome.year, uncaught[0], uncaught[1])?;
    }
    Ok(())
}

/// NDJSON export: one line per vessel-season with recorded activity.
pub fn write_vessel_ndjson<W: Write>(
    w: &mut W,
    outcome: &YearOutcome,
    registry: &VesselRegistry,
) -> io::Result<()> {
    for vessel in &outcome.fleet.vessels {
        for season in Season::BOTH {
            let side = vessel.season(season);
            if side.pollock <= 0.0 {
                continue;
            }
            let key = registry.key(vessel.id);
            let record = VesselSeasonRecord {
                year: outcome.year.0,
                season,
                vessel: &key.name,
                coop: &key.coop,
                pollock: side.actual_pollock,
                bycatch: side.actual_bycatch,
                uncaught_pollock: side.uncaught_pollock,
                bycatch_rate: side.actual_rate,
                credit_factor: side.credit_factor,
                credits: side.init_credits,
                z: side.z,
                q: side.q,
            };
            serde_json::to_writer(&mut *w, &record).map_err(io::Error::other)?;
            writeln!(w)?;
        }
    }
    Ok(())
}
