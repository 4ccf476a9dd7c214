use std::collections::HashMap;
use std::env;

use itec::synth::{SynthConfig, generate_landings};

/// Emit a synthetic catch-ticket CSV to stdout, summary to stderr.
/// Usage: synth_landings [years] [vessels] [seed]
fn main() {
    let mut config = SynthConfig::default();
    let mut args = env::args().skip(1);
    if let Some(v) = args.next().and_then(|s| s.parse().ok()) {
        config.years = v;
    }
    if let Some(v) = args.next().and_then(|s| s.parse().ok()) {
        config.vessels = v;
    }
    if let Some(v) = args.next().and_then(|s| s.parse().ok()) {
        config.seed = v;
    }

    let rows = generate_landings(&config);

    println!("year,date,ticket,vessel,coop,port,pollock,chinook");
    for l in &rows {
        println!(
            "{},{}/{},{},{},{},,{:.3},{:.3}",
            l.year, l.month, l.day, l.ticket, l.vessel, l.coop, l.pollock, l.chinook
        );
    }

    // Per-year totals to stderr.
    let mut year_pollock: HashMap<i32, f64> = HashMap::new();
    let mut year_chinook: HashMap<i32, f64> = HashMap::new();
    for l in &rows {
        *year_pollock.entry(l.year).or_insert(0.0) += l.pollock;
        *year_chinook.entry(l.year).or_insert(0.0) += l.chinook;
    }
    let mut years: Vec<i32> = year_pollock.keys().copied().collect();
    years.sort_unstable();
    eprintln!("synth_landings: {} rows over {} years", rows.len(), years.len());
    for y in years {
        eprintln!(
            "  {y}: pollock={:.0} t  chinook={:.0}  rate={:.5}",
            year_pollock[&y],
            year_chinook[&y],
            year_chinook[&y] / year_pollock[&y]
        );
    }
}
