use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use rayon::prelude::*;

use itec::config::{RegimeConfig, TradingPolicy};
use itec::landings::{self, Landing};
use itec::penalty::PenaltyCurve;
use itec::simulation::Simulation;
use itec::types::Season;

/// One cell of the regime grid: a trading policy crossed with a penalty
/// curve, run over the same landings.
struct SweepResult {
    policy: &'static str,
    penalty: &'static str,
    bycatch: f64,
    unfished: f64,
    transferred: f64,
    held: f64,
}

/// Run every trading-policy × penalty-curve combination over one landings
/// file. Runs are independent, so the grid parallelizes; each simulation
/// stays single-threaded and deterministic.
/// Usage: policy_sweep [--data <path>]
fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut data_path = "cv_sector_data.csv".to_string();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--data" {
            i += 1;
            data_path = args[i].clone();
        }
        i += 1;
    }

    let file = match File::open(&data_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("failed to open landings file {data_path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let rows = match landings::read_landings(BufReader::new(file)) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let policies: [(&'static str, TradingPolicy); 3] = [
        ("dynamic", TradingPolicy::DynamicSavings { stranding_limit: 0.50 }),
        ("tax", TradingPolicy::FixedTax { tax_rate: 0.20 }),
        ("none", TradingPolicy::NoTrading),
    ];
    let penalties: [(&'static str, PenaltyCurve); 3] = [
        ("shallow", PenaltyCurve::Shallow),
        ("moderate", PenaltyCurve::Moderate),
        ("linear", PenaltyCurve::Linear),
    ];

    let grid: Vec<(&'static str, TradingPolicy, &'static str, PenaltyCurve)> = policies
        .iter()
        .flat_map(|(pn, p)| {
            penalties.iter().map(move |(cn, c)| (*pn, p.clone(), *cn, c.clone()))
        })
        .collect();

    let results: Vec<SweepResult> = grid
        .into_par_iter()
        .map(|(policy_name, trading, penalty_name, penalty)| {
            run_cell(&rows, trading, penalty, policy_name, penalty_name)
        })
        .collect::<Result<_, _>>()
        .map_err(|e| eprintln!("sweep aborted: {e}"))
        .unwrap_or_default();

    if results.is_empty() {
        return ExitCode::FAILURE;
    }

    println!("\n=== Policy sweep ({} years of landings) ===", distinct_years(&rows));
    println!(
        "{:>8} | {:>8} | {:>10} | {:>12} | {:>12} | {:>10}",
        "Policy", "Penalty", "Bycatch", "Unfished (t)", "Transferred", "Held"
    );
    println!("{}", "-".repeat(76));
    for r in &results {
        println!(
            "{:>8} | {:>8} | {:>10.0} | {:>12.1} | {:>12.1} | {:>10.1}",
            r.policy, r.penalty, r.bycatch, r.unfished, r.transferred, r.held
        );
    }
    ExitCode::SUCCESS
}

fn run_cell(
    rows: &[Landing],
    trading: TradingPolicy,
    penalty: PenaltyCurve,
    policy_name: &'static str,
    penalty_name: &'static str,
) -> Result<SweepResult, itec::error::SimError> {
    let config = RegimeConfig { trading, penalty, ..RegimeConfig::canonical() };
    let mut sim = Simulation::new(config);
    sim.run(rows)?;

    let mut bycatch = 0.0;
    let mut unfished = 0.0;
    let mut transferred = 0.0;
    let mut held = 0.0;
    for outcome in &sim.years {
        bycatch += outcome.summary.credits_used;
        transferred += outcome.pool.transferred;
        held += outcome.pool.held;
        for vessel in &outcome.fleet.vessels {
            for season in Season::BOTH {
                unfished += vessel.season(season).uncaught_pollock;
            }
        }
    }
    Ok(SweepResult {
        policy: policy_name,
        penalty: penalty_name,
        bycatch,
        unfished,
        transferred,
        held,
    })
}

fn distinct_years(rows: &[Landing]) -> usize {
    let mut years: Vec<i32> = rows.iter().map(|l| l.year).collect();
    years.sort_unstable();
    years.dedup();
    years.len()
}
