use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::process::ExitCode;

use itec::config::{RegimeConfig, TradingPolicy};
use itec::landings;
use itec::penalty::{PenaltyCurve, ZTable};
use itec::report;
use itec::simulation::{AnnualSummary, Simulation};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let mut data_path = "cv_sector_data.csv".to_string();
    let mut output_dir = ".".to_string();
    let mut policy_opt: Option<String> = None;
    let mut penalty_opt: Option<String> = None;
    let mut z_table_path: Option<String> = None;
    let mut psi_override: Option<f64> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data" => {
                i += 1;
                data_path = args[i].clone();
            }
            "--output-dir" => {
                i += 1;
                output_dir = args[i].clone();
            }
            "--policy" => {
                i += 1;
                policy_opt = Some(args[i].clone());
            }
            "--penalty" => {
                i += 1;
                penalty_opt = Some(args[i].clone());
            }
            "--z-table" => {
                i += 1;
                z_table_path = Some(args[i].clone());
            }
            "--psi" => {
                i += 1;
                psi_override = Some(args[i].parse().expect("--psi requires a number"));
            }
            "--quiet" => quiet = true,
            _ => {}
        }
        i += 1;
    }

    let mut config = RegimeConfig::canonical();

    if let Some(policy) = policy_opt {
        config.trading = match policy.as_str() {
            "dynamic" => TradingPolicy::DynamicSavings { stranding_limit: 0.50 },
            "tax" => TradingPolicy::FixedTax { tax_rate: 0.20 },
            "none" => TradingPolicy::NoTrading,
            other => {
                eprintln!("unknown trading policy {other:?} (want dynamic|tax|none)");
                return ExitCode::FAILURE;
            }
        };
    }

    if let Some(penalty) = penalty_opt {
        config.penalty = match penalty.as_str() {
            "shallow" => PenaltyCurve::Shallow,
            "moderate" => PenaltyCurve::Moderate,
            "linear" => PenaltyCurve::Linear,
            "normal" => {
                let Some(ref path) = z_table_path else {
                    eprintln!("--penalty normal requires --z-table <path>");
                    return ExitCode::FAILURE;
                };
                let file = match File::open(path) {
                    Ok(f) => f,
                    Err(e) => {
                        eprintln!("failed to open z-table {path}: {e}");
                        return ExitCode::FAILURE;
                    }
                };
                match ZTable::from_reader(BufReader::new(file)) {
                    Ok(table) => PenaltyCurve::Normal(table),
                    Err(e) => {
                        eprintln!("bad z-table {path}: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            }
            other => {
                eprintln!("unknown penalty curve {other:?} (want shallow|moderate|linear|normal)");
                return ExitCode::FAILURE;
            }
        };
    }

    if let Some(psi) = psi_override {
        config.psi = psi;
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

    let mut sim = Simulation::new(config);
    if let Err(e) = sim.run(&rows) {
        eprintln!("simulation aborted: {e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = write_reports(&sim, &output_dir) {
        eprintln!("failed to write reports: {e}");
        return ExitCode::FAILURE;
    }

    if !quiet {
        print_summary_table(&sim);
    }
    ExitCode::SUCCESS
}

fn write_reports(sim: &Simulation, dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;

    for outcome in &sim.years {
        let year = outcome.year.0;

        let mut w = BufWriter::new(File::create(format!("{dir}/credit_supply_demand.{year}.csv"))?);
        report::write_daily_report(&mut w, outcome)?;

        let mut w = BufWriter::new(File::create(format!("{dir}/vessel_data.{year}.csv"))?);
        report::write_vessel_report(&mut w, outcome, &sim.registry)?;

        let mut w = BufWriter::new(File::create(format!("{dir}/vessel_seasons.{year}.ndjson"))?);
        report::write_vessel_ndjson(&mut w, outcome, &sim.registry)?;
    }

    let summaries: Vec<AnnualSummary> = sim.years.iter().map(|o| o.summary.clone()).collect();
    let mut w = BufWriter::new(File::create(format!("{dir}/summary_output.tsv"))?);
    report::write_annual_summary(&mut w, &summaries)?;

    let mut w = BufWriter::new(File::create(format!("{dir}/unfished_pollock.csv"))?);
    report::write_unfished_report(&mut w, &sim.years)?;

    Ok(())
}

fn print_summary_table(sim: &Simulation) {
    println!("\n=== Annual summary ===");
    println!(
        "{:>4} | {:>9} | {:>11} | {:>9} | {:>11} | {:>9} | {:>12}",
        "Year", "Target", "Distributed", "Used", "Transferred", "Held", "Orig bycatch"
    );
    println!("{}", "-".repeat(84));
    for outcome in &sim.years {
        let s = &outcome.summary;
        println!(
            "{:>4} | {:>9.0} | {:>11.0} | {:>9.0} | {:>11.1} | {:>9.1} | {:>12.0}",
            s.year,
            s.target_level,
            s.credits_distributed,
            s.credits_used,
            s.credits_transferred,
            s.credits_held,
            s.original_bycatch,
        );
    }

    println!("\n=== Unfished pollock ===");
    println!("{:>4} | {:>12} | {:>12}", "Year", "A season (t)", "B season (t)");
    for outcome in &sim.years {
        let mut uncaught = [0.0f64; 2];
        for vessel in &outcome.fleet.vessels {
            uncaught[0] += vessel.season(itec::types::Season::A).uncaught_pollock;
            uncaught[1] += vessel.season(itec::types::Season::B).uncaught_pollock;
        }
        println!("{:>4} | {:>12.1} | {:>12.1}", outcome.year, uncaught[0], uncaught[1]);
    }
}
