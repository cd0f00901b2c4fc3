// src/bin/ising_run.rs - Single-temperature run writing time series and grid dumps

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use ising::config::ModelConfig;
use ising::model::IsingModel;

// -----------------------------------------------------------------------------
// Run parameters, fixed per build as in the reference runs
// -----------------------------------------------------------------------------

/// Grid side length (NGRID x NGRID lattice).
const NGRID: usize = 100;

/// Generations to simulate per run.
const NUM_GENS: u64 = 10_000;

/// Independent runs per invocation.
const NUM_RUNS: usize = 1;

/// Initial expected magnetization, 0 for a fully random start.
const INIT_MAGN: f64 = 0.0;

/// Generations between full grid dumps; 0 disables dumping.
const DUMP_GRID_EVERY: u64 = 1_000;

#[derive(Parser)]
#[command(about = "2D Ising model run at a fixed temperature")]
struct Cli {
    /// Temperature in units of J/k (Tc = 2.2692)
    temperature: f64,

    /// Directory for output data files
    #[arg(long, default_value = ".")]
    datadir: PathBuf,

    /// RNG seed; drawn from entropy when absent
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The temperature is the one required argument; exit 1 without it.
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err)
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            err.exit()
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let mut rng = match args.seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_entropy(),
    };

    let config = ModelConfig::new(NGRID, args.temperature);
    let mut model = IsingModel::from_config(&config, &mut rng)?;

    println!("Temperature T={}", args.temperature);
    println!("{NGRID} x {NGRID} Ising model");
    println!("{NUM_RUNS} run{}", if NUM_RUNS > 1 { "s" } else { "" });
    println!("{NUM_GENS} generations");
    println!("Datadir is {}/", args.datadir.display());

    for run in 0..NUM_RUNS {
        println!("\n=== Starting run {}/{} ===", run + 1, NUM_RUNS);
        let run_start = Instant::now();

        model.reset_stats();
        model.cur_gen = 0;
        model.set_magnetization(INIT_MAGN, &mut rng);
        model.update_energy();
        model.update_magnetization();

        let series_path = data_path(&args, "series", run);
        println!("Recording time series in file {}", series_path.display());
        let mut series = BufWriter::new(File::create(&series_path)?);
        writeln!(series, "# Temperature = {}", args.temperature)?;
        writeln!(series, "# Grid N = {NGRID}")?;
        writeln!(series, "# Data columns")?;
        writeln!(series, "# 1: generation number")?;
        writeln!(series, "# 2: magnetization for this gen")?;
        writeln!(series, "# 3: energy per site for this gen")?;

        let grids_path = data_path(&args, "grids", run);
        println!("Recording grids in file {}", grids_path.display());
        let mut grids = BufWriter::new(File::create(&grids_path)?);
        writeln!(grids, "# Temperature = {}", args.temperature)?;
        writeln!(grids, "# Grid N = {NGRID}")?;

        println!("Initial magnetization M={}", model.global_magnetization);
        println!("Simulating {NUM_GENS} generations ...");

        write_series_row(&mut series, 0, &model)?;
        write_grid(&mut grids, 0, &model)?;
        report(run_start, 0, &model);

        for gen in 1..=NUM_GENS {
            model.do_generation(&mut rng);
            write_series_row(&mut series, gen, &model)?;
            if DUMP_GRID_EVERY > 0 && gen % DUMP_GRID_EVERY == 0 {
                write_grid(&mut grids, gen, &model)?;
            }
            if gen % (NUM_GENS / 10).max(1) == 0 {
                report(run_start, gen, &model);
            }
        }

        series.flush()?;
        grids.flush()?;
        println!("Run completed in {:.3} s", run_start.elapsed().as_secs_f64());
        println!("=== Run {}/{} complete ===", run + 1, NUM_RUNS);
    }

    if NUM_RUNS > 1 {
        println!("\n=== All runs complete! ===");
        println!("Total elapsed: {:.1} s", start.elapsed().as_secs_f64());
    }

    Ok(())
}

/// `T{temp:.3}_series.dat`, with a `_r{run:03}` tag when several runs share
/// the invocation.
fn data_path(args: &Cli, kind: &str, run: usize) -> PathBuf {
    let name = if NUM_RUNS == 1 {
        format!("T{:.3}_{kind}.dat", args.temperature)
    } else {
        format!("T{:.3}_r{run:03}_{kind}.dat", args.temperature)
    };
    args.datadir.join(name)
}

fn write_series_row(out: &mut impl Write, gen: u64, model: &IsingModel) -> std::io::Result<()> {
    writeln!(
        out,
        "{gen} {:e} {:e}",
        model.global_magnetization,
        model.energy_per_site()
    )
}

/// `# GEN <n>` marker followed by N rows of N characters, 0/1 per spin.
fn write_grid(out: &mut impl Write, gen: u64, model: &IsingModel) -> std::io::Result<()> {
    writeln!(out, "# GEN {gen}")?;
    for y in 0..model.n() {
        for x in 0..model.n() {
            write!(out, "{}", if model.spin(x, y) == 1 { 1 } else { 0 })?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn report(run_start: Instant, gen: u64, model: &IsingModel) {
    println!(
        "[{:.3}] gen {gen} | E = {} | M = {}",
        run_start.elapsed().as_secs_f64(),
        model.energy_per_site(),
        model.global_magnetization
    );
}
