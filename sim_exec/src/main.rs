//! Main simulator executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the simulation
//!     - Main loop:
//!         - Tuning command acquisition from the script
//!         - Simulation processing (one tick of every vehicle)
//!         - Archive writing
//!         - Cycle management, only when running in real time
//!     - Save the run summary
//!
//! Any front end drawing the simulation follows the same loop, calling
//! `Simulation::proc` once per frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use chrono::Utc;
use color_eyre::{Report, eyre::WrapErr};
use log::{debug, info, warn};
use structopt::StructOpt;

// Internal
use sim_lib::sim::{SimParams, Simulation, TuningCmd};
use util::{
    module::State,
    archive::Archived,
    logger::{logger_init, LevelFilter},
    session::Session,
    script_interpreter::{ScriptInterpreter, PendingCmds}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of ticks to run if neither a tick count nor a script is given.
const DEFAULT_NUM_TICKS: u64 = 600;

/// Number of ticks between progress reports.
const PROGRESS_PERIOD_TICKS: u64 = 60;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Headless moose test line following simulator.
#[derive(Debug, StructOpt)]
#[structopt(name = "sim_exec")]
struct Args {
    /// Number of ticks to run.
    ///
    /// If not given the simulation stops at the end of the script, or after
    /// 600 ticks when there is no script.
    #[structopt(short, long)]
    ticks: Option<u64>,

    /// Pace the ticks against the wall clock instead of running flat out.
    #[structopt(short, long)]
    realtime: bool,

    /// Path to a tuning command script.
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Parameter file, relative to the `params` directory of the root.
    #[structopt(short, long, default_value = "sim.toml")]
    params: String,

    /// Parameter file given by an explicit path, overrides `--params`.
    #[structopt(long, parse(from_os_str))]
    params_path: Option<PathBuf>,

    /// Log the simulation core at trace level.
    #[structopt(short, long)]
    verbose: bool
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "sim_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let core_level = match args.verbose {
        true => LevelFilter::Trace,
        false => LevelFilter::Debug
    };
    logger_init(LevelFilter::Info, core_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Moose Test Simulator Executable\n");
    info!("Started at {}", Utc::now().to_rfc3339());
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", args);

    // ---- LOAD PARAMETERS ----

    let sim_params: SimParams = match args.params_path {
        Some(ref path) => {
            info!("Simulation parameters loaded from {:?}", path);
            util::params::load_from_path::<SimParams, _>(path)
        },
        None => {
            info!("Simulation parameters loaded from {}", args.params);
            util::params::load::<SimParams>(&args.params)
        }
    }.wrap_err("Could not load simulation params")?;

    // ---- INITIALISE SCRIPT ----

    let mut script = match args.script {
        Some(ref path) => {
            let si = ScriptInterpreter::<TuningCmd>::new(path)
                .wrap_err("Failed to load script")?;

            info!(
                "Loaded script {:?} lasts {:.02} s and contains {} commands\n",
                si.get_path(),
                si.get_duration(),
                si.get_num_cmds()
            );

            Some(si)
        },
        None => {
            info!("No script provided, gains will not be changed\n");
            None
        }
    };

    // Run for the given number of ticks, otherwise to the end of the script
    let max_ticks = match (args.ticks, &script) {
        (Some(t), _) => Some(t),
        (None, Some(_)) => None,
        (None, None) => Some(DEFAULT_NUM_TICKS)
    };

    // ---- INITIALISE SIMULATION ----

    info!("Initialising simulation...");

    let tick_period_s = sim_params.tick_period_s;
    let mut sim = Simulation::init(sim_params, &session)
        .wrap_err("Failed to initialise the simulation")?;

    info!("Simulation init complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut tuning_cmds: Vec<TuningCmd> = Vec::new();

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        if let Some(max) = max_ticks {
            if sim.num_ticks() >= max {
                info!("Reached {} ticks, stopping", max);
                break
            }
        }

        // ---- TUNING COMMANDS ----

        tuning_cmds.clear();

        if let Some(ref mut si) = script {
            match si.get_pending(sim.sim_time_s()) {
                PendingCmds::None => (),
                PendingCmds::Some(cmds) => {
                    for cmd in cmds.iter() {
                        info!("{:.2} s: executing {:?}", sim.sim_time_s(), cmd);
                    }
                    tuning_cmds.extend(cmds);
                },
                // Exit if end of script reached and no tick count was given
                PendingCmds::EndOfScript => {
                    if max_ticks.is_none() {
                        info!("End of tuning script reached, stopping");
                        break
                    }
                }
            }
        }

        // ---- SIMULATION PROCESSING ----

        let (output, report) = sim.proc(&tuning_cmds)
            .wrap_err("Error during simulation processing")?;

        if report.num_cmds_rejected > 0 {
            warn!("{} tuning command(s) rejected", report.num_cmds_rejected);
        }

        if sim.num_ticks() % PROGRESS_PERIOD_TICKS == 0 {
            for t in output.iter() {
                info!(
                    "{:.2} s: {} at ({:.1}, {:.1}), error {:.3}, gains ({:.3}, {:.4}, {:.3})",
                    t.sim_time_s, t.name, t.x, t.y, t.error, t.kp, t.ki, t.kd
                );
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = sim.write() {
            warn!("Could not write the simulation archives: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        if args.realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            // Get sleep duration
            match Duration::from_secs_f64(tick_period_s)
                .checked_sub(cycle_dur)
            {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s", 
                    cycle_dur.as_secs_f64() - tick_period_s
                )
            }
        }
    }

    // ---- SHUTDOWN ----

    let summary = sim.summary();
    for v in summary.vehicles.iter() {
        info!(
            "{}: finished at ({:.1}, {:.1}), mean absolute error {:.4}",
            v.name, v.final_x, v.final_y, v.mean_abs_error
        );
    }
    session.save("summary.json", summary);

    info!("End of execution");

    session.exit();

    Ok(())
}
