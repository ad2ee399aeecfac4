//! Main drive-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the equipment, the drivetrain and the robot container
//!     - Main loop:
//!         - Apply the operator inputs due this cycle
//!         - Run one scheduler tick
//!         - Advance the simulated equipment
//!         - Sleep until the end of the cycle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use drive_lib::{
    drivetrain::{Drivetrain, DrivetrainParams},
    params::ExecParams,
    pid_ctrl::PidParams,
    robot_container::RobotContainer,
    scheduler::Scheduler,
    sim::{ScriptedHid, SimRobot},
};
use util::{
    logger::{level_from_str, logger_init},
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Interval between drivetrain status reports, in seconds.
const STATUS_PERIOD_S: f64 = 1.0;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;
    exec_params
        .validate()
        .wrap_err("Invalid exec parameters")?;

    // Initialise logger
    let log_level = level_from_str(&exec_params.log_level).wrap_err("Invalid log level")?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    let drivetrain_params: DrivetrainParams =
        util::params::load("drivetrain.toml").wrap_err("Could not load drivetrain params")?;
    let turn_params: PidParams =
        util::params::load("turn_pid.toml").wrap_err("Could not load turn PID params")?;

    info!("Parameters loaded");

    // ---- LOAD SCRIPT ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected one argument (the path to a TC script), found {}",
            args.len().saturating_sub(1)
        ));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE EQUIPMENT AND MODULES ----

    info!("Initialising modules...");

    let sim = SimRobot::from_drivetrain_params(
        &drivetrain_params,
        exec_params.sim_max_turn_rate_degs,
        exec_params.sim_counts_per_s,
    );
    let hid = ScriptedHid::new();

    let drivetrain = Drivetrain::new(
        Box::new(sim.motor_driver()),
        Box::new(sim.gyro()),
        drivetrain_params,
    )
    .wrap_err("Failed to initialise the drivetrain")?;
    info!("Drivetrain init complete");

    let mut scheduler =
        Scheduler::new(exec_params.cycle_period_s).wrap_err("Failed to create the scheduler")?;

    let container = RobotContainer::new(
        &mut scheduler,
        drivetrain,
        Rc::new(hid.clone()),
        &turn_params,
        &exec_params,
    )
    .wrap_err("Failed to build the robot container")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let status_cycles = util::time::cycles_in(STATUS_PERIOD_S, exec_params.cycle_period_s).max(1);

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        match script.get_pending_tcs(scheduler.now_s()) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    debug!("Applying TC: {:?}", tc);
                    hid.apply(tc);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        // ---- CONTROL PROCESSING ----

        scheduler.run();

        // ---- EQUIPMENT ----

        sim.step(exec_params.cycle_period_s);

        // ---- STATUS ----

        if scheduler.cycle() % status_cycles == 0 {
            let mut dt = container.drivetrain.borrow_mut();
            let owner = scheduler
                .owner(container.drivetrain.id())
                .and_then(|c| scheduler.command_name(c))
                .unwrap_or("none");

            info!(
                "t = {:.2} s, heading {:.1} deg, output {:?}, running {}",
                scheduler.now_s(),
                dt.heading_deg(),
                dt.last_output(),
                owner
            );

            match dt.encoder_positions() {
                Ok((left, right)) => debug!("Encoders: left {}, right {}", left, right),
                Err(e) => warn!("Could not read the encoders: {}", e),
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    container
        .drivetrain
        .borrow_mut()
        .stop()
        .wrap_err("Failed to stop the drivetrain")?;

    info!("End of execution");

    Ok(())
}
