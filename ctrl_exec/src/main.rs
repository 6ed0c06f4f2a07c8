//! Main controller-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - System input acquisition:
//!             - Robot pose snapshot
//!         - Command processing and handling
//!         - Motion control processing
//!         - Wheel demand application
//!         - Response despatch
//!         - Simulation step
//!
//! # Modules
//!
//! All modules (e.g. `motion_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::{
    cmd::Cmd,
    eqpt::WheelDems,
    net::{CmdServer, NetParams},
    response::Response,
};
use ctrl_lib::{
    data_store::DataStore,
    sim::{SimParams, SimRobot},
};

mod cmd_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{PendingCmds, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("E-Puck Controller Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE COMMAND SOURCE ----

    // The command source determines whether we're getting commands from a
    // script or from a network client.
    let mut cmd_source = CmdSource::None;
    let mut use_cmd_server = false;

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);

        // Load the script interpreter
        let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

        // Display some info
        info!(
            "Loaded script lasts {:.02} s and contains {} commands\n",
            si.get_duration(),
            si.get_num_cmds()
        );

        // Set the interpreter in the source
        cmd_source = CmdSource::Script(si);
    }
    // If no arguments then setup the command server
    else if args.len() == 1 {
        info!("No script provided, remote control via the CmdServer will be used\n");
        use_cmd_server = true;
    } else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}",
            args.len() - 1
        ));
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.motion_ctrl
        .init("motion_ctrl.toml", &session)
        .wrap_err("Failed to initialise MotionCtrl")?;
    info!("MotionCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE ROBOT MODEL ----

    let mut robot = SimRobot::new(sim_params);
    info!("SimRobot initialised at {:?}", robot.pose());

    // ---- INITIALISE NETWORK ----

    if use_cmd_server {
        let server = CmdServer::new(&net_params.cmd_endpoint)
            .wrap_err("Failed to initialise the CmdServer")?;

        info!("CmdServer listening on {}", net_params.cmd_endpoint);

        cmd_source = CmdSource::Server(server);
    }

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        // Snapshot the robot state, all processing this cycle sees one
        // consistent pose
        ds.robot_pose = robot.pose();
        ds.wheel_dems = robot.wheel_dems();
        ds.motion_ctrl_input.pose = ds.robot_pose;

        // ---- COMMAND PROCESSING ----

        // Branch depending on the source
        match cmd_source {
            // If no source no point in continuing so break
            CmdSource::None => raise_error!("No command source present"),

            CmdSource::Server(ref mut server) => {
                // Accept a pending connection if there is one, greeting the
                // new client
                match server.accept() {
                    Ok(Some(addr)) => {
                        info!("Client connected from {}", addr);

                        for greeting in &[Response::Hello, Response::Commands] {
                            if let Err(e) = server.send_line(&greeting.to_string()) {
                                warn!("Could not greet the client: {}", e);
                            }
                        }
                    }
                    Ok(None) => (),
                    Err(e) => warn!("Error accepting a connection: {}", e),
                }

                // Get lines until none remain
                while let Some(line) = server.recv_line() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    debug!("Command received: {}", line);

                    match Cmd::from_line(line) {
                        Ok(cmd) => cmd_processor::exec(&mut ds, &cmd),
                        Err(e) => {
                            warn!("Could not parse received command: {}", e);
                            ds.responses.push(Response::Error(e.to_string()));
                        }
                    }
                }

                if server.check_disconnected() {
                    info!("Client disconnected");
                }
            }

            CmdSource::Script(ref mut si) => match si.get_pending_cmds() {
                PendingCmds::None => (),
                PendingCmds::Some(cmd_vec) => {
                    for cmd in cmd_vec.iter() {
                        cmd_processor::exec(&mut ds, cmd);
                    }
                }
                // Exit if end of script reached
                PendingCmds::EndOfScript => {
                    info!("End of command script reached, stopping");
                    break;
                }
            },
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        // MotionCtrl processing
        match ds.motion_ctrl.proc(&ds.motion_ctrl_input) {
            Ok((o, r)) => {
                ds.motion_ctrl_output = o;
                ds.motion_ctrl_status_rpt = r;
            }
            Err(e) => {
                // MotionCtrl errors usually just mean a bad command was sent,
                // so just issue the warning and continue.
                warn!("Error during MotionCtrl processing: {}", e)
            }
        };

        // Apply new wheel demands to the robot
        if let Some(dems) = ds.motion_ctrl_output.dems {
            robot.set_wheel_dems(&dems);
            ds.wheel_dems = robot.wheel_dems();
        }

        // ---- RESPONSE DESPATCH ----

        let responses: Vec<Response> = ds
            .responses
            .drain(..)
            .chain(ds.motion_ctrl_output.responses.drain(..))
            .collect();

        for response in &responses {
            send_response(&mut cmd_source, response);
        }

        // ---- SIMULATION STEP ----

        robot.step(CYCLE_PERIOD_S);

        // Periodic pose trace, makes a stalled motion visible in the log
        if ds.is_1_hz_cycle {
            debug!(
                "Pose: pos=({:.2},{:.2}) cm, heading={:.2} rad",
                ds.robot_pose.position_cm.x, ds.robot_pose.position_cm.y, ds.robot_pose.heading_rad
            );
        }

        // ---- SHUTDOWN CHECK ----

        if ds.quit_requested {
            info!("Quit requested, stopping");
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    // Whatever caused the loop to end, leave the robot stopped
    robot.set_wheel_dems(&WheelDems::default());

    let final_pose = robot.pose();
    info!(
        "Final pose: pos=({:.2},{:.2}) cm, heading={:.2} rad",
        final_pose.position_cm.x, final_pose.position_cm.y, final_pose.heading_rad
    );

    session.save(
        "run_summary.json",
        RunSummary {
            num_cycles: ds.num_cycles as u64,
            final_pose_x_cm: final_pose.position_cm.x,
            final_pose_y_cm: final_pose.position_cm.y,
            final_heading_rad: final_pose.heading_rad,
        },
    );

    session.exit();

    info!("End of execution");

    Ok(())
}

/// Push a response to the client, or to the log when running from a script.
///
/// A missing client is not an error, the response is dropped.
fn send_response(cmd_source: &mut CmdSource, response: &Response) {
    match cmd_source {
        CmdSource::Server(server) => match server.send_line(&response.to_string()) {
            Ok(()) => (),
            Err(comms_if::net::CmdServerError::NotConnected) => {
                trace!("No client connected, response dropped: {}", response)
            }
            Err(e) => warn!("Could not send response: {}", e),
        },
        _ => info!("Response: {}", response),
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the commands incoming to the exec.
enum CmdSource {
    None,
    Server(CmdServer),
    Script(ScriptInterpreter),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of the run, saved into the session directory at shutdown.
#[derive(Serialize)]
struct RunSummary {
    num_cycles: u64,
    final_pose_x_cm: f64,
    final_pose_y_cm: f64,
    final_heading_rad: f64,
}
