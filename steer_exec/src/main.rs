//! # Steering Executable
//!
//! This executable steers the simulated vehicle. Each frame from the simulator bridge is handled to
//! completion before the next is read:
//!
//!     - Receive a frame from the bridge
//!     - Decode the event
//!     - Drive control processing (steering demand, episode scoring, gain tuning)
//!     - Reply with the resulting commands
//!
//! Frames which don't carry telemetry, or whose telemetry can't be read, are answered with a
//! manual driving acknowledgement.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulator server abstraction.
mod sim_server;

/// Parameters for the steering executable.
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{Result, eyre::WrapErr};
use comms_if::{net::zmq, sim::SimCommand};
use log::{debug, info, trace, warn};
use structopt::StructOpt;

// Internal
use params::SteerExecParams;
use sim_server::{Request, SimServer, SimServerError};
use steer_lib::drive_ctrl::DriveCtrl;
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Closed-loop steering of the simulated vehicle, with online gain tuning.
#[derive(Debug, StructOpt)]
#[structopt(name = "steer_exec")]
struct Opts {
    /// Drive control parameter file, relative to the params directory
    #[structopt(long, default_value = "drive_ctrl.toml")]
    params: String,

    /// Executable parameter file, relative to the params directory
    #[structopt(long, default_value = "steer_exec.toml")]
    exec_params: String,

    /// Drive with the configured gains without tuning them
    #[structopt(long)]
    no_tune: bool,

    /// Log every tick
    #[structopt(short, long)]
    verbose: bool
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    let opts = Opts::from_args();

    // Initialise session
    let session = Session::new(
        "steer_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = match opts.verbose {
        true => LevelFilter::Trace,
        false => LevelFilter::Debug
    };
    logger_init(level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Steering Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let exec_params: SteerExecParams = util::params::load(&opts.exec_params)
        .wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let mut drive_ctrl = DriveCtrl::default();
    drive_ctrl.init(opts.params.clone(), &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    if opts.no_tune {
        drive_ctrl.disable_tuning();
    }
    info!("DriveCtrl init complete");

    // ---- SERVER INITIALISATION ----

    let mut server = SimServer::new(&exec_params.net)
        .wrap_err("Failed to initialise server")?;

    info!("Listening for the simulator on {}", exec_params.net.sim_endpoint);

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    loop {
        let request = match server.get_request() {
            Ok(Some(r)) => r,
            Ok(None) => continue,
            Err(SimServerError::RecvError(zmq::Error::EFSM)) => {
                warn!("Server socket is waiting to reply, reopening the server");
                server = server.reopen().wrap_err("Failed to reopen server")?;
                continue
            },
            Err(SimServerError::RecvError(e)) => {
                warn!("Could not read from the bridge: {}", e);
                continue
            },
            Err(e) => return Err(e).wrap_err("Simulator server failed")
        };

        let cmds = match request {
            Request::Event(event) => match drive_ctrl.proc(&event) {
                Ok((cmds, report)) => {
                    trace!("DriveCtrl report: {:?}", report);
                    cmds
                },
                Err(e) => {
                    warn!("Skipping tick: {}", e);
                    vec![SimCommand::Manual]
                }
            },
            Request::Undecodable(e) => {
                debug!("Undecodable frame: {}", e);
                vec![SimCommand::Manual]
            }
        };

        if let Err(e) = server.send_commands(&cmds) {
            warn!("{}, reopening the server", e);
            server = server.reopen().wrap_err("Failed to reopen server")?;
        }
    }
}
