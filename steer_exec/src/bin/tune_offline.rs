//! # Offline Tuning
//!
//! This binary tunes the steering gains against the built-in vehicle model rather than the
//! simulator. It is designed to allow quick checks of drive control and the tuner without having
//! to run the simulator and bridge.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::info;
use structopt::StructOpt;

use steer_lib::{
    drive_ctrl::DriveCtrl,
    vehicle_model::{ModelParams, VehicleModel},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tune the steering gains against a kinematic vehicle model.
#[derive(Debug, StructOpt)]
#[structopt(name = "tune_offline")]
struct Opts {
    /// Drive control parameter file, relative to the params directory
    #[structopt(long, default_value = "drive_ctrl.toml")]
    params: String,

    /// Stop after this many episodes even if tuning hasn't converged
    #[structopt(long, default_value = "500")]
    max_episodes: u64,

    /// Constant steering bias of the model in degrees
    #[structopt(long, default_value = "1.0")]
    bias_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    let opts = Opts::from_args();

    let session = Session::new("tune_offline", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    info!("Offline Tuning\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    let mut drive_ctrl = DriveCtrl::default();
    drive_ctrl
        .init(opts.params.clone(), &session)
        .wrap_err("Failed to initialise DriveCtrl")?;

    if !drive_ctrl.tuner().is_active() {
        return Err(eyre!("Tuning is disabled in {}, nothing to do", opts.params));
    }

    let mut model = VehicleModel::new(ModelParams {
        steer_bias_rad: opts.bias_deg.to_radians(),
        ..Default::default()
    });

    // ---- MAIN LOOP ----

    while drive_ctrl.tuner().is_active() && drive_ctrl.tuner().num_episodes() < opts.max_episodes
    {
        let (cmds, _) = drive_ctrl
            .proc(&model.telemetry())
            .wrap_err("DriveCtrl processing failed")?;

        for cmd in cmds.iter() {
            model.apply(cmd);
        }
        model.tick();
    }

    // ---- SUMMARY ----

    let tuner = drive_ctrl.tuner();
    match tuner.best_gains() {
        Some(g) => info!(
            "After {} episodes best gains are ({}, {}, {}) with error {:.6}",
            tuner.num_episodes(),
            g.k_p,
            g.k_i,
            g.k_d,
            tuner.best_error()
        ),
        None => info!("No episodes were completed"),
    }
    if tuner.is_active() {
        info!(
            "Tuning did not converge, step sizes are {:?}",
            tuner.state().step_sizes
        );
    }

    Ok(())
}
