//! Drive control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::{fs::{self, OpenOptions}, io::Write, path::PathBuf};
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{
    episode::EpisodeAccumulator,
    pid_ctrl::PidController,
    twiddle::{StepReport, TwiddleTuner}
};
use comms_if::sim::{SimCommand, SimEvent, TELEMETRY_EVENT};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Episode archive path, relative to the session archive root.
const EPISODE_ARCHIVE_PATH: &str = "drive_ctrl/episodes.jsonl";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
pub struct DriveCtrl {
    params: Params,

    /// Executing mode
    mode: DriveMode,

    controller: PidController,

    accumulator: EpisodeAccumulator,

    tuner: TwiddleTuner,

    /// File episode reports are appended to, if archiving
    archive_path: Option<PathBuf>,

    num_ticks: u64
}

/// The status report for one processed event.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// True if the event carried no telemetry and was answered with a manual acknowledgement
    pub manual: bool,

    /// The cross-track error of this tick
    pub cte: Option<f64>,

    /// Controller output before saturation
    pub raw_steer: f64,

    /// Steering demand sent to the simulator
    pub steer: f64,

    /// True if the steering demand was saturated
    pub steer_limited: bool,

    /// True if new gains were applied at the start of this tick
    pub gains_changed: bool,

    /// Number of ticks recorded in the current episode
    pub step_count: usize,

    /// True if this tick finished an episode
    pub episode_finished: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of DriveCtrl.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum DriveMode {
    /// Mid-episode, the controller is driving with fixed gains.
    Driving,

    /// An episode has just finished (or none has started yet). Pending gains are applied on the
    /// next telemetry tick.
    EpisodeBoundary
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// Create a new instance from the given parameters.
    pub fn new(params: Params) -> Result<Self, DriveCtrlError> {
        if let Some(e) = params.validate() {
            return Err(DriveCtrlError::InvalidParams(e))
        }

        Ok(Self::build(params))
    }

    fn build(params: Params) -> Self {
        Self {
            mode: DriveMode::EpisodeBoundary,
            controller: PidController::new(params.gains),
            accumulator: EpisodeAccumulator::new(params.episode_length),
            tuner: TwiddleTuner::new(params.gains, params.twiddle.clone()),
            archive_path: None,
            num_ticks: 0,
            params
        }
    }

    /// Stop tuning and drive with the best gains found so far.
    ///
    /// The gains are swapped in on the next telemetry tick.
    pub fn disable_tuning(&mut self) {
        if self.tuner.is_active() {
            info!("Gain tuning disabled");
            self.mode = DriveMode::EpisodeBoundary;
        }
        self.tuner.disable();
    }

    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    pub fn controller(&self) -> &PidController {
        &self.controller
    }

    pub fn accumulator(&self) -> &EpisodeAccumulator {
        &self.accumulator
    }

    pub fn tuner(&self) -> &TwiddleTuner {
        &self.tuner
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Process one telemetry tick.
    fn drive(
        &mut self,
        cte: f64,
        report: &mut StatusReport
    ) -> Vec<SimCommand> {

        // ---- EPISODE START ----

        if self.mode == DriveMode::EpisodeBoundary {
            if let Some(gains) = self.tuner.take_pending() {
                debug!(
                    "Starting episode with gains ({}, {}, {})",
                    gains.k_p, gains.k_i, gains.k_d
                );
                self.controller.init(gains);
                report.gains_changed = true;
            }
            self.mode = DriveMode::Driving;
        }

        // ---- CONTROL ----

        self.controller.update(cte);
        let raw_steer = self.controller.output();
        let steer = raw_steer.clamp(self.params.min_steer, self.params.max_steer);

        report.cte = Some(cte);
        report.raw_steer = raw_steer;
        report.steer = steer;
        report.steer_limited = steer != raw_steer;

        trace!("[{}] CTE: {:.4}, steer: {:.4}", self.num_ticks, cte, steer);

        let mut cmds = vec![SimCommand::Steer {
            steering_angle: steer,
            throttle: self.params.throttle
        }];

        // ---- SCORING ----

        self.accumulator.record(cte);
        report.step_count = self.accumulator.step_count();

        if self.accumulator.is_complete() {
            let mean_error = self.accumulator.mean_squared_error();
            self.accumulator.begin_episode();
            report.episode_finished = true;

            match self.tuner.step(mean_error) {
                Some(step) => {
                    info!(
                        "Episode {} finished: error {:.6}, {:?}, best error {:.6}",
                        step.episode, step.mean_error, step.verdict, step.best_error
                    );

                    if let Err(e) = self.archive_step(&step) {
                        warn!("Could not archive episode {}: {}", step.episode, e);
                    }

                    cmds.push(SimCommand::Reset);
                    self.mode = DriveMode::EpisodeBoundary;
                },
                None => debug!("Window mean squared error: {:.6}", mean_error)
            }
        }

        cmds
    }

    /// Append the step report to the episode archive, if archiving.
    fn archive_step(&self, step: &StepReport) -> Result<(), DriveCtrlError> {
        let path = match self.archive_path {
            Some(ref p) => p,
            None => return Ok(())
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(DriveCtrlError::ArchiveError)?;

        let line = serde_json::to_string(step)
            .map_err(DriveCtrlError::SerializationError)?;

        writeln!(file, "{}", line).map_err(DriveCtrlError::ArchiveError)
    }
}

impl Default for DriveCtrl {
    fn default() -> Self {
        Self::build(Params::default())
    }
}

impl State for DriveCtrl {
    type InitData = String;
    type InitError = DriveCtrlError;

    type InputData = SimEvent;
    type OutputData = Vec<SimCommand>;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = params::load(&init_data)
            .map_err(DriveCtrlError::ParamLoadError)?;

        *self = Self::new(params)?;

        if self.params.archive_episodes {
            let path = session.arch_root.join(EPISODE_ARCHIVE_PATH);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(DriveCtrlError::ArchiveError)?;
            }
            info!("Archiving tuning episodes to {:?}", path);
            self.archive_path = Some(path);
        }

        info!(
            "DriveCtrl initialised with gains ({}, {}, {}), tuning {}",
            self.params.gains.k_p, self.params.gains.k_i, self.params.gains.k_d,
            match self.tuner.is_active() {
                true => "enabled",
                false => "disabled"
            }
        );

        Ok(())
    }

    /// Process one event from the simulator.
    ///
    /// Events without telemetry are acknowledged with a manual command and don't touch the
    /// controller or tuner. If the telemetry can't be read the tick is skipped and an error
    /// returned, the caller should acknowledge the event and carry on.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let mut report = StatusReport::default();

        let payload = match input_data.payload {
            Some(ref p) if input_data.name == TELEMETRY_EVENT => p,
            _ => {
                report.manual = true;
                return Ok((vec![SimCommand::Manual], report))
            }
        };

        let telemetry = Telemetry::from_payload(payload)?;
        self.num_ticks += 1;

        let cmds = self.drive(telemetry.cte, &mut report);

        Ok((cmds, report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pid_ctrl::Gains;
    use serde_json::json;

    fn fixed_gain_params(gains: Gains) -> Params {
        let mut params = Params::default();
        params.gains = gains;
        params.twiddle.enabled = false;
        params
    }

    fn cte_event(cte: &str) -> SimEvent {
        SimEvent::telemetry(json!({
            "cte": cte,
            "speed": "30.0",
            "steering_angle": "0.0"
        }))
    }

    fn steer_of(cmd: &SimCommand) -> f64 {
        match *cmd {
            SimCommand::Steer { steering_angle, throttle } => {
                assert_eq!(throttle, 0.3);
                steering_angle
            },
            c => panic!("Expected a steer command, found {:?}", c)
        }
    }

    #[test]
    fn test_single_tick() {
        let mut dc = DriveCtrl::new(
            fixed_gain_params(Gains::new(0.133155, 0.0000583929, 1.23517))
        ).unwrap();

        let (cmds, report) = dc.proc(&cte_event("0.5")).unwrap();

        assert_eq!(cmds.len(), 1);
        let steer = steer_of(&cmds[0]);
        let expected = 0.133155 * 0.5 + 0.0000583929 * 0.5 + 1.23517 * 0.5;
        assert!((steer - expected).abs() < 1e-12);
        assert_eq!(steer, report.raw_steer);
        assert!(!report.steer_limited);
        assert!(!report.gains_changed);
        assert_eq!(report.cte, Some(0.5));
        assert_eq!(dc.mode(), DriveMode::Driving);
    }

    #[test]
    fn test_steer_saturation() {
        let mut dc = DriveCtrl::new(fixed_gain_params(Gains::new(10.0, 0.0, 0.0))).unwrap();

        let (cmds, report) = dc.proc(&cte_event("1.0")).unwrap();
        assert_eq!(steer_of(&cmds[0]), 1.0);
        assert_eq!(report.raw_steer, 10.0);
        assert!(report.steer_limited);

        let (cmds, _) = dc.proc(&cte_event("-0.5")).unwrap();
        assert_eq!(steer_of(&cmds[0]), -1.0);

        let (cmds, report) = dc.proc(&cte_event("0.05")).unwrap();
        assert!((steer_of(&cmds[0]) - 0.5).abs() < 1e-12);
        assert!(!report.steer_limited);
    }

    #[test]
    fn test_manual_events() {
        let mut dc = DriveCtrl::default();

        let events = [
            SimEvent::new("telemetry", None),
            SimEvent::new("", None),
            SimEvent::new("connect", Some(serde_json::Map::new()))
        ];

        for event in events.iter() {
            let (cmds, report) = dc.proc(event).unwrap();
            assert_eq!(cmds, vec![SimCommand::Manual]);
            assert!(report.manual);
        }

        // Controller, accumulator and tuner untouched
        assert_eq!(dc.controller().integral(), 0.0);
        assert_eq!(dc.accumulator().step_count(), 0);
        assert_eq!(dc.mode(), DriveMode::EpisodeBoundary);
        assert_eq!(dc.tuner().num_episodes(), 0);
    }

    #[test]
    fn test_invalid_cte_skips_tick() {
        let mut dc = DriveCtrl::new(fixed_gain_params(Gains::new(1.0, 1.0, 0.0))).unwrap();

        dc.proc(&cte_event("0.25")).unwrap();

        match dc.proc(&cte_event("not a number")) {
            Err(DriveCtrlError::TelemetryError(_)) => (),
            r => panic!("Expected a telemetry error, got {:?}", r.map(|(c, _)| c))
        }
        assert_eq!(dc.accumulator().step_count(), 1);
        assert_eq!(dc.controller().integral(), 0.25);

        // The session carries on
        let (cmds, _) = dc.proc(&cte_event("0.25")).unwrap();
        assert_eq!(steer_of(&cmds[0]), 0.75);
    }

    #[test]
    fn test_episode_boundary() {
        let mut params = Params::default();
        params.episode_length = 4;
        let initial = params.gains;
        let mut dc = DriveCtrl::new(params).unwrap();

        // First tick applies the first perturbation
        let (_, report) = dc.proc(&cte_event("0.1")).unwrap();
        assert!(report.gains_changed);
        assert!((dc.controller().gains().k_p - (initial.k_p + 0.01)).abs() < 1e-12);

        for _ in 0..2 {
            let (cmds, report) = dc.proc(&cte_event("0.1")).unwrap();
            assert_eq!(cmds.len(), 1);
            assert!(!report.gains_changed);
        }

        // Last tick of the episode steers and then resets
        let (cmds, report) = dc.proc(&cte_event("0.1")).unwrap();
        assert_eq!(cmds.len(), 2);
        steer_of(&cmds[0]);
        assert_eq!(cmds[1], SimCommand::Reset);
        assert!(report.episode_finished);
        assert_eq!(report.step_count, 4);
        assert_eq!(dc.mode(), DriveMode::EpisodeBoundary);
        assert_eq!(dc.tuner().num_episodes(), 1);
        assert!((dc.tuner().best_error() - 0.01).abs() < 1e-12);

        // Next episode starts with the next gain increased, and a fresh controller
        let (_, report) = dc.proc(&cte_event("0.2")).unwrap();
        assert!(report.gains_changed);
        assert_eq!(report.step_count, 1);
        assert_eq!(dc.controller().integral(), 0.2);
        let gains = dc.controller().gains();
        assert!((gains.k_i - (initial.k_i + 0.0001)).abs() < 1e-12);
        assert_eq!(dc.mode(), DriveMode::Driving);
    }

    #[test]
    fn test_no_reset_without_tuning() {
        let mut params = fixed_gain_params(Gains::new(0.1, 0.0, 1.0));
        params.episode_length = 3;
        let mut dc = DriveCtrl::new(params).unwrap();

        for n in 0..10 {
            let (cmds, report) = dc.proc(&cte_event("0.3")).unwrap();
            assert_eq!(cmds.len(), 1);
            assert_eq!(report.episode_finished, (n + 1) % 3 == 0);
            assert!(!report.gains_changed);
        }

        assert_eq!(dc.tuner().num_episodes(), 0);
        assert_eq!(*dc.controller().gains(), Gains::new(0.1, 0.0, 1.0));
    }

    #[test]
    fn test_disable_tuning() {
        let mut dc = DriveCtrl::default();
        dc.disable_tuning();

        // No episode finished, so the starting gains are used rather than the first probe
        dc.proc(&cte_event("0.1")).unwrap();
        assert_eq!(*dc.controller().gains(), Params::default().gains);
    }

    #[test]
    fn test_disable_tuning_mid_episode() {
        let mut params = Params::default();
        params.episode_length = 4;
        let mut dc = DriveCtrl::new(params).unwrap();

        for _ in 0..4 {
            dc.proc(&cte_event("0.1")).unwrap();
        }
        let best = dc.tuner().best_gains().unwrap();

        // Partway through the second episode, running with the next probe
        dc.proc(&cte_event("0.1")).unwrap();
        assert_ne!(*dc.controller().gains(), best);

        dc.disable_tuning();
        let (cmds, report) = dc.proc(&cte_event("0.1")).unwrap();
        assert!(report.gains_changed);
        assert_eq!(cmds.len(), 1);
        assert_eq!(*dc.controller().gains(), best);

        for _ in 0..20 {
            let (cmds, report) = dc.proc(&cte_event("0.1")).unwrap();
            assert_eq!(cmds.len(), 1);
            assert!(!report.gains_changed);
        }
        assert_eq!(*dc.controller().gains(), best);
    }

    #[test]
    fn test_archive_episodes() {
        let path = std::env::temp_dir().join(format!(
            "steer_exec_episodes_{}.jsonl", std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let mut params = Params::default();
        params.episode_length = 4;
        let mut dc = DriveCtrl::new(params).unwrap();
        dc.archive_path = Some(path.clone());

        // First episode improves on the initial infinite error, second is worse
        for _ in 0..4 {
            dc.proc(&cte_event("0.1")).unwrap();
        }
        for _ in 0..4 {
            dc.proc(&cte_event("0.5")).unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);

        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["episode"], 1);
        assert_eq!(lines[0]["verdict"], "Accepted");
        assert_eq!(lines[0]["converged"], false);
        assert_eq!(lines[1]["episode"], 2);
        assert_eq!(lines[1]["verdict"], "Reversed");
        assert_eq!(lines[1]["converged"], false);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = Params::default();
        params.episode_length = 1;
        assert!(matches!(DriveCtrl::new(params), Err(DriveCtrlError::InvalidParams(_))));

        let mut params = Params::default();
        params.min_steer = 1.0;
        assert!(matches!(DriveCtrl::new(params), Err(DriveCtrlError::InvalidParams(_))));

        let mut params = Params::default();
        params.gains.k_d = std::f64::INFINITY;
        assert!(matches!(DriveCtrl::new(params), Err(DriveCtrlError::InvalidParams(_))));

        let mut params = Params::default();
        params.max_steer = 2.0;
        assert!(matches!(DriveCtrl::new(params), Err(DriveCtrlError::InvalidParams(_))));

        let mut params = Params::default();
        params.min_steer = -1.5;
        assert!(matches!(DriveCtrl::new(params), Err(DriveCtrlError::InvalidParams(_))));

        let mut params = Params::default();
        params.twiddle.step_shrink = 1.5;
        assert!(matches!(DriveCtrl::new(params), Err(DriveCtrlError::InvalidParams(_))));
    }

    #[test]
    fn test_closed_loop_tuning() {
        use crate::vehicle_model::{ModelParams, VehicleModel};

        let mut params = Params::default();
        params.episode_length = 200;
        let mut dc = DriveCtrl::new(params).unwrap();
        let mut model = VehicleModel::new(ModelParams::default());

        let mut num_resets = 0;
        let mut first_error = None;

        while dc.tuner().num_episodes() < 30 {
            let (cmds, report) = dc.proc(&model.telemetry()).unwrap();

            for cmd in cmds.iter() {
                if *cmd == SimCommand::Reset {
                    num_resets += 1;
                    if first_error.is_none() {
                        first_error = Some(dc.tuner().best_error());
                    }
                }
                model.apply(cmd);
            }
            model.tick();

            assert!(report.cte.map_or(false, |c| c.abs() < 5.0), "Vehicle left the track");
        }

        assert_eq!(num_resets, 30);
        assert!(dc.tuner().best_error().is_finite());
        assert!(dc.tuner().best_error() <= first_error.unwrap());
    }

    #[test]
    fn test_params_from_toml() {
        let params: Params = util::params::from_str(r#"
            throttle = 0.3
            episode_length = 3200
            min_steer = -1.0
            max_steer = 1.0

            [gains]
            k_p = 0.133155
            k_i = 0.0000583929
            k_d = 1.23517
        "#).unwrap();

        assert_eq!(params.gains, Params::default().gains);
        assert!(params.twiddle.enabled);
        assert_eq!(params.twiddle.initial_step_sizes, [0.01, 0.0001, 0.1]);
        assert!(!params.archive_episodes);
        assert!(params.validate().is_none());
    }
}
