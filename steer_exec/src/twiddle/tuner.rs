//! The gain tuner

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Serialize;

use super::{transition, Params, TuneState, Verdict};
use crate::pid_ctrl::{Gains, NUM_GAINS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tunes the controller gains across episodes.
///
/// The tuner holds the gains to use in the next episode until the session takes them with
/// [`TwiddleTuner::take_pending`] at the start of that episode. After each episode the session
/// reports the error with [`TwiddleTuner::step`].
#[derive(Debug, Clone)]
pub struct TwiddleTuner {
    params: Params,

    state: TuneState,

    /// False once tuning has converged, or if it was disabled.
    active: bool,

    /// Lowest episode error seen so far.
    best_error: f64,

    /// The gains which produced `best_error`.
    best_gains: Option<Gains>,

    /// Gains tuning started from.
    initial_gains: Gains,

    /// Gains being evaluated in the current episode.
    trial_gains: Gains,

    /// Gains to apply at the start of the next episode.
    pending: Option<Gains>,

    num_episodes: u64
}

/// Summary of one tuning step, archived by the session.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Number of the episode just scored, starting at 1.
    pub episode: u64,

    pub mean_error: f64,

    pub verdict: Verdict,

    /// Gains used during the episode.
    pub evaluated_gains: Gains,

    /// Gains that will be used for the next episode.
    pub next_gains: Gains,

    /// Index of the gain probed next.
    pub param_index: usize,

    pub step_sizes: [f64; NUM_GAINS],

    pub best_error: f64,

    pub best_gains: Option<Gains>,

    /// True if this step finished tuning.
    pub converged: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TwiddleTuner {
    /// Create a new tuner starting from the given gains.
    ///
    /// If tuning is enabled the first pending gains are `initial` with the first gain increased.
    pub fn new(initial: Gains, params: Params) -> Self {
        let state = TuneState::new(params.initial_step_sizes);
        let active = params.enabled && state.step_sum() >= params.tolerance;
        let pending = match active {
            true => Some(state.perturb(&initial)),
            false => None
        };

        Self {
            params,
            state,
            active,
            best_error: std::f64::INFINITY,
            best_gains: None,
            initial_gains: initial,
            trial_gains: initial,
            pending,
            num_episodes: 0
        }
    }

    /// Returns true while tuning is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop tuning.
    ///
    /// The best gains found so far become pending, or the starting gains if no episode has been
    /// scored yet.
    pub fn disable(&mut self) {
        if self.active {
            self.active = false;
            self.pending = Some(self.best_gains.unwrap_or(self.initial_gains));
        }
    }

    /// Take the gains to use for the episode which is starting, if they have changed.
    pub fn take_pending(&mut self) -> Option<Gains> {
        let gains = self.pending.take()?;
        self.trial_gains = gains;
        Some(gains)
    }

    /// Score the episode which just finished and choose the gains for the next one.
    ///
    /// Returns `None` if tuning is not active.
    pub fn step(&mut self, mean_error: f64) -> Option<StepReport> {
        if !self.active {
            return None
        }

        self.num_episodes += 1;

        let t = transition(
            &self.state,
            &self.trial_gains,
            mean_error,
            self.best_error,
            &self.params
        );

        if t.verdict == Verdict::Accepted {
            self.best_error = mean_error;
            self.best_gains = Some(self.trial_gains);
        }
        self.state = t.state;

        let converged = self.state.step_sum() < self.params.tolerance;
        let next_gains = match converged {
            true => self.best_gains.unwrap_or(self.trial_gains),
            false => t.gains
        };
        self.pending = Some(next_gains);
        self.active = !converged;

        if t.verdict == Verdict::Accepted {
            info!(
                "Best gains: ({}, {}, {}), best error: {}",
                self.trial_gains.k_p, self.trial_gains.k_i, self.trial_gains.k_d,
                self.best_error
            );
        }
        if converged {
            info!(
                "Tuning converged after {} episodes, final gains: ({}, {}, {})",
                self.num_episodes, next_gains.k_p, next_gains.k_i, next_gains.k_d
            );
        }

        Some(StepReport {
            episode: self.num_episodes,
            mean_error,
            verdict: t.verdict,
            evaluated_gains: self.trial_gains,
            next_gains,
            param_index: self.state.param_index,
            step_sizes: self.state.step_sizes,
            best_error: self.best_error,
            best_gains: self.best_gains,
            converged
        })
    }

    pub fn state(&self) -> &TuneState {
        &self.state
    }

    pub fn best_error(&self) -> f64 {
        self.best_error
    }

    pub fn best_gains(&self) -> Option<Gains> {
        self.best_gains
    }

    pub fn num_episodes(&self) -> u64 {
        self.num_episodes
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// A bowl with its minimum at (0.2, 0.0, 3.0).
    fn bowl(g: &Gains) -> f64 {
        (g.k_p - 0.2).powi(2) + 100.0 * g.k_i.powi(2) + 0.1 * (g.k_d - 3.0).powi(2) + 0.5
    }

    fn run_to_convergence<F: Fn(&Gains) -> f64>(tuner: &mut TwiddleTuner, cost: F) -> u64 {
        let mut gains = Gains::new(0.0, 0.0, 0.0);

        while tuner.is_active() {
            if let Some(g) = tuner.take_pending() {
                gains = g;
            }
            tuner.step(cost(&gains));

            assert!(tuner.num_episodes() < 100_000, "Tuning did not converge");
        }

        tuner.num_episodes()
    }

    #[test]
    fn test_first_pending_is_perturbed() {
        let initial = Gains::new(0.1, 0.0, 1.0);
        let mut tuner = TwiddleTuner::new(initial, Params::default());

        assert!(tuner.is_active());
        let g = tuner.take_pending().unwrap();
        assert!((g.k_p - 0.11).abs() < 1e-12);
        assert_eq!(g.k_i, 0.0);
        assert_eq!(g.k_d, 1.0);

        // Taken only once
        assert!(tuner.take_pending().is_none());
    }

    #[test]
    fn test_first_episode_accepted() {
        let mut tuner = TwiddleTuner::new(Gains::new(0.1, 0.0, 1.0), Params::default());
        tuner.take_pending();

        let report = tuner.step(1e9).unwrap();
        assert_eq!(report.verdict, Verdict::Accepted);
        assert_eq!(report.episode, 1);
        assert_eq!(tuner.best_error(), 1e9);
        assert_eq!(tuner.best_gains(), Some(report.evaluated_gains));
    }

    #[test]
    fn test_disabled() {
        let params = Params {
            enabled: false,
            ..Default::default()
        };
        let mut tuner = TwiddleTuner::new(Gains::new(0.1, 0.0, 1.0), params);

        assert!(!tuner.is_active());
        assert!(tuner.take_pending().is_none());
        assert!(tuner.step(1.0).is_none());
    }

    #[test]
    fn test_converges_on_bowl() {
        let params = Params::default();
        let tolerance = params.tolerance;
        let initial = Gains::new(0.133155, 0.0000583929, 1.23517);
        let start_cost = bowl(&initial);
        let mut tuner = TwiddleTuner::new(initial, params);

        run_to_convergence(&mut tuner, bowl);

        assert!(tuner.state().step_sum() < tolerance);
        assert!(tuner.best_error() < start_cost);

        // Final pending gains are the best found
        let best = tuner.best_gains().unwrap();
        assert_eq!(tuner.take_pending(), Some(best));
        assert!((best.k_p - 0.2).abs() < 0.05);
        assert!((best.k_d - 3.0).abs() < 0.5);
    }

    #[test]
    fn test_converges_on_flat_cost() {
        let mut tuner = TwiddleTuner::new(Gains::new(0.1, 0.0, 1.0), Params::default());

        // Only the first episode improves, every probe afterwards fails and shrinks its step
        run_to_convergence(&mut tuner, |_| 1.0);

        let best = tuner.best_gains().unwrap();
        assert!((best.k_p - 0.11).abs() < 1e-12);
        assert_eq!(tuner.best_error(), 1.0);
        assert!(!tuner.is_active());
    }

    #[test]
    fn test_disable_returns_to_best() {
        let mut tuner = TwiddleTuner::new(Gains::new(0.1, 0.0, 1.0), Params::default());
        tuner.take_pending();
        tuner.step(1.0);
        tuner.take_pending();
        tuner.step(2.0);

        tuner.disable();
        assert!(!tuner.is_active());
        let best = tuner.take_pending().unwrap();
        assert!((best.k_p - 0.11).abs() < 1e-12);
        assert_eq!(best.k_i, 0.0);

        // Nothing more to apply once disabled
        tuner.disable();
        assert!(tuner.take_pending().is_none());
    }

    #[test]
    fn test_disable_before_first_episode() {
        let initial = Gains::new(0.1, 0.0, 1.0);
        let mut tuner = TwiddleTuner::new(initial, Params::default());
        let probe = tuner.take_pending().unwrap();
        assert_ne!(probe, initial);

        tuner.disable();
        assert_eq!(tuner.take_pending(), Some(initial));
        assert!(tuner.step(1.0).is_none());
    }
}
