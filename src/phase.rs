//! Startup and arming gain scheduling
//!
//! Shortly after boot the filter runs a few seconds of aggressive tuning so
//! the accelerometer can pull the attitude and gyro bias to a useful state
//! quickly. Once the window passes, the steady-state tuning is loaded from
//! configuration. The selection is level-triggered and re-evaluated every
//! tick; an arming transition can re-open the fast window when configured.

use crate::lowpass::MIN_TAU;
use crate::types::{ArmedState, AttitudeSettings, FlightStatus};

/// Running time before the fast-convergence window opens, seconds.
const STARTUP_DELAY: f32 = 1.0;
/// Length of the fast-convergence window, seconds.
const CONVERGENCE_WINDOW: f32 = 6.0;

/// Fast-convergence tuning constants.
const CONVERGING_KP: f32 = 1.0;
const CONVERGING_KI: f32 = 0.9;
const CONVERGING_YAW_BIAS_RATE: f32 = 0.23;

/// Correction tuning active for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterGains {
    /// Proportional gain on the gravity error
    pub kp: f32,
    /// Integral gain feeding the roll/pitch bias
    pub ki: f32,
    /// Yaw-bias integrator rate
    pub yaw_bias_rate: f32,
    /// Whether accel/gravity smoothing is active
    pub accel_filter_enabled: bool,
}

impl FilterGains {
    /// Aggressive tuning used while converging; smoothing stays off so the
    /// accelerometer acts without lag.
    pub fn converging() -> Self {
        Self {
            kp: CONVERGING_KP,
            ki: CONVERGING_KI,
            yaw_bias_rate: CONVERGING_YAW_BIAS_RATE,
            accel_filter_enabled: false,
        }
    }

    /// Steady-state tuning from the configuration snapshot.
    pub fn tracking(settings: &AttitudeSettings) -> Self {
        Self {
            kp: settings.accel_kp,
            ki: settings.accel_ki,
            yaw_bias_rate: settings.yaw_bias_rate,
            accel_filter_enabled: settings.accel_tau >= MIN_TAU,
        }
    }
}

/// Estimator phase reported for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Converging,
    Tracking,
}

/// Selects the gain set for each tick from elapsed run time and arming state.
#[derive(Debug, Clone, Copy)]
pub struct PhaseController {
    elapsed: f32,
    phase: Phase,
    tracking_loaded: bool,
    active: FilterGains,
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            phase: Phase::Tracking,
            tracking_loaded: false,
            active: FilterGains::converging(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Force a gain reload from settings at the next tracking tick.
    pub fn invalidate(&mut self) {
        self.tracking_loaded = false;
    }

    /// Advance run time and return the gain set for this tick.
    pub fn tick(
        &mut self,
        dt: f32,
        flight: &FlightStatus,
        settings: &AttitudeSettings,
    ) -> FilterGains {
        self.elapsed += dt;

        let in_window = self.elapsed > STARTUP_DELAY
            && self.elapsed < STARTUP_DELAY + CONVERGENCE_WINDOW;
        let arming_zero =
            settings.zero_during_arming && flight.armed == ArmedState::Arming;

        if in_window || arming_zero {
            if self.phase != Phase::Converging {
                log::debug!("attitude gains: converging");
            }
            self.phase = Phase::Converging;
            self.tracking_loaded = false;
            self.active = FilterGains::converging();
        } else if !self.tracking_loaded {
            log::debug!("attitude gains: tracking (kp={})", settings.accel_kp);
            self.phase = Phase::Tracking;
            self.tracking_loaded = true;
            self.active = FilterGains::tracking(settings);
        }

        self.active
    }
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}
