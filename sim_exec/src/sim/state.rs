//! Implementations for the Simulation state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{SimError, SimParams, TuningCmd};
use crate::{
    track::Track,
    vehicle::{self, Vehicle, VehicleTelemetry}
};
use util::{
    module::State,
    archive::{Archived, Archiver, ArchiveError},
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation state
pub struct Simulation {
    params: SimParams,

    track: Track,

    vehicles: Vec<Vehicle>,

    /// Number of ticks processed since the start of the run
    num_ticks: u64,

    report: StatusReport,

    /// Telemetry of each vehicle from the last tick
    output: Vec<VehicleTelemetry>,
    arch_output: Vec<Archiver>
}

/// Status report for Simulation processing.
#[derive(Clone, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Report from each vehicle, in vehicle order
    pub vehicles: Vec<vehicle::StatusReport>,

    /// Number of tuning commands applied on this tick
    pub num_cmds_applied: usize,

    /// Number of tuning commands rejected on this tick
    pub num_cmds_rejected: usize
}

/// Summary of a run, saved at the end of an execution.
#[derive(Clone, Serialize, Debug)]
pub struct RunSummary {
    pub num_ticks: u64,
    pub sim_time_s: f64,
    pub vehicles: Vec<VehicleSummary>
}

#[derive(Clone, Serialize, Debug)]
pub struct VehicleSummary {
    pub name: String,
    pub final_x: f64,
    pub final_y: f64,
    pub final_heading_rad: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub mean_abs_error: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Simulation {
    /// Create a new simulation without any archiving.
    pub fn new(params: SimParams) -> Result<Self, SimError> {
        if params.vehicles.is_empty() {
            return Err(SimError::NoVehicles)
        }

        let track = Track::from_params(&params.track)?;

        let mut vehicles = Vec::with_capacity(params.vehicles.len());
        for (i, vp) in params.vehicles.iter().enumerate() {
            vehicles.push(
                Vehicle::new(vp.clone(), params.tick_period_s)
                    .map_err(|e| SimError::VehicleError(i, e))?
            );
        }

        let mut arch_output = Vec::with_capacity(vehicles.len());
        arch_output.resize_with(vehicles.len(), Archiver::default);

        Ok(Self {
            params,
            track,
            vehicles,
            num_ticks: 0,
            report: StatusReport::default(),
            output: Vec::new(),
            arch_output
        })
    }

    /// Return every vehicle to its start pose.
    ///
    /// The tick counter is not reset, simulated time keeps running.
    pub fn reset(&mut self) {
        for v in self.vehicles.iter_mut() {
            v.reset();
        }
        self.output.clear();

        info!("Simulation reset at {:.2} s", self.sim_time_s());
    }

    /// Build a summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            num_ticks: self.num_ticks,
            sim_time_s: self.sim_time_s(),
            vehicles: self.vehicles.iter().map(|v| {
                let hist = v.pid().error_history();
                let mean_abs_error = match hist.len() {
                    0 => 0.0,
                    n => hist.iter().map(|e| e.abs()).sum::<f64>() / n as f64
                };
                let g = v.pid().gains();

                VehicleSummary {
                    name: v.name().to_string(),
                    final_x: v.position()[0],
                    final_y: v.position()[1],
                    final_heading_rad: v.heading(),
                    kp: g.kp,
                    ki: g.ki,
                    kd: g.kd,
                    mean_abs_error
                }
            }).collect()
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicles_mut(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    /// Simulated time since the start of the run.
    pub fn sim_time_s(&self) -> f64 {
        util::time::ticks_to_seconds(self.num_ticks, self.params.tick_period_s)
    }

    pub fn status_report(&self) -> &StatusReport {
        &self.report
    }
}

impl State for Simulation {
    type InitData = SimParams;
    type InitError = SimError;

    type InputData = Vec<TuningCmd>;
    type OutputData = Vec<VehicleTelemetry>;
    type StatusReport = StatusReport;
    type ProcError = SimError;

    /// Initialise the simulation, archiving each vehicle's telemetry into the
    /// session.
    fn init(init_data: Self::InitData, session: &Session) 
        -> Result<Self, Self::InitError> 
    {
        let mut sim = Self::new(init_data)?;

        for (i, (v, arch)) in sim.vehicles.iter()
            .zip(sim.arch_output.iter_mut())
            .enumerate() 
        {
            *arch = Archiver::from_path(
                session, 
                format!("sim/vehicle_{}_{}.csv", i, v.name().replace(' ', "_"))
            )?;
        }

        info!(
            "Simulation initialised with {} vehicle(s) on a {:.1} long track", 
            sim.vehicles.len(),
            sim.track.length()
        );

        Ok(sim)
    }

    /// Perform one tick of the simulation.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> 
    {
        self.report = StatusReport::default();

        // Gains only change between ticks
        for cmd in input_data.iter() {
            match cmd.apply(&mut self.vehicles) {
                Ok(()) => self.report.num_cmds_applied += 1,
                Err(e) => {
                    warn!("Tuning command rejected: {}", e);
                    self.report.num_cmds_rejected += 1;
                }
            }
        }

        for (i, v) in self.vehicles.iter_mut().enumerate() {
            let r = v.update(&self.track)
                .map_err(|e| SimError::VehicleError(i, e))?;
            self.report.vehicles.push(r);
        }

        self.num_ticks += 1;

        let sim_time_s = self.sim_time_s();
        self.output = self.vehicles.iter()
            .map(|v| v.telemetry(self.num_ticks, sim_time_s))
            .collect();

        trace!("Tick {} complete at {:.3} s", self.num_ticks, sim_time_s);

        Ok((self.output.clone(), self.report.clone()))
    }
}

impl Archived for Simulation {
    fn write(&mut self) -> Result<(), ArchiveError> {
        for (t, arch) in self.output.iter().zip(self.arch_output.iter_mut()) {
            arch.serialise(t)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pid::Gain;

    fn default_params() -> SimParams {
        util::params::parse(include_str!("../../../params/sim.toml")).unwrap()
    }

    #[test]
    fn test_default_params() {
        let p = default_params();

        assert!((p.tick_period_s - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(p.vehicles.len(), 2);
        assert_eq!(p.vehicles[0].pid.kp, 2.0);
        assert_eq!(p.vehicles[1].pid.kd, 0.5);
        assert_eq!(p.vehicles[0].sensors.weights, [-2.0, -1.0, 0.0, 1.0, 2.0]);

        let sim = Simulation::new(p).unwrap();
        assert_eq!(sim.track().get_points().len(), 9);
    }

    #[test]
    fn test_default_run_follows_track() {
        let mut sim = Simulation::new(default_params()).unwrap();

        // 7 seconds gets both vehicles through the lane change and back
        for _ in 0..420 {
            let (out, report) = sim.proc(&vec![]).unwrap();
            assert_eq!(out.len(), 2);

            for (v, r) in sim.vehicles().iter().zip(report.vehicles.iter()) {
                assert!(!r.line_lost);
                let dev = sim.track().distance_to(&v.position());
                assert!(dev < 10.0, "{} is {} off the track", v.name(), dev);
            }
        }

        assert_eq!(sim.num_ticks(), 420);
        assert!((sim.sim_time_s() - 7.0).abs() < 1e-9);
        for v in sim.vehicles() {
            assert!(v.position()[0] > 800.0);
        }
    }

    #[test]
    fn test_tuning_cmds() {
        let mut sim = Simulation::new(default_params()).unwrap();

        let cmds = vec![
            TuningCmd::AdjustGain { vehicle: 0, gain: Gain::Kp, delta: 0.5 },
            TuningCmd::AdjustGain { vehicle: 1, gain: Gain::Ki, delta: -1.0 },
            TuningCmd::AdjustGain { vehicle: 2, gain: Gain::Kd, delta: 0.1 }
        ];
        let (_, report) = sim.proc(&cmds).unwrap();

        assert_eq!(report.num_cmds_applied, 2);
        assert_eq!(report.num_cmds_rejected, 1);
        assert_eq!(sim.vehicles()[0].pid().kp, 2.5);
        assert_eq!(sim.vehicles()[1].pid().ki, 0.0);

        let err = TuningCmd::AdjustGain { vehicle: 2, gain: Gain::Kd, delta: 0.1 }
            .apply(sim.vehicles_mut())
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidVehicleIndex(2, 2)));
    }

    #[test]
    fn test_reset_cmd() {
        let mut sim = Simulation::new(default_params()).unwrap();

        for _ in 0..30 {
            sim.proc(&vec![]).unwrap();
        }
        sim.proc(&vec![TuningCmd::Reset]).unwrap();

        // Reset is applied before the vehicles move, so each is one tick from
        // its start
        for (v, p) in sim.vehicles().iter().zip(sim.params().vehicles.iter()) {
            assert_eq!(v.trajectory().len(), 1);
            assert_eq!(v.pid().error_history().len(), 1);
            let start = nalgebra::Vector2::new(p.start_position[0], p.start_position[1]);
            assert!(((v.position() - start).norm() - p.speed / 60.0).abs() < 1e-9);
        }
        assert_eq!(sim.num_ticks(), 31);

        sim.reset();
        for (v, p) in sim.vehicles().iter().zip(sim.params().vehicles.iter()) {
            assert_eq!(v.position()[0], p.start_position[0]);
            assert!(v.trajectory().is_empty());
        }
    }

    #[test]
    fn test_no_vehicles() {
        let mut p = default_params();
        p.vehicles.clear();
        assert!(matches!(Simulation::new(p), Err(SimError::NoVehicles)));
    }

    #[test]
    fn test_summary_and_archive_without_session() {
        let mut sim = Simulation::new(default_params()).unwrap();
        for _ in 0..10 {
            sim.proc(&vec![]).unwrap();
        }

        // Archivers are disabled without a session
        assert!(sim.write().is_ok());

        let s = sim.summary();
        assert_eq!(s.num_ticks, 10);
        assert_eq!(s.vehicles.len(), 2);
        assert_eq!(s.vehicles[0].name, sim.vehicles()[0].name());
    }
}
