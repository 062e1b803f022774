//! The simulated control loop.

use crate::behavior::plan;
use crate::world::{BlockSurvey, OreIndex, SimWorld, SurveyCounts, TICK};
use clef_core::ManualClock;
use clef_execution::{ClefConfig, Runtime, TickReport};
use clef_tracker::TrackerManager;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    pub ticks: u64,
    pub finished: bool,
    pub stored: usize,
    pub blacklisted: usize,
    pub faults: usize,
}

/// The miner and its world.
pub struct Simulation {
    runtime: Runtime<SimWorld>,
    world: SimWorld,
    survey: Option<SurveyCounts>,
    faults: usize,
}

impl Simulation {
    /// Set up the demo scenario.
    pub fn new(config: ClefConfig) -> Self {
        let world = SimWorld::scenario(ManualClock::new(), config.blacklist.clone());
        let mut trackers = TrackerManager::new();
        trackers.register("ore index", OreIndex::default());
        trackers.register_progressive("block survey", BlockSurvey::default());
        Self {
            runtime: Runtime::new(config, trackers),
            world,
            survey: None,
            faults: 0,
        }
    }

    /// Run one tick and advance simulated time.
    pub fn step(&mut self) -> TickReport {
        let candidates = plan(&self.world, &self.runtime.config().movement);
        let report = self.runtime.step(&mut self.world, candidates);
        if let Some(fault) = &report.fault {
            self.faults += 1;
            if fault.is_invariant() {
                warn!(tick = report.tick, %fault, "executor fault");
            }
        }
        self.observe_survey();
        self.world.clock.advance(TICK);
        report
    }

    fn observe_survey(&mut self) {
        let counts = self
            .runtime
            .trackers()
            .get_progressive::<BlockSurvey>()
            .and_then(|survey| survey.read(&self.world, |counts| *counts));
        if let Some(counts) = counts.filter(|counts| self.survey != Some(*counts)) {
            info!(ores = counts.ores, stone = counts.stone, "survey updated");
            self.survey = Some(counts);
        }
    }

    /// Nothing left to do and nothing running.
    pub fn is_done(&self) -> bool {
        self.world.is_done() && !self.runtime.executor().is_active()
    }

    /// Stop whatever is running.
    pub fn shutdown(&mut self) {
        self.runtime.shutdown(&mut self.world);
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn runtime(&self) -> &Runtime<SimWorld> {
        &self.runtime
    }

    pub fn summary(&self) -> SimSummary {
        let blacklisted = self
            .world
            .blocks
            .keys()
            .filter(|pos| self.world.blacklist.unreachable(pos))
            .count();
        SimSummary {
            ticks: self.runtime.executor().ticks(),
            finished: self.is_done(),
            stored: self.world.stored.len(),
            blacklisted,
            faults: self.faults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clef_core::BlockPos;

    fn run_to_end(sim: &mut Simulation, limit: u64) {
        for _ in 0..limit {
            if sim.is_done() {
                return;
            }
            sim.step();
        }
    }

    #[test]
    fn test_scenario_completes() {
        let mut sim = Simulation::new(ClefConfig::default());
        run_to_end(&mut sim, 2_000);

        assert!(sim.is_done());
        let summary = sim.summary();
        assert_eq!(summary.stored, 3);
        assert_eq!(summary.blacklisted, 1);
        assert!(summary.ticks < 2_000);

        // The hard ore was retried until the allowance ran out.
        let hard = BlockPos::new(1, 0, 3);
        assert!(sim.world().blacklist.unreachable(&hard));
        assert_eq!(sim.world().blacklist.failure_count(&hard), 4);
        assert!(sim.world().digging.is_none());
    }

    #[test]
    fn test_wall_is_dug_through() {
        let mut sim = Simulation::new(ClefConfig::default());
        run_to_end(&mut sim, 2_000);

        let wall_left = (-2..=2)
            .filter(|z| sim.world().is_solid(&BlockPos::new(6, 0, *z)))
            .count();
        assert!(wall_left < 5);
    }

    #[test]
    fn test_shutdown_mid_run() {
        let mut sim = Simulation::new(ClefConfig::default());
        for _ in 0..30 {
            sim.step();
        }
        assert!(sim.runtime().executor().is_active());

        sim.shutdown();
        assert!(!sim.runtime().executor().is_active());
        assert!(sim.world().digging.is_none());
    }
}
