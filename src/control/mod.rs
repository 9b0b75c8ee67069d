use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::announce::Announcer;
use crate::app::config::{AppConfig, DensityThresholds};
use crate::camera::FrameSource;
use crate::pipeline::{classify, count_vehicles, plan, Density, GreenTimes, SignalPlan, VehicleDetector};

pub type CycleResult = Vec<Density>;

/// One lane's reading within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneObservation {
    pub lane: usize,
    pub vehicle_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Observing { lane: usize },
    Planning,
    Executing,
    Stopped,
}

/// Everything the controller needs out of `AppConfig`.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub lanes: usize,
    pub dwell: Duration,
    pub thresholds: DensityThresholds,
    pub green_times: GreenTimes,
    pub vehicle_classes: Vec<String>,
    pub fallback_density: Density,
    pub time_scale: f64,
}

impl CycleSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            lanes: config.lanes,
            dwell: Duration::from_millis(config.dwell_ms),
            thresholds: config.thresholds.clone(),
            green_times: config.signal.green_times.clone(),
            vehicle_classes: config.detector.vehicle_classes.clone(),
            fallback_density: config.fallback_density,
            time_scale: config.signal.time_scale,
        }
    }
}

/// Drives the whole intersection: per cycle, observe every lane in order,
/// plan green times from the densities, then hold each lane green in turn.
/// A lane whose frame or detection fails contributes the fallback density,
/// so the plan stays index-aligned with the lanes no matter what.
pub struct CycleController<S, D, A> {
    source: S,
    detector: D,
    announcer: A,
    settings: CycleSettings,
    cycle: u64,
    phase: CyclePhase,
}

impl<S, D, A> CycleController<S, D, A>
where
    S: FrameSource,
    D: VehicleDetector,
    A: Announcer,
{
    pub fn new(settings: CycleSettings, source: S, detector: D, announcer: A) -> Self {
        Self {
            source,
            detector,
            announcer,
            settings,
            cycle: 0,
            phase: CyclePhase::Idle,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Loops until `stop` is cancelled. The token is polled once per full
    /// cycle, so a cycle in progress always runs to completion. Only a
    /// configuration error ends the loop early.
    pub async fn run(&mut self, stop: CancellationToken) -> crate::Result<()> {
        tracing::info!(lanes = self.settings.lanes, "starting signal cycle loop");
        loop {
            self.run_cycle().await?;
            if stop.is_cancelled() {
                tracing::info!(cycle = self.cycle, "stop requested, ending cycle loop");
                self.phase = CyclePhase::Stopped;
                return Ok(());
            }
            self.phase = CyclePhase::Idle;
        }
    }

    pub async fn run_cycle(&mut self) -> crate::Result<SignalPlan> {
        self.cycle += 1;
        let mut densities = CycleResult::with_capacity(self.settings.lanes);

        for lane in 0..self.settings.lanes {
            self.phase = CyclePhase::Observing { lane };
            match self.observe(lane) {
                Ok(observation) => {
                    let density = classify(observation.vehicle_count, &self.settings.thresholds);
                    tracing::info!(
                        cycle = self.cycle,
                        lane,
                        vehicles = observation.vehicle_count,
                        %density,
                        "lane observed"
                    );
                    self.announcer.lane_observed(
                        self.cycle,
                        lane,
                        observation.vehicle_count,
                        density,
                    );
                    densities.push(density);
                    self.pause(self.settings.dwell).await;
                }
                Err(err) => {
                    let fallback = self.settings.fallback_density;
                    tracing::warn!(
                        cycle = self.cycle,
                        lane,
                        %err,
                        %fallback,
                        "lane observation failed, holding fallback density"
                    );
                    self.announcer.lane_skipped(self.cycle, lane, &err, fallback);
                    densities.push(fallback);
                }
            }
        }

        self.phase = CyclePhase::Planning;
        let plan = plan(&densities, &self.settings.green_times)?;
        self.announcer.plan_ready(self.cycle, &plan);

        self.phase = CyclePhase::Executing;
        for (lane, &green_secs) in plan.iter().enumerate() {
            tracing::info!(cycle = self.cycle, lane, green_secs, "lane green");
            self.announcer.lane_green(self.cycle, lane, green_secs);
            self.pause(Duration::from_secs(green_secs)).await;
        }

        Ok(plan)
    }

    fn observe(&mut self, lane: usize) -> crate::Result<LaneObservation> {
        let frame = self.source.next_frame()?;
        let detections = self.detector.detect(&frame)?;
        let vehicle_count = count_vehicles(&detections, &self.settings.vehicle_classes);
        Ok(LaneObservation {
            lane,
            vehicle_count,
        })
    }

    async fn pause(&self, base: Duration) {
        tokio::time::sleep(base.mul_f64(self.settings.time_scale)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::camera::Frame;
    use crate::pipeline::{default_green_times, Detection, Detections};
    use crate::Error;

    fn test_frame() -> Frame {
        Frame::new(vec![0x80; 4 * 4 * 3], 4, 4)
    }

    fn cars(n: u32) -> Detections {
        (0..n)
            .map(|i| Detection {
                xmin: i as i32,
                ymin: 0,
                xmax: i as i32 + 1,
                ymax: 1,
                score: 0.9,
                class: "car".to_string(),
            })
            .collect()
    }

    struct ScriptedCamera {
        frames: VecDeque<crate::Result<Frame>>,
    }

    impl ScriptedCamera {
        fn ok(lanes: usize) -> Self {
            Self {
                frames: (0..lanes).map(|_| Ok(test_frame())).collect(),
            }
        }
    }

    impl FrameSource for ScriptedCamera {
        fn next_frame(&mut self) -> crate::Result<Frame> {
            self.frames.pop_front().expect("camera script exhausted")
        }
    }

    struct ScriptedDetector {
        results: VecDeque<crate::Result<Detections>>,
    }

    impl ScriptedDetector {
        fn counts(counts: &[u32]) -> Self {
            Self {
                results: counts.iter().map(|&n| Ok(cars(n))).collect(),
            }
        }
    }

    impl VehicleDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &Frame) -> crate::Result<Detections> {
            self.results.pop_front().expect("detector script exhausted")
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Observed { lane: usize, vehicles: u32, density: Density },
        Skipped { lane: usize, fallback: Density },
        Planned(Vec<u64>),
        Green { lane: usize, secs: u64 },
    }

    #[derive(Clone)]
    struct RecordingAnnouncer {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl RecordingAnnouncer {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Announcer for RecordingAnnouncer {
        fn lane_observed(&mut self, _cycle: u64, lane: usize, vehicles: u32, density: Density) {
            self.events.lock().unwrap().push(Event::Observed {
                lane,
                vehicles,
                density,
            });
        }
        fn lane_skipped(&mut self, _cycle: u64, lane: usize, _error: &Error, fallback: Density) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Skipped { lane, fallback });
        }
        fn plan_ready(&mut self, _cycle: u64, plan: &SignalPlan) {
            self.events.lock().unwrap().push(Event::Planned(plan.clone()));
        }
        fn lane_green(&mut self, _cycle: u64, lane: usize, green_secs: u64) {
            self.events.lock().unwrap().push(Event::Green {
                lane,
                secs: green_secs,
            });
        }
    }

    fn settings() -> CycleSettings {
        CycleSettings {
            lanes: 4,
            dwell: Duration::from_secs(2),
            thresholds: DensityThresholds {
                medium: 5,
                high: 15,
            },
            green_times: default_green_times(),
            vehicle_classes: vec![
                "car".to_string(),
                "motorcycle".to_string(),
                "bus".to_string(),
                "truck".to_string(),
            ],
            fallback_density: Density::Low,
            time_scale: 1.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_cycle_plans_and_executes_in_lane_order() {
        let announcer = RecordingAnnouncer::new();
        let mut controller = CycleController::new(
            settings(),
            ScriptedCamera::ok(4),
            ScriptedDetector::counts(&[2, 8, 20, 4]),
            announcer.clone(),
        );

        let plan = controller.run_cycle().await.unwrap();
        assert_eq!(plan, vec![30, 45, 60, 30]);

        let expected = vec![
            Event::Observed { lane: 0, vehicles: 2, density: Density::Low },
            Event::Observed { lane: 1, vehicles: 8, density: Density::Medium },
            Event::Observed { lane: 2, vehicles: 20, density: Density::High },
            Event::Observed { lane: 3, vehicles: 4, density: Density::Low },
            Event::Planned(vec![30, 45, 60, 30]),
            Event::Green { lane: 0, secs: 30 },
            Event::Green { lane: 1, secs: 45 },
            Event::Green { lane: 2, secs: 60 },
            Event::Green { lane: 3, secs: 30 },
        ];
        assert_eq!(announcer.events(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_acquisition_holds_the_fallback_density() {
        let announcer = RecordingAnnouncer::new();
        let camera = ScriptedCamera {
            frames: VecDeque::from([
                Ok(test_frame()),
                Ok(test_frame()),
                Err(Error::Acquisition("no frame".to_string())),
                Ok(test_frame()),
            ]),
        };
        // only three detector calls: lane 2 never gets a frame
        let mut controller = CycleController::new(
            settings(),
            camera,
            ScriptedDetector::counts(&[2, 8, 4]),
            announcer.clone(),
        );

        let plan = controller.run_cycle().await.unwrap();
        assert_eq!(plan, vec![30, 45, 30, 30]);
        assert_eq!(
            announcer.events()[2],
            Event::Skipped {
                lane: 2,
                fallback: Density::Low
            }
        );
        assert_eq!(announcer.events().iter().filter(|e| matches!(e, Event::Green { .. })).count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn detector_failure_takes_the_same_path_as_acquisition_failure() {
        let announcer = RecordingAnnouncer::new();
        let detector = ScriptedDetector {
            results: VecDeque::from([
                Ok(cars(2)),
                Err(Error::Detector("inference failed".to_string())),
                Ok(cars(20)),
                Ok(cars(4)),
            ]),
        };
        let mut controller =
            CycleController::new(settings(), ScriptedCamera::ok(4), detector, announcer.clone());

        let plan = controller.run_cycle().await.unwrap();
        assert_eq!(plan, vec![30, 30, 60, 30]);
        assert_eq!(
            announcer.events()[1],
            Event::Skipped {
                lane: 1,
                fallback: Density::Low
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_takes_effect_only_between_cycles() {
        let announcer = RecordingAnnouncer::new();
        let mut controller = CycleController::new(
            settings(),
            ScriptedCamera::ok(4),
            ScriptedDetector::counts(&[2, 8, 20, 4]),
            announcer.clone(),
        );

        let stop = CancellationToken::new();
        stop.cancel();
        controller.run(stop).await.unwrap();

        // the already-started cycle ran to completion before stopping
        assert_eq!(controller.cycles(), 1);
        assert_eq!(controller.phase(), CyclePhase::Stopped);
        let greens: Vec<_> = announcer
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Green { .. }))
            .collect();
        assert_eq!(greens.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_green_time_escalates_out_of_the_cycle() {
        let mut s = settings();
        s.green_times.remove(&Density::High);
        let mut controller = CycleController::new(
            s,
            ScriptedCamera::ok(4),
            ScriptedDetector::counts(&[2, 8, 20, 4]),
            RecordingAnnouncer::new(),
        );

        match controller.run_cycle().await {
            Err(Error::Configuration(_)) => {}
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }
}
