//! Sensor Simulator
//!
//! ## Overview
//!
//! Produces realistic readings without hardware. Each tick advances a
//! phase counter and emits either a normal sample or one sample of an
//! anomaly burst:
//!
//! ```text
//! normal:  water = mid + amp·sin(phase) + N(0, 2)      clipped to [8, 85]
//!          gas   = 400 + 80·sin(0.7·phase) + N(0, 40)  clipped to [100, normal max]
//!
//! burst:   starts with probability rate/10 per tick, or on request
//!          lasts 1 + U[duration/2, duration] ticks
//!          values drawn uniformly from the burst's profile
//! ```
//!
//! ## Anomaly Profiles
//!
//! | Type       | Water (cm)          | Gas           |
//! |------------|---------------------|---------------|
//! | BLOCKAGE   | [2, blockage)       | [300, 900)    |
//! | LEAKAGE    | [leakage, 160)      | [200, 600)    |
//! | GAS_HAZARD | [20, 55)            | [danger, 3800)|
//! | FLOOD_RISK | [1, 8)              | [800, 2000)   |
//!
//! A requested type applies to the next burst only; later bursts pick a
//! profile at random again.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use drainguard_core::config::{SensorSettings, Settings};
use drainguard_core::constants::sensors::{
    SIM_GAS_AMPLITUDE, SIM_GAS_BASE, SIM_GAS_FLOOR, SIM_GAS_NOISE, SIM_WATER_CLIP_CM,
    SIM_WATER_NOISE_CM,
};
use drainguard_core::constants::READING_QUEUE_CAPACITY;
use drainguard_core::reading::round_to;
use drainguard_core::{
    BoundedQueue, CancellationToken, Reading, ReadingValidator, RiskType, Worker,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::monitor::{SourceMonitor, SourceStats};
use crate::{SourceError, TelemetrySource};

/// Phase advance per tick
const PHASE_STEP: f64 = 0.05;

/// Simulator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Anomaly rate; a burst starts with a tenth of this probability per tick
    pub anomaly_rate: f64,
    /// Maximum extra ticks in a burst
    pub burst_duration: u32,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
    /// Ranges and thresholds the profiles are built from
    pub sensors: SensorSettings,
    /// Reading queue capacity
    pub queue_capacity: usize,
    /// Bounded join on stop
    pub join_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl SimulatorConfig {
    /// Build from deployment settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interval: settings.simulator.interval(),
            anomaly_rate: settings.simulator.anomaly_rate,
            burst_duration: settings.simulator.burst_duration,
            seed: settings.simulator.seed,
            sensors: settings.sensors.clone(),
            queue_capacity: settings.pipeline.queue_capacity,
            join_timeout: Duration::from_millis(settings.pipeline.join_timeout_ms),
        }
    }

    /// Set the tick interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the anomaly rate
    pub fn with_anomaly_rate(mut self, rate: f64) -> Self {
        self.anomaly_rate = rate;
        self
    }

    /// Set the maximum burst length
    pub fn with_burst_duration(mut self, ticks: u32) -> Self {
        self.burst_duration = ticks;
        self
    }

    /// Seed the generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the reading queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the stop timeout
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }
}

/// Pending burst request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstRequest {
    /// Pick a profile at random
    Random,
    /// Use this profile
    Kind(RiskType),
}

impl BurstRequest {
    /// `None` and `NORMAL` both mean "random"
    pub fn from_type(kind: Option<RiskType>) -> Self {
        match kind {
            Some(RiskType::Normal) | None => BurstRequest::Random,
            Some(kind) => BurstRequest::Kind(kind),
        }
    }
}

/// Handle for requesting a burst from another thread
#[derive(Debug, Clone, Default)]
pub struct AnomalyTrigger {
    pending: Arc<Mutex<Option<BurstRequest>>>,
}

impl AnomalyTrigger {
    /// Request a burst on the next idle tick
    pub fn request(&self, kind: Option<RiskType>) {
        let request = BurstRequest::from_type(kind);
        match request {
            BurstRequest::Kind(kind) => log::info!("Anomaly triggered: {}", kind),
            BurstRequest::Random => log::info!("Anomaly triggered: random"),
        }
        *self.lock() = Some(request);
    }

    /// Take the pending request, if any
    pub fn take(&self) -> Option<BurstRequest> {
        self.lock().take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<BurstRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One generated sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Water distance (cm), two decimals
    pub water: f64,
    /// Gas level, integral
    pub gas: f64,
    /// Profile the values were drawn from, `None` for normal samples
    pub anomaly: Option<RiskType>,
}

#[derive(Debug, Clone, Copy)]
struct Burst {
    kind: RiskType,
    remaining: u32,
}

/// Deterministic-given-seed signal source
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    rng: StdRng,
    sensors: SensorSettings,
    anomaly_rate: f64,
    burst_duration: u32,
    phase: f64,
    burst: Option<Burst>,
    water_noise: Noise,
    gas_noise: Noise,
}

impl SignalGenerator {
    /// Create a generator; without a seed it is seeded from entropy
    pub fn new(config: &SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            sensors: config.sensors.clone(),
            anomaly_rate: config.anomaly_rate,
            burst_duration: config.burst_duration,
            phase: 0.0,
            burst: None,
            water_noise: Noise::new(SIM_WATER_NOISE_CM),
            gas_noise: Noise::new(SIM_GAS_NOISE),
        }
    }

    /// Whether more burst ticks are pending
    pub fn in_burst(&self) -> bool {
        self.burst.map_or(false, |burst| burst.remaining > 0)
    }

    /// Produce the next sample
    pub fn next_tick(&mut self, request: Option<BurstRequest>) -> Tick {
        self.phase += PHASE_STEP;

        let continuing = match self.burst.as_mut() {
            Some(burst) if burst.remaining > 0 => {
                burst.remaining -= 1;
                Some(burst.kind)
            }
            _ => None,
        };

        let anomaly = match continuing {
            Some(kind) => Some(kind),
            None => {
                self.burst = None;
                let start = request.is_some() || self.rng.gen::<f64>() < self.anomaly_rate * 0.1;
                if start {
                    Some(self.start_burst(request))
                } else {
                    None
                }
            }
        };

        let (water, gas) = match anomaly {
            Some(kind) => self.anomaly_values(kind),
            None => self.normal_values(),
        };

        Tick {
            water: round_to(water, 2),
            gas: gas.trunc(),
            anomaly,
        }
    }

    fn start_burst(&mut self, request: Option<BurstRequest>) -> RiskType {
        let kind = match request {
            Some(BurstRequest::Kind(kind)) => kind,
            _ => RiskType::ANOMALIES[self.rng.gen_range(0..RiskType::ANOMALIES.len())],
        };
        let remaining = self
            .rng
            .gen_range(self.burst_duration / 2..=self.burst_duration);
        self.burst = Some(Burst { kind, remaining });
        kind
    }

    fn normal_values(&mut self) -> (f64, f64) {
        let s = &self.sensors;
        let mid = (s.water_normal_low_cm + s.water_normal_high_cm) / 2.0;
        let amplitude = (s.water_normal_high_cm - s.water_normal_low_cm) / 3.0;
        let gas_max = f64::from(s.gas_normal_max);

        let water = mid + amplitude * self.phase.sin() + self.water_noise.sample(&mut self.rng);
        let gas = SIM_GAS_BASE
            + SIM_GAS_AMPLITUDE * (self.phase * 0.7).sin()
            + self.gas_noise.sample(&mut self.rng);

        let (water_low, water_high) = SIM_WATER_CLIP_CM;
        (
            water.clamp(water_low, water_high),
            gas.clamp(SIM_GAS_FLOOR, gas_max.max(SIM_GAS_FLOOR)),
        )
    }

    fn anomaly_values(&mut self, kind: RiskType) -> (f64, f64) {
        let s = &self.sensors;
        let (water, gas) = match kind {
            RiskType::Blockage => ((2.0, s.water_blockage_cm), (300.0, 900.0)),
            RiskType::Leakage => ((s.water_leakage_cm, 160.0), (200.0, 600.0)),
            RiskType::GasHazard => ((20.0, 55.0), (f64::from(s.gas_danger), 3800.0)),
            RiskType::FloodRisk => ((1.0, 8.0), (800.0, 2000.0)),
            RiskType::Normal => ((5.0, 90.0), (100.0, 3000.0)),
        };
        (uniform(&mut self.rng, water), uniform(&mut self.rng, gas))
    }
}

/// Uniform draw from `[low, high)`; a degenerate range yields `low`
fn uniform(rng: &mut StdRng, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Zero-mean Gaussian noise; a negative or NaN deviation yields none
#[derive(Debug, Clone, Copy)]
struct Noise(Option<Normal<f64>>);

impl Noise {
    fn new(std_dev: f64) -> Self {
        Self(Normal::new(0.0, std_dev).ok())
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.0.map_or(0.0, |normal| normal.sample(rng))
    }
}

/// Simulated telemetry source
pub struct SimulatedSource {
    config: SimulatorConfig,
    validator: ReadingValidator,
    queue: Arc<BoundedQueue<Reading>>,
    monitor: Arc<SourceMonitor>,
    trigger: AnomalyTrigger,
    token: CancellationToken,
    worker: Option<Worker>,
}

impl SimulatedSource {
    /// Create a stopped simulator
    pub fn new(config: SimulatorConfig) -> Self {
        let capacity = if config.queue_capacity == 0 {
            READING_QUEUE_CAPACITY
        } else {
            config.queue_capacity
        };
        Self {
            validator: ReadingValidator::from_settings(&config.sensors),
            queue: Arc::new(BoundedQueue::new(capacity)),
            monitor: Arc::new(SourceMonitor::default()),
            trigger: AnomalyTrigger::default(),
            token: CancellationToken::new(),
            worker: None,
            config,
        }
    }

    /// Request a burst; `None` or `NORMAL` picks a random profile
    pub fn trigger_anomaly(&self, kind: Option<RiskType>) {
        self.trigger.request(kind);
    }

    /// Handle that can request bursts after the source is boxed
    pub fn trigger(&self) -> AnomalyTrigger {
        self.trigger.clone()
    }

    /// Configuration
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}

impl TelemetrySource for SimulatedSource {
    fn name(&self) -> &'static str {
        "simulator"
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.worker.is_some() {
            return Err(SourceError::AlreadyRunning);
        }

        self.token = CancellationToken::new();
        let token = self.token.clone();
        let queue = Arc::clone(&self.queue);
        let monitor = Arc::clone(&self.monitor);
        let trigger = self.trigger.clone();
        let validator = self.validator;
        let interval = self.config.interval;
        let mut generator = SignalGenerator::new(&self.config);

        monitor.set_running(true);
        monitor.set_link_up(true);
        let body = move || {
            while !token.is_cancelled() {
                let request = if generator.in_burst() { None } else { trigger.take() };
                let tick = generator.next_tick(request);
                monitor.set_anomaly(tick.anomaly);

                match validator.validate_sample(Some(tick.water), Some(tick.gas)) {
                    Ok(reading) => monitor.publish(&queue, reading),
                    Err(err) => {
                        log::debug!("simulated sample rejected: {}", err);
                        monitor.record_error();
                    }
                }

                if !token.sleep(interval) {
                    break;
                }
            }
            monitor.set_anomaly(None);
            monitor.set_link_up(false);
            monitor.set_running(false);
        };

        match Worker::spawn("drainguard-simulator", body) {
            Ok(worker) => self.worker = Some(worker),
            Err(err) => {
                self.monitor.set_running(false);
                self.monitor.set_link_up(false);
                return Err(SourceError::Spawn(err));
            }
        }

        log::info!(
            "Sensor simulator started (interval={}ms)",
            self.config.interval.as_millis()
        );
        Ok(())
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.token.cancel();
        worker.join_timeout(self.config.join_timeout);
        self.monitor.set_link_up(false);
        self.monitor.set_running(false);
        log::info!("Sensor simulator stopped");
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn stats(&self) -> SourceStats {
        self.monitor.snapshot(&self.queue)
    }

    fn readings(&self) -> Arc<BoundedQueue<Reading>> {
        Arc::clone(&self.queue)
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop();
    }
}
