//! Alert notification hooks
//!
//! Observers run on the consumer thread after the alert has been written to
//! the alert log, so they should return quickly.

use drainguard_core::Alert;

/// Receives every raised alert
pub trait AlertObserver: Send + Sync {
    /// Called once per raised alert
    fn on_alert(&self, alert: &Alert);
}

impl<F> AlertObserver for F
where
    F: Fn(&Alert) + Send + Sync,
{
    fn on_alert(&self, alert: &Alert) {
        self(alert)
    }
}

/// Logs each alert at warn level; always installed
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl AlertObserver for LogObserver {
    fn on_alert(&self, alert: &Alert) {
        log::warn!("{}", alert.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainguard_core::{Detection, EnrichedReading, InferenceMode, Reading, RiskLevel, RiskType};
    use std::sync::Mutex;

    #[test]
    fn closures_are_observers() {
        let detection = Detection {
            is_anomaly: true,
            risk_score: 92.0,
            risk_level: RiskLevel::Critical,
            risk_type: RiskType::GasHazard,
            confidence: 60.0,
            raw_score: None,
            details: "Dangerous gas level.".into(),
            alert_suppressed: false,
            mode: InferenceMode::Rules,
        };
        let record = EnrichedReading::new(Reading::now(45.0, 3000), &detection);
        let alert = Alert::from_detection(&record, &detection).unwrap();

        let seen = Mutex::new(Vec::new());
        let observer = |alert: &Alert| seen.lock().unwrap().push(alert.record.anomaly_type);
        observer.on_alert(&alert);
        LogObserver.on_alert(&alert);

        assert_eq!(*seen.lock().unwrap(), vec![RiskType::GasHazard]);
    }
}
