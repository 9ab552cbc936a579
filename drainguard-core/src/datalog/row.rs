//! CSV encoding of log rows
//!
//! Both logs share the same dialect: comma separated, one record per line,
//! `\n` line endings, a header row first. Text fields are quoted only when
//! they contain a comma, a quote or a line break; embedded quotes are
//! doubled.

use std::borrow::Cow;

use crate::reading::format_decimal;
use crate::record::{Alert, EnrichedReading};

/// Columns of the readings log
pub const READING_COLUMNS: [&str; 7] = [
    "timestamp",
    "water_level_cm",
    "gas_level",
    "is_anomaly",
    "anomaly_type",
    "risk_score",
    "risk_level",
];

/// Columns of the alert log
pub const ALERT_COLUMNS: [&str; 7] = [
    "timestamp",
    "anomaly_type",
    "risk_score",
    "risk_level",
    "water_level_cm",
    "gas_level",
    "message",
];

/// Header line (with trailing newline) for a set of columns
pub fn header_line(columns: &[&str]) -> String {
    let mut line = columns.join(",");
    line.push('\n');
    line
}

/// Quote a field if it would otherwise break the row
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// A record that can be written as one CSV row
pub trait CsvRow {
    /// Field values in column order, unescaped
    fn fields(&self) -> Vec<String>;

    /// Complete line, escaped, with trailing newline
    fn to_line(&self) -> String {
        let fields = self.fields();
        let mut line = String::with_capacity(fields.iter().map(|f| f.len() + 1).sum());
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_field(field));
        }
        line.push('\n');
        line
    }
}

impl CsvRow for EnrichedReading {
    fn fields(&self) -> Vec<String> {
        vec![
            self.reading.timestamp_string(),
            format_decimal(self.reading.water_level_cm),
            self.reading.gas_level.to_string(),
            if self.is_anomaly { "1" } else { "0" }.to_string(),
            self.anomaly_type.to_string(),
            format_decimal(self.risk_score),
            self.risk_level.to_string(),
        ]
    }
}

impl CsvRow for Alert {
    fn fields(&self) -> Vec<String> {
        let record = &self.record;
        vec![
            record.reading.timestamp_string(),
            record.anomaly_type.to_string(),
            format_decimal(record.risk_score),
            record.risk_level.to_string(),
            format_decimal(record.reading.water_level_cm),
            record.reading.gas_level.to_string(),
            self.message.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;
    use crate::risk::{RiskLevel, RiskType};
    use chrono::{Local, TimeZone};

    fn record() -> EnrichedReading {
        let ts = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).single().unwrap();
        EnrichedReading {
            reading: Reading::at(ts, 5.0, 200),
            is_anomaly: true,
            anomaly_type: RiskType::Blockage,
            risk_score: 85.0,
            risk_level: RiskLevel::High,
        }
    }

    #[test]
    fn headers() {
        assert_eq!(
            header_line(&READING_COLUMNS),
            "timestamp,water_level_cm,gas_level,is_anomaly,anomaly_type,risk_score,risk_level\n"
        );
        assert_eq!(
            header_line(&ALERT_COLUMNS),
            "timestamp,anomaly_type,risk_score,risk_level,water_level_cm,gas_level,message\n"
        );
    }

    #[test]
    fn reading_row() {
        assert_eq!(
            record().to_line(),
            "2024-05-06T07:08:09.000000,5.0,200,1,BLOCKAGE,85.0,HIGH\n"
        );
    }

    #[test]
    fn alert_message_is_quoted() {
        let alert = Alert {
            record: record(),
            message: "Potential blockage detected. Water level critically low at 5.0cm, \"urgent\"".into(),
        };
        assert_eq!(
            alert.to_line(),
            "2024-05-06T07:08:09.000000,BLOCKAGE,85.0,HIGH,5.0,200,\
             \"Potential blockage detected. Water level critically low at 5.0cm, \"\"urgent\"\"\"\n"
        );
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(escape_field("GAS_HAZARD"), "GAS_HAZARD");
        assert_eq!(escape_field("a\nb"), "\"a\nb\"");
    }
}
