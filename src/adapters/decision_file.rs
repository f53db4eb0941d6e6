//! Replays externally produced decisions from a JSON-lines file.
//!
//! One object per line: a `timestamp` (same formats as candle files) plus the
//! decision fields. A decision applies to the candle with that exact
//! timestamp. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"timestamp":"2024-03-01","action":"BUY","position_pct":0.3,"reason":"breakout"}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::adapters::csv_adapter::parse_timestamp;
use crate::domain::decision::Decision;
use crate::domain::error::{DecisionError, TraderError};
use crate::ports::decision_port::{DecisionContext, DecisionSource};

#[derive(Debug, Clone, Default)]
pub struct DecisionFile {
    decisions: BTreeMap<DateTime<Utc>, Decision>,
}

impl DecisionFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, TraderError> {
        let mut decisions = BTreeMap::new();

        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_err = |reason: String| TraderError::Data {
                reason: format!("decision line {}: {}", i + 1, reason),
            };

            let value: Value = serde_json::from_str(line)
                .map_err(|e| TraderError::Decision(DecisionError::Malformed(e)))?;
            let timestamp = value
                .get("timestamp")
                .and_then(Value::as_str)
                .ok_or_else(|| line_err("missing timestamp".into()))?;
            let timestamp = parse_timestamp(timestamp)?;
            let decision: Decision = serde_json::from_value(value)
                .map_err(|e| TraderError::Decision(DecisionError::Malformed(e)))?;

            if decisions.insert(timestamp, decision).is_some() {
                return Err(line_err(format!("duplicate decision for {timestamp}")));
            }
        }

        Ok(Self { decisions })
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn get(&self, timestamp: &DateTime<Utc>) -> Option<&Decision> {
        self.decisions.get(timestamp)
    }
}

impl DecisionSource for DecisionFile {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Option<Decision>, TraderError> {
        Ok(ctx
            .candles
            .last()
            .and_then(|c| self.get(&c.candle.timestamp))
            .cloned())
    }
}
