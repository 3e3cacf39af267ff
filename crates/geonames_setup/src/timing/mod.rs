use std::{
    fmt, fs,
    path::Path,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ProvisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    GeoNames,
    Redis,
    Maven,
    Importer,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::GeoNames, Stage::Redis, Stage::Maven, Stage::Importer];

    pub fn label(self) -> &'static str {
        match self {
            Stage::GeoNames => "GeoNames",
            Stage::Redis => "Redis",
            Stage::Maven => "Maven",
            Stage::Importer => "Importer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A start point on both clocks: monotonic for measuring, wall for reporting.
#[derive(Debug, Clone, Copy)]
struct Started {
    at: Instant,
    wall: DateTime<Utc>,
}

impl Started {
    fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    started_at: DateTime<Utc>,
    elapsed: Duration,
}

impl Span {
    fn close(started: Started) -> Self {
        Self {
            started_at: started.wall,
            elapsed: started.at.elapsed(),
        }
    }
}

/// Wall-clock timings for each stage plus the whole run.
#[derive(Debug)]
pub struct StageTimings {
    run: Started,
    stages: Vec<(Stage, Span)>,
    total: Option<Span>,
}

/// Opaque handle returned by [`StageTimings::start`].
#[must_use]
pub struct StageGuard {
    stage: Stage,
    opened: Started,
}

#[derive(Debug, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct TimingReport {
    pub started_at: DateTime<Utc>,
    pub total_seconds: f64,
    pub stages: Vec<StageRecord>,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTimings {
    pub fn new() -> Self {
        Self {
            run: Started::now(),
            stages: Vec::new(),
            total: None,
        }
    }

    pub fn start(&self, stage: Stage) -> StageGuard {
        StageGuard {
            stage,
            opened: Started::now(),
        }
    }

    pub fn finish(&mut self, guard: StageGuard) {
        self.stages.push((guard.stage, Span::close(guard.opened)));
    }

    /// Closes the whole-run span. Later calls keep the first measurement.
    pub fn finish_run(&mut self) {
        if self.total.is_none() {
            self.total = Some(Span::close(self.run));
        }
    }

    pub fn elapsed(&self, stage: Stage) -> Option<Duration> {
        self.stages
            .iter()
            .find(|(recorded, _)| *recorded == stage)
            .map(|(_, span)| span.elapsed)
    }

    pub fn total(&self) -> Duration {
        self.total
            .map(|span| span.elapsed)
            .unwrap_or_else(|| self.run.at.elapsed())
    }

    /// Summary lines in fixed stage order, one decimal place each.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Stage::ALL
            .iter()
            .map(|stage| {
                let secs = self.elapsed(*stage).unwrap_or_default().as_secs_f64();
                format!("{stage} done in {secs:.1}s")
            })
            .collect();
        lines.push(format!(
            "The whole process took {:.1}s",
            self.total().as_secs_f64()
        ));
        lines
    }

    pub fn report(&self) -> TimingReport {
        let mut stages: Vec<StageRecord> = self
            .stages
            .iter()
            .map(|(stage, span)| StageRecord {
                stage: *stage,
                started_at: span.started_at,
                finished_at: span.started_at
                    + chrono::Duration::from_std(span.elapsed)
                        .unwrap_or_else(|_| chrono::Duration::zero()),
                seconds: span.elapsed.as_secs_f64(),
            })
            .collect();
        stages.sort_by_key(|record| Stage::ALL.iter().position(|stage| *stage == record.stage));

        TimingReport {
            started_at: self.run.wall,
            total_seconds: self.total().as_secs_f64(),
            stages,
        }
    }

    pub fn write_report(&self, path: &Path) -> Result<(), ProvisionError> {
        let json = serde_json::to_string_pretty(&self.report())
            .map_err(|err| ProvisionError::io("serializing timing report", err.into()))?;
        fs::write(path, json)
            .map_err(|err| ProvisionError::io(format!("writing timing report {:?}", path), err))
    }
}
