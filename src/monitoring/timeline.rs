//! Stage Timing
//!
//! Records how long each stage of the job pipeline took so the final log
//! shows where the wall-clock time went.

use std::time::{Duration, Instant};

/// Timing record for one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    /// Stage name as shown in the summary
    pub name: String,
    /// When the stage started
    pub started: Instant,
    /// When the stage finished (still running if `None`)
    pub finished: Option<Instant>,
}

impl StageTiming {
    /// Elapsed time of the stage, up to now if still running.
    pub fn elapsed(&self) -> Duration {
        match self.finished {
            Some(finished) => finished.duration_since(self.started),
            None => self.started.elapsed(),
        }
    }
}

/// Tracks the stages of a single job run.
#[derive(Debug, Clone)]
pub struct JobTimeline {
    stages: Vec<StageTiming>,
    start_time: Instant,
}

impl JobTimeline {
    /// Creates a timeline starting now.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Marks the start of a named stage.
    pub fn begin(&mut self, name: impl Into<String>) {
        self.stages.push(StageTiming {
            name: name.into(),
            started: Instant::now(),
            finished: None,
        });
    }

    /// Marks the most recent open stage with this name as finished.
    pub fn finish(&mut self, name: &str) {
        if let Some(stage) = self
            .stages
            .iter_mut()
            .rev()
            .find(|s| s.name == name && s.finished.is_none())
        {
            stage.finished = Some(Instant::now());
        }
    }

    /// All recorded stages in start order.
    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    /// Total elapsed time since the timeline was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Renders a per-stage timing table for the job log.
    pub fn summary(&self) -> String {
        let mut output = String::from("Stage timing:\n");

        let width = self
            .stages
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0);

        for stage in &self.stages {
            output.push_str(&format!(
                "  {:width$}  {:.2?}\n",
                stage.name,
                stage.elapsed(),
                width = width
            ));
        }

        output
    }
}

impl Default for JobTimeline {
    fn default() -> Self {
        Self::new()
    }
}
