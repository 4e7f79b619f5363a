//! Execution results
//!
//! Measurement counts and per-execution metadata returned by every
//! backend, local or remote.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Measurement outcome counts
///
/// Maps bitstrings to the number of times they were observed. Bitstrings
/// follow the device convention: the first character corresponds to the
/// highest-index qubit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementCounts {
    counts: HashMap<String, usize>,
    total_shots: usize,
}

impl MeasurementCounts {
    /// Create from a counts map; the shot total is the sum of counts
    pub fn from_counts(counts: HashMap<String, usize>) -> Self {
        let total_shots = counts.values().sum();
        Self {
            counts,
            total_shots,
        }
    }

    /// Empty counts (no shots recorded)
    pub fn empty() -> Self {
        Self {
            counts: HashMap::new(),
            total_shots: 0,
        }
    }

    /// Add observations of a bitstring
    pub fn add(&mut self, bitstring: String, count: usize) {
        *self.counts.entry(bitstring).or_insert(0) += count;
        self.total_shots += count;
    }

    /// Count for a specific bitstring
    pub fn get(&self, bitstring: &str) -> usize {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Empirical probability of a bitstring
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.total_shots == 0 {
            0.0
        } else {
            self.get(bitstring) as f64 / self.total_shots as f64
        }
    }

    /// Iterate over (bitstring, count) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, usize)> {
        self.counts.iter().map(|(bs, &c)| (bs, c))
    }

    /// All distinct observed bitstrings
    pub fn bitstrings(&self) -> impl Iterator<Item = &String> {
        self.counts.keys()
    }

    /// Underlying counts map
    pub fn counts(&self) -> &HashMap<String, usize> {
        &self.counts
    }

    /// Total number of shots
    pub fn total_shots(&self) -> usize {
        self.total_shots
    }

    /// Number of distinct outcomes observed
    pub fn num_outcomes(&self) -> usize {
        self.counts.len()
    }

    /// Most frequently observed outcome
    pub fn most_common(&self) -> Option<(&String, usize)> {
        self.counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(bs, &count)| (bs, count))
    }

    /// Outcomes sorted by frequency, descending
    pub fn sorted(&self) -> Vec<(&String, usize)> {
        let mut sorted: Vec<_> = self.counts.iter().map(|(bs, &c)| (bs, c)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

impl fmt::Display for MeasurementCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Measurement counts ({} shots):", self.total_shots)?;
        let sorted = self.sorted();
        for (bitstring, count) in sorted.iter().take(10) {
            let prob = *count as f64 / self.total_shots.max(1) as f64;
            writeln!(f, "  {}: {} ({:.2}%)", bitstring, count, prob * 100.0)?;
        }
        if sorted.len() > 10 {
            writeln!(f, "  ... and {} more outcomes", sorted.len() - 10)?;
        }
        Ok(())
    }
}

/// Result of one circuit execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts
    pub counts: MeasurementCounts,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata attached to every result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Wall-clock execution time
    pub execution_time: Option<Duration>,

    /// Backend name
    pub backend_name: Option<String>,

    /// Shots requested
    pub shots: Option<usize>,

    /// Job id, for remote backends
    pub job_id: Option<String>,
}

impl ExecutionMetadata {
    /// Metadata for a completed execution
    pub fn completed(backend_name: impl Into<String>, shots: usize, elapsed: Duration) -> Self {
        Self {
            execution_time: Some(elapsed),
            backend_name: Some(backend_name.into()),
            shots: Some(shots),
            job_id: None,
        }
    }

    /// Attach a remote job id
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Job status reported by remote backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is queued
    Queued,
    /// Job is running
    Running,
    /// Job completed successfully
    Completed,
    /// Job failed
    Failed,
    /// Job was cancelled
    Cancelled,
}

impl JobStatus {
    /// Check if the job has reached a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
