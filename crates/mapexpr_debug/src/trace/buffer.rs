//! Bounded storage for trace records.
//!
//! Records live in a ring that drops the oldest once full. Alongside the
//! ring the buffer keeps one [`RunSummary`] per run, updated as records
//! arrive, so step counts and outcomes stay exact after the step records
//! themselves have been evicted.

use std::collections::{HashMap, VecDeque};

use mapexpr_foundation::ErrorCategory;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Run Summaries
// =============================================================================

/// How a traced run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// No end or error event seen yet.
    Running,
    /// The run produced a result, rendered.
    Finished(String),
    /// The run failed.
    Failed(ErrorCategory),
}

/// Aggregate view of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Run number.
    pub run: u64,
    /// Program length reported at run start (0 if the start was not seen).
    pub instructions: usize,
    /// Steps recorded for the run, including evicted ones.
    pub steps: usize,
    /// Deepest operand stack seen before any step.
    pub max_stack_depth: usize,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Records of this run still in the ring.
    live: usize,
}

impl RunSummary {
    fn new(run: u64) -> Self {
        Self {
            run,
            instructions: 0,
            steps: 0,
            max_stack_depth: 0,
            outcome: RunOutcome::Running,
            live: 0,
        }
    }

    fn observe(&mut self, event: &TraceEvent) {
        self.live += 1;
        match event {
            TraceEvent::RunStart { instructions } => self.instructions = *instructions,
            TraceEvent::Step { stack_depth, .. } => {
                self.steps += 1;
                self.max_stack_depth = self.max_stack_depth.max(*stack_depth);
            }
            TraceEvent::RunEnd { result } => self.outcome = RunOutcome::Finished(result.clone()),
            TraceEvent::Error { category, .. } => self.outcome = RunOutcome::Failed(*category),
        }
    }

    /// Returns true once the run has finished or failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome != RunOutcome::Running
    }
}

// =============================================================================
// Trace Buffer
// =============================================================================

/// A ring buffer of trace records with per-run summaries.
#[derive(Clone, Debug)]
pub struct TraceBuffer {
    /// The records, oldest first.
    records: VecDeque<TraceRecord>,
    /// Summaries for every run with a record still in the ring, oldest first.
    runs: VecDeque<RunSummary>,
    /// Maximum number of records to store.
    max_size: usize,
    /// Next record ID to assign.
    next_id: u64,
}

impl TraceBuffer {
    /// Creates a new trace buffer with the given maximum size.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_size.min(1024)),
            runs: VecDeque::new(),
            max_size,
            next_id: 0,
        }
    }

    /// Creates a buffer with default size (10000 records).
    #[must_use]
    pub fn default_size() -> Self {
        Self::new(10_000)
    }

    /// Returns the maximum number of records kept.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Pushes a new event to the buffer.
    ///
    /// Returns the assigned record ID.
    pub fn push(&mut self, run: u64, timestamp_ns: u64, event: TraceEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.summary_mut(run).observe(&event);
        self.records
            .push_back(TraceRecord::new(id, run, timestamp_ns, event));
        while self.records.len() > self.max_size {
            if let Some(evicted) = self.records.pop_front() {
                self.release(evicted.run);
            }
        }

        id
    }

    fn summary_mut(&mut self, run: u64) -> &mut RunSummary {
        let found = self.runs.iter().rposition(|s| s.run == run);
        let index = found.unwrap_or_else(|| {
            self.runs.push_back(RunSummary::new(run));
            self.runs.len() - 1
        });
        &mut self.runs[index]
    }

    /// Drops a run's summary once its last record leaves the ring.
    fn release(&mut self, run: u64) {
        if let Some(index) = self.runs.iter().position(|s| s.run == run) {
            self.runs[index].live -= 1;
            if self.runs[index].live == 0 {
                self.runs.remove(index);
            }
        }
    }

    /// Returns the number of records in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clears all records and summaries.
    pub fn clear(&mut self) {
        // IDs keep increasing across clears
        self.records.clear();
        self.runs.clear();
    }

    /// Returns an iterator over all records.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// Returns records for a specific run.
    #[must_use]
    pub fn records_for_run(&self, run: u64) -> Vec<&TraceRecord> {
        self.records.iter().filter(|r| r.run == run).collect()
    }

    /// Returns the most recent N records.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&TraceRecord> {
        let start = self.records.len().saturating_sub(count);
        self.records.iter().skip(start).collect()
    }

    /// Returns records of a specific event type.
    #[must_use]
    pub fn by_event_type(&self, event_type: &str) -> Vec<&TraceRecord> {
        self.records
            .iter()
            .filter(|r| r.event_type() == event_type)
            .collect()
    }

    /// Returns the summary of one run.
    #[must_use]
    pub fn run(&self, run: u64) -> Option<&RunSummary> {
        self.runs.iter().find(|s| s.run == run)
    }

    /// Returns run summaries, oldest first.
    pub fn runs(&self) -> impl Iterator<Item = &RunSummary> {
        self.runs.iter()
    }

    /// Returns the summaries of runs that ended in an error.
    #[must_use]
    pub fn failed_runs(&self) -> Vec<&RunSummary> {
        self.runs
            .iter()
            .filter(|s| matches!(s.outcome, RunOutcome::Failed(_)))
            .collect()
    }

    /// Returns statistics about the buffer.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        let mut event_counts = HashMap::new();
        for record in &self.records {
            *event_counts.entry(record.event_type()).or_insert(0) += 1;
        }

        TraceBufferStats {
            record_count: self.records.len(),
            max_size: self.max_size,
            run_count: self.runs.len(),
            failed_runs: self.failed_runs().len(),
            oldest_run: self.runs.front().map(|s| s.run),
            newest_run: self.runs.back().map(|s| s.run),
            event_counts,
        }
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::default_size()
    }
}

// =============================================================================
// Buffer Statistics
// =============================================================================

/// Statistics about a trace buffer.
#[derive(Clone, Debug)]
pub struct TraceBufferStats {
    /// Number of records currently in buffer.
    pub record_count: usize,
    /// Maximum buffer size.
    pub max_size: usize,
    /// Number of runs with records in the buffer.
    pub run_count: usize,
    /// How many of those runs failed.
    pub failed_runs: usize,
    /// Oldest run in buffer.
    pub oldest_run: Option<u64>,
    /// Newest run in buffer.
    pub newest_run: Option<u64>,
    /// Count of each event type.
    pub event_counts: HashMap<&'static str, usize>,
}
