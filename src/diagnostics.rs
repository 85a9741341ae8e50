/*!
Explicit diagnostics for region resolution.
Components never log directly; they hand `DiagnosticEvent`s to a caller-supplied `DiagnosticsSink`.
Use `LogSink` to forward everything to the `log` facade, or `CollectingSink` to inspect events afterwards.
*/

use log::{debug, trace, warn};

use crate::primer::Direction;

/// Everything the resolver reports while working on a region
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticEvent {
    /// Per-primer counts after aligning against the panel
    AlignmentSummary {
        region_num: usize,
        primer: String,
        attempted: usize,
        aligned: usize,
        penalized_3prime: usize,
        over_budget: usize
    },
    /// A variant was promoted to an alternate primer
    AlternateFound {
        region_num: usize,
        name: String,
        direction: Direction,
        frequency: usize
    },
    /// A variant was seen in only one reference and was not promoted
    SingletonVariantSkipped {
        region_num: usize,
        direction: Direction,
        sequence: String
    },
    /// The region is complete
    RegionResolved {
        region_num: usize,
        pool: String,
        left: String,
        right: String,
        mean_percent_identity: f64,
        unique_candidates: (usize, usize),
        alternates: usize
    }
}

/// Receiver for diagnostic events
pub trait DiagnosticsSink {
    fn record(&mut self, event: DiagnosticEvent);
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&mut self, _event: DiagnosticEvent) {}
}

/// Keeps every event in order
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    events: Vec<DiagnosticEvent>
}

impl CollectingSink {
    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<DiagnosticEvent> {
        self.events
    }
}

impl DiagnosticsSink for CollectingSink {
    fn record(&mut self, event: DiagnosticEvent) {
        self.events.push(event);
    }
}

/// Forwards events to the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn record(&mut self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::AlignmentSummary { region_num, primer, attempted, aligned, penalized_3prime, over_budget } => {
                trace!("Region {region_num}: {primer} aligned to {aligned}/{attempted} references ({penalized_3prime} with 3' mismatches)");
                if over_budget > 0 {
                    warn!("Region {region_num}: {primer} skipped {over_budget} references that exceeded the alignment budget");
                }
            },
            DiagnosticEvent::AlternateFound { region_num, name, direction, frequency } => {
                debug!("Region {region_num}: found {direction} alternate primer {name} which covers {frequency} reference sequences");
            },
            DiagnosticEvent::SingletonVariantSkipped { region_num, direction, sequence } => {
                trace!("Region {region_num}: {direction} variant {sequence} only seen once, ignored");
            },
            DiagnosticEvent::RegionResolved { region_num, pool, left, right, mean_percent_identity, unique_candidates, alternates } => {
                debug!(
                    "Region {region_num} ({pool}): picked {left}/{right} at {mean_percent_identity:.2}% from {}x{} unique candidates, {alternates} alternates",
                    unique_candidates.0, unique_candidates.1
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        let mut sink = CollectingSink::default();
        let event = DiagnosticEvent::AlternateFound {
            region_num: 3,
            name: "amp_4_LEFT_alt1".to_string(),
            direction: Direction::Left,
            frequency: 5
        };
        sink.record(event.clone());
        assert_eq!(sink.events(), &[event.clone()]);
        assert_eq!(sink.into_events(), vec![event]);
    }

    #[test_log::test]
    fn test_log_sink() {
        // only checks that every variant can be forwarded
        let mut sink = LogSink;
        sink.record(DiagnosticEvent::AlignmentSummary {
            region_num: 0,
            primer: "p".to_string(),
            attempted: 3,
            aligned: 2,
            penalized_3prime: 1,
            over_budget: 1
        });
        sink.record(DiagnosticEvent::SingletonVariantSkipped {
            region_num: 0,
            direction: Direction::Right,
            sequence: "ACGT".to_string()
        });
        sink.record(DiagnosticEvent::RegionResolved {
            region_num: 0,
            pool: "x_2".to_string(),
            left: "l".to_string(),
            right: "r".to_string(),
            mean_percent_identity: 99.5,
            unique_candidates: (2, 3),
            alternates: 0
        });
    }
}
