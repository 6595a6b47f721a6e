// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Planning trace
//!
//! Captures the phases of one optimization run and every relaxation step, for
//! debugging and for explaining why an element ended up with its retrieval.

use crate::pattern::element::ElementId;
use crate::plan::retrieval::{Cost, IMPOSSIBLE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Trace information for one planning run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanTrace {
    pub steps: Vec<TraceStep>,
    pub relaxation: Vec<RelaxationStep>,
    pub total_duration: Duration,
}

/// Individual step in the planning process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub phase: PlanningPhase,
    pub description: String,
    pub duration: Duration,
    pub metadata: TraceMetadata,
}

/// Planning phases for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanningPhase {
    Initialization,
    DirectEstimation,
    Relaxation,
    TreeAssembly,
    JoinPlanning,
    Emission,
}

/// Additional metadata for trace steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceMetadata {
    pub elements: Vec<ElementId>,
    pub estimated_size: Option<Cost>,
    pub note: Option<String>,
}

impl TraceMetadata {
    pub fn with_elements(elements: Vec<ElementId>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One element popped from the relaxation frontier: its best estimate
/// before and after re-estimating its dependent retrievals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaxationStep {
    pub element: ElementId,
    pub before: Cost,
    pub after: Cost,
}

impl RelaxationStep {
    pub fn improved(&self) -> bool {
        self.after < self.before
    }
}

/// Builder for creating plan traces
#[derive(Debug)]
pub struct PlanTracer {
    enabled: bool,
    steps: Vec<TraceStep>,
    relaxation: Vec<RelaxationStep>,
    start_time: Instant,
    current_step_start: Option<Instant>,
}

impl Default for PlanTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanTracer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            steps: Vec::new(),
            relaxation: Vec::new(),
            start_time: Instant::now(),
            current_step_start: None,
        }
    }

    /// Tracer that records nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start_step(&mut self) {
        if self.enabled {
            self.current_step_start = Some(Instant::now());
        }
    }

    /// End the current step and record it
    pub fn end_step(&mut self, phase: PlanningPhase, description: String, metadata: TraceMetadata) {
        if !self.enabled {
            return;
        }
        let duration = self
            .current_step_start
            .map(|start| start.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        self.steps.push(TraceStep {
            phase,
            description,
            duration,
            metadata,
        });
        self.current_step_start = None;
    }

    pub fn record_relaxation(&mut self, element: ElementId, before: Cost, after: Cost) {
        if self.enabled {
            self.relaxation.push(RelaxationStep {
                element,
                before,
                after,
            });
        }
    }

    /// Finalize the trace; `None` when tracing is disabled
    pub fn finalize(self) -> Option<PlanTrace> {
        if !self.enabled {
            return None;
        }
        Some(PlanTrace {
            steps: self.steps,
            relaxation: self.relaxation,
            total_duration: self.start_time.elapsed(),
        })
    }
}

impl PlanTrace {
    pub fn steps_in(&self, phase: PlanningPhase) -> impl Iterator<Item = &TraceStep> {
        self.steps.iter().filter(move |s| s.phase == phase)
    }

    /// No relaxation step ever raised an element's best estimate
    pub fn is_monotonic(&self) -> bool {
        self.relaxation.iter().all(|step| step.after <= step.before)
    }

    /// Relaxation history of a single element
    pub fn relaxation_of(&self, element: ElementId) -> Vec<&RelaxationStep> {
        self.relaxation
            .iter()
            .filter(|step| step.element == element)
            .collect()
    }

    pub fn format_steps(&self) -> String {
        let mut output = String::new();
        output.push_str("Planning Steps\n");
        output.push_str(&"-".repeat(30));
        output.push('\n');
        for (i, step) in self.steps.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} ({:.1}ms)\n",
                i + 1,
                step.description,
                step.duration.as_secs_f64() * 1000.0
            ));
        }

        let improved = self.relaxation.iter().filter(|s| s.improved()).count();
        output.push_str(&format!(
            "Relaxation: {} steps, {} improvements | Planning Time: {:.1}ms\n",
            self.relaxation.len(),
            improved,
            self.total_duration.as_secs_f64() * 1000.0
        ));
        for step in self.relaxation.iter().filter(|s| s.improved()) {
            output.push_str(&format!(
                "    [{}] {} → {}\n",
                step.element,
                format_cost(step.before),
                format_cost(step.after)
            ));
        }
        output
    }
}

pub(crate) fn format_cost(cost: Cost) -> String {
    if cost == IMPOSSIBLE {
        "impossible".to_string()
    } else {
        cost.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracer_records_steps() {
        let mut tracer = PlanTracer::new();
        tracer.start_step();
        tracer.end_step(
            PlanningPhase::Relaxation,
            "Relaxed 2 elements".to_string(),
            TraceMetadata::with_elements(vec![ElementId::new(1)]).with_note("converged"),
        );
        tracer.record_relaxation(ElementId::new(1), IMPOSSIBLE, 40);
        tracer.record_relaxation(ElementId::new(2), 40, 40);

        let trace = tracer.finalize().unwrap();
        assert_eq!(trace.steps_in(PlanningPhase::Relaxation).count(), 1);
        assert!(trace.is_monotonic());
        assert_eq!(trace.relaxation_of(ElementId::new(1)).len(), 1);

        let rendered = trace.format_steps();
        assert!(rendered.contains("1. Relaxed 2 elements"));
        assert!(rendered.contains("2 steps, 1 improvements"));
        assert!(rendered.contains("[1] impossible → 40"));
    }

    #[test]
    fn test_disabled_tracer_records_nothing() {
        let mut tracer = PlanTracer::disabled();
        tracer.start_step();
        tracer.end_step(
            PlanningPhase::Emission,
            "Emitted".to_string(),
            TraceMetadata::default(),
        );
        tracer.record_relaxation(ElementId::new(1), 5, 3);
        assert!(tracer.finalize().is_none());
    }

    #[test]
    fn test_increase_breaks_monotonicity() {
        let trace = PlanTrace {
            relaxation: vec![RelaxationStep {
                element: ElementId::new(0),
                before: 3,
                after: 5,
            }],
            ..PlanTrace::default()
        };
        assert!(!trace.is_monotonic());
    }
}
