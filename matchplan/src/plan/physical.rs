// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Executable plan representation
//!
//! The optimizer's output, handed to an execution engine. A plan node
//! transforms a stream of bindings:
//!
//! - [`PlanNode::Fragment`] runs its steps in order for every incoming
//!   binding. A scan step pairs the binding with every stored match; a walk
//!   step extends it from the bound source. A step whose element is already
//!   bound keeps the binding only if it derives the same value.
//! - [`PlanNode::NestedLoopJoin`] feeds its left input into a nested-loop
//!   join against its right input (run once from an empty binding), then runs
//!   the `after` fragments on every joined binding.
//! - [`PlanNode::Empty`] passes bindings through unchanged.

use crate::error::PlanningResult;
use crate::pattern::element::{Direction, ElementId, ElementKind};
use crate::pattern::filter::{LabelFilter, PropertyFilter};
use crate::pattern::graph::PatternGraph;
use crate::plan::dependency_tree::DependencyTree;
use crate::plan::join::{JoinAttribute, PartialQueryPlan};
use crate::plan::retrieval::{Cost, Retrieval};
use crate::plan::trace::format_cost;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a step obtains its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    /// Every stored element of the step's kind
    Scan,
    /// Neighbours of the bound `source`. See
    /// [`DependentRetrieval`](crate::plan::retrieval::DependentRetrieval) for
    /// the meaning of `direction`.
    Walk {
        source: ElementId,
        direction: Direction,
    },
}

/// One retrieval of a fragment, with the filters its matches must pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStep {
    pub element: ElementId,
    pub kind: ElementKind,
    pub access: Access,
    pub label: Option<LabelFilter>,
    pub properties: Vec<PropertyFilter>,
    pub estimated_size: Cost,
    /// Name the step's matches are exposed under
    pub binding: String,
}

/// Where a fragment starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentStart {
    Scan(ElementId),
    /// Continues from an element bound earlier in the plan
    FromBinding(ElementId),
}

/// Steps of one dependency tree, in an order where every walk follows the
/// step binding its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub steps: Vec<RetrievalStep>,
}

impl Fragment {
    pub fn from_tree(graph: &PatternGraph, tree: &DependencyTree) -> PlanningResult<Self> {
        let steps = tree
            .retrievals()
            .into_iter()
            .map(|retrieval| RetrievalStep::from_retrieval(graph, retrieval))
            .collect::<PlanningResult<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn start(&self) -> Option<FragmentStart> {
        self.steps.first().map(|step| match step.access {
            Access::Scan => FragmentStart::Scan(step.element),
            Access::Walk { source, .. } => FragmentStart::FromBinding(source),
        })
    }

    pub fn elements(&self) -> BTreeSet<ElementId> {
        self.steps.iter().map(|step| step.element).collect()
    }
}

impl RetrievalStep {
    fn from_retrieval(graph: &PatternGraph, retrieval: &Retrieval) -> PlanningResult<Self> {
        let element = graph.element(retrieval.element())?;
        let access = match retrieval {
            Retrieval::Direct(_) => Access::Scan,
            Retrieval::Dependent(dependent) => Access::Walk {
                source: dependent.source(),
                direction: dependent.direction(),
            },
        };
        Ok(Self {
            element: element.id(),
            kind: element.kind(),
            access,
            label: element.label_filter().cloned(),
            properties: element.property_filters().to_vec(),
            estimated_size: retrieval.estimated_size(),
            binding: element
                .alias()
                .map(str::to_string)
                .unwrap_or_else(|| element.id().to_string()),
        })
    }
}

/// Node of an executable plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    Fragment(Fragment),
    NestedLoopJoin {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        attributes: Vec<JoinAttribute>,
        /// Explicitly cut fragments first, then generally cut ones
        after: Vec<Fragment>,
    },
    Empty,
}

impl PlanNode {
    pub fn from_partial(graph: &PatternGraph, plan: &PartialQueryPlan) -> PlanningResult<Self> {
        match plan {
            PartialQueryPlan::Tree(tree) => Ok(PlanNode::Fragment(Fragment::from_tree(graph, tree)?)),
            PartialQueryPlan::Join(join) => {
                let after = join
                    .direct_after()
                    .iter()
                    .chain(join.general_after())
                    .map(|tree| Fragment::from_tree(graph, tree))
                    .collect::<PlanningResult<Vec<_>>>()?;
                Ok(PlanNode::NestedLoopJoin {
                    left: Box::new(Self::from_partial(graph, join.left())?),
                    right: Box::new(Self::from_partial(graph, join.right())?),
                    attributes: join.attributes().to_vec(),
                    after,
                })
            }
            PartialQueryPlan::Empty => Ok(PlanNode::Empty),
        }
    }

    /// Elements bound by the node's output
    pub fn elements(&self) -> BTreeSet<ElementId> {
        match self {
            PlanNode::Fragment(fragment) => fragment.elements(),
            PlanNode::NestedLoopJoin {
                left, right, after, ..
            } => {
                let mut elements = left.elements();
                elements.extend(right.elements());
                for fragment in after {
                    elements.extend(fragment.elements());
                }
                elements
            }
            PlanNode::Empty => BTreeSet::new(),
        }
    }

    pub fn fragments(&self) -> Vec<&Fragment> {
        match self {
            PlanNode::Fragment(fragment) => vec![fragment],
            PlanNode::NestedLoopJoin {
                left, right, after, ..
            } => {
                let mut fragments = left.fragments();
                fragments.extend(right.fragments());
                fragments.extend(after.iter());
                fragments
            }
            PlanNode::Empty => Vec::new(),
        }
    }

    pub fn join_count(&self) -> usize {
        match self {
            PlanNode::NestedLoopJoin { left, right, .. } => 1 + left.join_count() + right.join_count(),
            PlanNode::Fragment(_) | PlanNode::Empty => 0,
        }
    }
}

/// Returned element and the external name it is reported under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub element: ElementId,
    pub name: String,
}

/// Plan handed to the execution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutablePlan {
    pub root: PlanNode,
    pub projection: Vec<Projection>,
}

impl ExecutablePlan {
    pub fn new(root: PlanNode, projection: Vec<Projection>) -> Self {
        Self { root, projection }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Render the plan as an indented tree
    pub fn explain(&self) -> String {
        let mut output = String::new();
        output.push_str("Execution Plan\n");
        output.push_str(&"=".repeat(50));
        output.push('\n');
        format_node(&self.root, &mut output, "", "");

        if !self.projection.is_empty() {
            let returned: Vec<String> = self
                .projection
                .iter()
                .map(|p| format!("{}:{}", p.name, p.element))
                .collect();
            output.push_str(&format!("Return {}\n", returned.join(", ")));
        }
        output
    }
}

fn format_node(node: &PlanNode, output: &mut String, first: &str, rest: &str) {
    match node {
        PlanNode::Fragment(fragment) => format_fragment(fragment, output, first, rest),
        PlanNode::NestedLoopJoin {
            left,
            right,
            attributes,
            after,
        } => {
            let on: Vec<String> = attributes.iter().map(|a| a.to_string()).collect();
            output.push_str(&format!("{}NestedLoopJoin on [{}]\n", first, on.join(", ")));

            let has_after = !after.is_empty();
            format_node(left, output, &format!("{}├── ", rest), &format!("{}│   ", rest));
            let (right_first, right_rest) = if has_after {
                ("├── ", "│   ")
            } else {
                ("└── ", "    ")
            };
            format_node(
                right,
                output,
                &format!("{}{}", rest, right_first),
                &format!("{}{}", rest, right_rest),
            );
            for (i, fragment) in after.iter().enumerate() {
                let last = i + 1 == after.len();
                let (f, r) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
                format_fragment(
                    fragment,
                    output,
                    &format!("{}{}After ", rest, f),
                    &format!("{}{}", rest, r),
                );
            }
        }
        PlanNode::Empty => output.push_str(&format!("{}Empty\n", first)),
    }
}

fn format_fragment(fragment: &Fragment, output: &mut String, first: &str, rest: &str) {
    let start = match fragment.start() {
        Some(FragmentStart::Scan(element)) => format!("Fragment from scan of {}", element),
        Some(FragmentStart::FromBinding(element)) => format!("Fragment from binding {}", element),
        None => "Fragment".to_string(),
    };
    output.push_str(&format!("{}{}\n", first, start));

    for step in &fragment.steps {
        let access = match step.access {
            Access::Scan => format!("Scan {}[{}]", step.kind, step.binding),
            Access::Walk { source, direction } => format!(
                "Walk {}[{}] from {} ({})",
                step.kind, step.binding, source, direction
            ),
        };
        let mut filters = Vec::new();
        if let Some(label) = &step.label {
            filters.push(label.to_string());
        }
        filters.extend(step.properties.iter().map(|p| p.to_string()));
        let filters = if filters.is_empty() {
            String::new()
        } else {
            format!(" {{{}}}", filters.join(", "))
        };
        output.push_str(&format!(
            "{}    {}{} → {}\n",
            rest,
            access,
            filters,
            format_cost(step.estimated_size)
        ));
    }
}
