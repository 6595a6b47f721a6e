// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Join planning
//!
//! Partial plans are folded pairwise into [`Join`]s. A join matches its two
//! sides on the elements they share, and rearranges both sides first:
//! branches unrelated to the join are moved after it (general cut), and node
//! leaves on the join border are moved after it too, with the join matching
//! on the edge they would have been walked from instead (explicit cut).

use crate::pattern::element::{Direction, ElementId};
use crate::plan::dependency_tree::DependencyTree;
use crate::plan::retrieval::DependentRetrieval;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How a join side resolves the value it compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchOn {
    /// The bound value itself
    Element,
    /// End node of the bound edge
    In,
    /// Start node of the bound edge
    Out,
}

impl From<Direction> for MatchOn {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => MatchOn::In,
            Direction::Out => MatchOn::Out,
        }
    }
}

impl fmt::Display for MatchOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOn::Element => write!(f, "ELEMENT"),
            MatchOn::In => write!(f, "IN"),
            MatchOn::Out => write!(f, "OUT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPosition {
    Left,
    Right,
}

/// Equality condition between one value of each join side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinAttribute {
    pub left: ElementId,
    pub left_match: MatchOn,
    pub right: ElementId,
    pub right_match: MatchOn,
}

impl JoinAttribute {
    pub fn new(left: ElementId, left_match: MatchOn, right: ElementId, right_match: MatchOn) -> Self {
        Self {
            left,
            left_match,
            right,
            right_match,
        }
    }

    /// Both sides bind `element`
    pub fn on(element: ElementId) -> Self {
        Self::new(element, MatchOn::Element, element, MatchOn::Element)
    }

    pub fn elements(&self) -> [ElementId; 2] {
        [self.left, self.right]
    }

    /// Match one side through the source of `detached` instead of its
    /// element, if that side currently compares the element itself.
    pub fn reformat(&mut self, detached: &DependentRetrieval, position: JoinPosition) {
        let (element, match_on) = match position {
            JoinPosition::Left => (&mut self.left, &mut self.left_match),
            JoinPosition::Right => (&mut self.right, &mut self.right_match),
        };
        if *element == detached.element() && *match_on == MatchOn::Element {
            *element = detached.source();
            *match_on = MatchOn::from(detached.direction());
        }
    }
}

impl fmt::Display for JoinAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}={}.{}",
            self.left, self.left_match, self.right, self.right_match
        )
    }
}

/// Composable plan fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialQueryPlan {
    Tree(DependencyTree),
    Join(Box<Join>),
    /// Covers nothing; joins as the identity
    Empty,
}

impl PartialQueryPlan {
    pub fn elements(&self) -> BTreeSet<ElementId> {
        match self {
            PartialQueryPlan::Tree(tree) => tree.elements(),
            PartialQueryPlan::Join(join) => join.elements(),
            PartialQueryPlan::Empty => BTreeSet::new(),
        }
    }

    /// Whether the fragment may run after a join instead of feeding it
    pub fn is_movable(&self) -> bool {
        match self {
            PartialQueryPlan::Tree(tree) => tree.is_movable(),
            PartialQueryPlan::Join(_) | PartialQueryPlan::Empty => false,
        }
    }

    pub fn general_cut(&mut self, keep: &BTreeSet<ElementId>) -> Vec<DependencyTree> {
        match self {
            PartialQueryPlan::Tree(tree) => tree.general_cut(keep),
            PartialQueryPlan::Join(join) => join.general_cut(keep),
            PartialQueryPlan::Empty => Vec::new(),
        }
    }

    pub fn explicit_cut(&mut self, border: &BTreeSet<ElementId>) -> Vec<DependencyTree> {
        match self {
            PartialQueryPlan::Tree(tree) => tree.explicit_cut(border),
            // the left side of a join has already been rearranged
            PartialQueryPlan::Join(_) | PartialQueryPlan::Empty => Vec::new(),
        }
    }
}

impl fmt::Display for PartialQueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialQueryPlan::Tree(tree) => write!(f, "{}", tree),
            PartialQueryPlan::Join(join) => write!(f, "{}", join),
            PartialQueryPlan::Empty => write!(f, "{{}}"),
        }
    }
}

/// Join of two partial plans, plus the fragments that run after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    left: PartialQueryPlan,
    right: PartialQueryPlan,
    attributes: Vec<JoinAttribute>,
    /// Border leaves detached by the explicit cut
    direct_after: Vec<DependencyTree>,
    /// Branches detached by the general cut
    general_after: Vec<DependencyTree>,
}

impl Join {
    /// Join `left` and `right` on their shared elements, rearranging both
    /// sides when `rearrange` is set
    pub fn new(left: PartialQueryPlan, right: PartialQueryPlan, rearrange: bool) -> Self {
        let right_elements = right.elements();
        let attributes = left
            .elements()
            .intersection(&right_elements)
            .map(|element| JoinAttribute::on(*element))
            .collect();

        let mut join = Self {
            left,
            right,
            attributes,
            direct_after: Vec::new(),
            general_after: Vec::new(),
        };
        if rearrange {
            join.general_rearrange();
            join.explicit_rearrange();
        }
        log::debug!("Planned {}", join);
        join
    }

    fn attribute_elements(&self) -> BTreeSet<ElementId> {
        self.attributes.iter().flat_map(JoinAttribute::elements).collect()
    }

    /// Move fragments unrelated to the join after it
    fn general_rearrange(&mut self) {
        if self.attributes.is_empty() {
            for side in [&mut self.left, &mut self.right] {
                match std::mem::replace(side, PartialQueryPlan::Empty) {
                    PartialQueryPlan::Tree(tree) if tree.is_movable() => {
                        self.general_after.push(tree)
                    }
                    other => *side = other,
                }
            }
            return;
        }

        let keep = self.attribute_elements();
        let mut cut = self.left.general_cut(&keep);
        cut.extend(self.right.general_cut(&keep));
        self.general_after.extend(cut);
    }

    /// Detach border node leaves and match through their source edges.
    ///
    /// A side that still binds a detached element elsewhere keeps matching on
    /// the element itself, since its own binding would otherwise go unchecked.
    fn explicit_rearrange(&mut self) {
        let border = self.attribute_elements();
        let left_cut = self.left.explicit_cut(&border);
        let right_cut = self.right.explicit_cut(&border);
        let left_elements = self.left.elements();
        let right_elements = self.right.elements();

        for (cut, position, remaining) in [
            (&left_cut, JoinPosition::Left, &left_elements),
            (&right_cut, JoinPosition::Right, &right_elements),
        ] {
            for tree in cut {
                if remaining.contains(&tree.element()) {
                    continue;
                }
                if let Some(root) = tree.root().as_dependent() {
                    for attribute in &mut self.attributes {
                        attribute.reformat(root, position);
                    }
                }
            }
        }

        let mut seen = BTreeSet::new();
        self.attributes.retain(|attribute| seen.insert(*attribute));

        self.direct_after.extend(left_cut);
        self.direct_after.extend(right_cut);
    }

    pub fn left(&self) -> &PartialQueryPlan {
        &self.left
    }

    pub fn right(&self) -> &PartialQueryPlan {
        &self.right
    }

    pub fn attributes(&self) -> &[JoinAttribute] {
        &self.attributes
    }

    pub fn direct_after(&self) -> &[DependencyTree] {
        &self.direct_after
    }

    pub fn general_after(&self) -> &[DependencyTree] {
        &self.general_after
    }

    pub fn elements(&self) -> BTreeSet<ElementId> {
        let mut elements = self.left.elements();
        elements.extend(self.right.elements());
        for tree in self.direct_after.iter().chain(&self.general_after) {
            elements.extend(tree.elements());
        }
        elements
    }

    /// Cut only from the fragments already scheduled after this join
    pub fn general_cut(&mut self, keep: &BTreeSet<ElementId>) -> Vec<DependencyTree> {
        let mut cut = Vec::new();
        let mut kept = Vec::new();
        for mut tree in std::mem::take(&mut self.general_after) {
            if tree.elements().is_disjoint(keep) {
                cut.push(tree);
            } else {
                cut.extend(tree.general_cut(keep));
                kept.push(tree);
            }
        }
        self.general_after = kept;
        cut
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes: Vec<String> = self.attributes.iter().map(|a| a.to_string()).collect();
        let after: Vec<String> = self
            .direct_after
            .iter()
            .chain(&self.general_after)
            .map(|t| t.to_string())
            .collect();
        write!(
            f,
            "Join on {{{}}} trees {{{}, {}}} then {{{}}}",
            attributes.join(", "),
            self.left,
            self.right,
            after.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::element::ElementKind;
    use crate::plan::retrieval::{DirectRetrieval, Retrieval};

    fn id(raw: u64) -> ElementId {
        ElementId::new(raw)
    }

    fn direct(element: u64, kind: ElementKind) -> DependencyTree {
        DependencyTree::leaf(Retrieval::Direct(DirectRetrieval::new(id(element))), kind)
    }

    fn dependent(element: u64, source: u64, direction: Direction, kind: ElementKind) -> DependencyTree {
        DependencyTree::leaf(
            Retrieval::Dependent(DependentRetrieval::new(id(element), id(source), direction)),
            kind,
        )
    }

    fn with_children(tree: DependencyTree, children: Vec<DependencyTree>) -> DependencyTree {
        DependencyTree::new(tree.root().clone(), tree.kind(), children)
    }

    #[test]
    fn test_reformat_only_touches_its_side() {
        let detached = DependentRetrieval::new(id(3), id(2), Direction::In);
        let mut attribute = JoinAttribute::on(id(3));

        attribute.reformat(&detached, JoinPosition::Left);
        assert_eq!(attribute, JoinAttribute::new(id(2), MatchOn::In, id(3), MatchOn::Element));

        // the left side no longer compares element 3
        attribute.reformat(&detached, JoinPosition::Left);
        assert_eq!(attribute.left, id(2));

        let other = DependentRetrieval::new(id(3), id(4), Direction::Out);
        attribute.reformat(&other, JoinPosition::Right);
        assert_eq!(attribute, JoinAttribute::new(id(2), MatchOn::In, id(4), MatchOn::Out));
        assert_eq!(attribute.to_string(), "2.IN=4.OUT");
    }

    #[test]
    fn test_disjoint_anchors_join_without_attributes() {
        let join = Join::new(
            PartialQueryPlan::Tree(direct(0, ElementKind::Node)),
            PartialQueryPlan::Tree(direct(1, ElementKind::Node)),
            true,
        );
        assert!(join.attributes().is_empty());
        assert!(join.general_after().is_empty());
        assert!(matches!(join.left(), PartialQueryPlan::Tree(_)));
        assert!(matches!(join.right(), PartialQueryPlan::Tree(_)));
    }

    #[test]
    fn test_movable_sides_without_shared_elements_run_after() {
        let join = Join::new(
            PartialQueryPlan::Tree(direct(0, ElementKind::Node)),
            PartialQueryPlan::Tree(dependent(5, 4, Direction::Out, ElementKind::Edge)),
            true,
        );
        assert_eq!(join.right(), &PartialQueryPlan::Empty);
        assert_eq!(join.general_after().len(), 1);
        assert_eq!(join.elements(), [id(0), id(5)].into_iter().collect::<BTreeSet<_>>());
        assert!(!PartialQueryPlan::Join(Box::new(join)).is_movable());
    }

    /// left: (0)-[1]->(2 closure leaf), plus branch -[3]->(4)
    /// right: (2) anchor
    fn shared_leaf_join(rearrange: bool) -> Join {
        let closure = dependent(2, 1, Direction::In, ElementKind::Node);
        let edge = with_children(dependent(1, 0, Direction::In, ElementKind::Edge), vec![closure]);
        let far = dependent(4, 3, Direction::In, ElementKind::Node);
        let branch = with_children(dependent(3, 0, Direction::In, ElementKind::Edge), vec![far]);
        let left = with_children(direct(0, ElementKind::Node), vec![edge, branch]);

        Join::new(
            PartialQueryPlan::Tree(left),
            PartialQueryPlan::Tree(direct(2, ElementKind::Node)),
            rearrange,
        )
    }

    #[test]
    fn test_shared_leaf_is_cut_and_reformatted() {
        let join = shared_leaf_join(true);

        assert_eq!(
            join.attributes(),
            &[JoinAttribute::new(id(1), MatchOn::In, id(2), MatchOn::Element)]
        );
        assert_eq!(join.direct_after().len(), 1);
        assert_eq!(join.direct_after()[0].element(), id(2));
        assert_eq!(join.general_after().len(), 1);
        assert_eq!(
            join.general_after()[0].elements(),
            [id(3), id(4)].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            join.left().elements(),
            [id(0), id(1)].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(join.elements(), (0..5).map(id).collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_side_still_binding_the_cut_element_matches_on_it() {
        // left: (0)-[1]->(2 leaf); right: (2)-[3]->(2 leaf), a self-loop
        let left = with_children(
            direct(0, ElementKind::Node),
            vec![with_children(
                dependent(1, 0, Direction::In, ElementKind::Edge),
                vec![dependent(2, 1, Direction::In, ElementKind::Node)],
            )],
        );
        let right = with_children(
            direct(2, ElementKind::Node),
            vec![with_children(
                dependent(3, 2, Direction::In, ElementKind::Edge),
                vec![dependent(2, 3, Direction::In, ElementKind::Node)],
            )],
        );

        let join = Join::new(PartialQueryPlan::Tree(left), PartialQueryPlan::Tree(right), true);
        assert_eq!(
            join.attributes(),
            &[JoinAttribute::new(id(1), MatchOn::In, id(2), MatchOn::Element)]
        );
        assert_eq!(join.direct_after().len(), 2);
        assert!(join.right().elements().contains(&id(2)));
    }

    #[test]
    fn test_reformatted_attributes_are_deduplicated() {
        // (0)-[1]->(2 leaf) on the left, (2) anchor on the right
        let left = with_children(
            direct(0, ElementKind::Node),
            vec![with_children(
                dependent(1, 0, Direction::In, ElementKind::Edge),
                vec![dependent(2, 1, Direction::In, ElementKind::Node)],
            )],
        );
        let mut join = Join {
            left: PartialQueryPlan::Tree(left),
            right: PartialQueryPlan::Tree(direct(2, ElementKind::Node)),
            attributes: vec![JoinAttribute::on(id(2)), JoinAttribute::on(id(2))],
            direct_after: Vec::new(),
            general_after: Vec::new(),
        };

        join.explicit_rearrange();
        assert_eq!(
            join.attributes(),
            &[JoinAttribute::new(id(1), MatchOn::In, id(2), MatchOn::Element)]
        );
        assert_eq!(join.direct_after().len(), 1);
    }

    #[test]
    fn test_no_rearrangement() {
        let join = shared_leaf_join(false);
        assert_eq!(join.attributes(), &[JoinAttribute::on(id(2))]);
        assert!(join.direct_after().is_empty());
        assert!(join.general_after().is_empty());
        assert_eq!(join.left().elements(), (0..5).map(id).collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_join_general_cut_moves_its_after_fragments() {
        let mut join = shared_leaf_join(true);
        let keep: BTreeSet<ElementId> = [id(0)].into_iter().collect();
        let cut = join.general_cut(&keep);
        assert_eq!(cut.len(), 1);
        assert!(join.general_after().is_empty());

        let mut plan = PartialQueryPlan::Join(Box::new(join));
        assert!(plan.explicit_cut(&keep).is_empty());
    }
}
