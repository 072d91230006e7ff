//! Consistency checks over recorded preferences.
//!
//! Raters are not guaranteed to be transitive. The adaptive sort does not
//! refuse such input; these checks let callers see how far a finished order
//! is from the recorded judgments and where the cycles are.

use std::collections::BTreeMap;

use super::oracle::JudgmentIndex;
use crate::types::Slice;

/// A set of slices whose strict preferences form at least one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceCycle {
    /// Members of the cycle, in structural order.
    pub slices: Vec<Slice>,
}

/// Count strict judgments that `order` contradicts.
///
/// `order` is ascending: a slice that won a comparison must come after the
/// slice it beat. Judgments on slices missing from `order` are ignored.
pub fn order_violations(order: &[Slice], index: &JudgmentIndex) -> usize {
    let position: BTreeMap<&Slice, usize> = order.iter().enumerate().map(|(i, s)| (s, i)).collect();

    index
        .decisive()
        .filter(|(winner, loser)| match (position.get(winner), position.get(loser)) {
            (Some(w), Some(l)) => w < l,
            _ => false,
        })
        .count()
}

/// Find groups of slices locked in preference cycles (A > B > C > A).
///
/// Returns the strongly connected components of the "beats" graph that have
/// more than one member, ordered by their smallest slice. Draws add no edges.
pub fn find_cycles(index: &JudgmentIndex) -> Vec<PreferenceCycle> {
    let mut graph: BTreeMap<&Slice, Vec<&Slice>> = BTreeMap::new();
    for (winner, loser) in index.decisive() {
        graph.entry(winner).or_default().push(loser);
        graph.entry(loser).or_default();
    }

    let mut tarjan = Tarjan::new(&graph);
    for &node in graph.keys() {
        if !tarjan.index.contains_key(node) {
            tarjan.visit(node);
        }
    }

    let mut cycles: Vec<PreferenceCycle> = tarjan
        .components
        .into_iter()
        .filter(|c| c.len() > 1)
        .map(|mut c| {
            c.sort();
            PreferenceCycle {
                slices: c.into_iter().cloned().collect(),
            }
        })
        .collect();
    cycles.sort_by(|a, b| a.slices.cmp(&b.slices));
    cycles
}

struct Tarjan<'a> {
    graph: &'a BTreeMap<&'a Slice, Vec<&'a Slice>>,
    next: usize,
    index: BTreeMap<&'a Slice, usize>,
    lowlink: BTreeMap<&'a Slice, usize>,
    stack: Vec<&'a Slice>,
    on_stack: BTreeMap<&'a Slice, bool>,
    components: Vec<Vec<&'a Slice>>,
}

impl<'a> Tarjan<'a> {
    fn new(graph: &'a BTreeMap<&'a Slice, Vec<&'a Slice>>) -> Self {
        Self {
            graph,
            next: 0,
            index: BTreeMap::new(),
            lowlink: BTreeMap::new(),
            stack: Vec::new(),
            on_stack: BTreeMap::new(),
            components: Vec::new(),
        }
    }

    fn visit(&mut self, node: &'a Slice) {
        self.index.insert(node, self.next);
        self.lowlink.insert(node, self.next);
        self.next += 1;
        self.stack.push(node);
        self.on_stack.insert(node, true);

        let graph = self.graph;
        for &succ in graph.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            if !self.index.contains_key(succ) {
                self.visit(succ);
                let low = self.lowlink[node].min(self.lowlink[succ]);
                self.lowlink.insert(node, low);
            } else if self.on_stack.get(succ).copied().unwrap_or(false) {
                let low = self.lowlink[node].min(self.index[succ]);
                self.lowlink.insert(node, low);
            }
        }

        if self.lowlink[node] == self.index[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.insert(member, false);
                component.push(member);
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}
