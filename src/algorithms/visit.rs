//! Depth-first traversal with pluggable visitors.
//!
//! The traversal is iterative (explicit stack) and filtered by an
//! [`ArcFilter`]; visitors classify arcs as tree, back, or forward/cross
//! edges. [`TopOrderVisitor`] derives a topological numbering,
//! [`SccVisitor`] strongly connected components plus accessibility and
//! coaccessibility.

use super::arc_filter::ArcFilter;
use crate::fst::{Arc, ArcsIter, ExpandedFst, StateId};
use crate::semiring::Semiring;

/// Callbacks invoked by [`dfs_visit`].
pub trait Visitor<W: Semiring> {
    /// Called once before the traversal with the state count and start.
    fn init_visit(&mut self, _num_states: usize, _start: Option<StateId>) {}

    /// Called when `state` is discovered under root `root`. Returning false
    /// skips the expansion of this state's arcs.
    fn init_state(&mut self, state: StateId, root: StateId) -> bool;

    /// Called for an arc to an undiscovered state (before it is visited).
    fn tree_arc(&mut self, _state: StateId, _arc: &Arc<W>) {}

    /// Called for an arc to a state on the current DFS path.
    fn back_arc(&mut self, _state: StateId, _arc: &Arc<W>) {}

    /// Called for an arc to an already finished state.
    fn forward_or_cross_arc(&mut self, _state: StateId, _arc: &Arc<W>) {}

    /// Called when `state`'s expansion is complete. `parent` is its DFS
    /// tree parent, if any.
    fn finish_state(&mut self, _state: StateId, _parent: Option<StateId>) {}

    /// Called once after the traversal.
    fn finish_visit(&mut self) {}
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Grey,
    Black,
}

/// Depth-first visit of every state, the start state's tree first.
pub fn dfs_visit<W, F, V, AF>(fst: &F, visitor: &mut V, filter: &AF)
where
    W: Semiring,
    F: ExpandedFst<W>,
    V: Visitor<W>,
    AF: ArcFilter<W>,
{
    let n = fst.num_states();
    visitor.init_visit(n, fst.start());
    let start = match fst.start() {
        Some(s) => s,
        None => {
            visitor.finish_visit();
            return;
        }
    };
    let mut color = vec![Color::White; n];

    let roots = std::iter::once(start).chain(0..n);
    for root in roots {
        if color[root] != Color::White {
            continue;
        }
        visit_tree(fst, visitor, filter, &mut color, root);
    }
    visitor.finish_visit();
}

fn visit_tree<W, F, V, AF>(
    fst: &F,
    visitor: &mut V,
    filter: &AF,
    color: &mut [Color],
    root: StateId,
) where
    W: Semiring,
    F: ExpandedFst<W>,
    V: Visitor<W>,
    AF: ArcFilter<W>,
{
    let mut stack: Vec<(StateId, Option<StateId>, ArcsIter<W>)> = Vec::new();
    color[root] = Color::Grey;
    let expand = visitor.init_state(root, root);
    let arcs = if expand {
        fst.arcs(root)
    } else {
        ArcsIter::new(crate::fst::SharedArcs::new(Vec::new()))
    };
    stack.push((root, None, arcs));

    while let Some((state, parent, iter)) = stack.last_mut() {
        let state = *state;
        let parent = *parent;
        match iter.next() {
            None => {
                color[state] = Color::Black;
                visitor.finish_state(state, parent);
                stack.pop();
            }
            Some(arc) => {
                if !filter.keep(&arc) {
                    continue;
                }
                match color[arc.nextstate] {
                    Color::White => {
                        visitor.tree_arc(state, &arc);
                        let next = arc.nextstate;
                        color[next] = Color::Grey;
                        let expand = visitor.init_state(next, root);
                        let arcs = if expand {
                            fst.arcs(next)
                        } else {
                            ArcsIter::new(crate::fst::SharedArcs::new(Vec::new()))
                        };
                        stack.push((next, Some(state), arcs));
                    }
                    Color::Grey => visitor.back_arc(state, &arc),
                    Color::Black => visitor.forward_or_cross_arc(state, &arc),
                }
            }
        }
    }
}

/// Computes a topological numbering of the filtered graph.
#[derive(Debug, Default)]
pub struct TopOrderVisitor {
    /// `order[s]` is the topological position of state `s` (valid only when
    /// `acyclic`).
    pub order: Vec<usize>,
    /// True if the filtered graph contained no cycle.
    pub acyclic: bool,
    finish: Vec<StateId>,
}

impl TopOrderVisitor {
    /// Creates a fresh visitor.
    pub fn new() -> Self {
        TopOrderVisitor {
            order: Vec::new(),
            acyclic: true,
            finish: Vec::new(),
        }
    }
}

impl<W: Semiring> Visitor<W> for TopOrderVisitor {
    fn init_visit(&mut self, num_states: usize, _start: Option<StateId>) {
        self.order = vec![0; num_states];
        self.acyclic = true;
        self.finish.clear();
    }

    fn init_state(&mut self, _state: StateId, _root: StateId) -> bool {
        true
    }

    fn back_arc(&mut self, _state: StateId, _arc: &Arc<W>) {
        self.acyclic = false;
    }

    fn finish_state(&mut self, state: StateId, _parent: Option<StateId>) {
        self.finish.push(state);
    }

    fn finish_visit(&mut self) {
        if self.acyclic {
            let n = self.finish.len();
            for (i, &s) in self.finish.iter().enumerate() {
                self.order[s] = n - 1 - i;
            }
        }
    }
}

/// Computes strongly connected components, accessibility, and
/// coaccessibility of the filtered graph.
///
/// Component ids are topologically ordered: for every arc `s -> t` not
/// inside a component, `scc[s] < scc[t]`.
#[derive(Debug)]
pub struct SccVisitor {
    /// Component id per state.
    pub scc: Vec<usize>,
    /// True if the state is reachable from the start.
    pub access: Vec<bool>,
    /// True if the state reaches a final state.
    pub coaccess: Vec<bool>,
    /// Number of components found.
    pub nscc: usize,
    /// True if some component has more than one state or a self-loop.
    pub cyclic: bool,
    /// True if a cycle passes through the start state.
    pub start_cyclic: bool,

    is_final: Vec<bool>,
    start: Option<StateId>,
    dfnumber: Vec<usize>,
    lowlink: Vec<usize>,
    onstack: Vec<bool>,
    scc_stack: Vec<StateId>,
    count: usize,
    under_start: bool,
}

impl SccVisitor {
    /// Creates a visitor; finality per state must be supplied so cycles can
    /// pool coaccessibility.
    pub fn new<W: Semiring, F: ExpandedFst<W>>(fst: &F) -> Self {
        let is_final = fst
            .states()
            .map(|s| !fst.final_weight(s).is_zero())
            .collect();
        SccVisitor {
            scc: Vec::new(),
            access: Vec::new(),
            coaccess: Vec::new(),
            nscc: 0,
            cyclic: false,
            start_cyclic: false,
            is_final,
            start: None,
            dfnumber: Vec::new(),
            lowlink: Vec::new(),
            onstack: Vec::new(),
            scc_stack: Vec::new(),
            count: 0,
            under_start: false,
        }
    }
}

impl<W: Semiring> Visitor<W> for SccVisitor {
    fn init_visit(&mut self, num_states: usize, start: Option<StateId>) {
        self.scc = vec![usize::MAX; num_states];
        self.access = vec![false; num_states];
        self.coaccess = vec![false; num_states];
        self.dfnumber = vec![usize::MAX; num_states];
        self.lowlink = vec![usize::MAX; num_states];
        self.onstack = vec![false; num_states];
        self.scc_stack.clear();
        self.count = 0;
        self.nscc = 0;
        self.cyclic = false;
        self.start_cyclic = false;
        self.start = start;
    }

    fn init_state(&mut self, state: StateId, root: StateId) -> bool {
        if state == root {
            // Entering a new DFS tree; only the start's tree is accessible.
            self.under_start = Some(state) == self.start;
        }
        self.access[state] = self.under_start;
        self.coaccess[state] = self.is_final[state];
        self.dfnumber[state] = self.count;
        self.lowlink[state] = self.count;
        self.count += 1;
        self.onstack[state] = true;
        self.scc_stack.push(state);
        true
    }

    fn back_arc(&mut self, state: StateId, arc: &Arc<W>) {
        let t = arc.nextstate;
        if self.dfnumber[t] < self.lowlink[state] {
            self.lowlink[state] = self.dfnumber[t];
        }
        if self.coaccess[t] {
            self.coaccess[state] = true;
        }
        self.cyclic = true;
        if Some(t) == self.start {
            self.start_cyclic = true;
        }
    }

    fn forward_or_cross_arc(&mut self, state: StateId, arc: &Arc<W>) {
        let t = arc.nextstate;
        if self.onstack[t] && self.dfnumber[t] < self.lowlink[state] {
            self.lowlink[state] = self.dfnumber[t];
        }
        if self.coaccess[t] {
            self.coaccess[state] = true;
        }
    }

    fn finish_state(&mut self, state: StateId, parent: Option<StateId>) {
        if self.lowlink[state] == self.dfnumber[state] {
            // `state` is the root of a component; pop its members and pool
            // coaccessibility across them.
            let mut members = Vec::new();
            let mut pooled = false;
            loop {
                let member = self.scc_stack.pop().expect("scc stack underflow");
                self.onstack[member] = false;
                pooled |= self.coaccess[member];
                members.push(member);
                if member == state {
                    break;
                }
            }
            if members.len() > 1 {
                self.cyclic = true;
                if members.iter().any(|&m| Some(m) == self.start) {
                    self.start_cyclic = true;
                }
            }
            for &member in &members {
                self.scc[member] = self.nscc;
                if pooled {
                    self.coaccess[member] = true;
                }
            }
            self.nscc += 1;
        }
        if let Some(p) = parent {
            if self.lowlink[state] < self.lowlink[p] {
                self.lowlink[p] = self.lowlink[state];
            }
            if self.coaccess[state] {
                self.coaccess[p] = true;
            }
        }
    }

    fn finish_visit(&mut self) {
        // Tarjan identifies sinks first; flip ids into topological order.
        let nscc = self.nscc;
        for id in self.scc.iter_mut() {
            *id = nscc - 1 - *id;
        }
    }
}
