use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::ir::bridge::cfg::ControlFlowGraph;
use crate::ir::bridge::instruction::{Instruction, Terminator};
use crate::ir::bridge::value::{BlockLabel, InstId};

/// A program point: either a body instruction or a block terminator
#[derive(Copy, Clone, Debug)]
pub enum Statement<'a> {
    Inst(&'a Instruction),
    Term(&'a Terminator),
}

impl Statement<'_> {
    pub fn index(&self) -> InstId {
        match self {
            Self::Inst(inst) => inst.index,
            Self::Term(term) => term.index,
        }
    }
}

/// A control-flow edge between two instructions
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug)]
pub struct Edge {
    pub src: InstId,
    pub dst: InstId,
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

/// Handle of an instruction in the per-function arena
pub type Position = usize;

/// Handle of an edge in the per-function arena
pub type EdgeId = usize;

/// Instruction-level view of a control-flow graph
///
/// Every instruction gets a dense position and every control-flow edge a
/// dense id, so that analysis states can live in plain vectors. Within a
/// block, each instruction flows into the next one; across blocks, the
/// terminator of a predecessor flows into the first instruction of the
/// successor.
pub struct InstIndex<'a> {
    stmts: Vec<Statement<'a>>,
    positions: BTreeMap<InstId, Position>,
    edges: Vec<Edge>,
    links: Vec<(Position, Position)>,
    incoming: Vec<Vec<EdgeId>>,
    outgoing: Vec<Vec<EdgeId>>,
    entry: Position,
    order: Vec<Position>,
}

impl<'a> InstIndex<'a> {
    pub fn build(cfg: &'a ControlFlowGraph) -> Self {
        let mut stmts = vec![];
        let mut positions = BTreeMap::new();
        let mut block_span: BTreeMap<BlockLabel, (Position, Position)> = BTreeMap::new();

        // assign positions, block by block
        for block in cfg.blocks() {
            let first = stmts.len();
            for inst in block.get_instructions() {
                positions.insert(inst.index, stmts.len());
                stmts.push(Statement::Inst(inst));
            }
            let term = block.get_terminator();
            positions.insert(term.index, stmts.len());
            stmts.push(Statement::Term(term));
            block_span.insert(block.label(), (first, stmts.len() - 1));
        }

        let mut edges = vec![];
        let mut links = vec![];
        let mut incoming = vec![vec![]; stmts.len()];
        let mut outgoing = vec![vec![]; stmts.len()];
        let mut link = |src: Position, dst: Position| {
            let id = edges.len();
            edges.push(Edge {
                src: stmts[src].index(),
                dst: stmts[dst].index(),
            });
            links.push((src, dst));
            outgoing[src].push(id);
            incoming[dst].push(id);
        };

        for block in cfg.blocks() {
            let (first, last) = block_span[&block.label()];

            // fall-through within the block
            for pos in first..last {
                link(pos, pos + 1);
            }

            // transfer of control across blocks
            for succ in cfg.get_successors(&block.label()) {
                let (succ_first, _) = block_span[&succ];
                link(last, succ_first);
            }
        }

        // structural visiting order
        let mut order = vec![];
        for label in cfg.reverse_post_order() {
            let (first, last) = block_span[&label];
            order.extend(first..=last);
        }

        let entry = block_span[&cfg.entry()].0;
        Self {
            stmts,
            positions,
            edges,
            links,
            incoming,
            outgoing,
            entry,
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn stmt(&self, pos: Position) -> &Statement<'a> {
        &self.stmts[pos]
    }

    pub fn position(&self, index: &InstId) -> Option<Position> {
        self.positions.get(index).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    /// Source and destination positions of an edge
    pub fn endpoints(&self, id: EdgeId) -> (Position, Position) {
        self.links[id]
    }

    pub fn incoming(&self, pos: Position) -> &[EdgeId] {
        &self.incoming[pos]
    }

    pub fn outgoing(&self, pos: Position) -> &[EdgeId] {
        &self.outgoing[pos]
    }

    /// The first instruction of the entry block
    pub fn entry(&self) -> Position {
        self.entry
    }

    /// Every position, in reverse post-order of the block graph
    pub fn order(&self) -> &[Position] {
        &self.order
    }
}
