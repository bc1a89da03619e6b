use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use petgraph::Direction;

use crate::error::{EngineError, EngineResult};
use crate::ir::adapter;
use crate::ir::bridge::instruction::{Context, Inst, Instruction, Term, Terminator};
use crate::ir::bridge::typing::{Type, TypeRegistry};
use crate::ir::bridge::value::BlockLabel;

/// An adapted representation of a basic block
#[derive(Eq, PartialEq, Debug)]
pub struct Block {
    /// label of the block
    label: BlockLabel,
    /// sequence of instructions
    sequence: Vec<Instruction>,
    /// terminator of the block
    terminator: Terminator,
}

impl Block {
    pub fn label(&self) -> BlockLabel {
        self.label
    }

    pub fn get_instructions(&self) -> &[Instruction] {
        &self.sequence
    }

    pub fn get_terminator(&self) -> &Terminator {
        &self.terminator
    }
}

/// A representation of CFG edges
#[derive(Eq, PartialEq, Debug)]
pub enum Edge {
    Goto,
    Branch(bool),
    Switch(BTreeSet<Option<u64>>),
}

/// An adapted representation of a control-flow graph
pub struct ControlFlowGraph {
    graph: DiGraph<Block, Edge>,
    /// block label to index in the graph
    block_label_to_index: BTreeMap<BlockLabel, NodeIndex>,
    /// the block where execution starts
    entry: BlockLabel,
}

impl ControlFlowGraph {
    fn insert_edge(
        edges: &mut BTreeMap<(BlockLabel, BlockLabel), Edge>,
        src: BlockLabel,
        dst: BlockLabel,
        edge: Edge,
    ) -> EngineResult<()> {
        if edges.insert((src, dst), edge).is_some() {
            return Err(EngineError::InvariantViolation(
                "duplicated edge in CFG".into(),
            ));
        }
        Ok(())
    }

    fn insert_switch_edge(
        edges: &mut BTreeMap<(BlockLabel, BlockLabel), Edge>,
        src: BlockLabel,
        dst: BlockLabel,
        case: Option<u64>,
    ) -> EngineResult<()> {
        let edge_switch = edges
            .entry((src, dst))
            .or_insert_with(|| Edge::Switch(BTreeSet::new()));
        match edge_switch {
            Edge::Switch(set) => {
                if !set.insert(case) {
                    return Err(EngineError::InvariantViolation(
                        "duplicated edge in CFG".into(),
                    ));
                }
            }
            Edge::Goto | Edge::Branch(..) => {
                return Err(EngineError::InvariantViolation(
                    "unexpected edge type for switch statement".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn build(
        typing: &TypeRegistry,
        params: &[Type],
        ret_ty: Option<&Type>,
        blocks: &[adapter::cfg::Block],
    ) -> EngineResult<Self> {
        use adapter::cfg::Block as AdaptedBlock;

        let entry: BlockLabel = match blocks.first() {
            None => {
                return Err(EngineError::InvariantViolation(
                    "a control-flow graph needs at least one block".into(),
                ));
            }
            Some(block) => block.label.into(),
        };

        // construct the parameter map
        let arg_labels: BTreeMap<_, _> = params.iter().cloned().enumerate().collect();

        // construct block labels
        let block_labels: BTreeSet<_> = blocks.iter().map(|b| b.label).collect();
        if block_labels.len() != blocks.len() {
            return Err(EngineError::InvariantViolation(
                "duplicated block labels".into(),
            ));
        }

        // construct instruction labels
        let mut inst_labels = BTreeSet::new();
        for block in blocks {
            for inst in block.body.iter().chain(std::iter::once(&block.terminator)) {
                let success = inst_labels.insert(inst.index);
                if !success {
                    return Err(EngineError::InvariantViolation(
                        "duplicated instruction index".into(),
                    ));
                }
            }
        }

        // create the context
        let ctxt = Context {
            typing,
            blocks: block_labels,
            insts: inst_labels,
            args: arg_labels,
            ret: ret_ty.cloned(),
        };

        // convert block by block
        let mut graph = DiGraph::new();
        let mut block_label_to_index = BTreeMap::new();
        let mut edges: BTreeMap<(BlockLabel, BlockLabel), _> = BTreeMap::new();
        for block in blocks {
            let AdaptedBlock {
                label,
                name: _,
                body,
                terminator,
            } = block;
            let label: BlockLabel = label.into();

            let body_new: Vec<_> = body
                .iter()
                .map(|inst| ctxt.parse_instruction(inst))
                .collect::<EngineResult<_>>()?;
            let terminator_new = ctxt.parse_terminator(terminator)?;

            // phi nodes are grouped at the head of a block
            let num_phis = body_new
                .iter()
                .take_while(|inst| matches!(inst.repr, Inst::Phi { .. }))
                .count();
            if body_new[num_phis..]
                .iter()
                .any(|inst| matches!(inst.repr, Inst::Phi { .. }))
            {
                return Err(EngineError::InvariantViolation(
                    "phi node after a non-phi instruction".into(),
                ));
            }

            // collect the edges
            match &terminator_new.repr {
                Term::Goto { target } => {
                    Self::insert_edge(&mut edges, label, *target, Edge::Goto)?;
                }
                Term::Branch {
                    cond: _,
                    then_case,
                    else_case,
                } => {
                    if then_case == else_case {
                        Self::insert_edge(&mut edges, label, *then_case, Edge::Goto)?;
                    } else {
                        Self::insert_edge(&mut edges, label, *then_case, Edge::Branch(true))?;
                        Self::insert_edge(&mut edges, label, *else_case, Edge::Branch(false))?;
                    }
                }
                Term::Switch {
                    cond: _,
                    cases,
                    default,
                } => {
                    for (case_id, case_block) in cases {
                        Self::insert_switch_edge(&mut edges, label, *case_block, Some(*case_id))?;
                    }
                    if let Some(default_block) = default {
                        Self::insert_switch_edge(&mut edges, label, *default_block, None)?;
                    }
                }
                Term::Return { .. } | Term::Unreachable => (),
            }

            // construct the new block
            let block_new = Block {
                label,
                sequence: body_new,
                terminator: terminator_new,
            };
            let node_index = graph.add_node(block_new);
            block_label_to_index.insert(label, node_index);
        }

        // add the edges
        for ((src, dst), edge) in edges {
            let src_index = block_label_to_index[&src];
            let dst_index = block_label_to_index[&dst];
            graph.add_edge(src_index, dst_index, edge);
        }

        let cfg = Self {
            graph,
            block_label_to_index,
            entry,
        };

        // phi nodes can only take values from actual predecessors
        for block in cfg.blocks() {
            let preds: BTreeSet<_> = cfg.get_predecessors(&block.label).into_iter().collect();
            for inst in &block.sequence {
                if let Inst::Phi { options } = &inst.repr {
                    if options.iter().any(|(label, _)| !preds.contains(label)) {
                        return Err(EngineError::InvariantViolation(format!(
                            "phi node {} takes a value from a non-predecessor block",
                            inst.index
                        )));
                    }
                }
            }
        }

        // done with the construction
        Ok(cfg)
    }

    pub fn entry(&self) -> BlockLabel {
        self.entry
    }

    /// All blocks, in the order they appear in the function
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Successor blocks, sorted by label
    pub fn get_successors(&self, label: &BlockLabel) -> Vec<BlockLabel> {
        self.neighbors(label, Direction::Outgoing)
    }

    /// Predecessor blocks, sorted by label
    pub fn get_predecessors(&self, label: &BlockLabel) -> Vec<BlockLabel> {
        self.neighbors(label, Direction::Incoming)
    }

    fn neighbors(&self, label: &BlockLabel, dir: Direction) -> Vec<BlockLabel> {
        let mut result: Vec<_> = match self.block_label_to_index.get(label) {
            None => vec![],
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, dir)
                .map(|n| self.graph[n].label)
                .collect(),
        };
        result.sort();
        result.dedup();
        result
    }

    /// Reverse post-order from the entry block, followed by unreachable
    /// blocks in function order
    pub fn reverse_post_order(&self) -> Vec<BlockLabel> {
        let mut visited = BTreeSet::new();
        let mut postorder = vec![];

        let start = self.block_label_to_index[&self.entry];
        let mut dfs = DfsPostOrder::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            let label = self.graph[idx].label;
            visited.insert(label);
            postorder.push(label);
        }

        let mut result: Vec<_> = postorder.into_iter().rev().collect();
        result.extend(
            self.blocks()
                .map(|b| b.label)
                .filter(|label| !visited.contains(label)),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{EngineError, EngineResult};
    use crate::ir::adapter;
    use crate::ir::bridge::function::Function;
    use crate::ir::bridge::instruction::Inst;
    use crate::ir::bridge::typing::TypeRegistry;
    use crate::ir::bridge::value::{BlockLabel, Value};
    use crate::ir::testing::*;

    fn try_convert(blocks: Vec<adapter::cfg::Block>) -> EngineResult<Function> {
        let typing = TypeRegistry::populate(&[])?;
        Function::convert(&function("f", vec![int(1)], blocks), &typing)
    }

    fn labels(items: &[usize]) -> Vec<BlockLabel> {
        items.iter().map(BlockLabel::from).collect()
    }

    #[test]
    fn duplicated_labels() {
        let result = try_convert(vec![
            block(0, vec![], goto(1, 0)),
            block(0, vec![], ret(2)),
        ]);
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn duplicated_instruction_index() {
        let result = try_convert(vec![
            block(0, vec![alloca(1, int(8))], goto(2, 10)),
            block(10, vec![alloca(1, int(8))], ret(3)),
        ]);
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn unknown_branch_target() {
        let result = try_convert(vec![block(0, vec![], goto(1, 42))]);
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn phi_from_non_predecessor() {
        let result = try_convert(vec![
            block(0, vec![alloca(1, int(8))], goto(2, 10)),
            block(10, vec![phi(11, vec![(20, reg(1, ptr()))])], ret(12)),
            block(20, vec![], ret(21)),
        ]);
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn phi_after_other_instructions() {
        let result = try_convert(vec![
            block(0, vec![alloca(1, int(8))], goto(2, 10)),
            block(
                10,
                vec![alloca(11, int(8)), phi(12, vec![(0, reg(1, ptr()))])],
                ret(13),
            ),
        ]);
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn branch_to_one_target() {
        let func = try_convert(vec![
            block(0, vec![], branch(1, arg(0, int(1)), 10, 10)),
            block(10, vec![], ret(11)),
        ])
        .unwrap();
        let cfg = func.body.unwrap();
        assert_eq!(cfg.get_successors(&BlockLabel::from(0)), labels(&[10]));
        assert_eq!(cfg.get_predecessors(&BlockLabel::from(10)), labels(&[0]));
    }

    #[test]
    fn unreachable_blocks_trail_the_order() {
        let func = try_convert(vec![
            block(0, vec![], branch(1, arg(0, int(1)), 30, 10)),
            block(10, vec![], goto(11, 30)),
            block(20, vec![], goto(21, 10)),
            block(30, vec![], ret(31)),
        ])
        .unwrap();
        let cfg = func.body.unwrap();
        let order = cfg.reverse_post_order();
        assert_eq!(order.first(), Some(&BlockLabel::from(0)));
        assert_eq!(order.last(), Some(&BlockLabel::from(20)));

        // a join block comes after all of its reachable predecessors
        let pos = |l: usize| order.iter().position(|e| *e == BlockLabel::from(l));
        assert!(pos(10) < pos(30));
        assert_eq!(cfg.get_predecessors(&BlockLabel::from(10)), labels(&[0, 20]));
    }

    #[test]
    fn unknown_operand_is_kept_unresolved() {
        let func = try_convert(vec![block(
            0,
            vec![alloca(1, int(32)), bitcast(2, reg(7, ptr()))],
            ret(3),
        )])
        .unwrap();
        let cfg = func.body.unwrap();
        let insts: Vec<_> = cfg.blocks().flat_map(|b| b.get_instructions()).collect();
        match &insts[1].repr {
            Inst::Cast { operand, .. } => {
                assert!(matches!(operand, Value::Unresolved { index: 7, .. }));
                assert_eq!(operand.as_register(), None);
            }
            other => panic!("unexpected instruction: {:?}", other),
        }
    }

    #[test]
    fn inline_assembly_and_address_spaces_are_accepted() {
        let func = try_convert(vec![block(
            0,
            vec![
                alloca(1, int(32)),
                asm_call(2, vec![reg(1, ptr())]),
                cast(
                    3,
                    "addrspacecast",
                    ptr(),
                    adapter::typing::Type::Pointer { address_space: 1 },
                    reg(1, ptr()),
                ),
            ],
            ret(4),
        )])
        .unwrap();
        let cfg = func.body.unwrap();
        let insts: Vec<_> = cfg.blocks().flat_map(|b| b.get_instructions()).collect();
        assert!(matches!(insts[1].repr, Inst::Asm { .. }));
        assert!(matches!(insts[2].repr, Inst::Cast { .. }));
    }
}
