use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

use log::{debug, trace};

use mayalias_shared::logging::Tracer;

use crate::analysis::domain::AbstractDomain;
use crate::analysis::index::{Edge, EdgeId, InstIndex, Position, Statement};
use crate::error::{EngineError, EngineResult};
use crate::ir::bridge::function::Function;
use crate::ir::bridge::value::InstId;

/// The direction we traverse the Control Flow Graph
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CfgDirection {
    Forward,
    Backward,
}

/// A client of the fixpoint engine
///
/// The engine owns the per-edge state and the worklist, the client only
/// says how a single statement transforms the facts flowing through it.
/// `transfer` must be monotone for the engine to terminate.
pub trait DataflowAnalysis {
    type Domain: AbstractDomain;

    fn direction(&self) -> CfgDirection;

    /// Facts after `stmt`, given the join of the facts before it
    fn transfer(&self, stmt: &Statement, input: &Self::Domain) -> Self::Domain;

    /// Split the result of `transfer` over the output edges, one value per edge
    fn distribute(
        &self,
        _stmt: &Statement,
        output: Self::Domain,
        edges: &[Edge],
    ) -> Vec<Self::Domain> {
        vec![output; edges.len()]
    }
}

/// Converged facts of one analysis run
#[derive(Clone, Debug)]
pub struct Solution<D: AbstractDomain> {
    edges: BTreeMap<Edge, D>,
    sinks: BTreeMap<InstId, D>,
    iterations: usize,
}

impl<D: AbstractDomain> Solution<D> {
    /// Solution of a function without a body
    pub fn empty() -> Self {
        Self {
            edges: BTreeMap::new(),
            sinks: BTreeMap::new(),
            iterations: 0,
        }
    }

    pub fn edge(&self, src: InstId, dst: InstId) -> Option<&D> {
        self.edges.get(&Edge { src, dst })
    }

    pub fn edges(&self) -> impl Iterator<Item = (&Edge, &D)> {
        self.edges.iter()
    }

    /// Output of a statement with no output edges (e.g., a return)
    pub fn sink(&self, index: &InstId) -> Option<&D> {
        self.sinks.get(index)
    }

    pub fn sinks(&self) -> impl Iterator<Item = (&InstId, &D)> {
        self.sinks.iter()
    }

    /// Number of statements popped from the worklist
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// What running the client on one statement produces
enum Effect<D> {
    /// New values for the output edges
    Edges(Vec<(EdgeId, D)>),
    /// The statement has no output edge
    Sink(D),
}

/// Direction-aware view over the instruction index
struct Walker<'a, 'b> {
    index: &'b InstIndex<'a>,
    direction: CfgDirection,
}

impl Walker<'_, '_> {
    fn inputs(&self, pos: Position) -> &[EdgeId] {
        match self.direction {
            CfgDirection::Forward => self.index.incoming(pos),
            CfgDirection::Backward => self.index.outgoing(pos),
        }
    }

    fn outputs(&self, pos: Position) -> &[EdgeId] {
        match self.direction {
            CfgDirection::Forward => self.index.outgoing(pos),
            CfgDirection::Backward => self.index.incoming(pos),
        }
    }

    /// The statement that consumes the facts on an output edge
    fn consumer(&self, edge: EdgeId) -> Position {
        let (src, dst) = self.index.endpoints(edge);
        match self.direction {
            CfgDirection::Forward => dst,
            CfgDirection::Backward => src,
        }
    }

    fn seeds(&self) -> Vec<Position> {
        let order = self.index.order();
        match self.direction {
            CfgDirection::Forward => order.to_vec(),
            CfgDirection::Backward => order.iter().rev().copied().collect(),
        }
    }

    /// Join of the facts flowing into a statement
    fn gather<D: AbstractDomain>(&self, pos: Position, values: &[D], initial: &D) -> D {
        let inputs = self.inputs(pos);
        let mut state = inputs
            .iter()
            .fold(D::bottom(), |acc, edge| acc.join(&values[*edge]));
        let boundary = inputs.is_empty()
            || (self.direction == CfgDirection::Forward && pos == self.index.entry());
        if boundary {
            state = state.join(initial);
        }
        state
    }

    fn step<A: DataflowAnalysis>(
        &self,
        analysis: &A,
        pos: Position,
        input: &A::Domain,
    ) -> EngineResult<Effect<A::Domain>> {
        let stmt = self.index.stmt(pos);
        let output = analysis.transfer(stmt, input);

        let outputs = self.outputs(pos);
        if outputs.is_empty() {
            return Ok(Effect::Sink(output));
        }

        let edges: Vec<_> = outputs.iter().map(|e| *self.index.edge(*e)).collect();
        let values = analysis.distribute(stmt, output, &edges);
        if values.len() != outputs.len() {
            return Err(EngineError::InvariantViolation(format!(
                "statement {} produced {} values for {} edges",
                stmt.index(),
                values.len(),
                outputs.len()
            )));
        }
        Ok(Effect::Edges(outputs.iter().copied().zip(values).collect()))
    }
}

/// Compute the fixpoint of `analysis` over the body of `function`
///
/// Every edge starts at bottom and the worklist is seeded with every
/// statement in structural order. A statement at the boundary of the
/// traversal (the entry in forward mode, any statement without inputs)
/// additionally receives `initial`.
pub fn execute<A: DataflowAnalysis>(
    analysis: &A,
    function: &Function,
    initial: &A::Domain,
) -> EngineResult<Solution<A::Domain>> {
    let body = match &function.body {
        None => return Ok(Solution::empty()),
        Some(cfg) => cfg,
    };
    let tracer = Tracer::new(format!("dataflow on {}", function.name));

    let index = InstIndex::build(body);
    let walker = Walker {
        index: &index,
        direction: analysis.direction(),
    };

    let mut values = vec![A::Domain::bottom(); index.edges().len()];
    let mut sinks = BTreeMap::new();

    let mut worklist: VecDeque<Position> = walker.seeds().into();
    let mut queued = vec![true; index.len()];
    let mut iterations = 0;

    // fixpoint loop
    while let Some(pos) = worklist.pop_front() {
        queued[pos] = false;
        iterations += 1;

        let input = walker.gather(pos, &values, initial);
        match walker.step(analysis, pos, &input)? {
            Effect::Sink(output) => {
                sinks.insert(index.stmt(pos).index(), output);
            }
            Effect::Edges(updates) => {
                for (edge, value) in updates {
                    if value == values[edge] {
                        continue;
                    }
                    debug_assert!(
                        matches!(
                            value.partial_order(&values[edge]),
                            Some(Ordering::Greater)
                        ),
                        "non-monotone update on edge {}",
                        index.edge(edge)
                    );
                    trace!("edge {} updated", index.edge(edge));
                    values[edge] = value;

                    let next = walker.consumer(edge);
                    if !queued[next] {
                        queued[next] = true;
                        worklist.push_back(next);
                    }
                }
            }
        }
    }

    tracer.log(&format!("converged after {} iterations", iterations));
    debug!(
        "{}: {} statements, {} edges, {} iterations",
        function.name,
        index.len(),
        index.edges().len(),
        iterations
    );

    let edges = index.edges().iter().copied().zip(values).collect();
    Ok(Solution {
        edges,
        sinks,
        iterations,
    })
}

/// Check that re-running every statement on the converged inputs
/// reproduces exactly what `solution` records
pub fn check_fixpoint<A: DataflowAnalysis>(
    analysis: &A,
    function: &Function,
    initial: &A::Domain,
    solution: &Solution<A::Domain>,
) -> EngineResult<bool> {
    let body = match &function.body {
        None => return Ok(solution.edges.is_empty() && solution.sinks.is_empty()),
        Some(cfg) => cfg,
    };

    let index = InstIndex::build(body);
    let walker = Walker {
        index: &index,
        direction: analysis.direction(),
    };

    let mut values = vec![];
    for edge in index.edges() {
        match solution.edges.get(edge) {
            None => return Ok(false),
            Some(value) => values.push(value.clone()),
        }
    }

    for pos in 0..index.len() {
        let input = walker.gather(pos, &values, initial);
        let stable = match walker.step(analysis, pos, &input)? {
            Effect::Sink(output) => solution.sinks.get(&index.stmt(pos).index()) == Some(&output),
            Effect::Edges(updates) => updates.iter().all(|(edge, value)| &values[*edge] == value),
        };
        if !stable {
            debug!(
                "{}: statement {} is not stable",
                function.name,
                index.stmt(pos).index()
            );
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::FiniteSetDomain;
    use crate::ir::testing::*;

    type Trail = FiniteSetDomain<InstId>;

    /// Collects every statement the facts have flowed through
    struct Visited(CfgDirection);

    impl DataflowAnalysis for Visited {
        type Domain = Trail;

        fn direction(&self) -> CfgDirection {
            self.0
        }

        fn transfer(&self, stmt: &Statement, input: &Trail) -> Trail {
            let mut output = input.clone();
            output.insert(stmt.index());
            output
        }
    }

    /// Drops every value it is asked to distribute
    struct Lossy;

    impl DataflowAnalysis for Lossy {
        type Domain = Trail;

        fn direction(&self) -> CfgDirection {
            CfgDirection::Forward
        }

        fn transfer(&self, _stmt: &Statement, input: &Trail) -> Trail {
            input.clone()
        }

        fn distribute(&self, _stmt: &Statement, _output: Trail, _edges: &[Edge]) -> Vec<Trail> {
            vec![]
        }
    }

    fn trail(ids: &[usize]) -> Trail {
        ids.iter().map(InstId::from).collect()
    }

    fn id(i: usize) -> InstId {
        InstId::from(i)
    }

    fn diamond() -> Function {
        convert(&function(
            "diamond",
            vec![int(1)],
            vec![
                block(0, vec![alloca(1, int(32))], branch(2, arg(0, int(1)), 10, 20)),
                block(10, vec![], goto(11, 30)),
                block(20, vec![alloca(21, int(32))], goto(22, 30)),
                block(30, vec![], ret(31)),
            ],
        ))
    }

    #[test]
    fn forward_diamond() {
        let func = diamond();
        let analysis = Visited(CfgDirection::Forward);
        let solution = execute(&analysis, &func, &Trail::bottom()).unwrap();

        assert_eq!(solution.edge(id(1), id(2)), Some(&trail(&[1])));
        assert_eq!(solution.edge(id(2), id(11)), Some(&trail(&[1, 2])));
        assert_eq!(solution.edge(id(21), id(22)), Some(&trail(&[1, 2, 21])));
        assert_eq!(solution.edge(id(11), id(31)), Some(&trail(&[1, 2, 11])));
        assert_eq!(solution.edge(id(1), id(31)), None);
        assert_eq!(
            solution.sink(&id(31)),
            Some(&trail(&[1, 2, 11, 21, 22, 31]))
        );
        assert_eq!(solution.sinks().count(), 1);

        // structural seeding visits an acyclic graph once
        assert_eq!(solution.iterations(), 6);
        assert!(check_fixpoint(&analysis, &func, &Trail::bottom(), &solution).unwrap());
    }

    #[test]
    fn backward_diamond() {
        let func = diamond();
        let analysis = Visited(CfgDirection::Backward);
        let solution = execute(&analysis, &func, &Trail::bottom()).unwrap();

        assert_eq!(solution.edge(id(11), id(31)), Some(&trail(&[31])));
        assert_eq!(solution.edge(id(2), id(21)), Some(&trail(&[21, 22, 31])));
        assert_eq!(
            solution.edge(id(1), id(2)),
            Some(&trail(&[2, 11, 21, 22, 31]))
        );
        // the entry has no predecessor to write to
        assert_eq!(
            solution.sink(&id(1)),
            Some(&trail(&[1, 2, 11, 21, 22, 31]))
        );
        assert!(solution.sink(&id(31)).is_none());
        assert!(check_fixpoint(&analysis, &func, &Trail::bottom(), &solution).unwrap());
    }

    #[test]
    fn initial_facts_enter_at_the_boundary() {
        let func = diamond();
        let seed = trail(&[99]);

        let forward = execute(&Visited(CfgDirection::Forward), &func, &seed).unwrap();
        assert_eq!(forward.edge(id(1), id(2)), Some(&trail(&[1, 99])));

        let backward = execute(&Visited(CfgDirection::Backward), &func, &seed).unwrap();
        assert_eq!(backward.edge(id(22), id(31)), Some(&trail(&[31, 99])));
        assert_eq!(backward.edge(id(1), id(2)).map(|t| t.contains(&id(99))), Some(true));
    }

    #[test]
    fn loop_converges() {
        let func = convert(&function(
            "spin",
            vec![int(1)],
            vec![
                block(0, vec![], goto(1, 10)),
                block(10, vec![alloca(11, int(8))], branch(12, arg(0, int(1)), 10, 20)),
                block(20, vec![], ret(21)),
            ],
        ));
        let analysis = Visited(CfgDirection::Forward);
        let solution = execute(&analysis, &func, &Trail::bottom()).unwrap();

        // the back edge feeds the loop header with its own facts
        assert_eq!(solution.edge(id(12), id(11)), Some(&trail(&[1, 11, 12])));
        assert_eq!(solution.edge(id(1), id(11)), Some(&trail(&[1])));
        assert_eq!(solution.sink(&id(21)), Some(&trail(&[1, 11, 12, 21])));
        assert!(solution.iterations() > 4);
        assert!(check_fixpoint(&analysis, &func, &Trail::bottom(), &solution).unwrap());
    }

    #[test]
    fn tampered_solution_is_not_a_fixpoint() {
        let func = diamond();
        let analysis = Visited(CfgDirection::Forward);
        let mut solution = execute(&analysis, &func, &Trail::bottom()).unwrap();
        solution
            .edges
            .insert(Edge { src: id(2), dst: id(11) }, trail(&[2]));
        assert!(!check_fixpoint(&analysis, &func, &Trail::bottom(), &solution).unwrap());
    }

    #[test]
    fn distribution_must_cover_every_edge() {
        let func = diamond();
        let result = execute(&Lossy, &func, &Trail::bottom());
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
    }

    #[test]
    fn declaration_has_empty_solution() {
        let mut decl = function("extern", vec![], vec![]);
        decl.is_defined = false;
        let func = convert(&decl);
        let solution = execute(&Visited(CfgDirection::Forward), &func, &Trail::bottom()).unwrap();
        assert_eq!(solution.edges().count(), 0);
        assert_eq!(solution.iterations(), 0);
    }
}
