// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # DPLL Engine
//!
//! A compact DPLL backend: two-watched-literal unit propagation, chronological
//! backtracking, and a seeded branching order. It carries no clause learning,
//! so it is no match for an industrial solver on hard formulas, but station
//! packing components are usually small once the pipeline has removed
//! underconstrained stations and split the instance.
//!
//! ## Termination
//!
//! The criterion is polled every `clock_check_mask + 1` search steps (a step
//! is a decision or a backtrack). The default mask (`0xFF`) checks every 256
//! steps, which keeps the poll cost negligible while still reacting to an
//! interrupt within microseconds on typical formulas.

use crate::cnf::{Cnf, Literal};
use crate::engine::{EngineError, EngineOutcome, SatEngine};
use packing_search::termination::criterion::TerminationCriterion;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const UNASSIGNED: i8 = 0;
const TRUE: i8 = 1;
const FALSE: i8 = -1;

#[inline(always)]
fn literal_value(values: &[i8], lit: Literal) -> i8 {
    let value = values[lit.var() as usize - 1];
    if lit.is_negated() {
        -value
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpllEngine {
    clock_check_mask: u64,
}

impl Default for DpllEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DpllEngine {
    /// Default mask: check every 256 steps.
    pub const DEFAULT_CLOCK_CHECK_MASK: u64 = 0xFF;

    #[inline]
    pub fn new() -> Self {
        Self {
            clock_check_mask: Self::DEFAULT_CLOCK_CHECK_MASK,
        }
    }

    #[inline]
    pub fn with_clock_check_mask(clock_check_mask: u64) -> Self {
        Self { clock_check_mask }
    }
}

impl SatEngine for DpllEngine {
    fn name(&self) -> &str {
        "DpllEngine"
    }

    fn solve(
        &mut self,
        cnf: &Cnf,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> Result<EngineOutcome, EngineError> {
        let outcome = DpllSearchSession::new(cnf, seed, self.clock_check_mask).run(criterion);
        if let EngineOutcome::Satisfiable(model) = &outcome {
            if !cnf.is_satisfied_by(model) {
                return Err(EngineError::InvalidModel {
                    engine: self.name().to_string(),
                });
            }
        }
        Ok(outcome)
    }
}

/// One decision level of the search.
#[derive(Debug, Clone, Copy)]
struct Level {
    trail_start: usize,
    decision: Literal,
    flipped: bool,
}

/// The state of a single `solve` call.
#[derive(Debug)]
struct DpllSearchSession {
    clauses: Vec<Vec<Literal>>,
    /// Clauses watching each literal, indexed by `Literal::code`.
    watches: Vec<Vec<usize>>,
    values: Vec<i8>,
    trail: Vec<Literal>,
    levels: Vec<Level>,
    propagation_head: usize,
    order: Vec<u32>,
    initial_units: Vec<Literal>,
    trivially_unsat: bool,
    steps: u64,
    clock_check_mask: u64,
}

impl DpllSearchSession {
    fn new(cnf: &Cnf, seed: u64, clock_check_mask: u64) -> Self {
        let num_vars = cnf.num_vars() as usize;
        let mut session = Self {
            clauses: Vec::with_capacity(cnf.num_clauses()),
            watches: vec![Vec::new(); 2 * num_vars],
            values: vec![UNASSIGNED; num_vars],
            trail: Vec::with_capacity(num_vars),
            levels: Vec::new(),
            propagation_head: 0,
            order: (1..=cnf.num_vars()).collect(),
            initial_units: Vec::new(),
            trivially_unsat: false,
            steps: 0,
            clock_check_mask,
        };

        let mut rng = StdRng::seed_from_u64(seed);
        session.order.shuffle(&mut rng);

        for clause in cnf.clauses() {
            let mut lits = clause.clone();
            lits.sort_unstable();
            lits.dedup();
            let tautology = lits.windows(2).any(|pair| pair[0] == pair[1].negated());
            if tautology {
                continue;
            }
            match lits.len() {
                0 => session.trivially_unsat = true,
                1 => session.initial_units.push(lits[0]),
                _ => {
                    let index = session.clauses.len();
                    session.watches[lits[0].code()].push(index);
                    session.watches[lits[1].code()].push(index);
                    session.clauses.push(lits);
                }
            }
        }

        session
    }

    fn run(mut self, criterion: &dyn TerminationCriterion) -> EngineOutcome {
        if self.trivially_unsat {
            return EngineOutcome::Unsatisfiable;
        }
        if criterion.has_to_stop() {
            return EngineOutcome::Stopped;
        }

        let units = std::mem::take(&mut self.initial_units);
        for unit in units {
            match literal_value(&self.values, unit) {
                FALSE => return EngineOutcome::Unsatisfiable,
                UNASSIGNED => self.enqueue(unit),
                _ => {}
            }
        }
        if !self.propagate() {
            return EngineOutcome::Unsatisfiable;
        }

        loop {
            self.steps = self.steps.wrapping_add(1);
            if (self.steps & self.clock_check_mask) == 0 && criterion.has_to_stop() {
                return EngineOutcome::Stopped;
            }

            let Some(var) = self.next_unassigned() else {
                return EngineOutcome::Satisfiable(
                    self.values.iter().map(|&value| value == TRUE).collect(),
                );
            };

            let decision = Literal::positive(var);
            self.levels.push(Level {
                trail_start: self.trail.len(),
                decision,
                flipped: false,
            });
            self.enqueue(decision);

            while !self.propagate() {
                self.steps = self.steps.wrapping_add(1);
                if !self.backtrack() {
                    return EngineOutcome::Unsatisfiable;
                }
            }
        }
    }

    #[inline]
    fn enqueue(&mut self, lit: Literal) {
        self.values[lit.var() as usize - 1] = if lit.is_negated() { FALSE } else { TRUE };
        self.trail.push(lit);
    }

    fn next_unassigned(&self) -> Option<u32> {
        self.order
            .iter()
            .copied()
            .find(|&var| self.values[var as usize - 1] == UNASSIGNED)
    }

    /// Propagates every pending trail literal. Returns `false` on conflict.
    fn propagate(&mut self) -> bool {
        while self.propagation_head < self.trail.len() {
            let false_lit = self.trail[self.propagation_head].negated();
            self.propagation_head += 1;

            let mut watchers = std::mem::take(&mut self.watches[false_lit.code()]);
            let mut conflict = false;
            let mut i = 0;

            while i < watchers.len() {
                let clause_index = watchers[i];
                let clause = &mut self.clauses[clause_index];
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }

                if literal_value(&self.values, clause[0]) == TRUE {
                    i += 1;
                    continue;
                }

                let replacement =
                    (2..clause.len()).find(|&k| literal_value(&self.values, clause[k]) != FALSE);
                if let Some(k) = replacement {
                    clause.swap(1, k);
                    self.watches[clause[1].code()].push(clause_index);
                    watchers.swap_remove(i);
                    continue;
                }

                let unit = clause[0];
                match literal_value(&self.values, unit) {
                    FALSE => {
                        conflict = true;
                        break;
                    }
                    UNASSIGNED => {
                        self.values[unit.var() as usize - 1] =
                            if unit.is_negated() { FALSE } else { TRUE };
                        self.trail.push(unit);
                    }
                    _ => {}
                }
                i += 1;
            }

            // New watches never land on `false_lit`, so its list is still empty.
            self.watches[false_lit.code()] = watchers;
            if conflict {
                return false;
            }
        }
        true
    }

    /// Undoes levels until one can be flipped. Returns `false` when the
    /// search space is exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(level) = self.levels.pop() {
            for lit in self.trail.drain(level.trail_start..) {
                self.values[lit.var() as usize - 1] = UNASSIGNED;
            }
            self.propagation_head = level.trail_start;

            if !level.flipped {
                let flipped = level.decision.negated();
                self.levels.push(Level {
                    trail_start: level.trail_start,
                    decision: flipped,
                    flipped: true,
                });
                self.enqueue(flipped);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_search::termination::interrupt::InterruptibleCriterion;
    use packing_search::termination::never::NeverEndingCriterion;
    use rand::Rng;

    fn pos(var: u32) -> Literal {
        Literal::positive(var)
    }

    fn neg(var: u32) -> Literal {
        Literal::negative(var)
    }

    fn solve(cnf: &Cnf, seed: u64) -> EngineOutcome {
        DpllEngine::new()
            .solve(cnf, &NeverEndingCriterion, seed)
            .unwrap()
    }

    /// `pigeons` pigeons into `holes` holes, one hole each, no sharing.
    fn pigeonhole(pigeons: u32, holes: u32) -> Cnf {
        let mut cnf = Cnf::new();
        let var = |p: u32, h: u32| p * holes + h + 1;
        for _ in 0..pigeons * holes {
            cnf.new_var();
        }
        for p in 0..pigeons {
            cnf.add_clause((0..holes).map(|h| pos(var(p, h))));
        }
        for h in 0..holes {
            for p in 0..pigeons {
                for q in p + 1..pigeons {
                    cnf.add_clause([neg(var(p, h)), neg(var(q, h))]);
                }
            }
        }
        cnf
    }

    fn brute_force_satisfiable(cnf: &Cnf) -> bool {
        let n = cnf.num_vars();
        (0..1u64 << n).any(|bits| {
            let model: Vec<bool> = (0..n).map(|i| bits & (1 << i) != 0).collect();
            cnf.is_satisfied_by(&model)
        })
    }

    #[test]
    fn test_empty_formula_is_satisfiable() {
        assert_eq!(solve(&Cnf::new(), 0), EngineOutcome::Satisfiable(vec![]));
    }

    #[test]
    fn test_empty_clause_is_unsatisfiable() {
        let mut cnf = Cnf::new();
        cnf.new_var();
        cnf.add_clause([]);
        assert_eq!(solve(&cnf, 0), EngineOutcome::Unsatisfiable);
    }

    #[test]
    fn test_contradicting_units() {
        let mut cnf = Cnf::new();
        let a = cnf.new_var();
        cnf.add_clause([pos(a)]);
        cnf.add_clause([neg(a)]);
        assert_eq!(solve(&cnf, 0), EngineOutcome::Unsatisfiable);
    }

    #[test]
    fn test_simple_satisfiable_model_is_valid() {
        let mut cnf = Cnf::new();
        let a = cnf.new_var();
        let b = cnf.new_var();
        let c = cnf.new_var();
        cnf.add_clause([pos(a), pos(b)]);
        cnf.add_clause([neg(a), pos(c)]);
        cnf.add_clause([neg(b), neg(c)]);
        cnf.add_clause([neg(c), pos(a)]);

        match solve(&cnf, 3) {
            EngineOutcome::Satisfiable(model) => assert!(cnf.is_satisfied_by(&model)),
            other => panic!("expected Satisfiable, got {:?}", other),
        }
    }

    #[test]
    fn test_pigeonhole() {
        assert_eq!(solve(&pigeonhole(4, 3), 7), EngineOutcome::Unsatisfiable);
        match solve(&pigeonhole(3, 3), 7) {
            EngineOutcome::Satisfiable(_) => {}
            other => panic!("expected Satisfiable, got {:?}", other),
        }
    }

    #[test]
    fn test_agrees_with_brute_force_on_random_3sat() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..200 {
            let num_vars = rng.random_range(3..=10u32);
            let num_clauses = rng.random_range(1..=45usize);
            let mut cnf = Cnf::new();
            for _ in 0..num_vars {
                cnf.new_var();
            }
            for _ in 0..num_clauses {
                let clause: Vec<Literal> = (0..3)
                    .map(|_| {
                        let var = rng.random_range(1..=num_vars);
                        if rng.random_bool(0.5) {
                            pos(var)
                        } else {
                            neg(var)
                        }
                    })
                    .collect();
                cnf.add_clause(clause);
            }

            let expected = brute_force_satisfiable(&cnf);
            match solve(&cnf, round) {
                EngineOutcome::Satisfiable(model) => {
                    assert!(expected, "round {round}: engine found a model for an UNSAT formula");
                    assert!(cnf.is_satisfied_by(&model));
                }
                EngineOutcome::Unsatisfiable => {
                    assert!(!expected, "round {round}: engine missed a model");
                }
                EngineOutcome::Stopped => panic!("round {round}: unexpected stop"),
            }
        }
    }

    #[test]
    fn test_stops_when_criterion_already_fired() {
        let criterion = InterruptibleCriterion::new(NeverEndingCriterion);
        criterion.interrupt();
        let outcome = DpllEngine::new()
            .solve(&pigeonhole(4, 3), &criterion, 0)
            .unwrap();
        assert_eq!(outcome, EngineOutcome::Stopped);
    }

    #[test]
    fn test_interrupt_mid_search_stops_engine() {
        let criterion = std::sync::Arc::new(InterruptibleCriterion::new(NeverEndingCriterion));
        let handle = {
            let criterion = std::sync::Arc::clone(&criterion);
            std::thread::spawn(move || {
                // Large enough to run far longer than the test waits.
                DpllEngine::with_clock_check_mask(0)
                    .solve(&pigeonhole(13, 12), &criterion, 0)
                    .unwrap()
            })
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        criterion.interrupt();
        assert_eq!(handle.join().unwrap(), EngineOutcome::Stopped);
    }
}
