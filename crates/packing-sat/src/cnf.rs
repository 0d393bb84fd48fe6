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

//! DIMACS-style CNF primitives.

/// A literal over a 1-based variable. Negative values are negations.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal(i32);

impl Literal {
    /// Creates the positive literal of `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` is zero or exceeds `i32::MAX`.
    #[inline]
    pub fn positive(var: u32) -> Self {
        assert!(
            var != 0 && var <= i32::MAX as u32,
            "called `Literal::positive` with invalid variable {}",
            var
        );
        Literal(var as i32)
    }

    #[inline]
    pub fn negative(var: u32) -> Self {
        Self::positive(var).negated()
    }

    #[inline]
    pub fn var(&self) -> u32 {
        self.0.unsigned_abs()
    }

    #[inline]
    pub fn is_negated(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn negated(&self) -> Self {
        Literal(-self.0)
    }

    /// A dense index for per-literal tables: `2 * (var - 1) + negated`.
    #[inline]
    pub fn code(&self) -> usize {
        2 * (self.var() as usize - 1) + self.is_negated() as usize
    }
}

impl std::fmt::Debug for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conjunction of clauses over variables `1..=num_vars`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cnf {
    num_vars: u32,
    clauses: Vec<Vec<Literal>>,
}

impl Cnf {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh variable and returns it.
    #[inline]
    pub fn new_var(&mut self) -> u32 {
        self.num_vars += 1;
        self.num_vars
    }

    /// Adds a clause.
    ///
    /// # Panics
    ///
    /// Panics if the clause mentions a variable that was not allocated.
    pub fn add_clause<I>(&mut self, literals: I)
    where
        I: IntoIterator<Item = Literal>,
    {
        let clause: Vec<Literal> = literals.into_iter().collect();
        assert!(
            clause.iter().all(|lit| lit.var() <= self.num_vars),
            "called `Cnf::add_clause` with a variable beyond {}",
            self.num_vars
        );
        self.clauses.push(clause);
    }

    #[inline]
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    #[inline]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    #[inline]
    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    /// Returns `true` if `model` (indexed by `var - 1`) satisfies every clause.
    pub fn is_satisfied_by(&self, model: &[bool]) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|lit| {
                model
                    .get(lit.var() as usize - 1)
                    .is_some_and(|&value| value != lit.is_negated())
            })
        })
    }

    /// Renders the formula in DIMACS format.
    pub fn to_dimacs(&self) -> String {
        let mut out = format!("p cnf {} {}\n", self.num_vars, self.clauses.len());
        for clause in &self.clauses {
            for lit in clause {
                out.push_str(&lit.to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}
