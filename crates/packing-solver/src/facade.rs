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

//! # Facade
//!
//! The request/response boundary of the solving engine. A `SolveRequest`
//! carries plain station and channel maps; the facade turns it into a
//! validated `StationPackingInstance`, runs its pipeline under a fresh
//! walltime criterion (or one supplied by the caller), and flattens the
//! outcome into a `SolveResponse`.

use crate::decorators::verifier::VerifierDecorator;
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::watchdog::WatchdogDecorator;
use log::{debug, info};
use packing_model::constraint::ConstraintManager;
use packing_model::index::{Channel, Station};
use packing_model::instance::{InstanceBuilder, StationPackingInstance};
use packing_presolve::components::ConnectedComponentGrouper;
use packing_presolve::underconstrained::HeuristicUnderconstrainedFinder;
use packing_sat::base::SatBasedSolver;
use packing_sat::dpll::DpllEngine;
use packing_sat::pool::EnginePool;
use packing_search::fault::SolverFault;
use packing_search::result::{SatResult, SolvedBy};
use packing_search::solver::Solver;
use packing_search::termination::criterion::TerminationCriterion;
use packing_search::termination::walltime::WalltimeCriterion;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A station packing query in plain maps, with its cutoff and an optional
/// seed overriding the facade default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveRequest {
    pub domains: BTreeMap<Station, BTreeSet<Channel>>,
    pub previous_assignment: BTreeMap<Station, Channel>,
    pub cutoff: Duration,
    pub seed: Option<u64>,
    pub name: Option<String>,
}

impl SolveRequest {
    #[inline]
    pub fn new(domains: BTreeMap<Station, BTreeSet<Channel>>, cutoff: Duration) -> Self {
        Self {
            domains,
            previous_assignment: BTreeMap::new(),
            cutoff,
            seed: None,
            name: None,
        }
    }

    #[inline]
    pub fn with_previous_assignment(mut self, previous: BTreeMap<Station, Channel>) -> Self {
        self.previous_assignment = previous;
        self
    }

    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[inline]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the instance of this request. Previous channels of stations
    /// that are not part of the query are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SolverFault::InvalidInstance` if a station has an empty domain.
    pub fn to_instance(&self) -> Result<StationPackingInstance, SolverFault> {
        let mut builder = InstanceBuilder::new();
        for (&station, domain) in &self.domains {
            builder.add_station(station, domain.iter().copied());
        }
        let previous = self
            .previous_assignment
            .iter()
            .filter(|(station, _)| self.domains.contains_key(station))
            .map(|(&station, &channel)| (station, channel));
        builder.with_previous_assignment(previous);
        if let Some(name) = &self.name {
            builder.with_name(name.clone());
        }
        Ok(builder.build()?)
    }
}

/// The verdict of a query. `witness` is empty unless `result` is SAT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResponse {
    pub result: SatResult,
    pub runtime: Duration,
    pub witness: BTreeMap<Station, Channel>,
    pub solved_by: SolvedBy,
}

/// Solves `SolveRequest`s with one configured solver chain. Build it with
/// `PackingFacadeBuilder`.
pub struct PackingFacade {
    pipeline: Box<dyn Solver>,
    default_seed: u64,
}

impl std::fmt::Debug for PackingFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackingFacade")
            .field("pipeline", &self.pipeline.name())
            .field("default_seed", &self.default_seed)
            .finish()
    }
}

impl PackingFacade {
    /// Solves `request` within its cutoff.
    ///
    /// # Errors
    ///
    /// Returns a `SolverFault` if the request is malformed or a fatal
    /// consistency fault aborted the query.
    pub fn solve(&self, request: &SolveRequest) -> Result<SolveResponse, SolverFault> {
        let criterion = WalltimeCriterion::new(request.cutoff);
        self.solve_with_criterion(request, &criterion)
    }

    /// Solves `request` under `criterion`, which the caller may interrupt
    /// from another thread. The request cutoff is ignored.
    ///
    /// # Errors
    ///
    /// See `PackingFacade::solve`.
    pub fn solve_with_criterion(
        &self,
        request: &SolveRequest,
        criterion: &dyn TerminationCriterion,
    ) -> Result<SolveResponse, SolverFault> {
        let start = Instant::now();
        let instance = request.to_instance()?;
        let seed = request.seed.unwrap_or(self.default_seed);
        debug!("solving {} with seed {}", instance, seed);

        let result = self.pipeline.solve(&instance, criterion, seed)?;
        let runtime = start.elapsed();
        info!(
            "{}: {} in {:.3}s (solved by {})",
            instance.name(),
            result.result(),
            runtime.as_secs_f64(),
            result.solved_by()
        );

        Ok(SolveResponse {
            result: result.result(),
            runtime,
            solved_by: result.solved_by(),
            witness: result.into_assignment().to_station_map(),
        })
    }
}

/// The solver a facade is built around.
enum SolverSource {
    Pipeline(Pipeline),
    Solver(Box<dyn Solver>),
}

/// Configures a `PackingFacade`.
///
/// Every SAT answer leaving the facade is verified: pipelines verify on
/// their own and solvers given through `with_solver` are wrapped in a
/// `VerifierDecorator`.
pub struct PackingFacadeBuilder {
    source: Option<SolverSource>,
    default_seed: u64,
    watchdog_grace: Option<Duration>,
}

impl Default for PackingFacadeBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl PackingFacadeBuilder {
    pub const DEFAULT_SEED: u64 = 1;

    #[inline]
    pub fn new() -> Self {
        Self {
            source: None,
            default_seed: Self::DEFAULT_SEED,
            watchdog_grace: None,
        }
    }

    #[inline]
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.source = Some(SolverSource::Pipeline(pipeline));
        self
    }

    /// Uses an arbitrary solver, such as a `ParallelComposite`, in place of
    /// a pipeline. Its SAT answers are verified against the constraints
    /// given to `build`.
    #[inline]
    pub fn with_solver(mut self, solver: Box<dyn Solver>) -> Self {
        self.source = Some(SolverSource::Solver(solver));
        self
    }

    #[inline]
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = seed;
        self
    }

    /// Runs every query under a `WatchdogDecorator` with this grace period.
    #[inline]
    pub fn with_watchdog_grace(mut self, grace_period: Duration) -> Self {
        self.watchdog_grace = Some(grace_period);
        self
    }

    /// Builds the facade. Without an explicit pipeline the facade uses
    /// `default_pipeline` over `constraints`.
    pub fn build(self, constraints: Arc<dyn ConstraintManager>) -> PackingFacade {
        let pipeline: Box<dyn Solver> = match self.source {
            Some(SolverSource::Pipeline(pipeline)) => Box::new(pipeline),
            Some(SolverSource::Solver(solver)) => {
                Box::new(VerifierDecorator::new(solver, constraints))
            }
            None => Box::new(default_pipeline(constraints)),
        };
        let pipeline: Box<dyn Solver> = match self.watchdog_grace {
            Some(grace) => Box::new(
                WatchdogDecorator::new(Arc::from(pipeline)).with_grace_period(grace),
            ),
            None => pipeline,
        };
        PackingFacade {
            pipeline,
            default_seed: self.default_seed,
        }
    }
}

/// The cache-less pipeline over a single DPLL engine: previous-assignment
/// shortcut, recursive underconstrained removal, component decomposition,
/// and arc consistency.
pub fn default_pipeline(constraints: Arc<dyn ConstraintManager>) -> Pipeline {
    let base = SatBasedSolver::new(
        Arc::new(EnginePool::new(vec![DpllEngine::new()])),
        Arc::clone(&constraints),
    );
    PipelineBuilder::new(constraints)
        .with_previous_assignment()
        .with_underconstrained_removal(Arc::new(HeuristicUnderconstrainedFinder::new(true)), true)
        .with_component_decomposition(Arc::new(ConnectedComponentGrouper), false)
        .with_arc_consistency()
        .build(Arc::new(base))
}
