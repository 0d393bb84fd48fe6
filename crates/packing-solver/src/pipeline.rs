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

//! # Pipelines
//!
//! A `Pipeline` is a chain of decorators around a base solver, described by
//! an ordered list of `StageDescriptor`s. Stages are listed outermost first:
//! the first descriptor sees the query first and the result last.
//!
//! Verification is not optional. Every pipeline starts with a
//! `StageDescriptor::Verification` stage, so no SAT witness leaves it
//! unchecked, whichever stage produced it.
//!
//! ```rust,ignore
//! let pipeline = PipelineBuilder::new(constraints)
//!     .with_previous_assignment()
//!     .with_superset_cache(binding.clone())
//!     .with_subset_cache(binding.clone())
//!     .with_cache_population(binding)
//!     .with_underconstrained_removal(finder, true)
//!     .with_component_decomposition(grouper, false)
//!     .with_arc_consistency()
//!     .build(base);
//! ```

use crate::decorators::arc_consistency::ArcConsistencyDecorator;
use crate::decorators::cache::{
    CacheBinding, CachePopulatorDecorator, SubsetCacheDecorator, SupersetCacheDecorator,
};
use crate::decorators::components::ComponentDecorator;
use crate::decorators::presolver::NeighbourhoodPresolver;
use crate::decorators::previous::PreviousAssignmentDecorator;
use crate::decorators::underconstrained::UnderconstrainedDecorator;
use crate::decorators::verifier::VerifierDecorator;
use crate::watchdog::WatchdogDecorator;
use packing_model::constraint::ConstraintManager;
use packing_model::instance::StationPackingInstance;
use packing_presolve::components::ComponentGrouper;
use packing_presolve::deepening::DeepeningSchedule;
use packing_presolve::neighbourhood::StationAddingStrategy;
use packing_presolve::underconstrained::UnderconstrainedStationFinder;
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::sync::Arc;
use std::time::Duration;

/// One stage of a pipeline, with the configuration it was built from.
#[derive(Debug, Clone)]
pub enum StageDescriptor {
    Verification,
    PreviousAssignment,
    SupersetCache(CacheBinding),
    SubsetCache(CacheBinding),
    CachePopulation(CacheBinding),
    ArcConsistency,
    UnderconstrainedRemoval {
        finder: Arc<dyn UnderconstrainedStationFinder>,
        recursive: bool,
    },
    ComponentDecomposition {
        grouper: Arc<dyn ComponentGrouper>,
        exhaustive: bool,
    },
    NeighbourhoodPresolver {
        certifier: Arc<dyn Solver>,
        strategy: Arc<dyn StationAddingStrategy>,
        schedule: DeepeningSchedule,
        budget: Duration,
    },
    Watchdog {
        grace_period: Duration,
    },
}

impl StageDescriptor {
    pub fn name(&self) -> &'static str {
        match self {
            StageDescriptor::Verification => "verification",
            StageDescriptor::PreviousAssignment => "previous-assignment",
            StageDescriptor::SupersetCache(_) => "superset-cache",
            StageDescriptor::SubsetCache(_) => "subset-cache",
            StageDescriptor::CachePopulation(_) => "cache-population",
            StageDescriptor::ArcConsistency => "arc-consistency",
            StageDescriptor::UnderconstrainedRemoval { .. } => "underconstrained-removal",
            StageDescriptor::ComponentDecomposition { .. } => "component-decomposition",
            StageDescriptor::NeighbourhoodPresolver { .. } => "neighbourhood-presolver",
            StageDescriptor::Watchdog { .. } => "watchdog",
        }
    }

    fn wrap(
        &self,
        inner: Box<dyn Solver>,
        constraints: &Arc<dyn ConstraintManager>,
    ) -> Box<dyn Solver> {
        let constraints = Arc::clone(constraints);
        match self {
            StageDescriptor::Verification => Box::new(VerifierDecorator::new(inner, constraints)),
            StageDescriptor::PreviousAssignment => {
                Box::new(PreviousAssignmentDecorator::new(inner, constraints))
            }
            StageDescriptor::SupersetCache(binding) => {
                Box::new(SupersetCacheDecorator::new(inner, binding.clone()))
            }
            StageDescriptor::SubsetCache(binding) => {
                Box::new(SubsetCacheDecorator::new(inner, binding.clone()))
            }
            StageDescriptor::CachePopulation(binding) => Box::new(CachePopulatorDecorator::new(
                inner,
                binding.clone(),
                constraints,
            )),
            StageDescriptor::ArcConsistency => {
                Box::new(ArcConsistencyDecorator::new(inner, constraints))
            }
            StageDescriptor::UnderconstrainedRemoval { finder, recursive } => Box::new(
                UnderconstrainedDecorator::new(inner, Arc::clone(finder), constraints)
                    .recursive(*recursive),
            ),
            StageDescriptor::ComponentDecomposition {
                grouper,
                exhaustive,
            } => Box::new(
                ComponentDecorator::new(inner, Arc::clone(grouper), constraints)
                    .exhaustive(*exhaustive),
            ),
            StageDescriptor::NeighbourhoodPresolver {
                certifier,
                strategy,
                schedule,
                budget,
            } => Box::new(
                NeighbourhoodPresolver::new(
                    inner,
                    Arc::clone(certifier),
                    Arc::clone(strategy),
                    constraints,
                )
                .with_schedule(*schedule)
                .with_budget(*budget),
            ),
            StageDescriptor::Watchdog { grace_period } => Box::new(
                WatchdogDecorator::new(Arc::from(inner)).with_grace_period(*grace_period),
            ),
        }
    }
}

impl std::fmt::Display for StageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub struct PipelineBuilder {
    constraints: Arc<dyn ConstraintManager>,
    stages: Vec<StageDescriptor>,
}

impl PipelineBuilder {
    #[inline]
    pub fn new(constraints: Arc<dyn ConstraintManager>) -> Self {
        Self {
            constraints,
            stages: vec![StageDescriptor::Verification],
        }
    }

    /// Appends `stage` inside every stage added so far.
    #[inline]
    pub fn with_stage(mut self, stage: StageDescriptor) -> Self {
        self.stages.push(stage);
        self
    }

    #[inline]
    pub fn with_previous_assignment(self) -> Self {
        self.with_stage(StageDescriptor::PreviousAssignment)
    }

    #[inline]
    pub fn with_superset_cache(self, binding: CacheBinding) -> Self {
        self.with_stage(StageDescriptor::SupersetCache(binding))
    }

    #[inline]
    pub fn with_subset_cache(self, binding: CacheBinding) -> Self {
        self.with_stage(StageDescriptor::SubsetCache(binding))
    }

    #[inline]
    pub fn with_cache_population(self, binding: CacheBinding) -> Self {
        self.with_stage(StageDescriptor::CachePopulation(binding))
    }

    #[inline]
    pub fn with_arc_consistency(self) -> Self {
        self.with_stage(StageDescriptor::ArcConsistency)
    }

    #[inline]
    pub fn with_underconstrained_removal(
        self,
        finder: Arc<dyn UnderconstrainedStationFinder>,
        recursive: bool,
    ) -> Self {
        self.with_stage(StageDescriptor::UnderconstrainedRemoval { finder, recursive })
    }

    #[inline]
    pub fn with_component_decomposition(
        self,
        grouper: Arc<dyn ComponentGrouper>,
        exhaustive: bool,
    ) -> Self {
        self.with_stage(StageDescriptor::ComponentDecomposition {
            grouper,
            exhaustive,
        })
    }

    pub fn with_neighbourhood_presolver(
        self,
        certifier: Arc<dyn Solver>,
        strategy: Arc<dyn StationAddingStrategy>,
        schedule: DeepeningSchedule,
        budget: Duration,
    ) -> Self {
        self.with_stage(StageDescriptor::NeighbourhoodPresolver {
            certifier,
            strategy,
            schedule,
            budget,
        })
    }

    #[inline]
    pub fn with_watchdog(self, grace_period: Duration) -> Self {
        self.with_stage(StageDescriptor::Watchdog { grace_period })
    }

    /// Wraps `base` in the configured stages.
    pub fn build(self, base: Arc<dyn Solver>) -> Pipeline {
        let mut chain: Box<dyn Solver> = Box::new(base);
        for stage in self.stages.iter().rev() {
            chain = stage.wrap(chain, &self.constraints);
        }
        Pipeline {
            stages: self.stages,
            chain,
        }
    }
}

pub struct Pipeline {
    stages: Vec<StageDescriptor>,
    chain: Box<dyn Solver>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .finish()
    }
}

impl Pipeline {
    /// The stages of the pipeline, outermost first.
    #[inline]
    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(StageDescriptor::name).collect()
    }
}

impl Solver for Pipeline {
    fn name(&self) -> &str {
        "Pipeline"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        self.chain.solve(instance, criterion, seed)
    }
}
