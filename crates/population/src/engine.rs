use std::collections::VecDeque;

use genetics::{FathersCurseKernel, MutationKernel, TypeDirectory};
use rng::{RandomSource, RngSubsystem};
use serde::{Deserialize, Serialize};

use crate::cell_type::TypeArena;
use crate::clone::CellClone;
use crate::error::EngineError;

/// A wall-clock instant at which the population is thinned down to
/// `target_cells`, modeling passaging cells between culture vessels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassageEvent {
    /// Simulation time the passage occurs at.
    pub time: f64,
    /// Cell count to thin the population down to.
    pub target_cells: u64,
}

/// Which rule governs how `advance()` picks and executes the next event.
///
/// Each variant mirrors one of the original model's `CList` subclasses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SchedulingPolicy {
    /// Unconstrained birth-death process; population size is a random walk.
    Branching,
    /// Every birth is paired with a death, so total cell count is fixed.
    Moran,
    /// Every live cell independently attempts one reproduction (and one
    /// death) per fixed `timestep`, rather than drawing a continuous
    /// waiting time.
    UpdateAll {
        /// Length of each synchronous update step.
        timestep: f64,
    },
    /// Branching dynamics interrupted by scheduled thinning events.
    Passage {
        /// Upcoming passage events, in ascending time order.
        schedule: VecDeque<PassageEvent>,
    },
    /// Sexual reproduction: mother and father are drawn independently
    /// from disjoint type pools and crossed through a
    /// [`FathersCurseKernel`].
    SexRepr {
        /// Type indices that count as female.
        female_types: Vec<usize>,
        /// Type indices that count as male.
        male_types: Vec<usize>,
    },
}

/// What the most recent [`Population::advance`] call actually did to a
/// single cell, recorded so observers can react without re-deriving it
/// from before/after snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    /// A cell in `type_index` reproduced. `mutated` is set when the
    /// daughter carries a newly minted type rather than the parent's.
    Birth { type_index: usize, daughter_type: usize, parent_birth: f64, daughter_birth: f64, mutated: bool },
    /// A cell in `type_index` died.
    Death { type_index: usize },
}

/// One birth or death, timestamped at the moment it occurred. Scheduling
/// policies that apply many micro-events per [`Population::advance`]
/// call (currently only [`SchedulingPolicy::UpdateAll`]) overwrite this
/// with each one, so callers that need every event should poll after
/// each applicable draw rather than relying on `advance` granularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRecord {
    pub time: f64,
    pub kind: EventKind,
}

/// The evolving cell population: every clone, the genotype phylogeny
/// those clones belong to, and the scheduling policy driving time
/// forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    types: TypeArena,
    clones: Vec<CellClone>,
    next_clone_id: u64,
    #[serde(skip)]
    last_event: Option<EventRecord>,
    death_rate: f64,
    time: f64,
    scheduling: SchedulingPolicy,
    kernel: MutationKernel,
    fathers_curse: Option<FathersCurseKernel>,
}

impl Population {
    /// A fresh, empty population. Callers add root clones with
    /// [`Population::add_root_clone`] before the first [`Population::advance`].
    pub fn new(
        max_types: usize,
        death_rate: f64,
        scheduling: SchedulingPolicy,
        kernel: MutationKernel,
        fathers_curse: Option<FathersCurseKernel>,
    ) -> Self {
        Self {
            types: TypeArena::new(max_types),
            clones: Vec::new(),
            next_clone_id: 0,
            last_event: None,
            death_rate,
            time: 0.0,
            scheduling,
            kernel,
            fathers_curse,
        }
    }

    /// Register a starting clone of a root type (present at time zero).
    pub fn add_root_clone(
        &mut self,
        type_index: usize,
        birth_rate: f64,
        mut_prob: f64,
        cell_count: u64,
        kind: crate::clone::CloneKind,
    ) {
        self.types.insert_root(type_index);
        self.types.record_cell_change(type_index, cell_count as i64, birth_rate * cell_count as f64);
        let id = self.next_clone_id;
        self.next_clone_id += 1;
        self.clones.push(CellClone::new(id, type_index, birth_rate, mut_prob, cell_count, kind));
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Every live clone.
    pub fn clones(&self) -> &[CellClone] {
        &self.clones
    }

    /// The genotype phylogeny accumulated so far.
    pub fn types(&self) -> &TypeArena {
        &self.types
    }

    /// Total live cells across every clone.
    pub fn total_cells(&self) -> u64 {
        self.clones.iter().map(CellClone::cell_count).sum()
    }

    /// Sum of `birth_rate * cell_count` across every clone.
    pub fn total_birth_rate(&self) -> f64 {
        self.clones.iter().map(CellClone::total_birth).sum()
    }

    /// Whether no more type indices remain for a mutation to claim.
    pub fn no_types_left(&self) -> bool {
        self.types.no_types_left()
    }

    /// Whether the population has died out. For [`SchedulingPolicy::SexRepr`]
    /// this also holds once either sex's pool is empty, since further
    /// reproduction is then impossible even with live cells remaining.
    pub fn is_extinct(&self) -> bool {
        if self.total_cells() == 0 {
            return true;
        }
        if let SchedulingPolicy::SexRepr { female_types, male_types } = &self.scheduling {
            let females = self.cells_in_types(female_types);
            let males = self.cells_in_types(male_types);
            return females == 0 || males == 0;
        }
        false
    }

    fn cells_in_types(&self, type_indices: &[usize]) -> u64 {
        self.clones
            .iter()
            .filter(|c| type_indices.contains(&c.type_index()))
            .map(CellClone::cell_count)
            .sum()
    }

    /// Verifies this population is runnable before the first
    /// [`Population::advance`]: at least one type exists, total event
    /// rate is positive, a [`SchedulingPolicy::SexRepr`] population has
    /// at least one live cell of each configured sex, and a
    /// [`SchedulingPolicy::Passage`] population has a non-empty
    /// schedule. A population that fails this check would otherwise
    /// only surface its problem as an opaque [`EngineError`] from the
    /// first `advance()` call, or (for an empty sex pool) run forever
    /// producing nothing.
    pub fn check_init(&self) -> Result<(), EngineError> {
        if self.types.num_types() == 0 {
            return Err(EngineError::NotRunnable { reason: "population has no types" });
        }

        let total_rate = self.total_birth_rate() + self.death_rate * self.total_cells() as f64;
        if total_rate <= 0.0 {
            return Err(EngineError::NotRunnable { reason: "total event rate is non-positive" });
        }

        match &self.scheduling {
            SchedulingPolicy::SexRepr { female_types, male_types } => {
                if self.cells_in_types(female_types) == 0 {
                    return Err(EngineError::NotRunnable { reason: "sex-structured population has no female cells" });
                }
                if self.cells_in_types(male_types) == 0 {
                    return Err(EngineError::NotRunnable { reason: "sex-structured population has no male cells" });
                }
            }
            SchedulingPolicy::Passage { schedule } => {
                if schedule.is_empty() {
                    return Err(EngineError::NotRunnable { reason: "passage population has an empty schedule" });
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// The birth or death most recently applied by [`Population::advance`],
    /// if any event completed before an error ended the step.
    pub fn last_event(&self) -> Option<EventRecord> {
        self.last_event
    }

    /// Advance the population by one event (or, for
    /// [`SchedulingPolicy::UpdateAll`], one synchronous timestep).
    pub fn advance<R: RandomSource>(&mut self, random: &mut R) -> Result<(), EngineError> {
        if self.is_extinct() {
            return Err(EngineError::Extinct);
        }

        let result = match self.scheduling.clone() {
            SchedulingPolicy::Branching => self.branching_step(random),
            SchedulingPolicy::Moran => self.moran_step(random),
            SchedulingPolicy::Passage { schedule } => self.passage_step(random, schedule),
            SchedulingPolicy::UpdateAll { timestep } => self.update_all_step(random, timestep),
            SchedulingPolicy::SexRepr { female_types, male_types } => {
                self.sex_repr_step(random, &female_types, &male_types)
            }
        };
        self.clones.retain(|c| c.cell_count() > 0);
        result
    }

    /// Gillespie birth/death step for [`SchedulingPolicy::Branching`]:
    /// birth and death compete as independent event classes, so
    /// population size is a random walk. [`SchedulingPolicy::Moran`] is
    /// handled separately by [`Population::moran_step`], since its
    /// timing law and event structure are both different, not just a
    /// variant of this one.
    fn branching_step<R: RandomSource>(&mut self, random: &mut R) -> Result<(), EngineError> {
        let total_birth = self.total_birth_rate();
        let total_cells = self.total_cells();
        let total_death = self.death_rate * total_cells as f64;
        let total_rate = total_birth + total_death;

        if total_rate <= 0.0 {
            return Err(EngineError::NoPossibleEvent { rate: total_rate });
        }

        self.time += random.exponential(RngSubsystem::Scheduling, 0, total_rate, "engine.rs:branching_wait");

        let roll = random.uniform_range(RngSubsystem::Scheduling, 0, 0.0, total_rate, "engine.rs:branching_event");
        if roll < total_birth {
            let reproducer = self.choose_birth_weighted(random, "engine.rs:choose_reproducer")?;
            self.execute_birth(random, reproducer)?;
        } else {
            let victim = self.choose_count_weighted(random, "engine.rs:choose_dead")?;
            self.execute_death(victim);
        }

        Ok(())
    }

    /// Moran step: every event unconditionally pairs one birth (the
    /// reproducer chosen weighted by birth rate) with one death of a
    /// uniformly-chosen cell, so total cell count never changes and the
    /// configured death rate plays no role in event selection. Time
    /// advances by `Exponential(total_cell_count)`, independent of the
    /// birth-rate distribution across clones.
    fn moran_step<R: RandomSource>(&mut self, random: &mut R) -> Result<(), EngineError> {
        let total_cells = self.total_cells();
        if total_cells == 0 {
            return Err(EngineError::NoPossibleEvent { rate: 0.0 });
        }

        self.time += random.exponential(RngSubsystem::Scheduling, 0, total_cells as f64, "engine.rs:moran_wait");

        let reproducer = self.choose_birth_weighted(random, "engine.rs:choose_reproducer")?;
        self.execute_birth(random, reproducer)?;
        let victim = self.choose_count_weighted(random, "engine.rs:moran_victim")?;
        self.execute_death(victim);

        Ok(())
    }

    fn passage_step<R: RandomSource>(
        &mut self,
        random: &mut R,
        mut schedule: VecDeque<PassageEvent>,
    ) -> Result<(), EngineError> {
        self.branching_step(random)?;

        while let Some(next) = schedule.front().copied() {
            if self.time < next.time {
                break;
            }
            self.thin_to(random, next.target_cells);
            schedule.pop_front();
        }

        self.scheduling = SchedulingPolicy::Passage { schedule };
        Ok(())
    }

    fn thin_to<R: RandomSource>(&mut self, random: &mut R, target_cells: u64) {
        let current = self.total_cells();
        if current <= target_cells || current == 0 {
            return;
        }
        let keep_fraction = target_cells as f64 / current as f64;

        for clone in &mut self.clones {
            let mut survivors = 0u64;
            for _ in 0..clone.cell_count() {
                if random.uniform01(RngSubsystem::Passage, 0, "engine.rs:thin") < keep_fraction {
                    survivors += 1;
                }
            }
            let removed = clone.cell_count() - survivors;
            if removed > 0 {
                let birth_delta = -clone.birth_rate() * removed as f64;
                let type_index = clone.type_index();
                for _ in 0..removed {
                    clone.remove_cell();
                }
                self.types.record_cell_change(type_index, -(removed as i64), birth_delta);
            }
        }

        self.clones.retain(|c| c.cell_count() > 0);
    }

    fn update_all_step<R: RandomSource>(&mut self, random: &mut R, timestep: f64) -> Result<(), EngineError> {
        if self.total_cells() == 0 {
            return Err(EngineError::Extinct);
        }

        self.time += timestep;

        let snapshot: Vec<usize> = (0..self.clones.len()).collect();
        for idx in snapshot {
            if idx >= self.clones.len() {
                continue;
            }
            let birth_rate = self.clones[idx].birth_rate();
            let cells = self.clones[idx].cell_count();
            for _ in 0..cells {
                if random.uniform01(RngSubsystem::Scheduling, 0, "engine.rs:update_all_birth")
                    < birth_rate * timestep
                {
                    self.execute_birth(random, idx)?;
                }
            }
        }

        let snapshot: Vec<usize> = (0..self.clones.len()).collect();
        for idx in snapshot {
            if idx >= self.clones.len() {
                continue;
            }
            let cells = self.clones[idx].cell_count();
            let mut deaths = 0u64;
            for _ in 0..cells {
                if random.uniform01(RngSubsystem::Scheduling, 0, "engine.rs:update_all_death")
                    < self.death_rate * timestep
                {
                    deaths += 1;
                }
            }
            for _ in 0..deaths {
                self.execute_death(idx);
            }
        }

        self.clones.retain(|c| c.cell_count() > 0);
        Ok(())
    }

    fn sex_repr_step<R: RandomSource>(
        &mut self,
        random: &mut R,
        female_types: &[usize],
        male_types: &[usize],
    ) -> Result<(), EngineError> {
        let kernel = self
            .fathers_curse
            .ok_or(EngineError::SexExhausted { sex: "unconfigured" })?;

        let total_birth = self.total_birth_rate();
        let total_cells = self.total_cells();
        let total_death = self.death_rate * total_cells as f64;
        let total_rate = total_birth + total_death;
        if total_rate <= 0.0 {
            return Err(EngineError::NoPossibleEvent { rate: total_rate });
        }
        self.time += random.exponential(RngSubsystem::Scheduling, 0, total_rate, "engine.rs:sex_repr_wait");

        let roll = random.uniform_range(RngSubsystem::Scheduling, 0, 0.0, total_rate, "engine.rs:sex_repr_event");
        if roll >= total_birth {
            let victim = self.choose_count_weighted(random, "engine.rs:sex_repr_dead")?;
            self.execute_death(victim);
            return Ok(());
        }

        let female_idx = self.choose_from_subset(random, female_types, "engine.rs:choose_mother");
        let male_idx = self.choose_from_subset(random, male_types, "engine.rs:choose_father");
        let (female_idx, male_idx) = match (female_idx, male_idx) {
            (Some(f), Some(m)) => (f, m),
            (None, _) => return Err(EngineError::SexExhausted { sex: "female" }),
            (_, None) => return Err(EngineError::SexExhausted { sex: "male" }),
        };

        let mother_index = self.clones[female_idx].type_index();
        let father_index = self.clones[male_idx].type_index();
        let mut_prob = self.clones[female_idx].mut_prob();
        let descriptor = kernel.generate_mutant(&mut self.types, random, mother_index, father_index, mut_prob)?;

        self.types
            .record_cell_change(descriptor.new_type, 1, descriptor.birth_rate);
        let id = self.next_clone_id;
        self.next_clone_id += 1;
        let kind = self.clones[female_idx].kind().clone();
        self.clones.push(CellClone::new(
            id,
            descriptor.new_type,
            descriptor.birth_rate,
            descriptor.mut_prob,
            1,
            kind,
        ));
        self.last_event = Some(EventRecord {
            time: self.time,
            kind: EventKind::Birth {
                type_index: mother_index,
                daughter_type: descriptor.new_type,
                parent_birth: self.clones[female_idx].birth_rate(),
                daughter_birth: descriptor.birth_rate,
                mutated: descriptor.new_type != mother_index,
            },
        });

        Ok(())
    }

    fn choose_from_subset<R: RandomSource>(
        &self,
        random: &mut R,
        type_indices: &[usize],
        callsite: &str,
    ) -> Option<usize> {
        let mut cumulative = Vec::new();
        let mut indices = Vec::new();
        let mut running = 0.0;
        for (i, clone) in self.clones.iter().enumerate() {
            if type_indices.contains(&clone.type_index()) && clone.total_birth() > 0.0 {
                running += clone.total_birth();
                cumulative.push(running);
                indices.push(i);
            }
        }
        if indices.is_empty() {
            return None;
        }
        let pick = random.categorical(RngSubsystem::Reproduction, 0, &cumulative, callsite);
        Some(indices[pick])
    }

    fn choose_birth_weighted<R: RandomSource>(&self, random: &mut R, callsite: &str) -> Result<usize, EngineError> {
        let mut cumulative = Vec::with_capacity(self.clones.len());
        let mut running = 0.0;
        for clone in &self.clones {
            running += clone.total_birth();
            cumulative.push(running);
        }
        if running <= 0.0 {
            return Err(EngineError::NoPossibleEvent { rate: running });
        }
        Ok(random.categorical(RngSubsystem::Reproduction, 0, &cumulative, callsite))
    }

    fn choose_count_weighted<R: RandomSource>(&self, random: &mut R, callsite: &str) -> Result<usize, EngineError> {
        let mut cumulative = Vec::with_capacity(self.clones.len());
        let mut running = 0.0;
        for clone in &self.clones {
            running += clone.cell_count() as f64;
            cumulative.push(running);
        }
        if running <= 0.0 {
            return Err(EngineError::NoPossibleEvent { rate: running });
        }
        Ok(random.categorical(RngSubsystem::Scheduling, 0, &cumulative, callsite))
    }

    fn execute_birth<R: RandomSource>(&mut self, random: &mut R, reproducer: usize) -> Result<(), EngineError> {
        let parent_type = self.clones[reproducer].type_index();
        let parent_birth = self.clones[reproducer].birth_rate();
        let parent_mut_prob = self.clones[reproducer].mut_prob();

        let mutates = parent_mut_prob > 0.0
            && random.uniform01(RngSubsystem::Mutation, 0, "engine.rs:mutate_roll") < parent_mut_prob;

        if mutates {
            let descriptor = self.kernel.generate_mutant(
                &mut self.types,
                random,
                parent_type,
                parent_birth,
                parent_mut_prob,
            )?;
            self.types
                .record_cell_change(descriptor.new_type, 1, descriptor.birth_rate);
            let id = self.next_clone_id;
            self.next_clone_id += 1;
            let kind = self.clones[reproducer].kind().clone();
            self.clones.push(CellClone::new(id, descriptor.new_type, descriptor.birth_rate, descriptor.mut_prob, 1, kind));
            self.last_event = Some(EventRecord {
                time: self.time,
                kind: EventKind::Birth {
                    type_index: parent_type,
                    daughter_type: descriptor.new_type,
                    parent_birth,
                    daughter_birth: descriptor.birth_rate,
                    mutated: true,
                },
            });
            return Ok(());
        }

        let daughter_birth = match self.clones[reproducer].kind().reproduce(random, parent_birth) {
            None => {
                self.clones[reproducer].add_cell();
                self.types.record_cell_change(parent_type, 1, parent_birth);
                parent_birth
            }
            Some((daughter_birth, daughter_kind)) => {
                self.types.record_cell_change(parent_type, 1, daughter_birth);
                let id = self.next_clone_id;
                self.next_clone_id += 1;
                self.clones.push(CellClone::new(id, parent_type, daughter_birth, parent_mut_prob, 1, daughter_kind));
                daughter_birth
            }
        };
        self.last_event = Some(EventRecord {
            time: self.time,
            kind: EventKind::Birth {
                type_index: parent_type,
                daughter_type: parent_type,
                parent_birth,
                daughter_birth,
                mutated: false,
            },
        });

        Ok(())
    }

    // Does not remove an emptied clone from `self.clones` itself: several
    // callers drive this off indices captured before any removals, so
    // shrinking the vector here would invalidate them. `advance()` sweeps
    // emptied clones out in one pass once the step is fully applied.
    fn execute_death(&mut self, victim: usize) {
        let type_index = self.clones[victim].type_index();
        let birth_rate = self.clones[victim].birth_rate();
        self.clones[victim].remove_cell();
        self.types.record_cell_change(type_index, -1, -birth_rate);
        self.last_event = Some(EventRecord { time: self.time, kind: EventKind::Death { type_index } });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clone::CloneKind;
    use rng::StubRandomSource;

    fn new_branching(death_rate: f64) -> Population {
        Population::new(8, death_rate, SchedulingPolicy::Branching, MutationKernel::None, None)
    }

    #[test]
    fn total_cells_matches_sum_of_clone_counts() {
        let mut pop = new_branching(0.1);
        pop.add_root_clone(0, 1.0, 0.0, 5, CloneKind::Simple);
        pop.add_root_clone(1, 1.0, 0.0, 3, CloneKind::Simple);
        assert_eq!(pop.total_cells(), 8);
    }

    #[test]
    fn time_only_moves_forward() {
        let mut pop = new_branching(0.1);
        pop.add_root_clone(0, 1.0, 0.0, 4, CloneKind::Simple);
        let mut stub = StubRandomSource::new(std::iter::repeat(0.3).take(200));
        let mut last = 0.0;
        for _ in 0..10 {
            if pop.is_extinct() {
                break;
            }
            pop.advance(&mut stub).unwrap();
            assert!(pop.time() >= last);
            last = pop.time();
        }
    }

    #[test]
    fn moran_dynamics_conserve_population_size() {
        let mut pop = Population::new(8, 0.0, SchedulingPolicy::Moran, MutationKernel::None, None);
        pop.add_root_clone(0, 1.0, 0.0, 10, CloneKind::Simple);
        let mut stub = StubRandomSource::new(std::iter::repeat(0.4).take(200));
        for _ in 0..20 {
            pop.advance(&mut stub).unwrap();
            assert_eq!(pop.total_cells(), 10);
        }
    }

    #[test]
    fn moran_conserves_population_with_nonuniform_birth_and_nonzero_death_rate() {
        // death_rate > 0 and unequal birth rates across clones: a death
        // branch competing on total_rate, or timing drawn from
        // total_birth + total_death, would both desync count
        // conservation or the Exponential(total_cell_count) timing law.
        let mut pop = Population::new(8, 0.5, SchedulingPolicy::Moran, MutationKernel::None, None);
        pop.add_root_clone(0, 1.0, 0.0, 99, CloneKind::Simple);
        pop.add_root_clone(1, 1.1, 0.0, 1, CloneKind::Simple);
        let mut stub = StubRandomSource::new(std::iter::repeat(0.4).take(400));
        for _ in 0..50 {
            pop.advance(&mut stub).unwrap();
            assert_eq!(pop.total_cells(), 100);
        }
    }

    #[test]
    fn check_init_rejects_zero_total_rate() {
        let mut pop = new_branching(0.0);
        pop.add_root_clone(0, 0.0, 0.0, 5, CloneKind::Simple);
        assert!(matches!(pop.check_init(), Err(EngineError::NotRunnable { .. })));
    }

    #[test]
    fn check_init_rejects_sex_repr_missing_a_sex() {
        let mut pop = Population::new(
            4,
            0.1,
            SchedulingPolicy::SexRepr { female_types: vec![0], male_types: vec![1] },
            MutationKernel::None,
            Some(genetics::FathersCurseKernel {
                f_aa_dominant: 1.0,
                f_aa_het: 1.0,
                f_aa_recessive: 1.0,
                f_aa_dominant_y: 1.0,
                f_aa_het_y: 1.0,
                f_aa_recessive_y: 1.0,
                autosome_mut: 0.0,
                y_mut: 0.0,
                male_prob: 0.5,
            }),
        );
        pop.add_root_clone(0, 1.0, 0.0, 5, CloneKind::Simple);
        assert!(matches!(pop.check_init(), Err(EngineError::NotRunnable { .. })));
    }

    #[test]
    fn check_init_rejects_passage_with_empty_schedule() {
        let mut pop = Population::new(4, 0.1, SchedulingPolicy::Passage { schedule: VecDeque::new() }, MutationKernel::None, None);
        pop.add_root_clone(0, 1.0, 0.0, 5, CloneKind::Simple);
        assert!(matches!(pop.check_init(), Err(EngineError::NotRunnable { .. })));
    }

    #[test]
    fn check_init_accepts_a_well_formed_population() {
        let mut pop = new_branching(0.1);
        pop.add_root_clone(0, 1.0, 0.0, 5, CloneKind::Simple);
        assert!(pop.check_init().is_ok());
    }

    #[test]
    fn extinction_is_a_terminal_state() {
        let mut pop = new_branching(1.0);
        pop.add_root_clone(0, 0.0, 0.0, 1, CloneKind::Simple);
        let mut stub = StubRandomSource::new(std::iter::repeat(0.1).take(20));
        pop.advance(&mut stub).unwrap();
        assert!(pop.is_extinct());
        assert!(matches!(pop.advance(&mut stub), Err(EngineError::Extinct)));
    }

    #[test]
    fn passage_thins_population_down_to_target() {
        let mut pop = Population::new(
            4,
            0.0,
            SchedulingPolicy::Passage {
                schedule: VecDeque::from([PassageEvent { time: 0.0, target_cells: 5 }]),
            },
            MutationKernel::None,
            None,
        );
        pop.add_root_clone(0, 0.5, 0.0, 20, CloneKind::Simple);
        // keep_fraction works out to 5/21; a constant 0.3 roll for every
        // per-cell survival draw lands above that threshold, so the
        // passage thins every cell away. What matters for this test is
        // only that thinning ran at all, not exactly how many survived.
        let mut stub = StubRandomSource::new(std::iter::repeat(0.3).take(200));
        pop.advance(&mut stub).unwrap();
        assert!(pop.total_cells() < 21);
    }
}
