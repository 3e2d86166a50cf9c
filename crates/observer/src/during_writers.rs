use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use population::{EventKind, EventRecord, Population};

use crate::error::ObserverError;
use crate::throttle::Throttle;
use crate::Observer;

fn open(path: &std::path::Path) -> Result<File, ObserverError> {
    File::create(path).map_err(|source| ObserverError::Io { path: path.display().to_string(), source })
}

fn write_err(path: &std::path::Path, source: std::io::Error) -> ObserverError {
    ObserverError::Io { path: path.display().to_string(), source }
}

fn file_mut<'a>(file: &'a mut Option<File>, kind: &'static str) -> Result<&'a mut File, ObserverError> {
    file.as_mut().ok_or(ObserverError::NotStarted(kind))
}

/// Samples one type's live cell count over time: `count_sim_<N>type_<i>.oevo`.
#[derive(Debug)]
pub struct CellCountWriter {
    out_dir: PathBuf,
    type_index: usize,
    throttle: Throttle,
    file: Option<File>,
}

impl CellCountWriter {
    pub fn new(out_dir: impl Into<PathBuf>, type_index: usize, writing_period: f64) -> Self {
        Self { out_dir: out_dir.into(), type_index, throttle: Throttle::new(writing_period), file: None }
    }

    fn path(&self, sim_number: u32) -> PathBuf {
        self.out_dir.join(format!("count_sim_{sim_number}type_{}.oevo", self.type_index))
    }

    fn write_count(&mut self, population: &Population) -> Result<(), ObserverError> {
        let count = population.types().get(self.type_index).map(|t| t.num_cells()).unwrap_or(0);
        let time = population.time();
        let file = file_mut(&mut self.file, "CellCount")?;
        writeln!(file, "{time}, {count}").map_err(|source| write_err(&self.out_dir, source))
    }
}

impl Observer for CellCountWriter {
    fn begin(&mut self, sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        let path = self.path(sim_number);
        let mut file = open(&path)?;
        writeln!(file, "data for cell type {} sim number {sim_number}", self.type_index).map_err(|source| write_err(&path, source))?;
        self.file = Some(file);
        Ok(())
    }

    fn on_event(&mut self, _sim_number: u32, population: &Population, _event: EventRecord) -> Result<(), ObserverError> {
        if self.throttle.should_write(population.time()) {
            self.write_count(population)?;
        }
        Ok(())
    }

    fn finish(&mut self, _sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        self.write_count(population)
    }
}

/// Samples every type's live cell count on one line per sample:
/// `all_types_wide_<N>.oevo`, columns in type-index order, `0` for a
/// type not yet created.
#[derive(Debug)]
pub struct AllTypesWideWriter {
    out_dir: PathBuf,
    throttle: Throttle,
    file: Option<File>,
}

impl AllTypesWideWriter {
    pub fn new(out_dir: impl Into<PathBuf>, writing_period: f64) -> Self {
        Self { out_dir: out_dir.into(), throttle: Throttle::new(writing_period), file: None }
    }

    fn write_row(&mut self, population: &Population) -> Result<(), ObserverError> {
        let max_types = population.types().max_types();
        let mut row = format!("{}", population.time());
        for idx in 0..max_types {
            let count = population.types().get(idx).map(|t| t.num_cells()).unwrap_or(0);
            row.push_str(&format!(", {count}"));
        }
        let file = file_mut(&mut self.file, "AllTypesWide")?;
        writeln!(file, "{row}").map_err(|source| write_err(&self.out_dir, source))
    }
}

impl Observer for AllTypesWideWriter {
    fn begin(&mut self, sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join(format!("all_types_wide_{sim_number}.oevo"));
        self.file = Some(open(&path)?);
        Ok(())
    }

    fn on_event(&mut self, _sim_number: u32, population: &Population, _event: EventRecord) -> Result<(), ObserverError> {
        if self.throttle.should_write(population.time()) {
            self.write_row(population)?;
        }
        Ok(())
    }

    fn finish(&mut self, _sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        self.write_row(population)
    }
}

/// Samples the birth-rate (fitness) of every clone belonging to one
/// type: `fit_sim_<N>type_<i>.oevo`.
#[derive(Debug)]
pub struct FitnessDistWriter {
    out_dir: PathBuf,
    type_index: usize,
    throttle: Throttle,
    file: Option<File>,
}

impl FitnessDistWriter {
    pub fn new(out_dir: impl Into<PathBuf>, type_index: usize, writing_period: f64) -> Self {
        Self { out_dir: out_dir.into(), type_index, throttle: Throttle::new(writing_period), file: None }
    }

    fn write_row(&mut self, population: &Population) -> Result<(), ObserverError> {
        let mut row = format!("{}", population.time());
        for clone in population.clones().iter().filter(|c| c.type_index() == self.type_index) {
            row.push_str(&format!(", {}", clone.birth_rate()));
        }
        let file = file_mut(&mut self.file, "FitnessDist")?;
        writeln!(file, "{row}").map_err(|source| write_err(&self.out_dir, source))
    }
}

impl Observer for FitnessDistWriter {
    fn begin(&mut self, sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join(format!("fit_sim_{sim_number}type_{}.oevo", self.type_index));
        let mut file = open(&path)?;
        writeln!(file, "fitness distribution for cell type {} sim number {sim_number}", self.type_index)
            .map_err(|source| write_err(&path, source))?;
        self.file = Some(file);
        Ok(())
    }

    fn on_event(&mut self, _sim_number: u32, population: &Population, _event: EventRecord) -> Result<(), ObserverError> {
        if self.throttle.should_write(population.time()) {
            self.write_row(population)?;
        }
        Ok(())
    }

    fn finish(&mut self, _sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        self.write_row(population)
    }
}

/// Samples one type's mean per-cell birth rate: `mean_fit_sim_<N>type_<i>.oevo`.
#[derive(Debug)]
pub struct MeanFitWriter {
    out_dir: PathBuf,
    type_index: usize,
    throttle: Throttle,
    file: Option<File>,
}

impl MeanFitWriter {
    pub fn new(out_dir: impl Into<PathBuf>, type_index: usize, writing_period: f64) -> Self {
        Self { out_dir: out_dir.into(), type_index, throttle: Throttle::new(writing_period), file: None }
    }

    fn write_row(&mut self, population: &Population) -> Result<(), ObserverError> {
        let Some(cell_type) = population.types().get(self.type_index) else {
            return Ok(());
        };
        if cell_type.num_cells() == 0 {
            return Ok(());
        }
        let mean = cell_type.total_birth_rate() / cell_type.num_cells() as f64;
        let time = population.time();
        let file = file_mut(&mut self.file, "MeanFit")?;
        writeln!(file, "{time}, {mean}").map_err(|source| write_err(&self.out_dir, source))
    }
}

impl Observer for MeanFitWriter {
    fn begin(&mut self, sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join(format!("mean_fit_sim_{sim_number}type_{}.oevo", self.type_index));
        self.file = Some(open(&path)?);
        Ok(())
    }

    fn on_event(&mut self, _sim_number: u32, population: &Population, _event: EventRecord) -> Result<(), ObserverError> {
        if self.throttle.should_write(population.time()) {
            self.write_row(population)?;
        }
        Ok(())
    }

    fn finish(&mut self, _sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        self.write_row(population)
    }
}

/// Logs every mutation event that lands a new mutant in one tracked
/// type: `sim_num_<N>_new_mutant_<i>.oevo`, one
/// `<sim_number>, <time>, <daughter_birth>, <total_birth>` line per hit.
#[derive(Debug)]
pub struct NewMutantWriter {
    out_dir: PathBuf,
    type_index: usize,
    file: Option<File>,
}

impl NewMutantWriter {
    pub fn new(out_dir: impl Into<PathBuf>, type_index: usize) -> Self {
        Self { out_dir: out_dir.into(), type_index, file: None }
    }
}

impl Observer for NewMutantWriter {
    fn begin(&mut self, sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join(format!("sim_num_{sim_number}_new_mutant_{}.oevo", self.type_index));
        self.file = Some(open(&path)?);
        Ok(())
    }

    fn on_event(&mut self, sim_number: u32, population: &Population, event: EventRecord) -> Result<(), ObserverError> {
        let EventKind::Birth { daughter_type, daughter_birth, mutated, .. } = event.kind else {
            return Ok(());
        };
        if !mutated || daughter_type != self.type_index {
            return Ok(());
        }
        let total_birth = population.total_birth_rate();
        let file = file_mut(&mut self.file, "NewMutant")?;
        writeln!(file, "{sim_number}, {}, {daughter_birth}, {total_birth}", event.time)
            .map_err(|source| write_err(&self.out_dir, source))
    }
}

/// Counts mutation events across the whole replica: `num_mutations.oevo`,
/// one `<sim_number>, <count>` line appended at the end of each replica.
#[derive(Debug, Default)]
pub struct NumMutationsWriter {
    out_dir: PathBuf,
    count: u64,
}

impl NumMutationsWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into(), count: 0 }
    }
}

impl Observer for NumMutationsWriter {
    fn begin(&mut self, _sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        self.count = 0;
        Ok(())
    }

    fn on_event(&mut self, _sim_number: u32, _population: &Population, event: EventRecord) -> Result<(), ObserverError> {
        if matches!(event.kind, EventKind::Birth { mutated: true, .. }) {
            self.count += 1;
        }
        Ok(())
    }

    fn finish(&mut self, sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join("num_mutations.oevo");
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| write_err(&path, source))?;
        writeln!(file, "{sim_number}, {}", self.count).map_err(|source| write_err(&path, source))
    }
}

/// Logs the parent/daughter birth-rate pair for every mutation event:
/// `mother_daughter_sim_<N>.oevo`, one `<time>, <parent_birth>,
/// <daughter_birth>` line per mutation.
#[derive(Debug)]
pub struct MotherDaughterWriter {
    out_dir: PathBuf,
    file: Option<File>,
}

impl MotherDaughterWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into(), file: None }
    }
}

impl Observer for MotherDaughterWriter {
    fn begin(&mut self, sim_number: u32, _population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join(format!("mother_daughter_sim_{sim_number}.oevo"));
        self.file = Some(open(&path)?);
        Ok(())
    }

    fn on_event(&mut self, _sim_number: u32, _population: &Population, event: EventRecord) -> Result<(), ObserverError> {
        let EventKind::Birth { parent_birth, daughter_birth, mutated: true, .. } = event.kind else {
            return Ok(());
        };
        let file = file_mut(&mut self.file, "MotherDaughter")?;
        writeln!(file, "{}, {parent_birth}, {daughter_birth}", event.time).map_err(|source| write_err(&self.out_dir, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genetics::MutationKernel;
    use population::{CloneKind, SchedulingPolicy};
    use rng::StubRandomSource;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("observer_during_writer_test_{name}"));
        let _ = std::fs::create_dir_all(&dir);
        dir
    }

    /// A single-clone population with `mut_prob = 1.0` under
    /// [`MutationKernel::Neutral`], so the very first `advance()` is
    /// guaranteed to be a birth that mints a fresh type.
    fn mutating_population() -> Population {
        let mut pop = Population::new(4, 0.1, SchedulingPolicy::Branching, MutationKernel::Neutral, None);
        pop.add_root_clone(0, 1.0, 1.0, 1, CloneKind::Simple);
        pop
    }

    fn drive_one_mutation(pop: &mut Population) -> EventRecord {
        let mut random = StubRandomSource::new([0.1, 0.0, 0.0, 0.0]);
        pop.advance(&mut random).unwrap();
        pop.last_event().unwrap()
    }

    #[test]
    fn cell_count_writer_records_the_header_and_a_sample() {
        let dir = test_dir("cell_count");
        let mut pop = mutating_population();
        let mut writer = CellCountWriter::new(&dir, 0, 0.0);
        writer.begin(1, &pop).unwrap();
        let event = drive_one_mutation(&mut pop);
        writer.on_event(1, &pop, event).unwrap();
        writer.finish(1, &pop).unwrap();

        let contents = std::fs::read_to_string(dir.join("count_sim_1type_0.oevo")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert!(lines[0].contains("cell type 0 sim number 1"));
        assert!(lines.len() >= 3);
    }

    #[test]
    fn new_mutant_writer_only_fires_for_its_tracked_type() {
        let dir = test_dir("new_mutant");
        let mut pop = mutating_population();
        let event = drive_one_mutation(&mut pop);
        let EventKind::Birth { daughter_type, .. } = event.kind else { unreachable!() };

        let mut hit = NewMutantWriter::new(&dir, daughter_type);
        let mut miss = NewMutantWriter::new(&dir, daughter_type + 1);
        hit.begin(2, &pop).unwrap();
        miss.begin(2, &pop).unwrap();
        hit.on_event(2, &pop, event).unwrap();
        miss.on_event(2, &pop, event).unwrap();

        let hit_contents = std::fs::read_to_string(dir.join(format!("sim_num_2_new_mutant_{daughter_type}.oevo"))).unwrap();
        assert_eq!(hit_contents.lines().count(), 1);
        let miss_contents = std::fs::read_to_string(dir.join(format!("sim_num_2_new_mutant_{}.oevo", daughter_type + 1))).unwrap();
        assert_eq!(miss_contents.lines().count(), 0);
    }

    #[test]
    fn num_mutations_writer_counts_across_the_replica() {
        let dir = test_dir("num_mutations");
        let mut pop = mutating_population();
        let event = drive_one_mutation(&mut pop);
        let mut writer = NumMutationsWriter::new(&dir);
        writer.begin(3, &pop).unwrap();
        writer.on_event(3, &pop, event).unwrap();
        writer.finish(3, &pop).unwrap();
        let contents = std::fs::read_to_string(dir.join("num_mutations.oevo")).unwrap();
        assert!(contents.trim_end().ends_with("3, 1"));
    }

    #[test]
    fn mother_daughter_writer_logs_only_mutation_events() {
        let dir = test_dir("mother_daughter");
        let mut pop = mutating_population();
        let event = drive_one_mutation(&mut pop);
        let mut writer = MotherDaughterWriter::new(&dir);
        writer.begin(4, &pop).unwrap();
        writer.on_event(4, &pop, event).unwrap();
        let contents = std::fs::read_to_string(dir.join("mother_daughter_sim_4.oevo")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
