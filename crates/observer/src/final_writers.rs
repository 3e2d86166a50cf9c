use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use population::Population;

use crate::error::ObserverError;
use crate::Observer;

fn append_line(path: &Path, line: &str) -> Result<(), ObserverError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ObserverError::Io { path: path.display().to_string(), source })?;
    writeln!(file, "{line}").map_err(|source| ObserverError::Io { path: path.display().to_string(), source })
}

/// Appends `<sim_number>, <final_time>` to `end_time.oevo` for every
/// replica.
#[derive(Debug)]
pub struct EndTimeWriter {
    out_dir: PathBuf,
}

impl EndTimeWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }
}

impl Observer for EndTimeWriter {
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        append_line(&self.out_dir.join("end_time.oevo"), &format!("{sim_number}, {}", population.time()))
    }
}

/// Appends `<sim_number>, <final_cell_count>` to `end_pop.oevo`.
#[derive(Debug)]
pub struct EndPopWriter {
    out_dir: PathBuf,
}

impl EndPopWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }
}

impl Observer for EndPopWriter {
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        append_line(&self.out_dir.join("end_pop.oevo"), &format!("{sim_number}, {}", population.total_cells()))
    }
}

/// Appends `<sim_number>, <0 or 1>` to `extinction.oevo`, 1 meaning the
/// replica ended with no live cells.
#[derive(Debug)]
pub struct IsExtinctWriter {
    out_dir: PathBuf,
}

impl IsExtinctWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }
}

impl Observer for IsExtinctWriter {
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        let flag = if population.is_extinct() { 1 } else { 0 };
        append_line(&self.out_dir.join("extinction.oevo"), &format!("{sim_number}, {flag}"))
    }
}

/// Appends one block per replica to `end_pop_types.oevo`: the simulation
/// number, then one `<type_index>, <num_cells>` line per live type, then
/// a blank line separating replicas.
#[derive(Debug)]
pub struct EndPopTypesWriter {
    out_dir: PathBuf,
}

impl EndPopTypesWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }
}

impl Observer for EndPopTypesWriter {
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join("end_pop_types.oevo");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ObserverError::Io { path: path.display().to_string(), source })?;
        let map_err = |source| ObserverError::Io { path: path.display().to_string(), source };
        writeln!(file, "{sim_number}").map_err(map_err)?;
        for cell_type in population.types().iter() {
            if cell_type.num_cells() > 0 {
                writeln!(file, "{}, {}", cell_type.index(), cell_type.num_cells()).map_err(map_err)?;
            }
        }
        writeln!(file).map_err(map_err)
    }
}

/// Appends `<sim_number>, <0 or 1>` to a fixed filename, 1 meaning the
/// tracked type index held at least one live cell when the replica
/// ended. Backs both `IfType` (`iftype.oevo`) and `IfType2`
/// (`iftype2.oevo`) — the original model tracks two independent type
/// indices through otherwise identical logic.
#[derive(Debug)]
pub struct IfTypeWriter {
    out_dir: PathBuf,
    file_name: &'static str,
    type_index: usize,
}

impl IfTypeWriter {
    pub fn new(out_dir: impl Into<PathBuf>, file_name: &'static str, type_index: usize) -> Self {
        Self { out_dir: out_dir.into(), file_name, type_index }
    }
}

impl Observer for IfTypeWriter {
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        let present = population.types().get(self.type_index).map(|t| t.num_cells() > 0).unwrap_or(false);
        let flag = if present { 1 } else { 0 };
        append_line(&self.out_dir.join(self.file_name), &format!("{sim_number}, {flag}"))
    }
}

/// Appends `<sim_number>, <final_cell_count>` for one tracked type index
/// to `type_<index>_tunnel.oevo`, recording whether (and how far) a
/// lineage tunneled through that type by the time the replica ended.
#[derive(Debug)]
pub struct TunnelWriter {
    out_dir: PathBuf,
    type_index: usize,
}

impl TunnelWriter {
    pub fn new(out_dir: impl Into<PathBuf>, type_index: usize) -> Self {
        Self { out_dir: out_dir.into(), type_index }
    }
}

impl Observer for TunnelWriter {
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        let count = population.types().get(self.type_index).map(|t| t.num_cells()).unwrap_or(0);
        let path = self.out_dir.join(format!("type_{}_tunnel.oevo", self.type_index));
        append_line(&path, &format!("{sim_number}, {count}"))
    }
}

/// Writes the whole genotype phylogeny for one replica to
/// `sim_<N>type_tree.oevo`, one `<index>, <parent>` line per type, root
/// types first and each subtree walked depth-first (parent `-1` for a
/// root).
#[derive(Debug)]
pub struct TypeStructureWriter {
    out_dir: PathBuf,
}

impl TypeStructureWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }
}

impl Observer for TypeStructureWriter {
    fn finish(&mut self, sim_number: u32, population: &Population) -> Result<(), ObserverError> {
        let path = self.out_dir.join(format!("sim_{sim_number}type_tree.oevo"));
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .map_err(|source| ObserverError::Io { path: path.display().to_string(), source })?;
        let map_err = |source| ObserverError::Io { path: path.display().to_string(), source };

        let mut children: std::collections::HashMap<Option<usize>, Vec<usize>> = std::collections::HashMap::new();
        for cell_type in population.types().iter() {
            children.entry(cell_type.parent()).or_default().push(cell_type.index());
        }
        for siblings in children.values_mut() {
            siblings.sort_unstable();
        }

        let mut stack: Vec<usize> = children.get(&None).cloned().unwrap_or_default();
        stack.reverse();
        while let Some(index) = stack.pop() {
            let parent = population.types().get(index).and_then(|t| t.parent());
            let parent_field = parent.map(|p| p as i64).unwrap_or(-1);
            writeln!(file, "{index}, {parent_field}").map_err(map_err)?;
            if let Some(kids) = children.get(&Some(index)) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genetics::MutationKernel;
    use population::{CloneKind, Population, SchedulingPolicy};

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("observer_final_writer_test_{name}"));
        let _ = std::fs::create_dir_all(&dir);
        dir
    }

    fn sample_population() -> Population {
        let mut pop = Population::new(4, 0.1, SchedulingPolicy::Branching, MutationKernel::None, None);
        pop.add_root_clone(0, 1.0, 0.0, 3, CloneKind::Simple);
        pop
    }

    #[test]
    fn end_time_and_end_pop_append_one_line_per_replica() {
        let dir = test_dir("end_time_end_pop");
        let pop = sample_population();
        let mut end_time = EndTimeWriter::new(&dir);
        let mut end_pop = EndPopWriter::new(&dir);
        end_time.finish(7, &pop).unwrap();
        end_pop.finish(7, &pop).unwrap();

        let time_contents = std::fs::read_to_string(dir.join("end_time.oevo")).unwrap();
        assert!(time_contents.trim_end().ends_with("7, 0"));
        let pop_contents = std::fs::read_to_string(dir.join("end_pop.oevo")).unwrap();
        assert!(pop_contents.trim_end().ends_with("7, 3"));
    }

    #[test]
    fn is_extinct_reports_zero_for_a_live_population() {
        let dir = test_dir("is_extinct");
        let pop = sample_population();
        let mut writer = IsExtinctWriter::new(&dir);
        writer.finish(1, &pop).unwrap();
        let contents = std::fs::read_to_string(dir.join("extinction.oevo")).unwrap();
        assert!(contents.trim_end().ends_with("1, 0"));
    }

    #[test]
    fn if_type_reports_presence_of_the_tracked_type() {
        let dir = test_dir("if_type");
        let pop = sample_population();
        let mut present = IfTypeWriter::new(&dir, "iftype.oevo", 0);
        let mut absent = IfTypeWriter::new(&dir, "iftype.oevo", 1);
        present.finish(1, &pop).unwrap();
        absent.finish(2, &pop).unwrap();
        let contents = std::fs::read_to_string(dir.join("iftype.oevo")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[lines.len() - 2], "1, 1");
        assert_eq!(lines[lines.len() - 1], "2, 0");
    }

    #[test]
    fn type_structure_writes_a_root_with_no_parent() {
        let dir = test_dir("type_structure");
        let pop = sample_population();
        let mut writer = TypeStructureWriter::new(&dir);
        writer.finish(9, &pop).unwrap();
        let contents = std::fs::read_to_string(dir.join("sim_9type_tree.oevo")).unwrap();
        assert_eq!(contents.trim_end(), "0, -1");
    }
}
