use std::path::Path;

use sim_config::WriterSpec;

use crate::during_writers::{
    AllTypesWideWriter, CellCountWriter, FitnessDistWriter, MeanFitWriter, MotherDaughterWriter, NewMutantWriter, NumMutationsWriter,
};
use crate::error::ObserverError;
use crate::final_writers::{EndPopTypesWriter, EndPopWriter, EndTimeWriter, IfTypeWriter, IsExtinctWriter, TunnelWriter, TypeStructureWriter};
use crate::Observer;

/// Build the concrete [`Observer`] a `writer` config line named.
///
/// Tokens are positional: writers keyed on a type index take it first
/// (`writer CellCount 0 5` tracks type `0`, sampled every `5` time
/// units); writers with no type index take the sampling period alone.
/// Final-only writers ignore any tokens entirely.
pub fn build_writer(spec: &WriterSpec, out_dir: &Path) -> Result<Box<dyn Observer>, ObserverError> {
    match spec.kind.as_str() {
        "CellCount" => Ok(Box::new(CellCountWriter::new(out_dir, type_index(spec)?, period(spec, 1)))),
        "AllTypesWide" => Ok(Box::new(AllTypesWideWriter::new(out_dir, period(spec, 0)))),
        "FitnessDist" => Ok(Box::new(FitnessDistWriter::new(out_dir, type_index(spec)?, period(spec, 1)))),
        "MeanFit" => Ok(Box::new(MeanFitWriter::new(out_dir, type_index(spec)?, period(spec, 1)))),
        "NewMutant" => Ok(Box::new(NewMutantWriter::new(out_dir, type_index(spec)?))),
        "NumMutations" => Ok(Box::new(NumMutationsWriter::new(out_dir))),
        "MotherDaughter" => Ok(Box::new(MotherDaughterWriter::new(out_dir))),
        "TypeStructure" => Ok(Box::new(TypeStructureWriter::new(out_dir))),
        "IsExtinct" => Ok(Box::new(IsExtinctWriter::new(out_dir))),
        "EndTime" => Ok(Box::new(EndTimeWriter::new(out_dir))),
        "EndPop" => Ok(Box::new(EndPopWriter::new(out_dir))),
        "EndPopTypes" => Ok(Box::new(EndPopTypesWriter::new(out_dir))),
        "IfType" => Ok(Box::new(IfTypeWriter::new(out_dir, "iftype.oevo", type_index(spec)?))),
        "IfType2" => Ok(Box::new(IfTypeWriter::new(out_dir, "iftype2.oevo", type_index(spec)?))),
        "Tunnel" => Ok(Box::new(TunnelWriter::new(out_dir, type_index(spec)?))),
        other => Err(ObserverError::UnknownKind(other.to_string())),
    }
}

fn type_index(spec: &WriterSpec) -> Result<usize, ObserverError> {
    spec.tokens
        .first()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| ObserverError::MissingTypeIndex { kind: spec.kind.clone() })
}

fn period(spec: &WriterSpec, token_index: usize) -> f64 {
    spec.tokens.get(token_index).and_then(|t| t.parse().ok()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_count_requires_a_type_index() {
        let spec = WriterSpec { line: 1, kind: "CellCount".into(), tokens: vec![] };
        let err = build_writer(&spec, Path::new(".")).unwrap_err();
        assert!(matches!(err, ObserverError::MissingTypeIndex { .. }));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let spec = WriterSpec { line: 1, kind: "Bogus".into(), tokens: vec![] };
        let err = build_writer(&spec, Path::new(".")).unwrap_err();
        assert!(matches!(err, ObserverError::UnknownKind(_)));
    }

    #[test]
    fn end_time_needs_no_tokens() {
        let spec = WriterSpec { line: 1, kind: "EndTime".into(), tokens: vec![] };
        assert!(build_writer(&spec, Path::new(".")).is_ok());
    }
}
