use rng::{RandomSource, RngSubsystem};
use serde::{Deserialize, Serialize};

use crate::config::{parse_f64, split_kv};
use crate::error::KernelConfigError;
use crate::kernel::MutantDescriptor;
use crate::type_directory::TypeDirectory;

/// Nine-genotype autosomal/Y-linked Mendelian cross used by
/// [`crate::kernel::SchedulingPolicy::SexRepr`]-style sexual reproduction.
///
/// Cell type indices encode genotype directly:
///
/// | index | genotype     |
/// |-------|--------------|
/// | 0     | `AA` XX      |
/// | 1     | `Aa` XX      |
/// | 2     | `aa` XX      |
/// | 3     | `AA` XY      |
/// | 4     | `Aa` XY      |
/// | 5     | `aa` XY      |
/// | 6     | `AA` Xy      |
/// | 7     | `Aa` Xy      |
/// | 8     | `aa` Xy      |
///
/// `y` (lowercase) marks a mutated Y chromosome, distinct from `Y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FathersCurseKernel {
    /// Birth rate for `AA` daughters.
    pub f_aa_dominant: f64,
    /// Birth rate for `Aa` daughters/sons.
    pub f_aa_het: f64,
    /// Birth rate for `aa` daughters/sons.
    pub f_aa_recessive: f64,
    /// Birth rate for `AA` sons carrying a mutated Y.
    pub f_aa_dominant_y: f64,
    /// Birth rate for `Aa` sons carrying a mutated Y.
    pub f_aa_het_y: f64,
    /// Birth rate for `aa` sons carrying a mutated Y.
    pub f_aa_recessive_y: f64,
    /// Per-birth probability of an autosomal mutation event.
    pub autosome_mut: f64,
    /// Per-birth probability of a Y-chromosome mutation event.
    pub y_mut: f64,
    /// Probability a new offspring is male.
    pub male_prob: f64,
}

/// Genotype classes tracked before sex and Y-mutation status are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Autosome {
    Dominant,
    Het,
    Recessive,
}

impl FathersCurseKernel {
    /// Resolve one offspring's genotype, sex, and birth rate from a
    /// mother/father type pair, applying autosomal and Y mutation.
    pub fn generate_mutant<T: TypeDirectory, R: RandomSource>(
        &self,
        types: &mut T,
        random: &mut R,
        mother_index: usize,
        father_index: usize,
        mut_prob: f64,
    ) -> Result<MutantDescriptor, crate::error::MutationError> {
        let mut autosome = self.cross(random, mother_index, father_index)?;

        let mutated = random.uniform01(RngSubsystem::SexSelection, 0, "fathers_curse.rs:autosome_mut")
            < self.autosome_mut;
        if mutated {
            autosome = self.mutate_autosome(random, autosome);
        }

        let y_mutated =
            random.uniform01(RngSubsystem::SexSelection, 0, "fathers_curse.rs:y_mut") < self.y_mut;
        let is_male =
            random.uniform01(RngSubsystem::SexSelection, 0, "fathers_curse.rs:sex") < self.male_prob;

        let father_carries_mutant_y = father_index > 5;
        let (dest_base, birth_rate) = match autosome {
            Autosome::Dominant => (0, self.f_aa_dominant),
            Autosome::Het => (1, self.f_aa_het),
            Autosome::Recessive => (2, self.f_aa_recessive),
        };

        let (dest, birth_rate) = if is_male {
            let son_has_mutant_y = father_carries_mutant_y != y_mutated;
            if son_has_mutant_y {
                let y_birth = match autosome {
                    Autosome::Dominant => self.f_aa_dominant_y,
                    Autosome::Het => self.f_aa_het_y,
                    Autosome::Recessive => self.f_aa_recessive_y,
                };
                (dest_base + 6, y_birth)
            } else {
                (dest_base + 3, birth_rate)
            }
        } else {
            (dest_base, birth_rate)
        };

        let new_type = types.get_or_create_by_index(dest, mother_index);
        Ok(MutantDescriptor {
            new_type,
            birth_rate,
            mut_prob,
        })
    }

    fn cross<R: RandomSource>(
        &self,
        random: &mut R,
        mother_index: usize,
        father_index: usize,
    ) -> Result<Autosome, crate::error::MutationError> {
        use crate::error::MutationError;

        let father_autosome = match father_index {
            3 | 6 => Autosome::Dominant,
            4 | 7 => Autosome::Het,
            5 | 8 => Autosome::Recessive,
            other => return Err(MutationError::InvalidParentType(other)),
        };

        let roll = |random: &mut R| random.uniform01(RngSubsystem::SexSelection, 0, "fathers_curse.rs:cross");

        let result = match mother_index {
            0 => match father_autosome {
                Autosome::Dominant => Autosome::Dominant,
                Autosome::Het => {
                    if roll(random) < 0.5 {
                        Autosome::Dominant
                    } else {
                        Autosome::Het
                    }
                }
                Autosome::Recessive => Autosome::Het,
            },
            1 => {
                let r = roll(random);
                match father_autosome {
                    Autosome::Dominant => {
                        if r < 0.5 {
                            Autosome::Dominant
                        } else {
                            Autosome::Het
                        }
                    }
                    Autosome::Het => {
                        if r < 0.25 {
                            Autosome::Dominant
                        } else if r < 0.75 {
                            Autosome::Het
                        } else {
                            Autosome::Recessive
                        }
                    }
                    Autosome::Recessive => {
                        if r < 0.5 {
                            Autosome::Recessive
                        } else {
                            Autosome::Het
                        }
                    }
                }
            }
            2 => match father_autosome {
                Autosome::Dominant => Autosome::Het,
                Autosome::Het => {
                    if roll(random) < 0.5 {
                        Autosome::Recessive
                    } else {
                        Autosome::Het
                    }
                }
                Autosome::Recessive => Autosome::Recessive,
            },
            other => return Err(MutationError::InvalidParentType(other)),
        };

        Ok(result)
    }

    fn mutate_autosome<R: RandomSource>(&self, random: &mut R, autosome: Autosome) -> Autosome {
        match autosome {
            Autosome::Dominant => Autosome::Het,
            Autosome::Recessive => Autosome::Het,
            Autosome::Het => {
                if random.uniform01(RngSubsystem::SexSelection, 0, "fathers_curse.rs:mutate") < 0.5 {
                    Autosome::Dominant
                } else {
                    Autosome::Recessive
                }
            }
        }
    }

    /// Parse from `f_AA,.. f_Aa,.. f_aa,.. f_AA_y,.. f_Aa_y,.. f_aa_y,..
    /// autosome_mut,.. y_mut,.. male_prob,..` comma tokens.
    pub fn from_config(tokens: &[String]) -> Result<Self, KernelConfigError> {
        let mut f_aa_dominant = None;
        let mut f_aa_het = None;
        let mut f_aa_recessive = None;
        let mut f_aa_dominant_y = None;
        let mut f_aa_het_y = None;
        let mut f_aa_recessive_y = None;
        let mut autosome_mut = None;
        let mut y_mut = None;
        let mut male_prob = 0.5;

        for tok in tokens {
            let (key, value) = split_kv(tok)?;
            match key {
                "f_AA" => f_aa_dominant = Some(parse_f64(key, value)?),
                "f_Aa" => f_aa_het = Some(parse_f64(key, value)?),
                "f_aa" => f_aa_recessive = Some(parse_f64(key, value)?),
                "f_AA_y" => f_aa_dominant_y = Some(parse_f64(key, value)?),
                "f_Aa_y" => f_aa_het_y = Some(parse_f64(key, value)?),
                "f_aa_y" => f_aa_recessive_y = Some(parse_f64(key, value)?),
                "autosome_mut" => autosome_mut = Some(parse_f64(key, value)?),
                "y_mut" => y_mut = Some(parse_f64(key, value)?),
                "male_prob" => male_prob = parse_f64(key, value)?,
                other => return Err(KernelConfigError::UnknownKey { key: other.to_string() }),
            }
        }

        let require = |field: Option<f64>, key: &str| {
            field.ok_or_else(|| KernelConfigError::MissingRequired { key: key.to_string() })
        };

        let kernel = FathersCurseKernel {
            f_aa_dominant: require(f_aa_dominant, "f_AA")?,
            f_aa_het: require(f_aa_het, "f_Aa")?,
            f_aa_recessive: require(f_aa_recessive, "f_aa")?,
            f_aa_dominant_y: require(f_aa_dominant_y, "f_AA_y")?,
            f_aa_het_y: require(f_aa_het_y, "f_Aa_y")?,
            f_aa_recessive_y: require(f_aa_recessive_y, "f_aa_y")?,
            autosome_mut: require(autosome_mut, "autosome_mut")?,
            y_mut: require(y_mut, "y_mut")?,
            male_prob,
        };

        if kernel.f_aa_dominant < 0.0
            || kernel.f_aa_het < 0.0
            || kernel.f_aa_recessive < 0.0
            || kernel.f_aa_dominant_y < 0.0
            || kernel.f_aa_het_y < 0.0
            || kernel.f_aa_recessive_y < 0.0
            || kernel.autosome_mut < 0.0
            || kernel.y_mut < 0.0
            || kernel.male_prob < 0.0
        {
            return Err(KernelConfigError::NonPositiveParameter {
                key: "fathers_curse rates".to_string(),
                value: -1.0,
            });
        }

        Ok(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_directory::test_support::FakeTypeDirectory;
    use rng::StubRandomSource;

    fn sample_kernel() -> FathersCurseKernel {
        FathersCurseKernel {
            f_aa_dominant: 1.0,
            f_aa_het: 1.0,
            f_aa_recessive: 1.0,
            f_aa_dominant_y: 1.0,
            f_aa_het_y: 1.0,
            f_aa_recessive_y: 1.0,
            autosome_mut: 0.0,
            y_mut: 0.0,
            male_prob: 0.0,
        }
    }

    #[test]
    fn dominant_mother_and_father_yield_dominant_daughter() {
        let kernel = sample_kernel();
        let mut types = FakeTypeDirectory::default();
        // autosome_mut/y_mut/male_prob all zero: deterministic, no draws consumed by them.
        let mut stub = StubRandomSource::new([0.0, 0.0, 0.0, 0.0]);

        let result = kernel.generate_mutant(&mut types, &mut stub, 0, 3, 0.0).unwrap();
        assert_eq!(result.new_type, 0);
        assert_eq!(result.birth_rate, 1.0);
    }

    #[test]
    fn het_mother_and_father_can_produce_any_autosome() {
        let kernel = sample_kernel();
        let mut types = FakeTypeDirectory::default();

        let mut low = StubRandomSource::new([0.1, 0.0, 0.0, 0.0]);
        let dominant = kernel.generate_mutant(&mut types, &mut low, 1, 4, 0.0).unwrap();
        assert_eq!(dominant.new_type, 0);

        let mut mid = StubRandomSource::new([0.5, 0.0, 0.0, 0.0]);
        let het = kernel.generate_mutant(&mut types, &mut mid, 1, 4, 0.0).unwrap();
        assert_eq!(het.new_type, 1);

        let mut high = StubRandomSource::new([0.9, 0.0, 0.0, 0.0]);
        let recessive = kernel.generate_mutant(&mut types, &mut high, 1, 4, 0.0).unwrap();
        assert_eq!(recessive.new_type, 2);
    }

    #[test]
    fn invalid_father_type_is_rejected() {
        let kernel = sample_kernel();
        let mut types = FakeTypeDirectory::default();
        let mut stub = StubRandomSource::new([]);
        let err = kernel.generate_mutant(&mut types, &mut stub, 0, 99, 0.0).unwrap_err();
        assert!(matches!(err, crate::error::MutationError::InvalidParentType(99)));
    }

    #[test]
    fn from_config_requires_all_rates() {
        let tokens = vec!["f_AA,1.0".to_string()];
        let err = FathersCurseKernel::from_config(&tokens).unwrap_err();
        assert!(matches!(err, KernelConfigError::MissingRequired { .. }));
    }
}
