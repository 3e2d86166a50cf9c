/// The population-side surface a mutation kernel needs to resolve a
/// mutant's destination type without knowing anything about clones, cell
/// counts, or scheduling.
///
/// A genotype "type" is identified by its `usize` index directly — the
/// same index space the original simulator's typespace array used —
/// rather than through an opaque handle, because several kernels
/// (`ManyTypesFlex`, `FixedSites`) compute destination indices
/// arithmetically (`num_types + index`, adjacency-matrix lookups) and
/// need to reason about index values, not just identities.
pub trait TypeDirectory {
    /// Return the existing type at `index` if the population already has
    /// one, otherwise create it as a child of `parent_index` and return
    /// the same `index`. Mirrors `getNewTypeByIndex`: the returned index
    /// always equals the requested one.
    fn get_or_create_by_index(&mut self, index: usize, parent_index: usize) -> usize;

    /// The next unused type index for kernels that grow the typespace
    /// freely (`Neutral`, `DimReturnsUnif`, `ParamDist`), or `None` if the
    /// type space is exhausted.
    fn next_free_index(&mut self) -> Option<usize>;

    /// Whether the type space has no unused indices left.
    fn no_types_left(&self) -> bool;

    /// Number of mutation steps between the root type and `index`, used
    /// by [`crate::kernel::MutationKernel::DimReturnsUnif`] to scale its
    /// benefit by depth.
    fn depth(&self, index: usize) -> u32;

    /// Record the birth-rate delta a mutation event conferred on `index`,
    /// for kernels (`DimReturnsUnif`, `ParamDist`) that report it back for
    /// downstream analysis/output.
    fn set_mut_effect(&mut self, index: usize, effect: f64);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::TypeDirectory;
    use std::collections::HashMap;

    /// Minimal in-memory [`TypeDirectory`] for kernel unit tests.
    #[derive(Default)]
    pub struct FakeTypeDirectory {
        parents: HashMap<usize, usize>,
        depths: HashMap<usize, u32>,
        mut_effects: HashMap<usize, f64>,
        free_indices: Vec<usize>,
    }

    impl FakeTypeDirectory {
        pub fn with_free_indices(indices: Vec<usize>) -> Self {
            Self {
                free_indices: indices,
                ..Default::default()
            }
        }

        pub fn mut_effect(&self, index: usize) -> Option<f64> {
            self.mut_effects.get(&index).copied()
        }
    }

    impl TypeDirectory for FakeTypeDirectory {
        fn get_or_create_by_index(&mut self, index: usize, parent_index: usize) -> usize {
            if !self.parents.contains_key(&index) {
                let parent_depth = self.depths.get(&parent_index).copied().unwrap_or(0);
                self.parents.insert(index, parent_index);
                self.depths.insert(index, parent_depth + 1);
            }
            index
        }

        fn next_free_index(&mut self) -> Option<usize> {
            if self.free_indices.is_empty() {
                None
            } else {
                Some(self.free_indices.remove(0))
            }
        }

        fn no_types_left(&self) -> bool {
            self.free_indices.is_empty()
        }

        fn depth(&self, index: usize) -> u32 {
            self.depths.get(&index).copied().unwrap_or(0)
        }

        fn set_mut_effect(&mut self, index: usize, effect: f64) {
            self.mut_effects.insert(index, effect);
        }
    }
}
