//! A compilation unit: the functions one pipeline run sees together.

use rustc_hash::FxHashMap;

use crate::attrs::Stage;
use crate::ir::{Function, Inst};

/// A compilation unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    /// Lowering stage shared by every function in the module.
    pub stage: Stage,
    /// Whether this unit is the whole module (no sibling units exist).
    pub whole_module: bool,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Count `FunctionRef` instructions naming each function.
    ///
    /// Functions that are never referenced are absent from the map.
    pub fn reference_counts(&self) -> FxHashMap<String, usize> {
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for func in &self.functions {
            for (_, inst) in func.instructions() {
                if let Inst::FunctionRef { name, .. } = inst {
                    *counts.entry(name.clone()).or_default() += 1;
                }
            }
        }
        counts
    }
}
