//! Module-level driver: run the pass over every function of a module.
//!
//! Reference counts are snapshotted once, before any function is checked,
//! so deleting one unused body never changes the decision for another
//! function in the same run. Each function gets its own host, emitter
//! and allocator; with [`CheckerOptions::parallel`] the functions are
//! checked on the rayon pool. Results are collected in module order
//! either way, so the report does not depend on scheduling.

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use moveck_diagnostic::{Diagnostic, ErrorGuaranteed};
use moveck_ir::{Function, FunctionAnalyses, Module, Stage};

use crate::options::CheckerOptions;
use crate::pass::{run_move_only_checker, InvalidationKind, PassError, PassHost, PassOutcome};

/// What happened to one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionReport {
    pub name: String,
    pub outcome: PassOutcome,
    /// Diagnostics for this function, in discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// Invalidations the pass reported, in order.
    pub invalidations: Vec<InvalidationKind>,
}

/// Per-function reports, in module order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleReport {
    pub functions: Vec<FunctionReport>,
}

impl ModuleReport {
    /// Every diagnostic, function by function.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.functions.iter().flat_map(|f| f.diagnostics.iter())
    }

    /// Names of the functions the pass modified.
    pub fn changed_functions(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .filter(|f| f.outcome.changed)
            .map(|f| f.name.as_str())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics().filter(|d| d.is_error()).count()
    }

    /// `Err` if any function produced an error, so the compilation fails.
    pub fn result(&self) -> Result<(), ErrorGuaranteed> {
        match ErrorGuaranteed::from_error_count(self.error_count()) {
            Some(guarantee) => Err(guarantee),
            None => Ok(()),
        }
    }
}

/// Host for one function of a module being checked by [`check_module`].
struct FunctionHost<'a> {
    options: &'a CheckerOptions,
    stage: Stage,
    whole_module: bool,
    reference_counts: &'a FxHashMap<String, usize>,
    analyses: Option<Arc<FunctionAnalyses>>,
    diagnostics: Vec<Diagnostic>,
    invalidations: Vec<InvalidationKind>,
}

impl PassHost for FunctionHost<'_> {
    fn move_only_enabled(&self) -> bool {
        self.options.move_only_enabled
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn is_whole_module(&self) -> bool {
        self.whole_module
    }

    fn reference_count(&self, name: &str) -> usize {
        self.reference_counts.get(name).copied().unwrap_or(0)
    }

    fn analyses(&mut self, func: &Function) -> Arc<FunctionAnalyses> {
        Arc::clone(
            self.analyses
                .get_or_insert_with(|| Arc::new(FunctionAnalyses::compute(func))),
        )
    }

    fn invalidate(&mut self, _func: &Function, kind: InvalidationKind) {
        self.analyses = None;
        self.invalidations.push(kind);
    }

    fn emit_diagnostics(&mut self, _func: &Function, diagnostics: Vec<Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }
}

fn check_function(
    func: &mut Function,
    options: &CheckerOptions,
    stage: Stage,
    whole_module: bool,
    reference_counts: &FxHashMap<String, usize>,
) -> Result<FunctionReport, PassError> {
    let mut host = FunctionHost {
        options,
        stage,
        whole_module,
        reference_counts,
        analyses: None,
        diagnostics: Vec::new(),
        invalidations: Vec::new(),
    };
    let outcome = run_move_only_checker(func, &mut host)?;
    Ok(FunctionReport {
        name: func.name.clone(),
        outcome,
        diagnostics: host.diagnostics,
        invalidations: host.invalidations,
    })
}

/// Run the move-only checker over every function of `module`.
///
/// Returns the first internal error in module order, if any; user errors
/// are reported through [`ModuleReport::result`].
pub fn check_module(
    module: &mut Module,
    options: &CheckerOptions,
) -> Result<ModuleReport, PassError> {
    let reference_counts = module.reference_counts();
    let stage = module.stage;
    let whole_module = module.whole_module;

    let results: Vec<Result<FunctionReport, PassError>> = if options.parallel {
        module
            .functions
            .par_iter_mut()
            .map(|func| check_function(func, options, stage, whole_module, &reference_counts))
            .collect()
    } else {
        module
            .functions
            .iter_mut()
            .map(|func| check_function(func, options, stage, whole_module, &reference_counts))
            .collect()
    };

    let functions = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    let report = ModuleReport { functions };
    debug!(
        module = %module.name,
        functions = report.functions.len(),
        errors = report.error_count(),
        "module checked"
    );
    Ok(report)
}
