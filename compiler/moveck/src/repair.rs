//! Repair of implicit copies the engines did not eliminate.
//!
//! After checking, any implicit duplication of a noncopyable value left in
//! the body is either an error the user has already been told about, or a
//! blind spot of the engines. Either way later stages need well-formed IR,
//! so [`cleanup_copies`] rewrites each one into its explicit,
//! legality-agnostic form. [`emit_missed_copy_errors`] is the backstop for
//! the blind-spot case.

use tracing::{debug, trace};

use moveck_diagnostic::{missed_copy, DiagnosticEmitter};
use moveck_ir::{CopyAddrKind, Function, Inst, InstLoc, LoadKind, ValueId};

/// The copied value, if `inst` implicitly duplicates a noncopyable value.
pub fn implicit_copy_source(func: &Function, inst: &Inst) -> Option<ValueId> {
    let src = match *inst {
        Inst::Copy { src, .. }
        | Inst::Load {
            src,
            kind: LoadKind::Copy,
            ..
        }
        | Inst::CopyAddr {
            src,
            kind: CopyAddrKind::Copy,
            ..
        } => src,
        _ => return None,
    };
    func.is_move_only(src).then_some(src)
}

/// Every implicit copy of a noncopyable value, in block order.
pub fn implicit_copies(func: &Function) -> Vec<InstLoc> {
    func.instructions()
        .filter(|(_, inst)| implicit_copy_source(func, inst).is_some())
        .map(|(loc, _)| loc)
        .collect()
}

/// Rewrite every implicit copy of a noncopyable value into an explicit
/// copy. Returns whether anything was rewritten.
pub fn cleanup_copies(func: &mut Function) -> bool {
    let sites = implicit_copies(func);
    for &loc in &sites {
        let Some(inst) = func.inst_mut(loc) else {
            continue;
        };
        match inst {
            Inst::Copy { dst, src } => {
                let (dst, src) = (*dst, *src);
                *inst = Inst::ExplicitCopy { dst, src };
            }
            Inst::Load { kind, .. } => *kind = LoadKind::ExplicitCopy,
            Inst::CopyAddr { kind, .. } => *kind = CopyAddrKind::ExplicitCopy,
            _ => continue,
        }
        trace!(block = loc.block.raw(), index = loc.index, "made copy explicit");
    }
    if !sites.is_empty() {
        debug!(function = %func.name, rewritten = sites.len(), "cleaned up implicit copies");
    }
    !sites.is_empty()
}

/// Emit an E9002 for every implicit copy of a noncopyable value still in
/// the body. Returns how many were emitted.
pub fn emit_missed_copy_errors(func: &Function, emitter: &mut DiagnosticEmitter) -> usize {
    let mut emitted = 0;
    for (loc, inst) in func.instructions() {
        let Some(src) = implicit_copy_source(func, inst) else {
            continue;
        };
        emitter.record(missed_copy(func.value_name(src), func.span_at(loc)));
        emitted += 1;
    }
    if emitted > 0 {
        debug!(function = %func.name, emitted, "fallback sweep found missed copies");
    }
    emitted
}
