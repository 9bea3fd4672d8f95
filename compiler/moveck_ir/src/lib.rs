//! Intermediate representation consumed by the move-only checker.
//!
//! This crate provides:
//!
//! - **IR** ([`Function`], [`Block`], [`Inst`], [`Terminator`]): a
//!   basic-block representation of raw function bodies, with introduction
//!   markers ([`Inst::Mark`]) that opt values into move-only checking.
//!
//! - **Attributes** ([`Linkage`], [`Directives`], [`Stage`]): what the
//!   pipeline knows about a function beyond its body.
//!
//! - **CFG analyses** ([`PostOrder`], [`DominatorTree`],
//!   [`FunctionAnalyses`]): computed once per function and shared with
//!   passes read-only.
//!
//! - **Construction** ([`FunctionBuilder`]) and the enclosing [`Module`].
//!
//! With the `cache` feature, checked bodies can be serialized with bincode
//! and decoded back as canonical (see `cache`).

pub mod attrs;
pub mod builder;
#[cfg(feature = "cache")]
pub mod cache;
pub mod graph;
pub mod ir;
pub mod module;
pub mod span;

pub use attrs::{is_possibly_used_externally, Directives, Linkage, Stage, UnknownDirective};
pub use builder::FunctionBuilder;
pub use graph::{compute_predecessors, DominatorTree, FunctionAnalyses, PostOrder};
pub use ir::{
    Block, BlockId, Body, CallArg, CheckKind, Convention, CopyAddrKind, DefSite, DefinitionMap,
    Function, Inst, InstLoc, LoadKind, StoreKind, Terminator, Ty, ValueClass, ValueId,
};
pub use module::Module;
pub use span::Span;
