//! The UnifiedModel: language-neutral description of a source file.
//!
//! Adapters produce these types; the synthesizer consumes them. Nothing in
//! here knows about tree-sitter or about any particular language's syntax.

pub mod condition;
pub mod source;
pub mod type_category;
pub mod unit;

pub use condition::{CompareOp, Condition, GuardAtom, GuardTest};
pub use source::{FieldModel, ParseFailure, SourceUnit, SyntaxRegion, TypeKind, TypeModel};
pub use type_category::{classify_type, is_void_type, NumericRange, RangeBound, RangeOrigin, TypeCategory, TypeInfo};
pub use unit::{
    AccessMode, CallableUnit, ControlFlowHint, EarlyReturn, ErrorSignal, FieldAccess,
    LiteralValue, Parameter, SignalGuard, SignalKind, UnitKind, UnitRef, Visibility,
};
