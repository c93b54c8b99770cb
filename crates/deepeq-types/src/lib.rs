//! Value model for deepeq.
//!
//! Comparison operates on dynamic [`Value`] trees rather than on Rust values
//! directly. This crate defines the tree, the [`Kind`] classification the
//! engine dispatches on, and the two ways of lowering Rust values into it.
//!
//! # Key Types
//!
//! - [`Kind`] -- Runtime shape classification (integer family, record, map, ...)
//! - [`Value`] -- A lowered value of any shape
//! - [`Record`] / [`Mapping`] / [`Sequence`] / [`Variant`] -- Composite payloads
//! - [`Handle`] -- Identity-only values (function and raw pointers, sync primitives)
//! - [`Reflect`] -- Lowering trait, with [`reflect_struct!`] for user records
//! - [`to_value`] / [`Serde`] -- Lowering through serde

pub mod error;
pub mod kind;
pub mod reflect;
pub mod ser;
pub mod value;

pub use error::ValueError;
pub use kind::Kind;
pub use reflect::{Address, Dynamic, Reflect};
pub use ser::{to_value, Serde, ValueSerializer};
pub use value::{
    short_type_name, Handle, HandleKind, Mapping, Opaque, Record, Sequence, TypeName, Value,
    Variant,
};
