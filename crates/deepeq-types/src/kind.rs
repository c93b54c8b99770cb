use std::fmt;

use serde::{Deserialize, Serialize};

/// The runtime shape classification of a [`Value`](crate::Value).
///
/// Comparison dispatches on the kind of the left operand once both operands
/// are known to share a kind. The set is closed: every value lowers to
/// exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Complex64,
    Complex128,
    String,
    Unit,
    /// A record with named (or positional) fields.
    Struct,
    /// A keyed mapping.
    Map,
    /// A growable sequence (`Vec`, slice, `VecDeque`).
    Slice,
    /// A fixed-size sequence (`[T; N]`).
    Array,
    /// A pointer-like indirection that is compared through.
    Ref,
    /// A tagged union (Rust enum).
    Variant,
    /// A type-erased container holding a value of any kind.
    Dyn,
    /// A function pointer. Identity only.
    Fn,
    /// A raw pointer. Identity only.
    RawPtr,
    /// A synchronization primitive (`Mutex`, atomics, ...). Identity only.
    Sync,
    /// A bare address. Identity only.
    Addr,
    /// A value that could not be lowered into a structured form.
    Opaque,
    /// The absent value: a missing map entry or an uninitialised slot.
    Invalid,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 33] = [
        Kind::Bool,
        Kind::Char,
        Kind::I8,
        Kind::I16,
        Kind::I32,
        Kind::I64,
        Kind::I128,
        Kind::Isize,
        Kind::U8,
        Kind::U16,
        Kind::U32,
        Kind::U64,
        Kind::U128,
        Kind::Usize,
        Kind::F32,
        Kind::F64,
        Kind::Complex64,
        Kind::Complex128,
        Kind::String,
        Kind::Unit,
        Kind::Struct,
        Kind::Map,
        Kind::Slice,
        Kind::Array,
        Kind::Ref,
        Kind::Variant,
        Kind::Dyn,
        Kind::Fn,
        Kind::RawPtr,
        Kind::Sync,
        Kind::Addr,
        Kind::Opaque,
        Kind::Invalid,
    ];

    /// The lowercase name used in rendered output, e.g. `i32` or `struct`.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Char => "char",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::I128 => "i128",
            Kind::Isize => "isize",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::U128 => "u128",
            Kind::Usize => "usize",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Complex64 => "complex64",
            Kind::Complex128 => "complex128",
            Kind::String => "string",
            Kind::Unit => "unit",
            Kind::Struct => "struct",
            Kind::Map => "map",
            Kind::Slice => "slice",
            Kind::Array => "array",
            Kind::Ref => "ref",
            Kind::Variant => "variant",
            Kind::Dyn => "dyn",
            Kind::Fn => "fn",
            Kind::RawPtr => "raw_ptr",
            Kind::Sync => "sync",
            Kind::Addr => "addr",
            Kind::Opaque => "opaque",
            Kind::Invalid => "invalid",
        }
    }

    /// Returns `true` for signed and unsigned integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Kind::I8
                | Kind::I16
                | Kind::I32
                | Kind::I64
                | Kind::I128
                | Kind::Isize
                | Kind::U8
                | Kind::U16
                | Kind::U32
                | Kind::U64
                | Kind::U128
                | Kind::Usize
        )
    }

    /// Returns `true` for `f32` and `f64`.
    pub fn is_float(&self) -> bool {
        matches!(self, Kind::F32 | Kind::F64)
    }

    /// Returns `true` for kinds compared by address rather than content.
    pub fn is_identity(&self) -> bool {
        matches!(self, Kind::Fn | Kind::RawPtr | Kind::Sync | Kind::Addr)
    }

    /// Returns `true` for kinds whose comparison builds child nodes.
    pub fn is_composite(&self) -> bool {
        matches!(self, Kind::Struct | Kind::Map | Kind::Slice | Kind::Array)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn all_kinds_are_distinct() {
        let set: HashSet<Kind> = Kind::ALL.iter().copied().collect();
        assert_eq!(set.len(), Kind::ALL.len());
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = Kind::ALL.iter().map(Kind::name).collect();
        assert_eq!(names.len(), Kind::ALL.len());
    }

    #[test]
    fn classification() {
        assert!(Kind::U64.is_integer());
        assert!(!Kind::F64.is_integer());
        assert!(Kind::F32.is_float());
        assert!(Kind::Sync.is_identity());
        assert!(!Kind::Ref.is_identity());
        assert!(Kind::Array.is_composite());
        assert!(!Kind::Variant.is_composite());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Kind::RawPtr).unwrap();
        assert_eq!(json, "\"raw_ptr\"");
        let back: Kind = serde_json::from_str("\"complex128\"").unwrap();
        assert_eq!(back, Kind::Complex128);
    }
}
