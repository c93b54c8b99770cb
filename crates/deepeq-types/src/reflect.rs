//! Lowering of Rust values into [`Value`] trees.
//!
//! [`Reflect`] is implemented for std scalars, strings, containers, smart
//! pointers, function pointers, raw pointers and sync primitives. User
//! records opt in with [`reflect_struct!`](crate::reflect_struct), or go
//! through serde with [`Serde`](crate::Serde).
//!
//! Lowering follows ownership: a cycle of `Rc`s recurses without bound.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::atomic::{
    AtomicBool, AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize, AtomicU16, AtomicU32,
    AtomicU64, AtomicU8, AtomicUsize,
};
use std::sync::{Arc, Barrier, Condvar, Mutex, RwLock};

use indexmap::IndexMap;
use num_complex::Complex;

use crate::value::{
    short_type_name, Handle, HandleKind, Mapping, Opaque, Record, Sequence, TypeName, Value,
    Variant,
};

/// Conversion of a Rust value into a dynamic [`Value`].
pub trait Reflect {
    fn reflect(&self) -> Value;
}

fn label_of<T: ?Sized>() -> String {
    short_type_name(std::any::type_name::<T>())
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! reflect_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> Value {
                    Value::$variant(*self)
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    Complex<f32> => Complex64,
    Complex<f64> => Complex128,
}

impl Reflect for str {
    fn reflect(&self) -> Value {
        Value::String(self.to_owned())
    }
}

impl Reflect for String {
    fn reflect(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Reflect for () {
    fn reflect(&self) -> Value {
        Value::Unit
    }
}

// ---------------------------------------------------------------------------
// Sequences and mappings
// ---------------------------------------------------------------------------

impl<T: Reflect> Reflect for [T] {
    fn reflect(&self) -> Value {
        let items = self.iter().map(Reflect::reflect).collect();
        Value::Seq(Sequence::growable(label_of::<Self>(), items))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self) -> Value {
        let items = self.iter().map(Reflect::reflect).collect();
        Value::Seq(Sequence::growable(label_of::<Self>(), items))
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn reflect(&self) -> Value {
        let items = self.iter().map(Reflect::reflect).collect();
        Value::Seq(Sequence::growable(label_of::<Self>(), items))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(&self) -> Value {
        let items = self.iter().map(Reflect::reflect).collect();
        Value::Seq(Sequence::fixed(label_of::<Self>(), items))
    }
}

fn reflect_entries<'a, K, V, I>(label: String, entries: I) -> Value
where
    K: Reflect + 'a,
    V: Reflect + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let mut map = Mapping::new(label);
    for (key, value) in entries {
        // Keys are matched by their rendering, seen through references.
        let key = key.reflect().deref_all().to_string();
        if let Err(key) = map.try_insert(key, value.reflect()) {
            return Value::Opaque(Opaque::new(map.label, format!("map keys collide on {key:?}")));
        }
    }
    Value::Map(map)
}

impl<K: Reflect, V: Reflect, S: BuildHasher> Reflect for HashMap<K, V, S> {
    fn reflect(&self) -> Value {
        reflect_entries(label_of::<HashMap<K, V>>(), self)
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect(&self) -> Value {
        reflect_entries(label_of::<Self>(), self)
    }
}

impl<K: Reflect, V: Reflect, S: BuildHasher> Reflect for IndexMap<K, V, S> {
    fn reflect(&self) -> Value {
        reflect_entries(label_of::<IndexMap<K, V>>(), self)
    }
}

// ---------------------------------------------------------------------------
// Tuples
// ---------------------------------------------------------------------------

macro_rules! reflect_tuple {
    ($(($($name:ident . $idx:tt),+)),* $(,)?) => {
        $(
            impl<$($name: Reflect),+> Reflect for ($($name,)+) {
                fn reflect(&self) -> Value {
                    let record = Record::new(TypeName::bare(label_of::<Self>()))
                        $(.with_field(stringify!($idx), self.$idx.reflect()))+;
                    Value::Struct(record)
                }
            }
        )*
    };
}

reflect_tuple! {
    (A.0),
    (A.0, B.1),
    (A.0, B.1, C.2),
    (A.0, B.1, C.2, D.3),
    (A.0, B.1, C.2, D.3, E.4),
    (A.0, B.1, C.2, D.3, E.4, F.5),
}

// ---------------------------------------------------------------------------
// Tagged unions
// ---------------------------------------------------------------------------

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> Value {
        let type_name = TypeName::of::<Self>();
        let variant = match self {
            Some(inner) => Variant::new(type_name, "Some", inner.reflect()),
            None => Variant::new(type_name, "None", Value::Unit),
        };
        Value::Variant(variant)
    }
}

impl<T: Reflect, E: Reflect> Reflect for Result<T, E> {
    fn reflect(&self) -> Value {
        let type_name = TypeName::of::<Self>();
        let variant = match self {
            Ok(inner) => Variant::new(type_name, "Ok", inner.reflect()),
            Err(err) => Variant::new(type_name, "Err", err.reflect()),
        };
        Value::Variant(variant)
    }
}

/// A type-erased value. Compared by its contents, re-dispatched on the
/// kind of whatever it holds.
pub struct Dynamic(Box<dyn Reflect + Send + Sync>);

impl Dynamic {
    pub fn new<T: Reflect + Send + Sync + 'static>(value: T) -> Self {
        Self(Box::new(value))
    }
}

impl Reflect for Dynamic {
    fn reflect(&self) -> Value {
        Value::Dyn(Box::new((*self.0).reflect()))
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

macro_rules! reflect_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Reflect + ?Sized> Reflect for $ptr<T> {
                fn reflect(&self) -> Value {
                    Value::Ref(Box::new((**self).reflect()))
                }
            }
        )*
    };
}

reflect_pointer!(Box, Rc, Arc);

impl<T: Reflect + ?Sized> Reflect for &T {
    fn reflect(&self) -> Value {
        Value::Ref(Box::new((**self).reflect()))
    }
}

impl<T: Reflect + ?Sized> Reflect for &mut T {
    fn reflect(&self) -> Value {
        Value::Ref(Box::new((**self).reflect()))
    }
}

impl<T: Reflect + ?Sized> Reflect for RefCell<T> {
    fn reflect(&self) -> Value {
        match self.try_borrow() {
            Ok(inner) => Value::Ref(Box::new(inner.reflect())),
            Err(err) => Value::Opaque(Opaque::new(label_of::<Self>(), err.to_string())),
        }
    }
}

impl<T> Reflect for Cow<'_, T>
where
    T: Reflect + ToOwned + ?Sized,
{
    fn reflect(&self) -> Value {
        (**self).reflect()
    }
}

// ---------------------------------------------------------------------------
// Identity-only handles
// ---------------------------------------------------------------------------

/// A bare address, compared by value as an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address(pub usize);

impl Reflect for Address {
    fn reflect(&self) -> Value {
        Value::Handle(Handle::new(HandleKind::Addr, "Address", self.0))
    }
}

impl<T: ?Sized> Reflect for *const T {
    fn reflect(&self) -> Value {
        let addr = self.cast::<()>() as usize;
        Value::Handle(Handle::new(HandleKind::RawPtr, label_of::<Self>(), addr))
    }
}

impl<T: ?Sized> Reflect for *mut T {
    fn reflect(&self) -> Value {
        let addr = self.cast::<()>() as usize;
        Value::Handle(Handle::new(HandleKind::RawPtr, label_of::<Self>(), addr))
    }
}

impl<T: ?Sized> Reflect for NonNull<T> {
    fn reflect(&self) -> Value {
        let addr = self.as_ptr().cast::<()>() as usize;
        Value::Handle(Handle::new(HandleKind::RawPtr, label_of::<Self>(), addr))
    }
}

fn sync_handle<T: ?Sized>(value: &T) -> Value {
    let addr = (value as *const T).cast::<()>() as usize;
    Value::Handle(Handle::new(HandleKind::Sync, label_of::<T>(), addr))
}

impl<T: ?Sized> Reflect for Mutex<T> {
    fn reflect(&self) -> Value {
        sync_handle(self)
    }
}

impl<T: ?Sized> Reflect for RwLock<T> {
    fn reflect(&self) -> Value {
        sync_handle(self)
    }
}

macro_rules! reflect_sync {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> Value {
                    sync_handle(self)
                }
            }
        )*
    };
}

reflect_sync!(
    Condvar,
    Barrier,
    AtomicBool,
    AtomicI8,
    AtomicI16,
    AtomicI32,
    AtomicI64,
    AtomicIsize,
    AtomicU8,
    AtomicU16,
    AtomicU32,
    AtomicU64,
    AtomicUsize,
);

macro_rules! reflect_fn {
    ($(($($arg:ident),*)),* $(,)?) => {
        $(
            impl<R, $($arg),*> Reflect for fn($($arg),*) -> R {
                fn reflect(&self) -> Value {
                    Value::Handle(Handle::new(HandleKind::Fn, label_of::<Self>(), *self as usize))
                }
            }
        )*
    };
}

reflect_fn! {
    (),
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
}

// ---------------------------------------------------------------------------
// JSON documents
// ---------------------------------------------------------------------------

impl Reflect for serde_json::Value {
    fn reflect(&self) -> Value {
        use serde_json::Value as Json;

        match self {
            Json::Null => Value::Unit,
            Json::Bool(v) => Value::Bool(*v),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Value::I64(v)
                } else if let Some(v) = n.as_u64() {
                    Value::U64(v)
                } else {
                    n.as_f64()
                        .map(Value::F64)
                        .unwrap_or_else(|| Value::Opaque(Opaque::new("Number", n.to_string())))
                }
            }
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => {
                let items = items.iter().map(Reflect::reflect).collect();
                Value::Seq(Sequence::growable("Vec<Value>", items))
            }
            Json::Object(entries) => {
                let mut map = Mapping::new("Map<String, Value>");
                for (key, value) in entries {
                    map.insert(key.clone(), value.reflect());
                }
                Value::Map(map)
            }
        }
    }
}

/// Implement [`Reflect`] for a record type by listing its fields.
///
/// ```rust
/// use deepeq_types::{reflect_struct, Kind, Reflect};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
/// reflect_struct!(Point { x, y });
///
/// struct Meters(f64);
/// reflect_struct!(Meters { 0 });
///
/// assert_eq!(Point { x: 1, y: 2 }.reflect().kind(), Kind::Struct);
/// assert_eq!(Meters(1.5).reflect().to_string(), "Meters(1.5)");
/// ```
#[macro_export]
macro_rules! reflect_struct {
    ($ty:ty { $($field:tt),* $(,)? }) => {
        impl $crate::Reflect for $ty {
            fn reflect(&self) -> $crate::Value {
                $crate::Value::Struct(
                    $crate::Record::of::<Self>()
                        $(.with_field(stringify!($field), $crate::Reflect::reflect(&self.$field)))*
                )
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::kind::Kind;

    struct Inner {
        name: String,
        values: Vec<i32>,
    }
    crate::reflect_struct!(Inner { name, values });

    struct Empty {}
    crate::reflect_struct!(Empty {});

    #[test]
    fn scalars_keep_their_kind() {
        assert_eq!(5u8.reflect(), Value::U8(5));
        assert_eq!((-3i64).reflect(), Value::I64(-3));
        assert_eq!(1.5f32.reflect(), Value::F32(1.5));
        assert_eq!('x'.reflect(), Value::Char('x'));
        assert_eq!("hi".reflect(), Value::String("hi".into()));
        assert_eq!(().reflect(), Value::Unit);
        assert_eq!(Complex::new(1.0f64, 2.0).reflect().kind(), Kind::Complex128);
    }

    #[test]
    fn records_carry_namespace_and_field_order() {
        let value = Inner {
            name: "inner".into(),
            values: vec![1, 2],
        }
        .reflect();
        let Value::Struct(record) = value else {
            panic!("expected record");
        };
        assert_eq!(record.type_name.name, "Inner");
        assert!(record.type_name.namespace.ends_with("reflect::tests"));
        let names: Vec<&str> = record.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["name", "values"]);
        assert_eq!(record.field_path("name"), "Inner::name");
    }

    #[test]
    fn empty_record_has_no_fields() {
        let Value::Struct(record) = Empty {}.reflect() else {
            panic!("expected record");
        };
        assert!(record.fields.is_empty());
    }

    #[test]
    fn sequences_are_labelled() {
        let Value::Seq(seq) = vec![1i32, 2].reflect() else {
            panic!("expected sequence");
        };
        assert_eq!(seq.label, "Vec<i32>");
        assert!(!seq.fixed);

        let array = [1u8, 2, 3].reflect();
        assert_eq!(array.kind(), Kind::Array);
        assert_eq!(array.type_name(), "[u8; 3]");
    }

    #[test]
    fn maps_use_rendered_keys() {
        let mut source = HashMap::new();
        source.insert(1u32, "one");
        let Value::Map(map) = source.reflect() else {
            panic!("expected map");
        };
        assert_eq!(map.label, "HashMap<u32, &str>");
        assert_eq!(map.get("1"), Some(&Value::Ref(Box::new(Value::String("one".into())))));
    }

    #[test]
    fn colliding_key_renderings_lower_to_opaque() {
        let source: BTreeMap<Vec<String>, i32> = [
            (vec!["a, b".to_string()], 1),
            (vec!["a".to_string(), "b".to_string()], 2),
        ]
        .into_iter()
        .collect();

        let Value::Opaque(opaque) = source.reflect() else {
            panic!("expected opaque");
        };
        assert_eq!(opaque.type_name, "BTreeMap<Vec<String>, i32>");
        assert!(opaque.repr.contains("[a, b]"));
    }

    #[test]
    fn btree_maps_iterate_in_key_order() {
        let source: BTreeMap<&str, i32> = [("b", 2), ("a", 1)].into_iter().collect();
        let Value::Map(map) = source.reflect() else {
            panic!("expected map");
        };
        let keys: Vec<&String> = map.entries.keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn pointers_lower_to_refs() {
        let boxed = Box::new(7i32);
        assert_eq!(boxed.reflect(), Value::Ref(Box::new(Value::I32(7))));
        let shared = Rc::new(Box::new(1u8));
        assert_eq!(shared.reflect().deref_all(), &Value::U8(1));
    }

    #[test]
    fn options_are_variants() {
        let Value::Variant(some) = Some(3u8).reflect() else {
            panic!("expected variant");
        };
        assert_eq!(some.tag, "Some");
        assert_eq!(*some.payload, Value::U8(3));

        let Value::Variant(none) = None::<u8>.reflect() else {
            panic!("expected variant");
        };
        assert_eq!(none.tag, "None");
        assert_eq!(*none.payload, Value::Unit);
    }

    #[test]
    fn tuples_are_positional_records() {
        let Value::Struct(record) = (1u8, "x").reflect() else {
            panic!("expected record");
        };
        assert_eq!(record.type_name.name, "(u8, &str)");
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0].0, "0");
    }

    #[test]
    fn sync_primitives_are_identities() {
        let a = Mutex::new(1);
        let b = Mutex::new(1);
        let (Value::Handle(ha), Value::Handle(hb)) = (a.reflect(), b.reflect()) else {
            panic!("expected handles");
        };
        assert_eq!(ha.kind, HandleKind::Sync);
        assert_ne!(ha.addr, hb.addr);
        assert_eq!(a.reflect(), a.reflect());
    }

    #[test]
    fn function_pointers_are_identities() {
        fn one() -> i32 {
            1
        }
        let f: fn() -> i32 = one;
        assert_eq!(f.reflect().kind(), Kind::Fn);
        assert_eq!(f.reflect(), f.reflect());
    }

    #[test]
    fn dynamic_wraps_contents() {
        let value = Dynamic::new(5i32).reflect();
        assert_eq!(value.kind(), Kind::Dyn);
        let Value::Dyn(inner) = value else {
            panic!("expected dyn");
        };
        assert_eq!(*inner, Value::I32(5));
    }

    #[test]
    fn json_documents_lower_structurally() {
        let doc = serde_json::json!({"a": [1, 2.5, "x"], "b": null});
        let Value::Map(map) = doc.reflect() else {
            panic!("expected map");
        };
        let Some(Value::Seq(seq)) = map.get("a") else {
            panic!("expected array");
        };
        assert_eq!(seq.items[0], Value::I64(1));
        assert_eq!(seq.items[1], Value::F64(2.5));
        assert_eq!(map.get("b"), Some(&Value::Unit));
    }

    #[test]
    fn borrowed_refcell_becomes_opaque() {
        let cell = RefCell::new(1i32);
        let _guard = cell.borrow_mut();
        assert_eq!(cell.reflect().kind(), Kind::Opaque);
    }
}
