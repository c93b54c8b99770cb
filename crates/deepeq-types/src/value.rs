//! The dynamic value tree that comparison operates on.
//!
//! Rust values are lowered into [`Value`] either through the
//! [`Reflect`](crate::Reflect) trait or through the serde bridge in
//! [`ser`](crate::ser). Composite payloads keep the information the diff
//! reporter needs: record type names, field order, container labels.

use std::fmt;

use indexmap::IndexMap;
use num_complex::Complex;

use crate::kind::Kind;

// ---------------------------------------------------------------------------
// TypeName
// ---------------------------------------------------------------------------

/// A namespaced type name, e.g. `my_crate::model` + `Inner`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeName {
    /// Module path of the type. Empty when unknown.
    pub namespace: String,
    /// Declared name, with generic arguments shortened.
    pub name: String,
}

impl TypeName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// A name without a namespace.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(String::new(), name)
    }

    /// Derive the name of `T` from [`std::any::type_name`].
    pub fn of<T: ?Sized>() -> Self {
        Self::parse(std::any::type_name::<T>())
    }

    /// Split a fully qualified Rust type path into namespace and name.
    ///
    /// The namespace is the module path of the outermost type; generic
    /// arguments keep only their last path segment.
    pub fn parse(full: &str) -> Self {
        let head_end = full.find(['<', '(', '[']).unwrap_or(full.len());
        let namespace = match full[..head_end].rsplit_once("::") {
            Some((ns, _)) => ns.to_string(),
            None => String::new(),
        };
        Self {
            namespace,
            name: short_type_name(full),
        }
    }

    /// The name with generic arguments removed, used for field paths.
    pub fn base_name(&self) -> &str {
        match self.name.find('<') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }

    /// `namespace::name`, or just `name` when the namespace is empty.
    pub fn qualified(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Strip module paths from every path segment of a Rust type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            token.push(ch);
        } else {
            flush_segment(&mut out, &mut token);
            out.push(ch);
        }
    }
    flush_segment(&mut out, &mut token);
    out
}

fn flush_segment(out: &mut String, token: &mut String) {
    match token.rsplit_once("::") {
        Some((_, last)) => out.push_str(last),
        None => out.push_str(token),
    }
    token.clear();
}

// ---------------------------------------------------------------------------
// Composite payloads
// ---------------------------------------------------------------------------

/// A record: a named type with ordered fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub type_name: TypeName,
    /// Fields in declaration order. Positional fields are named `0`, `1`, ...
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    /// An empty record named after `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(TypeName::of::<T>())
    }

    /// Append a field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// The identifier used to exclude a field: `<TypeName>::<field>`.
    pub fn field_path(&self, field: &str) -> String {
        format!("{}::{}", self.type_name.base_name(), field)
    }

    fn is_positional(&self) -> bool {
        !self.fields.is_empty()
            && self
                .fields
                .iter()
                .all(|(name, _)| name.chars().all(|c| c.is_ascii_digit()))
    }
}

/// A keyed mapping. Keys are stored in their rendered form; iteration
/// follows insertion order, which mirrors the source container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    /// Container type, e.g. `HashMap<String, i32>`.
    pub label: String,
    pub entries: IndexMap<String, Value>,
}

impl Mapping {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Insert a new entry. When `key` is already present the mapping is left
    /// unchanged and the key is handed back.
    pub fn try_insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), String> {
        match self.entries.entry(key.into()) {
            indexmap::map::Entry::Occupied(entry) => Err(entry.key().clone()),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reorder entries by key, recursively through nested values.
    pub fn sort_keys(&mut self) {
        self.entries.sort_keys();
        for value in self.entries.values_mut() {
            value.sort_map_keys();
        }
    }
}

/// A positional sequence, growable (`slice`) or fixed-size (`array`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    /// Container type, e.g. `Vec<i32>` or `[u8; 4]`.
    pub label: String,
    pub fixed: bool,
    pub items: Vec<Value>,
}

impl Sequence {
    pub fn growable(label: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            label: label.into(),
            fixed: false,
            items,
        }
    }

    pub fn fixed(label: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            label: label.into(),
            fixed: true,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One case of a tagged union. Unit cases carry [`Value::Unit`]; struct and
/// multi-field tuple cases carry a [`Record`] named `<Enum>::<Case>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    pub type_name: TypeName,
    pub tag: String,
    pub payload: Box<Value>,
}

impl Variant {
    pub fn new(type_name: TypeName, tag: impl Into<String>, payload: Value) -> Self {
        Self {
            type_name,
            tag: tag.into(),
            payload: Box::new(payload),
        }
    }
}

/// The identity-only kinds a [`Handle`] can represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Fn,
    RawPtr,
    Sync,
    Addr,
}

impl HandleKind {
    pub fn kind(&self) -> Kind {
        match self {
            HandleKind::Fn => Kind::Fn,
            HandleKind::RawPtr => Kind::RawPtr,
            HandleKind::Sync => Kind::Sync,
            HandleKind::Addr => Kind::Addr,
        }
    }
}

/// A value that is only meaningful by address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handle {
    pub kind: HandleKind,
    pub type_name: String,
    pub addr: usize,
}

impl Handle {
    pub fn new(kind: HandleKind, type_name: impl Into<String>, addr: usize) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            addr,
        }
    }
}

/// A value with no structured form; only its rendering survives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Opaque {
    pub type_name: String,
    pub repr: String,
}

impl Opaque {
    pub fn new(type_name: impl Into<String>, repr: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            repr: repr.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A lowered runtime value of any shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
    Complex64(Complex<f32>),
    Complex128(Complex<f64>),
    String(String),
    Unit,
    Struct(Record),
    Map(Mapping),
    Seq(Sequence),
    Ref(Box<Value>),
    Variant(Variant),
    Dyn(Box<Value>),
    Handle(Handle),
    Opaque(Opaque),
    /// The absent marker.
    #[default]
    Invalid,
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Char(_) => Kind::Char,
            Value::I8(_) => Kind::I8,
            Value::I16(_) => Kind::I16,
            Value::I32(_) => Kind::I32,
            Value::I64(_) => Kind::I64,
            Value::I128(_) => Kind::I128,
            Value::Isize(_) => Kind::Isize,
            Value::U8(_) => Kind::U8,
            Value::U16(_) => Kind::U16,
            Value::U32(_) => Kind::U32,
            Value::U64(_) => Kind::U64,
            Value::U128(_) => Kind::U128,
            Value::Usize(_) => Kind::Usize,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
            Value::Complex64(_) => Kind::Complex64,
            Value::Complex128(_) => Kind::Complex128,
            Value::String(_) => Kind::String,
            Value::Unit => Kind::Unit,
            Value::Struct(_) => Kind::Struct,
            Value::Map(_) => Kind::Map,
            Value::Seq(seq) if seq.fixed => Kind::Array,
            Value::Seq(_) => Kind::Slice,
            Value::Ref(_) => Kind::Ref,
            Value::Variant(_) => Kind::Variant,
            Value::Dyn(_) => Kind::Dyn,
            Value::Handle(handle) => handle.kind.kind(),
            Value::Opaque(_) => Kind::Opaque,
            Value::Invalid => Kind::Invalid,
        }
    }

    /// The declared type name, for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Complex64(_) => "Complex<f32>".into(),
            Value::Complex128(_) => "Complex<f64>".into(),
            Value::String(_) => "String".into(),
            Value::Unit => "()".into(),
            Value::Struct(record) => record.type_name.qualified(),
            Value::Map(map) => map.label.clone(),
            Value::Seq(seq) => seq.label.clone(),
            Value::Ref(inner) => format!("&{}", inner.type_name()),
            Value::Variant(variant) => variant.type_name.qualified(),
            Value::Dyn(inner) => format!("dyn {}", inner.type_name()),
            Value::Handle(handle) => handle.type_name.clone(),
            Value::Opaque(opaque) => opaque.type_name.clone(),
            Value::Invalid => "<invalid>".into(),
            scalar => scalar.kind().name().into(),
        }
    }

    /// Follow a chain of references to the first non-reference value.
    pub fn deref_all(&self) -> &Value {
        let mut current = self;
        while let Value::Ref(inner) = current {
            current = inner.as_ref();
        }
        current
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid)
    }

    /// Sort the keys of every mapping reachable from this value.
    pub fn sort_map_keys(&mut self) {
        match self {
            Value::Map(map) => map.sort_keys(),
            Value::Struct(record) => {
                for (_, value) in &mut record.fields {
                    value.sort_map_keys();
                }
            }
            Value::Seq(seq) => {
                for item in &mut seq.items {
                    item.sort_map_keys();
                }
            }
            Value::Ref(inner) | Value::Dyn(inner) => inner.sort_map_keys(),
            Value::Variant(variant) => variant.payload.sort_map_keys(),
            _ => {}
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Struct(record)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(map)
    }
}

impl From<Sequence> for Value {
    fn from(seq: Sequence) -> Self {
        Value::Seq(seq)
    }
}

impl From<Variant> for Value {
    fn from(variant: Variant) -> Self {
        Value::Variant(variant)
    }
}

impl From<Handle> for Value {
    fn from(handle: Handle) -> Self {
        Value::Handle(handle)
    }
}

fn write_joined<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (idx, item) in items.into_iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.type_name.name;
        if self.fields.is_empty() {
            return f.write_str(name);
        }
        if self.is_positional() {
            write!(f, "{name}(")?;
            write_joined(f, self.fields.iter().map(|(_, value)| value))?;
            return f.write_str(")");
        }
        write!(f, "{name} {{ ")?;
        for (idx, (field, value)) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {value}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::I128(v) => write!(f, "{v}"),
            Value::Isize(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::U128(v) => write!(f, "{v}"),
            Value::Usize(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Complex64(v) => write!(f, "({v})"),
            Value::Complex128(v) => write!(f, "({v})"),
            Value::String(v) => f.write_str(v),
            Value::Unit => f.write_str("()"),
            Value::Struct(record) => write!(f, "{record}"),
            Value::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, value)) in map.entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Seq(seq) => {
                f.write_str("[")?;
                write_joined(f, &seq.items)?;
                f.write_str("]")
            }
            Value::Ref(inner) => write!(f, "&{inner}"),
            Value::Variant(variant) => match variant.payload.as_ref() {
                Value::Unit => f.write_str(&variant.tag),
                Value::Struct(record) => write!(f, "{record}"),
                payload => write!(f, "{}({payload})", variant.tag),
            },
            Value::Dyn(inner) => write!(f, "{inner}"),
            Value::Handle(handle) => write!(f, "{:#x}", handle.addr),
            Value::Opaque(opaque) => f.write_str(&opaque.repr),
            Value::Invalid => f.write_str("<absent>"),
        }
    }
}
