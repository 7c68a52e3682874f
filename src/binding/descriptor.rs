// Type descriptor. Rust has no runtime reflection, so callers hand the
// planner a plain data description of a record type's recognized members
// instead of the planner discovering them itself: one descriptor built
// once per type, consumed by `plan`.

use std::sync::Arc;

/// The fixed scalar converter table the binder knows how to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    Text,
    Integer,
    Unsigned,
    Float,
    Boolean,
    DateTime,
    Nullable(Box<ScalarType>),
}

/// The decoded value produced by a converter, generic across scalar types
/// so a single `setter` closure per member can consume whichever variant
/// its `ScalarType` declares.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    DateTime(chrono::DateTime<chrono::Utc>),
    Null,
}

/// One recognized public member of a target record type `T`.
pub struct MemberDescriptor<T> {
    pub name: String,
    pub scalar_type: ScalarType,
    /// Declared header name this member binds to; defaults to `name`.
    pub header_name: Option<String>,
    /// Member annotation `column_index`; when set, overrides header lookup.
    pub column_index: Option<usize>,
    pub setter: Arc<dyn Fn(&mut T, ScalarValue) + Send + Sync>,
}

impl<T> MemberDescriptor<T> {
    pub fn new(
        name: impl Into<String>,
        scalar_type: ScalarType,
        setter: impl Fn(&mut T, ScalarValue) + Send + Sync + 'static,
    ) -> Self {
        MemberDescriptor {
            name: name.into(),
            scalar_type,
            header_name: None,
            column_index: None,
            setter: Arc::new(setter),
        }
    }

    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = Some(header_name.into());
        self
    }

    pub fn with_column_index(mut self, index: usize) -> Self {
        self.column_index = Some(index);
        self
    }
}

/// The set of recognized public members of `T`, as supplied to `plan`.
pub struct TypeDescriptor<T> {
    pub members: Vec<MemberDescriptor<T>>,
}

impl<T> TypeDescriptor<T> {
    pub fn new(members: Vec<MemberDescriptor<T>>) -> Self {
        TypeDescriptor { members }
    }
}
