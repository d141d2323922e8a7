//! Runtime type descriptions.
//!
//! [`Reflect`] gives every supported type a [`TypeInfo`]: its identity, the
//! module it was declared in, and the shape the classifier dispatches on.
//! Structs get it from `#[derive(Entity)]`, unit enums from `#[derive(Reflect)]`.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::synthesize::ErasedBuilder;

/// Stable identifier of a Rust type. Compared by [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Scalar types with a dedicated generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Char,
    String,
    /// `Vec<u8>` is generated as a byte buffer, not as a list.
    Bytes,
    #[cfg(feature = "chrono")]
    Date,
    #[cfg(feature = "chrono")]
    NaiveDateTime,
    #[cfg(feature = "chrono")]
    DateTime,
    #[cfg(feature = "decimal")]
    Decimal,
    #[cfg(feature = "uuid")]
    Uuid,
}

impl Primitive {
    /// Inclusive bounds of integer primitives.
    pub fn integer_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            Primitive::I8 => (i8::MIN as i128, i8::MAX as i128),
            Primitive::I16 => (i16::MIN as i128, i16::MAX as i128),
            Primitive::I32 => (i32::MIN as i128, i32::MAX as i128),
            Primitive::I64 => (i64::MIN as i128, i64::MAX as i128),
            Primitive::Isize => (isize::MIN as i128, isize::MAX as i128),
            Primitive::U8 => (0, u8::MAX as i128),
            Primitive::U16 => (0, u16::MAX as i128),
            Primitive::U32 => (0, u32::MAX as i128),
            Primitive::U64 => (0, u64::MAX as i128),
            Primitive::Usize => (0, usize::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }

    pub fn is_integer(self) -> bool {
        self.integer_bounds().is_some()
    }

    pub fn is_float(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }
}

/// Unit variants of an enum, spelled as they serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumInfo {
    pub variants: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    List,
    Set,
    Map,
    /// Fixed-length array.
    Array(usize),
}

#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub shape: CollectionShape,
    pub element: Box<TypeInfo>,
    /// Key type for maps.
    pub key: Option<Box<TypeInfo>>,
}

/// Instantiates the dynamic builder of a complex type.
pub type SynthesizeFn = fn() -> Arc<dyn ErasedBuilder>;

#[derive(Debug, Clone, Copy)]
pub struct ComplexInfo {
    /// Whether the type is declared `pub`.
    pub accessible: bool,
    pub synthesize: Option<SynthesizeFn>,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive(Primitive),
    Enum(EnumInfo),
    /// `Option<T>`.
    Nullable(Box<TypeInfo>),
    Collection(CollectionInfo),
    /// A struct built through a builder. Fields are not part of the
    /// description so self-referential types stay finite.
    Complex(ComplexInfo),
}

/// Runtime description of one type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub key: TypeKey,
    pub module_path: &'static str,
    pub kind: TypeKind,
}

impl TypeInfo {
    pub fn primitive<T: ?Sized + 'static>(primitive: Primitive) -> Self {
        Self::with_kind::<T>(None, TypeKind::Primitive(primitive))
    }

    pub fn enumeration<T: 'static>(
        module_path: &'static str,
        variants: &'static [&'static str],
    ) -> Self {
        Self::with_kind::<T>(Some(module_path), TypeKind::Enum(EnumInfo { variants }))
    }

    pub fn nullable<T: 'static>(inner: TypeInfo) -> Self {
        Self::with_kind::<T>(None, TypeKind::Nullable(Box::new(inner)))
    }

    pub fn collection<T: ?Sized + 'static>(
        shape: CollectionShape,
        element: TypeInfo,
        key: Option<TypeInfo>,
    ) -> Self {
        Self::with_kind::<T>(
            None,
            TypeKind::Collection(CollectionInfo {
                shape,
                element: Box::new(element),
                key: key.map(Box::new),
            }),
        )
    }

    pub fn complex<T: 'static>(
        module_path: &'static str,
        accessible: bool,
        synthesize: Option<SynthesizeFn>,
    ) -> Self {
        Self::with_kind::<T>(
            Some(module_path),
            TypeKind::Complex(ComplexInfo {
                accessible,
                synthesize,
            }),
        )
    }

    fn with_kind<T: ?Sized + 'static>(module_path: Option<&'static str>, kind: TypeKind) -> Self {
        let key = TypeKey::of::<T>();
        Self {
            key,
            module_path: module_path.unwrap_or_else(|| module_of(key.name())),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    /// First segment of the declaring module path.
    pub fn crate_name(&self) -> &'static str {
        crate_of(self.module_path)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, TypeKind::Complex(_))
    }
}

/// Crate segment of a `::`-separated module path.
pub fn crate_of(module_path: &str) -> &str {
    module_path.split("::").next().unwrap_or(module_path)
}

// `alloc::vec::Vec<u8>` -> `alloc::vec`; generic arguments are ignored.
fn module_of(type_name: &'static str) -> &'static str {
    let head = type_name.split('<').next().unwrap_or(type_name);
    match head.rfind("::") {
        Some(idx) => &head[..idx],
        None => "",
    }
}

/// Types that can describe themselves at runtime.
pub trait Reflect: 'static {
    fn type_info() -> TypeInfo;
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! reflect_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::primitive::<$ty>(Primitive::$kind)
                }
            }
        )*
    };
}

reflect_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
}

#[cfg(feature = "chrono")]
reflect_primitive! {
    chrono::NaiveDate => Date,
    chrono::NaiveDateTime => NaiveDateTime,
    chrono::DateTime<chrono::Utc> => DateTime,
}

#[cfg(feature = "decimal")]
reflect_primitive! {
    rust_decimal::Decimal => Decimal,
}

#[cfg(feature = "uuid")]
reflect_primitive! {
    uuid::Uuid => Uuid,
}

// ---------------------------------------------------------------------------
// Wrappers and collections
// ---------------------------------------------------------------------------

impl<T: Reflect> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::nullable::<Self>(T::type_info())
    }
}

/// Boxes are transparent.
impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn type_info() -> TypeInfo {
        T::type_info()
    }
}

impl<T: Reflect> Reflect for [T] {
    fn type_info() -> TypeInfo {
        TypeInfo::collection::<Self>(CollectionShape::List, T::type_info(), None)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::collection::<Self>(CollectionShape::Array(N), T::type_info(), None)
    }
}

macro_rules! reflect_sequence {
    ($($ty:ident => $shape:ident),* $(,)?) => {
        $(
            impl<T: Reflect> Reflect for $ty<T> {
                fn type_info() -> TypeInfo {
                    TypeInfo::collection::<Self>(CollectionShape::$shape, T::type_info(), None)
                }
            }
        )*
    };
}

reflect_sequence! {
    Vec => List,
    VecDeque => List,
    HashSet => Set,
    BTreeSet => Set,
}

impl<K: Reflect, V: Reflect> Reflect for HashMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::collection::<Self>(CollectionShape::Map, V::type_info(), Some(K::type_info()))
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::collection::<Self>(CollectionShape::Map, V::type_info(), Some(K::type_info()))
    }
}
