//! Type categories and classification of declared type text.

use serde::{Deserialize, Serialize};

use crate::scanner::Language;

/// Coarse type classification shared by every language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    Integer,
    FloatingPoint,
    Text,
    Boolean,
    Collection,
    ReferenceType,
    Unknown,
}

impl TypeCategory {
    pub fn is_numeric(self) -> bool {
        matches!(self, TypeCategory::Integer | TypeCategory::FloatingPoint)
    }

    pub fn label(self) -> &'static str {
        match self {
            TypeCategory::Integer => "integer",
            TypeCategory::FloatingPoint => "float",
            TypeCategory::Text => "text",
            TypeCategory::Boolean => "boolean",
            TypeCategory::Collection => "collection",
            TypeCategory::ReferenceType => "reference",
            TypeCategory::Unknown => "unknown",
        }
    }
}

/// Where a numeric bound was learned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeOrigin {
    /// The storage width of the type; values past it are not representable.
    TypeWidth,
    /// A validation annotation such as `@Min`.
    Annotation,
    /// An error guard in the body (`if x < 0 throw`).
    Guard,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    pub value: f64,
    pub origin: RangeOrigin,
}

/// Inclusive valid range of a numeric parameter. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: Option<RangeBound>,
    pub max: Option<RangeBound>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>, origin: RangeOrigin) -> Self {
        Self {
            min: min.map(|value| RangeBound { value, origin }),
            max: max.map(|value| RangeBound { value, origin }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Narrow `self` by `other`, keeping the tighter bound on each side.
    pub fn narrowed(&self, other: &NumericRange) -> NumericRange {
        let min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(if b.value > a.value { b } else { a }),
            (a, b) => a.or(b),
        };
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(if b.value < a.value { b } else { a }),
            (a, b) => a.or(b),
        };
        NumericRange { min, max }
    }

    pub fn is_consistent(&self) -> bool {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => lo.value <= hi.value,
            _ => true,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min.map_or(true, |b| v >= b.value) && self.max.map_or(true, |b| v <= b.value)
    }
}

/// Result of classifying a declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub category: TypeCategory,
    pub nullable: bool,
    pub range: Option<NumericRange>,
}

impl TypeInfo {
    fn plain(category: TypeCategory) -> Self {
        Self {
            category,
            nullable: false,
            range: None,
        }
    }
}

const VOID_NAMES: &[&str] = &["void", "None", "()", "never", "Void", "undefined"];

/// True for declared return types meaning "returns nothing".
pub fn is_void_type(text: &str) -> bool {
    let t = text.trim().trim_start_matches("->").trim();
    let t = t.trim_start_matches(':').trim();
    VOID_NAMES.contains(&t) || t == "Task" || t == "Promise<void>"
}

const INTEGER_NAMES: &[&str] = &[
    "int", "integer", "long", "short", "byte", "sbyte", "uint", "ulong", "ushort", "nint",
    "nuint", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize", "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64",
    "uintptr", "rune", "size_t", "ssize_t", "ptrdiff_t", "int8_t", "int16_t", "int32_t",
    "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t", "intptr_t", "uintptr_t",
    "long long", "long int", "short int", "unsigned", "unsigned int", "unsigned long",
    "unsigned long long", "unsigned short", "unsigned char", "signed", "signed char",
    "signed int", "Integer", "Long", "Short", "Byte", "BigInteger", "Int16", "Int32",
    "Int64", "UInt16", "UInt32", "UInt64", "SByte", "bigint", "AtomicInteger", "AtomicLong",
];

const FLOAT_NAMES: &[&str] = &[
    "float", "double", "decimal", "f32", "f64", "float32", "float64", "Float", "Double",
    "Decimal", "BigDecimal", "Single", "number", "Number", "long double",
];

const TEXT_NAMES: &[&str] = &[
    "str", "String", "string", "char", "Character", "CharSequence", "StringBuilder",
    "string_view", "wstring", "wchar_t", "Cow",
];

const BOOL_NAMES: &[&str] = &["bool", "boolean", "Boolean", "_Bool"];

const COLLECTION_NAMES: &[&str] = &[
    "list", "List", "ArrayList", "LinkedList", "Vec", "VecDeque", "vector", "deque", "array",
    "Array", "ReadonlyArray", "dict", "Dict", "Map", "HashMap", "BTreeMap", "TreeMap",
    "LinkedHashMap", "map", "unordered_map", "set", "Set", "HashSet", "BTreeSet", "TreeSet",
    "unordered_set", "tuple", "Tuple", "Sequence", "MutableSequence", "Iterable", "Collection",
    "IEnumerable", "IList", "ICollection", "IReadOnlyList", "IReadOnlyCollection",
    "Dictionary", "IDictionary", "Span", "ReadOnlySpan", "bytes", "bytearray", "frozenset",
    "Record", "Mapping", "MutableMapping",
];

const UNKNOWN_NAMES: &[&str] = &[
    "any", "Any", "object", "Object", "var", "auto", "interface{}", "dynamic", "unknown",
    "T", "U", "K", "V", "E",
];

/// Classify declared type text in the conventions of `language`.
pub fn classify_type(language: Language, raw: &str) -> TypeInfo {
    let mut text = raw.trim().to_string();
    if text.is_empty() {
        return TypeInfo::plain(TypeCategory::Unknown);
    }
    let mut nullable = false;

    // Qualifiers that do not change the category.
    for prefix in ["const ", "final ", "readonly ", "volatile ", "mut ", "struct ", "ref ", "out ", "in ", "params ", "dyn ", "impl "] {
        while let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim().to_string();
        }
    }
    text = text.trim_end_matches("const").trim().to_string();

    // References.
    while let Some(rest) = text.strip_prefix('&') {
        text = rest.trim_start_matches("mut ").trim().to_string();
    }
    while let Some(rest) = text.strip_suffix('&') {
        text = rest.trim().to_string();
    }

    // Union types: `X | None`, `string | null`.
    if text.contains('|') && !text.contains('[') && !text.contains('<') {
        let parts: Vec<&str> = text.split('|').map(str::trim).collect();
        let kept: Vec<&str> = parts
            .iter()
            .copied()
            .filter(|p| !matches!(*p, "None" | "null" | "undefined"))
            .collect();
        if kept.len() < parts.len() {
            nullable = true;
        }
        if kept.len() != 1 {
            return TypeInfo {
                category: TypeCategory::Unknown,
                nullable,
                range: None,
            };
        }
        text = kept[0].to_string();
    }

    // Nullable wrappers.
    if let Some(rest) = text.strip_suffix('?') {
        nullable = true;
        text = rest.trim().to_string();
    }
    for wrapper in ["Optional[", "Option<", "Nullable<"] {
        if text.starts_with(wrapper) && (text.ends_with(']') || text.ends_with('>')) {
            nullable = true;
            text = text[wrapper.len()..text.len() - 1].trim().to_string();
        }
    }

    // Pointers.
    if language == Language::Go {
        if let Some(rest) = text.strip_prefix('*') {
            let mut inner = classify_type(language, rest);
            inner.nullable = true;
            return inner;
        }
    }
    if matches!(language, Language::C | Language::Cpp) && text.ends_with('*') {
        let base = text.trim_end_matches('*').trim();
        let base = base.trim_start_matches("const ").trim();
        let category = if matches!(base, "char" | "wchar_t") {
            TypeCategory::Text
        } else {
            TypeCategory::ReferenceType
        };
        return TypeInfo {
            category,
            nullable: true,
            range: None,
        };
    }

    // Array syntax.
    if text.ends_with("[]")
        || text.ends_with("...")
        || (language == Language::Go && (text.starts_with('[') || text.starts_with("map[")))
        || (language == Language::Rust && text.starts_with('['))
    {
        return TypeInfo {
            category: TypeCategory::Collection,
            nullable: nullable || default_nullable(language, TypeCategory::Collection, &text),
            range: None,
        };
    }

    // Strip generics and namespaces: `java.util.List<String>` -> `List`.
    let base_end = text.find(['<', '[']).unwrap_or(text.len());
    let mut base = text[..base_end].trim().to_string();
    if !base.contains(' ') {
        if let Some(idx) = base.rfind("::") {
            base = base[idx + 2..].to_string();
        }
        if language != Language::Go || !base.starts_with("interface") {
            if let Some(idx) = base.rfind('.') {
                base = base[idx + 1..].to_string();
            }
        }
    }
    let base = base.as_str();

    let category = if UNKNOWN_NAMES.contains(&base) || base.starts_with("interface") {
        TypeCategory::Unknown
    } else if language == Language::Java && base == "char" {
        TypeCategory::Text
    } else if INTEGER_NAMES.contains(&base) {
        TypeCategory::Integer
    } else if FLOAT_NAMES.contains(&base) {
        TypeCategory::FloatingPoint
    } else if TEXT_NAMES.contains(&base) {
        TypeCategory::Text
    } else if BOOL_NAMES.contains(&base) {
        TypeCategory::Boolean
    } else if COLLECTION_NAMES.contains(&base) {
        TypeCategory::Collection
    } else {
        TypeCategory::ReferenceType
    };

    TypeInfo {
        category,
        nullable: nullable || default_nullable(language, category, base),
        range: if category == TypeCategory::Integer {
            width_range(language, base).map(|(lo, hi)| NumericRange::new(lo, hi, RangeOrigin::TypeWidth))
        } else {
            None
        },
    }
}

fn default_nullable(language: Language, category: TypeCategory, base: &str) -> bool {
    match language {
        Language::Java => !matches!(
            base,
            "int" | "long" | "short" | "byte" | "char" | "float" | "double" | "boolean"
        ),
        Language::CSharp => matches!(
            category,
            TypeCategory::Text | TypeCategory::Collection | TypeCategory::ReferenceType | TypeCategory::Unknown
        ),
        Language::Go => {
            category == TypeCategory::Collection
                || base == "error"
                || base == "any"
                || base.starts_with("interface")
        }
        _ => false,
    }
}

/// Representable range of narrow or unsigned integer types.
fn width_range(language: Language, base: &str) -> Option<(Option<f64>, Option<f64>)> {
    const I8: (Option<f64>, Option<f64>) = (Some(-128.0), Some(127.0));
    const U8: (Option<f64>, Option<f64>) = (Some(0.0), Some(255.0));
    const I16: (Option<f64>, Option<f64>) = (Some(-32_768.0), Some(32_767.0));
    const U16: (Option<f64>, Option<f64>) = (Some(0.0), Some(65_535.0));
    const U32: (Option<f64>, Option<f64>) = (Some(0.0), Some(4_294_967_295.0));
    const UNSIGNED: (Option<f64>, Option<f64>) = (Some(0.0), None);

    let range = match base {
        "byte" if language == Language::Java => I8,
        "byte" | "Byte" if language == Language::CSharp => U8,
        "Byte" => I8,
        "byte" | "u8" | "uint8" | "uint8_t" | "unsigned char" => U8,
        "sbyte" | "SByte" | "i8" | "int8" | "int8_t" | "signed char" => I8,
        "short" | "Short" | "Int16" | "i16" | "int16" | "int16_t" | "short int" => I16,
        "ushort" | "UInt16" | "u16" | "uint16" | "uint16_t" | "unsigned short" => U16,
        "UInt32" | "u32" | "uint32" | "uint32_t" | "unsigned" | "unsigned int" => U32,
        "uint" if language == Language::CSharp => U32,
        "ulong" | "UInt64" | "u64" | "u128" | "usize" | "uint64" | "uint" | "uintptr"
        | "uint64_t" | "size_t" | "uintptr_t" | "unsigned long" | "unsigned long long"
        | "nuint" => UNSIGNED,
        _ => return None,
    };
    Some(range)
}
