//! NBT tag types.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// On-disk tag type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagType {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            11 => TagType::IntArray,
            12 => TagType::LongArray,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Smallest number of bytes a payload of this type can occupy.
    pub(crate) fn min_payload_len(self) -> usize {
        match self {
            TagType::End => 0,
            TagType::Byte => 1,
            TagType::Short | TagType::String => 2,
            TagType::Int
            | TagType::Float
            | TagType::ByteArray
            | TagType::IntArray
            | TagType::LongArray => 4,
            TagType::Long | TagType::Double => 8,
            TagType::List => 5,
            TagType::Compound => 1,
        }
    }
}

/// String payload kept as the raw bytes found on disk.
///
/// Bedrock does not guarantee UTF-8 here, so nothing is lost by decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NbtString(Vec<u8>);

impl NbtString {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The string as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn is_utf8(&self) -> bool {
        self.as_str().is_some()
    }
}

impl From<&str> for NbtString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for NbtString {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl fmt::Display for NbtString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// A compound tag: names mapped to tags, in source order.
///
/// Names are unique; inserting an existing name replaces the value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NbtCompound {
    entries: IndexMap<String, NbtTag>,
}

impl NbtCompound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, returning the previous value stored under `name`.
    pub fn insert(&mut self, name: String, tag: NbtTag) -> Option<NbtTag> {
        self.entries.insert(name, tag)
    }

    pub fn get(&self, name: &str) -> Option<&NbtTag> {
        self.entries.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtTag)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(NbtTag::as_int)
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(NbtTag::as_long)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(NbtTag::as_str)
    }

    pub fn get_compound(&self, name: &str) -> Option<&NbtCompound> {
        self.get(name).and_then(NbtTag::as_compound)
    }
}

impl FromIterator<(String, NbtTag)> for NbtCompound {
    fn from_iter<I: IntoIterator<Item = (String, NbtTag)>>(iter: I) -> Self {
        let mut compound = NbtCompound::new();
        for (name, tag) in iter {
            compound.insert(name, tag);
        }
        compound
    }
}

/// One named top-level value.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtRoot {
    pub name: String,
    pub tag: NbtTag,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, tag: NbtTag) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }

    /// The root compound, when the root is one (it nearly always is).
    pub fn compound(&self) -> Option<&NbtCompound> {
        self.tag.as_compound()
    }
}

/// Represents any NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(NbtString),
    /// Element type as declared on disk, then the elements.
    List(TagType, Vec<NbtTag>),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    pub fn tag_type(&self) -> TagType {
        match self {
            NbtTag::End => TagType::End,
            NbtTag::Byte(_) => TagType::Byte,
            NbtTag::Short(_) => TagType::Short,
            NbtTag::Int(_) => TagType::Int,
            NbtTag::Long(_) => TagType::Long,
            NbtTag::Float(_) => TagType::Float,
            NbtTag::Double(_) => TagType::Double,
            NbtTag::ByteArray(_) => TagType::ByteArray,
            NbtTag::String(_) => TagType::String,
            NbtTag::List(..) => TagType::List,
            NbtTag::Compound(_) => TagType::Compound,
            NbtTag::IntArray(_) => TagType::IntArray,
            NbtTag::LongArray(_) => TagType::LongArray,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            NbtTag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            NbtTag::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            NbtTag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            NbtTag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            NbtTag::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            NbtTag::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_nbt_string(&self) -> Option<&NbtString> {
        match self {
            NbtTag::String(v) => Some(v),
            _ => None,
        }
    }

    /// String payload as text; `None` for other tags and for non-UTF-8 strings.
    pub fn as_str(&self) -> Option<&str> {
        self.as_nbt_string().and_then(NbtString::as_str)
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            NbtTag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NbtTag]> {
        match self {
            NbtTag::List(_, v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            NbtTag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            NbtTag::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            NbtTag::LongArray(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to a JSON value for dumping. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            NbtTag::End => Value::Null,
            NbtTag::Byte(v) => Value::from(*v),
            NbtTag::Short(v) => Value::from(*v),
            NbtTag::Int(v) => Value::from(*v),
            NbtTag::Long(v) => Value::from(*v),
            NbtTag::Float(v) => Number::from_f64(f64::from(*v)).map_or(Value::Null, Value::Number),
            NbtTag::Double(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            NbtTag::ByteArray(v) => Value::from(v.clone()),
            NbtTag::String(v) => Value::String(v.to_string_lossy().into_owned()),
            NbtTag::List(_, v) => Value::Array(v.iter().map(NbtTag::to_json).collect()),
            NbtTag::Compound(c) => {
                let map: Map<String, Value> =
                    c.iter().map(|(n, t)| (n.to_string(), t.to_json())).collect();
                Value::Object(map)
            }
            NbtTag::IntArray(v) => Value::from(v.clone()),
            NbtTag::LongArray(v) => Value::from(v.clone()),
        }
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtTag::End => write!(f, "END"),
            NbtTag::Byte(v) => write!(f, "{v}b"),
            NbtTag::Short(v) => write!(f, "{v}s"),
            NbtTag::Int(v) => write!(f, "{v}"),
            NbtTag::Long(v) => write!(f, "{v}L"),
            NbtTag::Float(v) => write!(f, "{v}f"),
            NbtTag::Double(v) => write!(f, "{v}d"),
            NbtTag::ByteArray(v) => write!(f, "[B; {} elements]", v.len()),
            NbtTag::String(v) => write!(f, "\"{v}\""),
            NbtTag::List(_, v) => write!(f, "[{} elements]", v.len()),
            NbtTag::Compound(v) => write!(f, "{{{} entries}}", v.len()),
            NbtTag::IntArray(v) => write!(f, "[I; {} elements]", v.len()),
            NbtTag::LongArray(v) => write!(f, "[L; {} elements]", v.len()),
        }
    }
}
