use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as Json};

/// Fixed-width numeric kinds. All of them travel little-endian with no
/// alignment padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 6] = [
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::F32,
        ScalarKind::F64,
    ];

    /// Wire width in bytes.
    pub fn width(self) -> usize {
        match self {
            ScalarKind::U8 => 1,
            ScalarKind::U16 => 2,
            ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::F64 => 8,
        }
    }

    pub fn c_type(self) -> &'static str {
        match self {
            ScalarKind::U8 => "uint8_t",
            ScalarKind::U16 => "uint16_t",
            ScalarKind::U32 => "uint32_t",
            ScalarKind::U64 => "uint64_t",
            ScalarKind::F32 => "float",
            ScalarKind::F64 => "double",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<ScalarKind> {
        ScalarKind::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

/// A named member of a struct, or a variant of an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty:   FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Field {
        Field { name: name.into(), ty }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// u32 length prefix followed by that many bytes.
    Text,
    FixedBytes(usize),
    FixedArray(Box<FieldType>, usize),
    /// One presence byte, then the payload iff the byte is nonzero.
    Optional(Box<FieldType>),
    Struct(Vec<Field>),
    /// One variant-index byte, then the selected variant's payload.
    Enum(Vec<Field>),
}

impl FieldType {
    pub fn array(element: FieldType, count: usize) -> FieldType {
        FieldType::FixedArray(Box::new(element), count)
    }

    pub fn optional(inner: FieldType) -> FieldType {
        FieldType::Optional(Box::new(inner))
    }

    /// Wire width when it does not depend on the value being encoded.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            FieldType::Scalar(kind) => Some(kind.width()),
            FieldType::FixedBytes(n) => Some(*n),
            FieldType::FixedArray(element, count) => element.fixed_width()?.checked_mul(*count),
            FieldType::Struct(fields) => fields
                .iter()
                .try_fold(0usize, |acc, f| acc.checked_add(f.ty.fixed_width()?)),
            FieldType::Text | FieldType::Optional(_) | FieldType::Enum(_) => None,
        }
    }

    /// True when a field of this type must be addressed through the runtime
    /// cursor, and every field after it too.
    pub fn forces_dynamic(&self) -> bool {
        match self {
            FieldType::Text | FieldType::Optional(_) => true,
            FieldType::FixedArray(element, _) => element.forces_dynamic(),
            _ => false,
        }
    }

    /// Parses the normalized JSON form, e.g. `"u8"`, `"string"`, `[32]`,
    /// `["u16", 4]`, `{"kind": "option", "type": "string"}`.
    pub fn from_json(raw: &Json) -> Result<FieldType, String> {
        match raw {
            Json::String(name) if name == "string" => Ok(FieldType::Text),
            Json::String(name) => ScalarKind::from_name(name)
                .map(FieldType::Scalar)
                .ok_or_else(|| format!("unknown type {:?}", name)),
            Json::Array(items) => match items.as_slice() {
                [Json::Number(n)] => Ok(FieldType::FixedBytes(json_count(n)?)),
                [element, Json::Number(n)] => Ok(FieldType::array(
                    FieldType::from_json(element)?,
                    json_count(n)?,
                )),
                [_] => Err("dynamically sized arrays are not supported".to_string()),
                _ => Err(format!("malformed array type {}", raw)),
            },
            Json::Object(map) => match map.get("kind").and_then(Json::as_str) {
                Some("option") => {
                    let inner = map
                        .get("type")
                        .ok_or_else(|| "option is missing \"type\"".to_string())?;
                    Ok(FieldType::optional(FieldType::from_json(inner)?))
                }
                Some("struct") => Ok(FieldType::Struct(fields_from_json(map.get("fields"))?)),
                Some("enum") => Ok(FieldType::Enum(fields_from_json(map.get("values"))?)),
                Some(other) => Err(format!("unknown kind {:?}", other)),
                None => Err("type object is missing \"kind\"".to_string()),
            },
            other => Err(format!("malformed type {}", other)),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            FieldType::Scalar(kind) => json!(kind.name()),
            FieldType::Text => json!("string"),
            FieldType::FixedBytes(n) => json!([n]),
            FieldType::FixedArray(element, count) => json!([element.to_json(), count]),
            FieldType::Optional(inner) => json!({ "kind": "option", "type": inner.to_json() }),
            FieldType::Struct(fields) => json!({ "kind": "struct", "fields": fields_to_json(fields) }),
            FieldType::Enum(variants) => json!({ "kind": "enum", "values": fields_to_json(variants) }),
        }
    }
}

fn json_count(n: &serde_json::Number) -> Result<usize, String> {
    n.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| format!("invalid length {}", n))
}

fn fields_from_json(raw: Option<&Json>) -> Result<Vec<Field>, String> {
    let items = raw
        .and_then(Json::as_array)
        .ok_or_else(|| "expected a list of [name, type] pairs".to_string())?;

    items
        .iter()
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([Json::String(name), ty]) => Ok(Field::new(name.clone(), FieldType::from_json(ty)?)),
            _ => Err(format!("expected [name, type], found {}", item)),
        })
        .collect()
}

fn fields_to_json(fields: &[Field]) -> Json {
    Json::Array(
        fields
            .iter()
            .map(|f| json!([f.name, f.ty.to_json()]))
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Struct,
    Enum,
}

/// A top-level record layout. Field order is wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind:   SchemaKind,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new_struct(fields: Vec<Field>) -> Schema {
        Schema { kind: SchemaKind::Struct, fields }
    }

    pub fn new_enum(variants: Vec<Field>) -> Schema {
        Schema { kind: SchemaKind::Enum, fields: variants }
    }

    /// The schema viewed as a single field type.
    pub fn as_field_type(&self) -> FieldType {
        match self.kind {
            SchemaKind::Struct => FieldType::Struct(self.fields.clone()),
            SchemaKind::Enum => FieldType::Enum(self.fields.clone()),
        }
    }

    pub fn from_json(raw: &Json) -> Result<Schema, String> {
        match FieldType::from_json(raw)? {
            FieldType::Struct(fields) => Ok(Schema::new_struct(fields)),
            FieldType::Enum(variants) => Ok(Schema::new_enum(variants)),
            other => Err(format!(
                "a schema must be a struct or an enum, found {}",
                other.to_json()
            )),
        }
    }

    pub fn to_json(&self) -> Json {
        self.as_field_type().to_json()
    }
}

impl Serialize for ScalarKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        FieldType::from_json(&raw).map_err(D::Error::custom)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Schema::from_json(&raw).map_err(D::Error::custom)
    }
}
