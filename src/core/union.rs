//! Purpose: Decode and encode JSON tagged unions (several record shapes sharing one JSON position).
//! Exports: `TaggedUnion`, `Discriminator`, `Arm`, `Carrier`, `UnionError`, `decode`, `encode`.
//! Role: The one codec behind every polymorphic field in the API models.
//! Invariants: Presence arms are tried in declared order; the first key present wins.
//! Invariants: A payload matching no arm is an error carrying the raw JSON, never a default variant.
//! Invariants: Encoding nests under the same key (or writes the same field value) decoding looks for.
use super::error::{Error, ErrorKind};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;

/// Where the variant payload lives relative to its discriminator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Carrier {
    /// The discriminator key holds the payload: `{"jar": "dbfs:/a.jar"}`.
    Nested,
    /// The discriminator only signals the shape; the whole object is the payload.
    Flat,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arm {
    pub tag: &'static str,
    pub carrier: Carrier,
}

impl Arm {
    pub const fn nested(tag: &'static str) -> Self {
        Self {
            tag,
            carrier: Carrier::Nested,
        }
    }

    pub const fn flat(tag: &'static str) -> Self {
        Self {
            tag,
            carrier: Carrier::Flat,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Discriminator {
    /// Variant selected by which key is present.
    Presence(&'static [Arm]),
    /// Variant selected by the string value of `field`; payloads are always flat.
    FieldValue {
        field: &'static str,
        tags: &'static [&'static str],
    },
}

/// A closed family of JSON shapes.
///
/// `from_arm` receives the tag chosen by the dispatch table and the payload
/// extracted for it; `to_arm` is the inverse and must report one of the tags
/// listed in `DISCRIMINATOR`.
pub trait TaggedUnion: Sized {
    const FAMILY: &'static str;
    const DISCRIMINATOR: Discriminator;

    fn from_arm(tag: &str, payload: Value) -> serde_json::Result<Self>;

    fn to_arm(&self) -> (&'static str, serde_json::Result<Value>);
}

#[derive(Debug)]
pub enum UnionError {
    NotAnObject {
        family: &'static str,
        raw: String,
    },
    NoMatchingVariant {
        family: &'static str,
        raw: String,
    },
    Payload {
        family: &'static str,
        tag: String,
        source: serde_json::Error,
    },
    UnknownTag {
        family: &'static str,
        tag: &'static str,
    },
    Shape {
        family: &'static str,
        tag: &'static str,
        message: &'static str,
    },
}

impl UnionError {
    pub fn family(&self) -> &'static str {
        match self {
            UnionError::NotAnObject { family, .. }
            | UnionError::NoMatchingVariant { family, .. }
            | UnionError::Payload { family, .. }
            | UnionError::UnknownTag { family, .. }
            | UnionError::Shape { family, .. } => family,
        }
    }
}

impl fmt::Display for UnionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnionError::NotAnObject { family, raw } => {
                write!(f, "{family}: expected a JSON object, got {raw}")
            }
            UnionError::NoMatchingVariant { family, raw } => {
                write!(f, "no matching variant for {family}: {raw}")
            }
            UnionError::Payload {
                family,
                tag,
                source,
            } => write!(f, "invalid {family} payload for `{tag}`: {source}"),
            UnionError::UnknownTag { family, tag } => {
                write!(f, "{family} has no variant tagged `{tag}`")
            }
            UnionError::Shape {
                family,
                tag,
                message,
            } => write!(f, "{family} variant `{tag}`: {message}"),
        }
    }
}

impl StdError for UnionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            UnionError::Payload { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<UnionError> for Error {
    fn from(err: UnionError) -> Self {
        Error::new(ErrorKind::Format)
            .with_message(format!("invalid {} value", err.family()))
            .with_source(err)
    }
}

pub fn decode<T: TaggedUnion>(value: Value) -> Result<T, UnionError> {
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(UnionError::NotAnObject {
                family: T::FAMILY,
                raw: other.to_string(),
            });
        }
    };

    match T::DISCRIMINATOR {
        Discriminator::Presence(arms) => {
            let Some(arm) = arms.iter().find(|arm| object.contains_key(arm.tag)) else {
                return Err(no_matching_variant::<T>(object));
            };
            let payload = match arm.carrier {
                Carrier::Nested => {
                    let mut object = object;
                    object.remove(arm.tag).unwrap_or(Value::Null)
                }
                Carrier::Flat => Value::Object(object),
            };
            decode_payload(arm.tag, payload)
        }
        Discriminator::FieldValue { field, tags } => {
            let tag = object
                .get(field)
                .and_then(Value::as_str)
                .and_then(|value| tags.iter().copied().find(|tag| *tag == value));
            match tag {
                Some(tag) => decode_payload(tag, Value::Object(object)),
                None => Err(no_matching_variant::<T>(object)),
            }
        }
    }
}

pub fn encode<T: TaggedUnion>(value: &T) -> Result<Value, UnionError> {
    let (tag, payload) = value.to_arm();
    let payload = payload.map_err(|source| UnionError::Payload {
        family: T::FAMILY,
        tag: tag.to_string(),
        source,
    })?;

    match T::DISCRIMINATOR {
        Discriminator::Presence(arms) => {
            let arm = arms
                .iter()
                .find(|arm| arm.tag == tag)
                .ok_or(UnionError::UnknownTag {
                    family: T::FAMILY,
                    tag,
                })?;
            match arm.carrier {
                Carrier::Nested => {
                    let mut object = Map::new();
                    object.insert(tag.to_string(), payload);
                    Ok(Value::Object(object))
                }
                Carrier::Flat => match payload {
                    Value::Object(object) if object.contains_key(tag) => Ok(Value::Object(object)),
                    _ => Err(UnionError::Shape {
                        family: T::FAMILY,
                        tag,
                        message: "flat payload must be an object carrying its discriminator",
                    }),
                },
            }
        }
        Discriminator::FieldValue { field, tags } => {
            if !tags.contains(&tag) {
                return Err(UnionError::UnknownTag {
                    family: T::FAMILY,
                    tag,
                });
            }
            match payload {
                Value::Object(mut object) => {
                    object.insert(field.to_string(), Value::String(tag.to_string()));
                    Ok(Value::Object(object))
                }
                _ => Err(UnionError::Shape {
                    family: T::FAMILY,
                    tag,
                    message: "value-keyed payload must be an object",
                }),
            }
        }
    }
}

fn decode_payload<T: TaggedUnion>(tag: &'static str, payload: Value) -> Result<T, UnionError> {
    T::from_arm(tag, payload).map_err(|source| UnionError::Payload {
        family: T::FAMILY,
        tag: tag.to_string(),
        source,
    })
}

fn no_matching_variant<T: TaggedUnion>(object: Map<String, Value>) -> UnionError {
    UnionError::NoMatchingVariant {
        family: T::FAMILY,
        raw: Value::Object(object).to_string(),
    }
}

/// Route a family's serde impls through `decode`/`encode`.
macro_rules! impl_union_serde {
    ($ty:ty) => {
        impl ::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                let value =
                    $crate::core::union::encode(self).map_err(::serde::ser::Error::custom)?;
                ::serde::Serialize::serialize(&value, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value =
                    <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                $crate::core::union::decode(value).map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_union_serde;
