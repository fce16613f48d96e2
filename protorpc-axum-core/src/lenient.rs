//! A `serde_json::Value` deserializer that accepts string scalars.
//!
//! Querystring and form values always arrive as strings. When the target
//! field is an integer, float or boolean, a string that parses as that type
//! is accepted in place of the JSON scalar. A lone value given for a
//! repeated field is read as a one-element list, and a `null` struct field is
//! treated as absent so it takes its default. Everything else behaves exactly
//! like deserializing from `&Value`.

use serde::Deserializer;
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Unexpected, Visitor};
use serde_json::{Error, Value};

#[derive(Clone, Copy)]
pub(crate) struct Lenient<'de>(pub(crate) &'de Value);

macro_rules! coerce_from_str {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, Error>
            where
                V: Visitor<'de>,
            {
                match self.0 {
                    Value::String(s) => match s.trim().parse::<$ty>() {
                        Ok(n) => visitor.$visit(n),
                        Err(_) => Err(de::Error::invalid_type(Unexpected::Str(s), &visitor)),
                    },
                    value => Deserializer::$method(value, visitor),
                }
            }
        )*
    };
}

impl<'de> Deserializer<'de> for Lenient<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Array(items) => visitor.visit_seq(LenientSeq(items.iter())),
            Value::Object(map) => visitor.visit_map(LenientMap {
                iter: map.iter(),
                value: None,
                skip_null: false,
            }),
            value => Deserializer::deserialize_any(value, visitor),
        }
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Array(items) => visitor.visit_seq(LenientSeq(items.iter())),
            Value::Null => Deserializer::deserialize_seq(self.0, visitor),
            value => visitor.visit_seq(LenientSeq(std::slice::from_ref(value).iter())),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Object(map) => visitor.visit_map(LenientMap {
                iter: map.iter(),
                value: None,
                skip_null: true,
            }),
            value => Deserializer::deserialize_struct(value, name, fields, visitor),
        }
    }

    coerce_from_str! {
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::String(s) => match s.trim() {
                "true" => visitor.visit_bool(true),
                "false" => visitor.visit_bool(false),
                _ => Err(de::Error::invalid_type(Unexpected::Str(s), &visitor)),
            },
            value => Deserializer::deserialize_bool(value, visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error>
    where
        V: Visitor<'de>,
    {
        Deserializer::deserialize_enum(self.0, name, variants, visitor)
    }

    serde::forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct
        tuple_struct map identifier ignored_any
    }
}

struct LenientSeq<'de>(std::slice::Iter<'de, Value>);

impl<'de> SeqAccess<'de> for LenientSeq<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: DeserializeSeed<'de>,
    {
        self.0
            .next()
            .map(|value| seed.deserialize(Lenient(value)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct LenientMap<'de> {
    iter: serde_json::map::Iter<'de>,
    value: Option<&'de Value>,
    // Struct fields set to null are left out, so they take their default
    skip_null: bool,
}

impl<'de> MapAccess<'de> for LenientMap<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        for (key, value) in self.iter.by_ref() {
            if self.skip_null && value.is_null() {
                continue;
            }
            self.value = Some(value);
            return seed
                .deserialize(BorrowedStrDeserializer::new(key.as_str()))
                .map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(Lenient(value)),
            None => Err(de::Error::custom("value is missing")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Scalars {
        int: i64,
        small: u8,
        float: f64,
        flag: bool,
        name: String,
        maybe: Option<i32>,
    }

    #[test]
    fn test_string_scalars_are_coerced() {
        let value = json!({
            "int": "-12",
            "small": "7",
            "float": "2.5",
            "flag": "true",
            "name": "hello",
            "maybe": "3",
        });
        let parsed = Scalars::deserialize(Lenient(&value)).unwrap();
        assert_eq!(
            parsed,
            Scalars {
                int: -12,
                small: 7,
                float: 2.5,
                flag: true,
                name: "hello".to_string(),
                maybe: Some(3),
            }
        );
    }

    #[test]
    fn test_native_json_scalars_still_work() {
        let value = json!({
            "int": 5,
            "small": 1,
            "float": 1,
            "flag": false,
            "name": "n",
            "maybe": null,
        });
        let parsed = Scalars::deserialize(Lenient(&value)).unwrap();
        assert_eq!(parsed.int, 5);
        assert_eq!(parsed.float, 1.0);
        assert_eq!(parsed.maybe, None);
    }

    #[test]
    fn test_unparseable_string_reports_invalid_type() {
        let value = json!("not-an-int");
        let err = i64::deserialize(Lenient(&value)).unwrap_err();
        assert!(err.to_string().contains("invalid type: string \"not-an-int\""));
    }

    #[test]
    fn test_out_of_range_string_is_rejected() {
        let value = json!("300");
        assert!(u8::deserialize(Lenient(&value)).is_err());
    }

    #[test]
    fn test_scalar_for_repeated_field_becomes_one_element_list() {
        let value = json!("7");
        let parsed = Vec::<u32>::deserialize(Lenient(&value)).unwrap();
        assert_eq!(parsed, vec![7]);

        let value = json!("solo");
        let parsed = Vec::<String>::deserialize(Lenient(&value)).unwrap();
        assert_eq!(parsed, vec!["solo".to_string()]);
    }

    #[test]
    fn test_null_struct_field_takes_default() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Counter {
            #[serde(default)]
            count: i64,
            #[serde(default)]
            tags: Vec<String>,
            label: Option<String>,
        }

        let value = json!({"count": null, "tags": null, "label": null});
        let parsed = Counter::deserialize(Lenient(&value)).unwrap();
        assert_eq!(
            parsed,
            Counter {
                count: 0,
                tags: vec![],
                label: None,
            }
        );
    }

    #[test]
    fn test_null_required_field_is_missing() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Required {
            id: u32,
        }

        let value = json!({"id": null});
        let err = Required::deserialize(Lenient(&value)).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn test_null_map_entries_are_kept() {
        use std::collections::BTreeMap;

        let value = json!({"a": null, "b": "2"});
        let parsed = BTreeMap::<String, Option<u8>>::deserialize(Lenient(&value)).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a"], None);
        assert_eq!(parsed["b"], Some(2));
    }

    #[test]
    fn test_nested_sequences_are_coerced() {
        let value = json!(["1", 2, "3"]);
        let parsed = Vec::<u32>::deserialize(Lenient(&value)).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }
}
