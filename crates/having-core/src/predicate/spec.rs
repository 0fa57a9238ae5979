//! Conversion between declarative HAVING specs and predicate trees.
//!
//! Grammar (JSON, tagged by `type`):
//!
//! - `{"type": "greaterThan" | "lessThan" | "equalTo", "aggregation": <name>, "value": <number>}`
//! - `{"type": "not", "havingSpec": <spec>}`
//! - `{"type": "and" | "or", "havingSpecs": [<spec>, ...]}`
//! - `{"type": "always"}`, `{"type": "never"}`
//!
//! Keys not named by a variant are ignored.

use crate::{
    config::HavingConfig,
    error::InvalidSpecError,
    predicate::model::{CompareOp, ComparePredicate, Predicate},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value};

const TYPE_KEY: &str = "type";
const AGGREGATION_KEY: &str = "aggregation";
const VALUE_KEY: &str = "value";
const CHILD_KEY: &str = "havingSpec";
const CHILDREN_KEY: &str = "havingSpecs";

const TYPE_ALWAYS: &str = "always";
const TYPE_NEVER: &str = "never";
const TYPE_NOT: &str = "not";
const TYPE_AND: &str = "and";
const TYPE_OR: &str = "or";

/// Parse a trusted spec without size limits.
///
/// Accepts every tree `serialize` can produce. Caller-supplied specs go
/// through [`parse_with`] instead.
pub fn parse(value: &Value) -> Result<Predicate, InvalidSpecError> {
    parse_with(value, &HavingConfig::unbounded())
}

/// Parse a spec, enforcing the configured depth, fan-out and name limits.
pub fn parse_with(value: &Value, config: &HavingConfig) -> Result<Predicate, InvalidSpecError> {
    SpecParser { config }.parse_node(value, 1)
}

pub fn from_json_str(text: &str) -> Result<Predicate, InvalidSpecError> {
    let value: Value = serde_json::from_str(text)?;

    parse(&value)
}

/// Serialize a predicate back into its spec shape.
#[must_use]
pub fn serialize(predicate: &Predicate) -> Value {
    let object = match predicate {
        Predicate::Always => tagged(TYPE_ALWAYS),
        Predicate::Never => tagged(TYPE_NEVER),
        Predicate::Not(inner) => {
            let mut object = tagged(TYPE_NOT);
            object.insert(CHILD_KEY.to_string(), serialize(inner));
            object
        }
        Predicate::And(children) => tagged_children(TYPE_AND, children),
        Predicate::Or(children) => tagged_children(TYPE_OR, children),
        Predicate::Compare(cmp) => {
            let mut object = tagged(cmp.op().spec_type());
            object.insert(AGGREGATION_KEY.to_string(), Value::from(cmp.field()));
            object.insert(VALUE_KEY.to_string(), Value::from(cmp.threshold()));
            object
        }
    };

    Value::Object(object)
}

#[must_use]
pub fn to_json_string(predicate: &Predicate) -> String {
    serialize(predicate).to_string()
}

fn tagged(spec_type: &str) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert(TYPE_KEY.to_string(), Value::from(spec_type));
    object
}

fn tagged_children(spec_type: &str, children: &[Predicate]) -> Map<String, Value> {
    let mut object = tagged(spec_type);
    object.insert(
        CHILDREN_KEY.to_string(),
        Value::Array(children.iter().map(serialize).collect()),
    );
    object
}

///
/// SpecParser
///

struct SpecParser<'a> {
    config: &'a HavingConfig,
}

impl SpecParser<'_> {
    fn parse_node(&self, value: &Value, depth: usize) -> Result<Predicate, InvalidSpecError> {
        if depth > self.config.max_depth {
            return Err(InvalidSpecError::TooDeep {
                max: self.config.max_depth,
            });
        }

        let object = value.as_object().ok_or(InvalidSpecError::NotAnObject)?;
        let spec_type = match object.get(TYPE_KEY) {
            None | Some(Value::Null) => return Err(InvalidSpecError::MissingType),
            Some(Value::String(spec_type)) => spec_type.as_str(),
            Some(other) => {
                return Err(InvalidSpecError::UnknownType {
                    found: other.to_string(),
                });
            }
        };

        match spec_type {
            TYPE_ALWAYS => Ok(Predicate::Always),
            TYPE_NEVER => Ok(Predicate::Never),
            TYPE_NOT => self.parse_not(object, depth),
            TYPE_AND => self.parse_children(TYPE_AND, object, depth).map(Predicate::And),
            TYPE_OR => self.parse_children(TYPE_OR, object, depth).map(Predicate::Or),
            "greaterThan" => self.parse_compare(CompareOp::GreaterThan, object),
            "lessThan" => self.parse_compare(CompareOp::LessThan, object),
            "equalTo" => self.parse_compare(CompareOp::EqualTo, object),
            other => Err(InvalidSpecError::UnknownType {
                found: other.to_string(),
            }),
        }
    }

    fn parse_not(
        &self,
        object: &Map<String, Value>,
        depth: usize,
    ) -> Result<Predicate, InvalidSpecError> {
        match object.get(CHILD_KEY) {
            None | Some(Value::Null) => Err(InvalidSpecError::NotArity { found: 0 }),
            Some(Value::Array(items)) if items.len() != 1 => {
                Err(InvalidSpecError::NotArity { found: items.len() })
            }
            Some(child @ Value::Object(_)) => {
                self.parse_node(child, depth + 1).map(Predicate::not)
            }
            Some(_) => Err(InvalidSpecError::WrongShape {
                spec_type: TYPE_NOT,
                field: CHILD_KEY,
                expected: "a single spec object",
            }),
        }
    }

    fn parse_children(
        &self,
        spec_type: &'static str,
        object: &Map<String, Value>,
        depth: usize,
    ) -> Result<Vec<Predicate>, InvalidSpecError> {
        let items = match object.get(CHILDREN_KEY) {
            None | Some(Value::Null) => {
                return Err(InvalidSpecError::MissingField {
                    spec_type,
                    field: CHILDREN_KEY,
                });
            }
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(InvalidSpecError::WrongShape {
                    spec_type,
                    field: CHILDREN_KEY,
                    expected: "an array of specs",
                });
            }
        };

        if items.len() > self.config.max_children {
            return Err(InvalidSpecError::TooManyChildren {
                max: self.config.max_children,
                found: items.len(),
            });
        }

        items
            .iter()
            .map(|item| self.parse_node(item, depth + 1))
            .collect()
    }

    fn parse_compare(
        &self,
        op: CompareOp,
        object: &Map<String, Value>,
    ) -> Result<Predicate, InvalidSpecError> {
        let spec_type = op.spec_type();

        let field = match object.get(AGGREGATION_KEY) {
            None | Some(Value::Null) => {
                return Err(InvalidSpecError::MissingField {
                    spec_type,
                    field: AGGREGATION_KEY,
                });
            }
            Some(Value::String(field)) => field,
            Some(_) => {
                return Err(InvalidSpecError::WrongShape {
                    spec_type,
                    field: AGGREGATION_KEY,
                    expected: "a string",
                });
            }
        };
        if field.len() > self.config.max_field_len {
            return Err(InvalidSpecError::FieldTooLong {
                max: self.config.max_field_len,
                found: field.len(),
            });
        }

        let threshold = match object.get(VALUE_KEY) {
            None | Some(Value::Null) => {
                return Err(InvalidSpecError::MissingField {
                    spec_type,
                    field: VALUE_KEY,
                });
            }
            Some(Value::Number(number)) => {
                number.as_f64().ok_or(InvalidSpecError::WrongShape {
                    spec_type,
                    field: VALUE_KEY,
                    expected: "a number",
                })?
            }
            Some(_) => {
                return Err(InvalidSpecError::WrongShape {
                    spec_type,
                    field: VALUE_KEY,
                    expected: "a number",
                });
            }
        };

        ComparePredicate::try_new(op, field.as_str(), threshold).map(Predicate::Compare)
    }
}

impl Serialize for Predicate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        parse(&value).map_err(de::Error::custom)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested_tree() -> Predicate {
        Predicate::and(vec![
            Predicate::greater_than("agg", 1.3).unwrap(),
            Predicate::or(vec![
                Predicate::less_than("lessAgg", 1.0).unwrap(),
                Predicate::not(Predicate::equal_to("equalAgg", 2.0).unwrap()),
            ]),
        ])
    }

    #[test]
    fn parses_nested_payload() {
        let payload = json!({
            "type": "and",
            "havingSpecs": [
                {"type": "greaterThan", "aggregation": "agg", "value": 1.3},
                {
                    "type": "or",
                    "havingSpecs": [
                        {"type": "lessThan", "aggregation": "lessAgg", "value": 1},
                        {
                            "type": "not",
                            "havingSpec": {"type": "equalTo", "aggregation": "equalAgg", "value": 2.0}
                        }
                    ]
                }
            ]
        });

        assert_eq!(parse(&payload), Ok(nested_tree()));
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let tree = nested_tree();

        assert_eq!(parse(&serialize(&tree)), Ok(tree.clone()));
        assert_eq!(from_json_str(&to_json_string(&tree)), Ok(tree));
    }

    #[test]
    fn constants_round_trip() {
        let tree = Predicate::or(vec![
            Predicate::Always,
            Predicate::not(Predicate::Never),
            Predicate::and(vec![]),
        ]);

        assert_eq!(serialize(&Predicate::Always), json!({"type": "always"}));
        assert_eq!(parse(&serialize(&tree)), Ok(tree));
    }

    #[test]
    fn compare_serializes_aggregation_and_value() {
        let tree = Predicate::less_than("rows", 11.5).unwrap();

        assert_eq!(
            serialize(&tree),
            json!({"type": "lessThan", "aggregation": "rows", "value": 11.5})
        );
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        assert_eq!(
            parse(&json!({"type": "between", "aggregation": "a", "value": 1})),
            Err(InvalidSpecError::UnknownType {
                found: "between".to_string()
            })
        );
        assert!(matches!(
            parse(&json!({"type": 7})),
            Err(InvalidSpecError::UnknownType { .. })
        ));
    }

    #[test]
    fn structural_errors_are_reported() {
        assert_eq!(parse(&json!([])), Err(InvalidSpecError::NotAnObject));
        assert_eq!(
            parse(&json!({"aggregation": "a"})),
            Err(InvalidSpecError::MissingType)
        );
        assert_eq!(
            parse(&json!({"type": "equalTo", "value": 1})),
            Err(InvalidSpecError::MissingField {
                spec_type: "equalTo",
                field: "aggregation",
            })
        );
        assert_eq!(
            parse(&json!({"type": "equalTo", "aggregation": "a"})),
            Err(InvalidSpecError::MissingField {
                spec_type: "equalTo",
                field: "value",
            })
        );
        assert_eq!(
            parse(&json!({"type": "greaterThan", "aggregation": "a", "value": "1"})),
            Err(InvalidSpecError::WrongShape {
                spec_type: "greaterThan",
                field: "value",
                expected: "a number",
            })
        );
        assert_eq!(
            parse(&json!({"type": "lessThan", "aggregation": 3, "value": 1})),
            Err(InvalidSpecError::WrongShape {
                spec_type: "lessThan",
                field: "aggregation",
                expected: "a string",
            })
        );
        assert_eq!(
            parse(&json!({"type": "or", "havingSpecs": {"type": "always"}})),
            Err(InvalidSpecError::WrongShape {
                spec_type: "or",
                field: "havingSpecs",
                expected: "an array of specs",
            })
        );
        assert_eq!(
            parse(&json!({"type": "and"})),
            Err(InvalidSpecError::MissingField {
                spec_type: "and",
                field: "havingSpecs",
            })
        );
        assert_eq!(
            parse(&json!({"type": "equalTo", "aggregation": "", "value": 1})),
            Err(InvalidSpecError::EmptyField)
        );
    }

    #[test]
    fn not_requires_exactly_one_child() {
        assert_eq!(
            parse(&json!({"type": "not"})),
            Err(InvalidSpecError::NotArity { found: 0 })
        );
        assert_eq!(
            parse(&json!({"type": "not", "havingSpec": []})),
            Err(InvalidSpecError::NotArity { found: 0 })
        );
        assert_eq!(
            parse(&json!({"type": "not", "havingSpec": [{"type": "always"}, {"type": "never"}]})),
            Err(InvalidSpecError::NotArity { found: 2 })
        );
        assert_eq!(
            parse(&json!({"type": "not", "havingSpec": [{"type": "always"}]})),
            Err(InvalidSpecError::WrongShape {
                spec_type: "not",
                field: "havingSpec",
                expected: "a single spec object",
            })
        );
    }

    #[test]
    fn nested_errors_surface_from_children() {
        let payload = json!({
            "type": "or",
            "havingSpecs": [{"type": "always"}, {"type": "not", "havingSpec": {"type": "nope"}}]
        });

        assert_eq!(
            parse(&payload),
            Err(InvalidSpecError::UnknownType {
                found: "nope".to_string()
            })
        );
    }

    #[test]
    fn limits_are_enforced() {
        let config = HavingConfig {
            max_depth: 2,
            max_children: 2,
            max_field_len: 4,
        };

        let deep = json!({"type": "not", "havingSpec": {"type": "not", "havingSpec": {"type": "always"}}});
        assert_eq!(
            parse_with(&deep, &config),
            Err(InvalidSpecError::TooDeep { max: 2 })
        );

        let wide = json!({"type": "and", "havingSpecs": [{"type": "always"}, {"type": "always"}, {"type": "always"}]});
        assert_eq!(
            parse_with(&wide, &config),
            Err(InvalidSpecError::TooManyChildren { max: 2, found: 3 })
        );

        let long = json!({"type": "equalTo", "aggregation": "total", "value": 1});
        assert_eq!(
            parse_with(&long, &config),
            Err(InvalidSpecError::FieldTooLong { max: 4, found: 5 })
        );
    }

    fn nested_nots(count: usize) -> Predicate {
        (0..count).fold(Predicate::Always, |inner, _| Predicate::not(inner))
    }

    #[test]
    fn default_limits_accept_at_and_reject_past_each_bound() {
        let config = HavingConfig::default();

        let at_depth = nested_nots(HavingConfig::DEFAULT_MAX_DEPTH - 1);
        let past_depth = nested_nots(HavingConfig::DEFAULT_MAX_DEPTH);
        assert_eq!(parse_with(&serialize(&at_depth), &config), Ok(at_depth));
        assert_eq!(
            parse_with(&serialize(&past_depth), &config),
            Err(InvalidSpecError::TooDeep { max: 64 })
        );

        let at_width = Predicate::and(vec![Predicate::Always; HavingConfig::DEFAULT_MAX_CHILDREN]);
        let past_width =
            Predicate::and(vec![Predicate::Always; HavingConfig::DEFAULT_MAX_CHILDREN + 1]);
        assert_eq!(parse_with(&serialize(&at_width), &config), Ok(at_width));
        assert_eq!(
            parse_with(&serialize(&past_width), &config),
            Err(InvalidSpecError::TooManyChildren {
                max: 1024,
                found: 1025
            })
        );

        let at_len = Predicate::equal_to("m".repeat(256), 1.0).unwrap();
        let past_len = Predicate::equal_to("m".repeat(257), 1.0).unwrap();
        assert_eq!(parse_with(&serialize(&at_len), &config), Ok(at_len));
        assert_eq!(
            parse_with(&serialize(&past_len), &config),
            Err(InvalidSpecError::FieldTooLong {
                max: 256,
                found: 257
            })
        );
    }

    #[test]
    fn unbounded_parse_round_trips_trees_past_the_default_limits() {
        let trees = [
            nested_nots(HavingConfig::DEFAULT_MAX_DEPTH),
            Predicate::and(vec![Predicate::Always; HavingConfig::DEFAULT_MAX_CHILDREN + 1]),
            Predicate::less_than("m".repeat(257), 1.0).unwrap(),
        ];

        for tree in trees {
            assert_eq!(parse(&serialize(&tree)), Ok(tree));
        }
    }

    #[test]
    fn deserialize_accepts_wide_trees() {
        let wide = Predicate::or(vec![Predicate::Never; 2000]);
        let value = serde_json::to_value(&wide).expect("serialize predicate");

        assert_eq!(
            serde_json::from_value::<Predicate>(value).expect("deserialize predicate"),
            wide
        );
    }

    #[test]
    fn extra_keys_are_ignored() {
        let payload = json!({"type": "never", "comment": "kept for humans"});

        assert_eq!(parse(&payload), Ok(Predicate::Never));
    }

    #[test]
    fn invalid_json_text_is_a_spec_error() {
        assert!(matches!(
            from_json_str("{\"type\": "),
            Err(InvalidSpecError::Json { .. })
        ));
    }

    #[test]
    fn serde_impls_use_the_spec_grammar() {
        let tree = nested_tree();
        let encoded = serde_json::to_value(&tree).expect("serialize predicate");

        assert_eq!(encoded, serialize(&tree));
        assert_eq!(
            serde_json::from_value::<Predicate>(encoded).expect("deserialize predicate"),
            tree
        );

        let err = serde_json::from_value::<Predicate>(json!({"type": "not"})).unwrap_err();
        assert!(err.to_string().contains("exactly one child"));
    }
}
