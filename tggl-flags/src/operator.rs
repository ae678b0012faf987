//! Rule operators and their wire names.

use crate::FlagError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a [`Rule`](crate::Rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Empty,
    True,
    StrEqual,
    StrEqualSoft,
    StrStartsWith,
    StrEndsWith,
    StrContains,
    Percentage,
    ArrOverlap,
    RegExp,
    StrBefore,
    StrAfter,
    Eq,
    Lt,
    Gt,
    DateAfter,
    DateBefore,
    SemverEq,
    SemverGte,
    SemverLte,
}

/// Wire names, shared by encoding and decoding.
const OPERATORS: [(Operator, &str); 20] = [
    (Operator::Empty, "EMPTY"),
    (Operator::True, "TRUE"),
    (Operator::StrEqual, "STR_EQUAL"),
    (Operator::StrEqualSoft, "STR_EQUAL_SOFT"),
    (Operator::StrStartsWith, "STR_STARTS_WITH"),
    (Operator::StrEndsWith, "STR_ENDS_WITH"),
    (Operator::StrContains, "STR_CONTAINS"),
    (Operator::Percentage, "PERCENTAGE"),
    (Operator::ArrOverlap, "ARR_OVERLAP"),
    (Operator::RegExp, "REGEXP"),
    (Operator::StrBefore, "STR_BEFORE"),
    (Operator::StrAfter, "STR_AFTER"),
    (Operator::Eq, "EQ"),
    (Operator::Lt, "LT"),
    (Operator::Gt, "GT"),
    (Operator::DateAfter, "DATE_AFTER"),
    (Operator::DateBefore, "DATE_BEFORE"),
    (Operator::SemverEq, "SEMVER_EQ"),
    (Operator::SemverGte, "SEMVER_GTE"),
    (Operator::SemverLte, "SEMVER_LTE"),
];

impl Operator {
    /// All operators in wire-table order.
    pub fn all() -> impl Iterator<Item = Operator> {
        OPERATORS.iter().map(|(op, _)| *op)
    }

    /// Upper-snake-case wire name.
    pub fn as_str(&self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(op, _)| op == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OPERATORS
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(op, _)| *op)
            .ok_or_else(|| FlagError::UnknownOperator(s.to_string()))
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operator_round_trips() {
        assert_eq!(Operator::all().count(), 20);
        for op in Operator::all() {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = "STR_MATCHES".parse::<Operator>().unwrap_err();
        assert!(matches!(err, FlagError::UnknownOperator(ref name) if name == "STR_MATCHES"));

        let decoded: Result<Operator, _> = serde_json::from_str(r#""str_equal""#);
        assert!(decoded.is_err());
    }

    #[test]
    fn test_serde() {
        assert_eq!(serde_json::to_string(&Operator::SemverGte).unwrap(), r#""SEMVER_GTE""#);
        let op: Operator = serde_json::from_str(r#""REGEXP""#).unwrap();
        assert_eq!(op, Operator::RegExp);
    }
}
