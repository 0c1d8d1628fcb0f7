// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-712 typed data as produced by the instance.
//!
//! JSON has no big integer type, so [`Eip712Value`] keeps them as a separate
//! variant. Two JSON renderings exist:
//! - [`Eip712Value::to_json`] for wallets: big integers become plain numbers
//!   when they fit in `u64`, decimal strings otherwise.
//! - the tagged form used for persistence, where every big integer is written
//!   as `{ "__type": "bigint", "value": "<decimal>" }` and restored exactly.

use std::collections::BTreeMap;

use alloy::primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

const TYPE_TAG: &str = "__type";
const BIGINT_TAG: &str = "bigint";
const VALUE_FIELD: &str = "value";

/// A JSON value that can also hold unsigned big integers.
#[derive(Debug, Clone, PartialEq)]
pub enum Eip712Value {
    Null,
    Bool(bool),
    Number(Number),
    BigInt(U256),
    String(String),
    Array(Vec<Eip712Value>),
    Object(BTreeMap<String, Eip712Value>),
}

impl Eip712Value {
    /// Convert plain JSON. Tagged objects are *not* interpreted.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render for a wallet's `eth_signTypedData_v4`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::BigInt(big) => match u64::try_from(*big) {
                Ok(small) => Value::Number(small.into()),
                Err(_) => Value::String(big.to_string()),
            },
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Render with big integers wrapped in tagged objects.
    pub fn to_tagged_json(&self) -> Value {
        match self {
            Self::BigInt(big) => {
                let mut tagged = Map::new();
                tagged.insert(TYPE_TAG.to_string(), Value::String(BIGINT_TAG.to_string()));
                tagged.insert(VALUE_FIELD.to_string(), Value::String(big.to_string()));
                Value::Object(tagged)
            }
            Self::Array(items) => Value::Array(items.iter().map(Self::to_tagged_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_tagged_json()))
                    .collect(),
            ),
            other => other.to_json(),
        }
    }

    /// Parse the tagged rendering back, restoring big integers.
    pub fn from_tagged_json(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(Self::from_tagged_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            Value::Object(map) if map.get(TYPE_TAG).and_then(Value::as_str) == Some(BIGINT_TAG) => {
                let digits = map
                    .get(VALUE_FIELD)
                    .and_then(Value::as_str)
                    .ok_or_else(|| "bigint tag without string value".to_string())?;
                U256::from_str_radix(digits, 10)
                    .map(Self::BigInt)
                    .map_err(|e| format!("invalid bigint `{digits}`: {e}"))
            }
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| Self::from_tagged_json(v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Self::Object),
            other => Ok(Self::from_json(other)),
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Eip712Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Eip712Value> {
        self.as_object()?.get(key)
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Eip712Value> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Replace the value at `path`. Returns `false` if an intermediate node
    /// is missing or not an object.
    pub fn set_path(&mut self, path: &[&str], value: Eip712Value) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };

        let mut node = self;
        for key in parents {
            node = match node {
                Self::Object(map) => match map.get_mut(*key) {
                    Some(child) => child,
                    None => return false,
                },
                _ => return false,
            };
        }

        match node {
            Self::Object(map) => {
                map.insert((*last).to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Turn a big-integer `domain.chainId` into a plain number.
    pub fn normalize_chain_id(&mut self) -> Result<(), String> {
        let Some(Self::BigInt(chain_id)) = self.get_path(&["domain", "chainId"]) else {
            return Ok(());
        };

        let chain_id = u64::try_from(*chain_id)
            .map_err(|_| format!("chain id {chain_id} does not fit in 64 bits"))?;
        self.set_path(&["domain", "chainId"], Self::Number(chain_id.into()));
        Ok(())
    }
}

impl Serialize for Eip712Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_tagged_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Eip712Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_tagged_json(value).map_err(de::Error::custom)
    }
}
