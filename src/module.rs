//! Bundled module records.
//!
//! A [`Module`] is one closure pulled out of the bundle by a decoder: its
//! bundler-assigned id, its code tree, and (for bundlers that embed them) the
//! specifier table mapping the strings used in its source to module ids.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::ast::Node;

/// Bundler-assigned module identifier.
///
/// Webpack and browserify use integers in production builds and strings
/// (usually source paths) in development builds. The two never compare equal:
/// `Num(1)` and `Str("1")` are different modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleId {
    Num(u64),
    Str(String),
}

impl ModuleId {
    /// Coerce an object key (always a string in JSON) to a module id.
    /// Keys that parse as unsigned integers become numeric ids.
    pub fn from_key(key: &str) -> Self {
        match key.trim().parse::<u64>() {
            Ok(n) => ModuleId::Num(n),
            Err(_) => ModuleId::Str(key.to_string()),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleId::Num(n) => write!(f, "{n}"),
            ModuleId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for ModuleId {
    fn from(value: u64) -> Self {
        ModuleId::Num(value)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        ModuleId::Str(value.to_string())
    }
}

/// Specifier table of a module, in source order.
pub type Lookup = IndexMap<String, ModuleId>;

/// One module extracted from the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub code: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<Lookup>,
}

impl Module {
    pub fn new(id: impl Into<ModuleId>, code: Node) -> Self {
        Self {
            id: id.into(),
            code,
            lookup: None,
        }
    }

    pub fn with_lookup<I, S, M>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, M)>,
        S: Into<String>,
        M: Into<ModuleId>,
    {
        self.lookup = Some(
            entries
                .into_iter()
                .map(|(spec, id)| (spec.into(), id.into()))
                .collect(),
        );
        self
    }
}

/// User-supplied path overrides, keyed by module id.
///
/// Values are paths relative to the output root without an extension
/// (`./lib/util`) or bare package names (`lodash`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KnownPaths(IndexMap<ModuleId, String>);

impl KnownPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<ModuleId>, path: impl Into<String>) {
        self.0.insert(id.into(), path.into());
    }

    pub fn get(&self, id: &ModuleId) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<ModuleId>, V: Into<String>> FromIterator<(K, V)> for KnownPaths {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for KnownPaths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, String>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(key, path)| (ModuleId::from_key(&key), path))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_from_key() {
        assert_eq!(ModuleId::from_key("12"), ModuleId::Num(12));
        assert_eq!(
            ModuleId::from_key("./src/a.js"),
            ModuleId::Str("./src/a.js".into())
        );
        assert_ne!(ModuleId::Num(1), ModuleId::Str("1".into()));
    }

    #[test]
    fn test_known_paths_keys_are_coerced() {
        let known: KnownPaths =
            serde_json::from_str(r#"{"1": "./hello/world", "abc": "lodash"}"#).unwrap();
        assert_eq!(known.get(&ModuleId::Num(1)), Some("./hello/world"));
        assert_eq!(known.get(&ModuleId::from("abc")), Some("lodash"));
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn test_module_deserializes_with_ordered_lookup() {
        let json = r#"{
            "id": 1,
            "code": {"type": "EmptyStatement"},
            "lookup": {"./z": 3, "./a": "two"}
        }"#;
        let module: Module = serde_json::from_str(json).unwrap();
        let lookup = module.lookup.unwrap();
        let keys: Vec<&str> = lookup.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["./z", "./a"]);
        assert_eq!(lookup["./a"], ModuleId::Str("two".into()));
    }
}
