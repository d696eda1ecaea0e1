//! Declarative monitor configuration.
//!
//! ```toml
//! processes = 3
//!
//! [[predicates]]
//! name = "in-sync"
//! i = 0
//! j = 1
//! comparison = "eq"
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// How a predicate compares the local value of process `i` with that of `j`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn holds<V: PartialOrd>(self, a: &V, b: &V) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PredicateConfig {
    pub name: String,
    pub i: usize,
    pub j: usize,
    pub comparison: Comparison,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    pub processes: usize,
    #[serde(default)]
    pub predicates: Vec<PredicateConfig>,
}

impl MonitorConfig {
    /// Three predicates over processes 0 and 1, plus one over 0 and 2 when a
    /// third process exists.
    pub fn classic(processes: usize) -> Self {
        let predicate = |n: usize, j: usize, comparison: Comparison| PredicateConfig {
            name: format!("predicate{n}"),
            i: 0,
            j,
            comparison,
        };
        let mut predicates = vec![
            predicate(0, 1, Comparison::Eq),
            predicate(1, 1, Comparison::Lt),
            predicate(2, 1, Comparison::Gt),
        ];
        if processes > 2 {
            predicates.push(predicate(3, 2, Comparison::Eq));
        }
        Self {
            processes,
            predicates,
        }
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid monitor configuration")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading monitor configuration {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("loading monitor configuration {}", path.display()))
    }
}
