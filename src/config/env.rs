//! Environment sources.
//!
//! The loader only reads through [`Environment`], so tests and embedders can
//! hand it a map or a dotenv file instead of the process environment.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::Result;

/// Read-only key-value store queried by exact key.
pub trait Environment {
    /// Value stored under `key`, or `None` if unset.
    fn get(&self, key: &str) -> Option<String>;

    /// Layer `self` over `fallback`: the first non-empty value wins.
    fn or<F: Environment>(self, fallback: F) -> Layered<Self, F>
    where
        Self: Sized,
    {
        Layered {
            primary: self,
            fallback,
        }
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        // Non-unicode values are treated as unset.
        std::env::var(key).ok()
    }
}

impl<S: std::hash::BuildHasher> Environment for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

/// Variables parsed from a dotenv file, held in memory.
///
/// Unlike `dotenvy::from_path`, loading never touches the process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct DotenvFile {
    vars: HashMap<String, String>,
}

impl DotenvFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path)? {
            let (key, value) = item?;
            vars.insert(key, value);
        }
        tracing::debug!(path = %path.display(), count = vars.len(), "loaded env file");
        Ok(Self { vars })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Environment for DotenvFile {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Two sources, consulted in order. Built with [`Environment::or`].
#[derive(Debug, Clone)]
pub struct Layered<P, F> {
    primary: P,
    fallback: F,
}

impl<P: Environment, F: Environment> Environment for Layered<P, F> {
    fn get(&self, key: &str) -> Option<String> {
        match self.primary.get(key) {
            Some(value) if !value.is_empty() => Some(value),
            _ => self.fallback.get(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn map_lookup_is_exact() {
        let env = map(&[("PORT", "8080")]);
        assert_eq!(Environment::get(&env, "PORT").as_deref(), Some("8080"));
        assert_eq!(Environment::get(&env, "port"), None);
    }

    #[test]
    fn layered_prefers_non_empty_primary() {
        let env = map(&[("A", "primary"), ("B", "")]).or(map(&[
            ("A", "fallback"),
            ("B", "fallback"),
            ("C", "fallback"),
        ]));
        assert_eq!(env.get("A").as_deref(), Some("primary"));
        assert_eq!(env.get("B").as_deref(), Some("fallback"));
        assert_eq!(env.get("C").as_deref(), Some("fallback"));
        assert_eq!(env.get("D"), None);
    }

    #[test]
    fn dotenv_file_is_read_without_touching_process_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "ENVCFG_DOTENV_ONLY_KEY=from-file").unwrap();
        writeln!(file, "QUOTED=\"with spaces\"").unwrap();
        drop(file);

        let env = DotenvFile::from_path(&path).unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env.get("ENVCFG_DOTENV_ONLY_KEY").as_deref(), Some("from-file"));
        assert_eq!(env.get("QUOTED").as_deref(), Some("with spaces"));
        assert!(std::env::var("ENVCFG_DOTENV_ONLY_KEY").is_err());
    }

    #[test]
    fn missing_dotenv_file_is_an_error() {
        let result = DotenvFile::from_path("/nonexistent/envcfg/.env");
        assert!(matches!(result, Err(crate::error::Error::EnvFile(_))));
    }
}
