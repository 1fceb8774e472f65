use std::collections::BTreeMap;

/// Scheme prefixing sources that are looked up in an [Environment]
pub const ENV_SCHEME: &str = "env://";
/// Older templates use this prefix for the same purpose
pub const LEGACY_ENV_SCHEME: &str = "data://";

/// A value stored in an [Environment]: either raw content or a nested table
#[derive(Debug, Clone, PartialEq)]
pub enum EnvValue {
    Bytes(Vec<u8>),
    Table(BTreeMap<String, EnvValue>),
}

/// A nested key-value store supplying embedded content to templates. A source
/// written as `env://preview:42` is resolved as `env["preview"]["42"]`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Environment {
    root: BTreeMap<String, EnvValue>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    /// Store content under a colon-separated key path, creating intermediate
    /// tables as needed. Anything already stored along the path is replaced.
    pub fn insert<B: Into<Vec<u8>>>(&mut self, key_path: &str, content: B) -> &mut Self {
        let keys: Vec<&str> = key_path.split(':').collect();
        let (last, parents) = match keys.split_last() {
            Some(split) => split,
            None => return self,
        };

        let mut table = &mut self.root;
        for key in parents {
            let entry = table
                .entry(key.to_string())
                .or_insert_with(|| EnvValue::Table(BTreeMap::new()));
            if let EnvValue::Bytes(_) = entry {
                *entry = EnvValue::Table(BTreeMap::new());
            }
            let EnvValue::Table(t) = entry else {
                return self;
            };
            table = t;
        }
        table.insert(last.to_string(), EnvValue::Bytes(content.into()));
        self
    }

    /// Follow a sequence of keys through nested tables
    pub fn lookup<S: AsRef<str>>(&self, keys: &[S]) -> Option<&EnvValue> {
        let (first, rest) = keys.split_first()?;
        let mut value = self.root.get(first.as_ref())?;
        for key in rest {
            value = match value {
                EnvValue::Table(t) => t.get(key.as_ref())?,
                EnvValue::Bytes(_) => return None,
            };
        }
        Some(value)
    }

    /// Resolve a key path to stored content. Tables are not content.
    pub fn resolve<S: AsRef<str>>(&self, keys: &[S]) -> Option<&[u8]> {
        match self.lookup(keys)? {
            EnvValue::Bytes(b) => Some(b.as_slice()),
            EnvValue::Table(_) => None,
        }
    }
}

/// Split a source into its environment key path, if it uses an environment scheme
pub fn env_key_path(src: &str) -> Option<Vec<String>> {
    let path = src
        .strip_prefix(ENV_SCHEME)
        .or_else(|| src.strip_prefix(LEGACY_ENV_SCHEME))?;
    Some(path.split(':').map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_nested_keys() {
        let mut env = Environment::new();
        env.insert("preview:42", b"<svg/>".to_vec())
            .insert("logo", "x");

        assert_eq!(env.resolve(&["preview", "42"]), Some(&b"<svg/>"[..]));
        assert_eq!(env.resolve(&["logo"]), Some(&b"x"[..]));
        assert_eq!(env.resolve(&["preview"]), None);
        assert_eq!(env.resolve(&["preview", "43"]), None);
        assert_eq!(env.resolve(&["logo", "deeper"]), None);
    }

    #[test]
    fn deeper_keys_replace_stored_content() {
        let mut env = Environment::new();
        env.insert("charts", "flat").insert("charts:sales:q3", "nested");

        assert_eq!(env.resolve(&["charts", "sales", "q3"]), Some(&b"nested"[..]));
        assert_eq!(env.resolve(&["charts"]), None);
        assert!(matches!(env.lookup(&["charts"]), Some(EnvValue::Table(_))));
    }

    #[test]
    fn key_paths() {
        assert_eq!(
            env_key_path("env://preview:42"),
            Some(vec!["preview".to_string(), "42".to_string()])
        );
        assert_eq!(env_key_path("data://a"), Some(vec!["a".to_string()]));
        assert_eq!(env_key_path("images/a.svg"), None);
    }
}
