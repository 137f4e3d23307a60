use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::fields::{FieldMap, BUILTIN_PROFILES, DEFAULT_CHILDREN_FIELD, DEFAULT_PLACEHOLDER};

pub const DEFAULT_PROFILE: &str = "ledger-group";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub profile: BTreeMap<String, ProfileConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub profile: Option<String>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub name_fields: Vec<String>,
    pub id_fields: Vec<String>,
    pub children_field: Option<String>,
    pub parent_field: Option<String>,
    pub placeholder: Option<String>,
}

impl ProfileConfig {
    fn to_field_map(&self) -> FieldMap {
        FieldMap {
            name_fields: self.name_fields.clone(),
            id_fields: self.id_fields.clone(),
            children_field: self
                .children_field
                .clone()
                .unwrap_or_else(|| DEFAULT_CHILDREN_FIELD.into()),
            parent_field: self.parent_field.clone(),
            placeholder: self
                .placeholder
                .clone()
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER.into()),
        }
    }
}

impl Config {
    /// Load config from `path`, or from the default location when `None`.
    /// Returns default config if the file doesn't exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.map(str::to_string).unwrap_or_else(crate::paths::config_path);
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.defaults.max_depth == Some(0) {
            bail!("defaults.max_depth must be at least 1");
        }
        for (name, p) in &self.profile {
            if p.name_fields.is_empty() || p.name_fields.iter().any(|f| f.trim().is_empty()) {
                bail!("profile '{name}': name_fields must be a non-empty list of field names");
            }
            if p.id_fields.is_empty() || p.id_fields.iter().any(|f| f.trim().is_empty()) {
                bail!("profile '{name}': id_fields must be a non-empty list of field names");
            }
            if p.children_field.as_deref().is_some_and(|f| f.trim().is_empty()) {
                bail!("profile '{name}': children_field must not be empty");
            }
            if p.parent_field.as_deref().is_some_and(|f| f.trim().is_empty()) {
                bail!("profile '{name}': parent_field must not be empty");
            }
        }
        if let Some(default) = &self.defaults.profile {
            if !self.has_profile(default) {
                bail!("defaults.profile '{default}' is not a known profile");
            }
        }
        Ok(())
    }

    fn has_profile(&self, name: &str) -> bool {
        self.profile.contains_key(name) || FieldMap::builtin(name).is_some()
    }

    pub fn default_profile(&self) -> &str {
        self.defaults.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    /// Resolve a profile by name (user profiles shadow built-ins), or the
    /// default profile when `name` is `None`.
    pub fn field_map(&self, name: Option<&str>) -> Result<FieldMap> {
        let name = name.unwrap_or_else(|| self.default_profile());
        if let Some(p) = self.profile.get(name) {
            return Ok(p.to_field_map());
        }
        match FieldMap::builtin(name) {
            Some(fields) => Ok(fields),
            None => bail!(
                "unknown profile '{name}': known profiles are {}",
                self.profile_names().join(", ")
            ),
        }
    }

    /// Built-in and user profile names, sorted and deduplicated.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_PROFILES
            .iter()
            .map(|s| s.to_string())
            .chain(self.profile.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// The CLI's `--max-depth` wins over the config file.
    pub fn max_depth(&self, cli: Option<usize>) -> Option<usize> {
        cli.or(self.defaults.max_depth)
    }
}
