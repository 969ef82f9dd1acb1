use std::collections::BTreeMap;

use crate::configs::builtin::register_builtins;
use crate::configs::load::{from_json_file, from_json_str};
use crate::configs::profile::BankProfile;
use crate::configs::validate::validate_profile;

/// Keyed store of immutable bank profiles.
///
/// Populated once at startup and shared read-only across parses; the
/// engine never mutates it. Keys iterate in sorted order so behavior is
/// deterministic.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    /// If true, keep loaded profile instances in memory, else they are
    /// reloaded from file on each fetch.
    caching: bool,
    profiles: BTreeMap<String, BankProfile>,
    profile_paths: BTreeMap<String, String>,
}

impl ProfileRegistry {
    /// Initialize an empty registry.
    pub fn new(caching: bool) -> Self {
        ProfileRegistry {
            caching,
            profiles: BTreeMap::new(),
            profile_paths: BTreeMap::new(),
        }
    }

    /// Registry pre-loaded with the built-in profiles.
    pub fn with_builtins() -> Self {
        let mut registry = ProfileRegistry::new(true);
        register_builtins(&mut registry);
        registry
    }

    /// Register an already-constructed profile.
    pub fn register(&mut self, profile: BankProfile) -> Result<(), String> {
        validate_profile(&profile)?;
        self.profiles.insert(profile.key.clone(), profile);
        Ok(())
    }

    /// Register a profile from a JSON string. Caching must be enabled.
    pub fn register_from_str(&mut self, json_str: &str) -> Result<(), String> {
        if !self.caching {
            return Err("Caching must be enabled to add a profile from a JSON string".to_string());
        }
        let profile = from_json_str(json_str)?;
        self.profiles.insert(profile.key.clone(), profile);
        Ok(())
    }

    /// Register a profile from a JSON file path.
    pub fn register_from_file(&mut self, file_path: &str) -> Result<(), String> {
        let profile = from_json_file(file_path)?;
        let key = profile.key.clone();
        if self.caching {
            self.profiles.insert(key.clone(), profile);
        }
        self.profile_paths.insert(key, file_path.to_string());
        Ok(())
    }

    /// Fetch a profile by key.
    pub fn get(&self, key: &str) -> Result<BankProfile, String> {
        if self.caching {
            if let Some(profile) = self.profiles.get(key) {
                return Ok(profile.clone());
            }
        }
        if let Some(path) = self.profile_paths.get(key) {
            return from_json_file(path);
        }
        Err(format!("Profile with key '{}' not found", key))
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.profiles.keys().cloned().collect();
        for key in self.profile_paths.keys() {
            if !self.profiles.contains_key(key) {
                keys.push(key.clone());
            }
        }
        keys.sort();
        keys
    }
}
