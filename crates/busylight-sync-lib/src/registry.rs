//! Name-keyed constructor tables.
//!
//! Sources and devices are both built from a type name found in the config.
//! A [`Registry`] maps those names to constructors; each module adds its own
//! `build`/`open` on top (see `source::SourceRegistry`, `device::DeviceRegistry`)
//! so an unknown name turns into that module's "not implemented" error.

use std::collections::BTreeMap;

pub struct Registry<C> {
    constructors: BTreeMap<String, C>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Registry {
            constructors: BTreeMap::new(),
        }
    }
}

impl<C> Registry<C> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `constructor` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, constructor: C) -> &mut Self {
        self.constructors.insert(name.to_string(), constructor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&C> {
        self.constructors.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}
