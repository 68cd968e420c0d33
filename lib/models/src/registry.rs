use ahash::AHashMap;
use parking_lot::RwLock;
use pmmlx_core::{Pmml, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use crate::engine::ScriptEngine;
use crate::script::CompiledModel;

/// Named compiled models shared between scoring threads.
///
/// Compiled models are immutable; loading under an existing name swaps the
/// entry, and callers holding the old `Arc` keep scoring against it.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    engine: ScriptEngine,
    models: RwLock<AHashMap<String, Arc<CompiledModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pmml` and store it under `name`.
    pub fn insert(&self, name: impl Into<String>, pmml: &Pmml) -> Result<Arc<CompiledModel>> {
        let name = name.into();
        let model = Arc::new(self.engine.compile(pmml)?);
        let replaced = self.models.write().insert(name.clone(), model.clone()).is_some();
        info!(name = %name, kind = model.model().kind(), replaced, "Loaded model");
        Ok(model)
    }

    /// Parse and compile a JSON document.
    pub fn load(&self, name: impl Into<String>, source: &str) -> Result<Arc<CompiledModel>> {
        let pmml = self.engine.parse(source)?;
        self.insert(name, &pmml)
    }

    pub fn load_file<P: AsRef<Path>>(&self, name: impl Into<String>, path: P) -> Result<Arc<CompiledModel>> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let pmml = Pmml::from_reader(reader)?;
        self.insert(name, &pmml)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CompiledModel>> {
        self.models.read().get(name).cloned()
    }

    pub fn unload(&self, name: &str) -> bool {
        let removed = self.models.write().remove(name).is_some();
        if removed {
            info!(name, "Unloaded model");
        }
        removed
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.models.read().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}
