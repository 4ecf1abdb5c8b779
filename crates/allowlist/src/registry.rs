//! Capability sets per execution context.

#[allow(deprecated)]
use crate::whitelist::Whitelist;
use crate::{CapabilitySet, Error, HostResolver, NameOnlyResolver, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// A host component contributing capability sets to named contexts.
pub trait Extension {
    /// Capability sets to add, per context id.
    #[allow(deprecated)]
    fn context_allowlists(&self) -> Vec<(String, Vec<Arc<CapabilitySet>>)> {
        self.context_whitelists()
            .into_iter()
            .map(|(context, whitelists)| {
                let sets = whitelists.into_iter().map(Whitelist::into_allowlist).collect();
                (context, sets)
            })
            .collect()
    }

    #[deprecated(note = "implement `context_allowlists` instead")]
    #[allow(deprecated)]
    fn context_whitelists(&self) -> Vec<(String, Vec<Whitelist>)> {
        Vec::new()
    }
}

/// Maps execution context ids to the capability set scripts in them may use.
///
/// Registration replaces or extends a context's set as a whole; the sets
/// themselves are never mutated.
pub struct ContextRegistry {
    resolver: Arc<dyn HostResolver>,
    contexts: RwLock<HashMap<String, Arc<CapabilitySet>>>,
}

impl ContextRegistry {
    /// A registry merging combined sets against `resolver`.
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            resolver,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Combine several capability sets into the one set for `context`.
    ///
    /// A single set is shared as is. Several sets go through the merge again
    /// and any failure is reported as [`Error::Merge`].
    pub fn combine(
        &self,
        context: &str,
        sets: &[Arc<CapabilitySet>],
    ) -> Result<Arc<CapabilitySet>> {
        match sets {
            [] => Ok(Arc::new(CapabilitySet::empty())),
            [set] => Ok(set.clone()),
            sets => {
                let declarations = sets.iter().flat_map(|set| set.declarations()).collect();
                crate::merge(self.resolver.clone(), declarations)
                    .map(Arc::new)
                    .map_err(|source| Error::Merge {
                        context: context.to_string(),
                        source: Box::new(source),
                    })
            }
        }
    }

    /// Register `context`, replacing any set it had.
    pub fn register(
        &self,
        context: impl Into<String>,
        sets: Vec<Arc<CapabilitySet>>,
    ) -> Result<()> {
        let context = context.into();
        let set = self.combine(&context, &sets)?;
        info!(
            context = %context,
            sets = sets.len(),
            classes = set.classes().len(),
            "registered context"
        );
        self.write().insert(context, set);
        Ok(())
    }

    /// Register `context` with the shared base set in front of `sets`.
    pub fn register_with_base(
        &self,
        context: impl Into<String>,
        sets: Vec<Arc<CapabilitySet>>,
    ) -> Result<()> {
        let mut all = Vec::with_capacity(sets.len() + 1);
        all.push(crate::base()?);
        all.extend(sets);
        self.register(context, all)
    }

    /// Merge `sets` into whatever `context` already holds.
    ///
    /// The write lock is held from reading the current set until the merged
    /// one is stored, so concurrent extensions of one context all land.
    pub fn extend(
        &self,
        context: impl Into<String>,
        sets: Vec<Arc<CapabilitySet>>,
    ) -> Result<()> {
        let context = context.into();
        let mut contexts = self.write();
        let mut all = Vec::with_capacity(sets.len() + 1);
        if let Some(existing) = contexts.get(&context) {
            all.push(existing.clone());
        }
        all.extend(sets);
        let set = self.combine(&context, &all)?;
        debug!(context = %context, classes = set.classes().len(), "extended context");
        contexts.insert(context, set);
        Ok(())
    }

    /// Add every contribution of `extension`.
    pub fn install(&self, extension: &dyn Extension) -> Result<()> {
        for (context, sets) in extension.context_allowlists() {
            self.extend(context, sets)?;
        }
        Ok(())
    }

    pub fn lookup(&self, context: &str) -> Option<Arc<CapabilitySet>> {
        self.contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context)
            .cloned()
    }

    /// Registered context ids, sorted.
    pub fn contexts(&self) -> Vec<String> {
        let mut contexts: Vec<String> = self
            .contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        contexts.sort();
        contexts
    }

    pub fn resolver(&self) -> &Arc<dyn HostResolver> {
        &self.resolver
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<CapabilitySet>>> {
        self.contexts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new(Arc::new(NameOnlyResolver))
    }
}

impl std::fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("contexts", &self.contexts())
            .finish_non_exhaustive()
    }
}
