use crate::verify::IdentityLookup;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Total author-name resolution
///
/// Wraps an [`IdentityLookup`] and falls back to the raw author id on any
/// failure. Names (and fallbacks) are remembered for the rest of the run so
/// each author costs at most one lookup.
pub struct DisplayNames {
    identities: Arc<dyn IdentityLookup>,
    resolved: Mutex<HashMap<String, String>>,
}

impl DisplayNames {
    pub fn new(identities: Arc<dyn IdentityLookup>) -> Self {
        Self {
            identities,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, author_id: &str) -> String {
        if author_id.is_empty() {
            return String::new();
        }

        if let Some(name) = self.cached(author_id) {
            return name;
        }

        let name = match self.identities.display_name(author_id).await {
            Ok(name) if !name.trim().is_empty() => name,
            Ok(_) => author_id.to_string(),
            Err(e) => {
                tracing::debug!(author_id, error = %e, "Falling back to raw author id");
                author_id.to_string()
            }
        };

        if let Ok(mut resolved) = self.resolved.lock() {
            resolved.insert(author_id.to_string(), name.clone());
        }
        name
    }

    fn cached(&self, author_id: &str) -> Option<String> {
        self.resolved
            .lock()
            .ok()
            .and_then(|resolved| resolved.get(author_id).cloned())
    }
}
