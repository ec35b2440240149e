use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed storage key of the persisted worker name map.
pub const USER_MAPPINGS_KEY: &str = "userMappings";

/// Worker id -> display name, persisted as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserMappings {
    names: BTreeMap<String, String>,
}

impl UserMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both values are trimmed; a blank id or name leaves the map unchanged.
    pub fn add(&mut self, user_id: &str, name: &str) -> bool {
        let user_id = user_id.trim();
        let name = name.trim();
        if user_id.is_empty() || name.is_empty() {
            return false;
        }
        self.names.insert(user_id.to_string(), name.to_string());
        true
    }

    pub fn remove(&mut self, user_id: &str) -> Option<String> {
        self.names.remove(user_id)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn get(&self, user_id: &str) -> Option<&str> {
        self.names.get(user_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `U1` when unmapped, `U1/Ana` when mapped.
    pub fn display_name(&self, user_id: &str) -> String {
        match self.get(user_id) {
            Some(name) if !name.is_empty() => format!("{}/{}", user_id, name),
            _ => user_id.to_string(),
        }
    }
}

/// Loads and saves [`UserMappings`] under [`USER_MAPPINGS_KEY`].
pub struct UserMappingStore<S: Storage> {
    storage: S,
}

impl<S: Storage> UserMappingStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn path() -> String {
        format!("{}.json", USER_MAPPINGS_KEY)
    }

    /// A missing entry is an empty map.
    pub async fn load(&self) -> Result<UserMappings> {
        match self.storage.read_file(&Self::path()).await {
            Ok(data) => {
                let mappings: UserMappings = serde_json::from_slice(&data)?;
                tracing::debug!("Loaded {} user mappings", mappings.len());
                Ok(mappings)
            }
            Err(crate::utils::error::EtlError::IoError(e))
                if e.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(UserMappings::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, mappings: &UserMappings) -> Result<()> {
        let data = serde_json::to_vec(mappings)?;
        self.storage.write_file(&Self::path(), &data).await?;
        tracing::debug!("Saved {} user mappings", mappings.len());
        Ok(())
    }

    /// Drops the persisted entry entirely.
    pub async fn clear(&self) -> Result<()> {
        self.storage.remove_file(&Self::path()).await
    }
}
