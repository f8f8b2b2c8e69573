//! Exploration content loading.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::{fs, io};

use thiserror::Error;

use wayfinder_types::{Exploration, ExplorationId};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid exploration id '{0}'")]
    InvalidId(ExplorationId),
    #[error("exploration '{0}' not found")]
    NotFound(ExplorationId),
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Source of exploration content.
///
/// Called on a blocking thread while the engine holds its writer slot.
pub trait ExplorationLoader: Send + Sync {
    fn load_exploration(&self, id: &ExplorationId) -> Result<Exploration, LoadError>;
}

/// Reads `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectoryLoader {
    dir: PathBuf,
}

impl JsonDirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ExplorationId) -> Result<PathBuf, LoadError> {
        let file_name = format!("{id}.json");
        let mut components = Path::new(&file_name).components();
        let single_normal = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if id.as_str().is_empty() || id.as_str().contains("..") || !single_normal {
            return Err(LoadError::InvalidId(id.clone()));
        }
        Ok(self.dir.join(file_name))
    }
}

impl ExplorationLoader for JsonDirectoryLoader {
    fn load_exploration(&self, id: &ExplorationId) -> Result<Exploration, LoadError> {
        let path = self.path_for(id)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(id.clone()));
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };
        let exploration: Exploration = serde_json::from_str(&content)
            .map_err(|source| LoadError::Parse {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(
            exploration_id = %id,
            states = exploration.states.len(),
            path = %path.display(),
            "Read exploration file"
        );
        Ok(exploration)
    }
}

/// Explorations held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    explorations: HashMap<ExplorationId, Exploration>,
}

impl InMemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_exploration(mut self, exploration: Exploration) -> Self {
        self.insert(exploration);
        self
    }

    pub fn insert(&mut self, exploration: Exploration) {
        self.explorations.insert(exploration.id.clone(), exploration);
    }
}

impl ExplorationLoader for InMemoryLoader {
    fn load_exploration(&self, id: &ExplorationId) -> Result<Exploration, LoadError> {
        self.explorations
            .get(id)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(id.clone()))
    }
}
