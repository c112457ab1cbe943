use crate::config::{ConfigError, FetchConfig};

///
/// FetchPlan
///
/// Which parts of each result object graph are loaded.
/// Every query starts from a copy of its persistence manager's plan, so
/// changing one query's plan never affects the manager or other queries.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchPlan {
    groups: Vec<String>,
    max_fetch_depth: i32,
    fetch_size: i32,
}

impl FetchPlan {
    pub const DEFAULT_GROUP: &'static str = "default";
    pub const ALL_GROUP: &'static str = "all";

    /// Relationship depth meaning "follow every reference".
    pub const UNLIMITED_DEPTH: i32 = -1;

    /// Let the datastore pick a batch size.
    pub const FETCH_SIZE_OPTIMAL: i32 = 0;
    /// Load every result at once.
    pub const FETCH_SIZE_GREEDY: i32 = -1;

    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            groups: config.groups.clone(),
            max_fetch_depth: config.max_fetch_depth,
            fetch_size: config.fetch_size,
        }
    }

    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }

    pub fn add_group(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.has_group(&name) {
            self.groups.push(name);
        }
        self
    }

    pub fn remove_group(&mut self, name: &str) -> &mut Self {
        self.groups.retain(|g| g != name);
        self
    }

    /// Replace the active groups.
    pub fn set_groups<I, S>(&mut self, groups: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.clear();
        for group in groups {
            self.add_group(group);
        }
        self
    }

    pub fn clear_groups(&mut self) -> &mut Self {
        self.groups.clear();
        self
    }

    #[must_use]
    pub const fn max_fetch_depth(&self) -> i32 {
        self.max_fetch_depth
    }

    /// Set the relationship depth; -1 is unlimited and 0 is rejected.
    pub fn set_max_fetch_depth(&mut self, depth: i32) -> Result<&mut Self, ConfigError> {
        if depth == 0 || depth < Self::UNLIMITED_DEPTH {
            return Err(ConfigError::Invalid {
                key: "max_fetch_depth",
                message: format!("{depth} (expected -1 or a positive depth)"),
            });
        }
        self.max_fetch_depth = depth;

        Ok(self)
    }

    #[must_use]
    pub const fn fetch_size(&self) -> i32 {
        self.fetch_size
    }

    pub fn set_fetch_size(&mut self, size: i32) -> Result<&mut Self, ConfigError> {
        if size < Self::FETCH_SIZE_GREEDY {
            return Err(ConfigError::Invalid {
                key: "fetch_size",
                message: format!("{size} (expected -1 or more)"),
            });
        }
        self.fetch_size = size;

        Ok(self)
    }
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}
