//! Identity roster
//!
//! The roster is a fixed, pre-generated list of test users loaded once before
//! the run starts. It is shared read-only by every virtual user.

use crate::assignment::roster_index;
use crate::error::RosterError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Gender attribute sent with every queue-join request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single test user as stored in the roster file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Opaque, stable user identifier
    pub user_id: String,
    pub gender: Gender,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, gender: Gender) -> Self {
        Self {
            user_id: user_id.into(),
            gender,
        }
    }
}

/// Dense, 0-indexed, non-empty list of identities with unique ids
#[derive(Debug, Clone)]
pub struct Roster {
    identities: Vec<Identity>,
}

impl Roster {
    /// Build a roster, enforcing non-emptiness and id uniqueness
    pub fn from_identities(identities: Vec<Identity>) -> Result<Self, RosterError> {
        if identities.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut seen = HashSet::with_capacity(identities.len());
        for (index, identity) in identities.iter().enumerate() {
            if identity.user_id.is_empty() {
                return Err(RosterError::EmptyId(index));
            }
            if !seen.insert(identity.user_id.as_str()) {
                return Err(RosterError::DuplicateId(identity.user_id.clone()));
            }
        }

        Ok(Self { identities })
    }

    /// Parse a roster from a JSON array of `{userId, gender}` records
    pub fn from_json_str(content: &str) -> Result<Self, RosterError> {
        let identities: Vec<Identity> = serde_json::from_str(content)?;
        Self::from_identities(identities)
    }

    /// Load a roster file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        debug!("Loading roster from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_json_str(&content)?;

        let (male, female) = roster.gender_split();
        info!(
            "Loaded {} test users from {:?} ({} male, {} female)",
            roster.len(),
            path,
            male,
            female
        );
        Ok(roster)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Always false: construction rejects empty rosters
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Identity> {
        self.identities.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    /// Identity used by `slot` (1-based) for its `cycle`-th cycle (0-based)
    pub fn assign(&self, slot: usize, cycle: u64) -> &Identity {
        // len() > 0 is guaranteed by construction
        let index = roster_index(slot, cycle, self.len()).unwrap_or(0);
        &self.identities[index]
    }

    /// Number of (male, female) identities
    pub fn gender_split(&self) -> (usize, usize) {
        let male = self
            .identities
            .iter()
            .filter(|identity| identity.gender == Gender::Male)
            .count();
        (male, self.identities.len() - male)
    }
}
