//! Worker lifecycle states and transitions

use crate::error::{SiteCacheError, SiteCacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one cache generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Uninstalled,
    Installing,
    Installed,
    Activating,
    Active,
}

/// Host-dispatched lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Install,
    Activate,
    Fetch,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Activate => write!(f, "activate"),
            Self::Fetch => write!(f, "fetch"),
        }
    }
}

impl WorkerState {
    /// State entered when `trigger` starts from `self`.
    ///
    /// Fetch leaves the state unchanged and is only valid once active.
    pub fn begin(self, trigger: Trigger) -> SiteCacheResult<Self> {
        match (self, trigger) {
            (Self::Uninstalled, Trigger::Install) => Ok(Self::Installing),
            (Self::Installed, Trigger::Activate) => Ok(Self::Activating),
            (Self::Active, Trigger::Fetch) => Ok(Self::Active),
            (state, trigger) => Err(SiteCacheError::InvalidTransition { trigger, state }),
        }
    }

    /// State entered when an in-flight batch settles
    pub fn settle(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (Self::Installing, true) => Self::Installed,
            (Self::Installing, false) => Self::Uninstalled,
            (Self::Activating, true) => Self::Active,
            (Self::Activating, false) => Self::Installed,
            (state, _) => state,
        }
    }

    /// Roll back a transition that was interrupted before settling
    pub fn recovered(self) -> Self {
        self.settle(false)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Installing | Self::Activating)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninstalled => write!(f, "uninstalled"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
        }
    }
}
