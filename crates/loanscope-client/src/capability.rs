//! What the acting user may do with a target.
//!
//! Everything here is a pure function of the acting [`User`] and the target's
//! owner. Callers evaluate it on every render from the freshly read current
//! user; results are never cached.
//!
//! | Target     | VIEW | EDIT            | DELETE          | CHANGE_ROLE |
//! |------------|------|-----------------|-----------------|-------------|
//! | Prediction | yes  | never           | owner or admin  | never       |
//! | User       | yes  | self or admin   | admin           | admin       |

use bitflags::bitflags;
use loanscope_common::{User, UserId};
use serde::{Deserialize, Serialize};

use crate::navigation::Route;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u8 {
        const VIEW        = 0b0001;
        /// Edit profile fields; predictions are immutable
        const EDIT        = 0b0010;
        const DELETE      = 0b0100;
        const CHANGE_ROLE = 0b1000;
    }
}

impl Capabilities {
    pub fn can_view(self) -> bool {
        self.contains(Self::VIEW)
    }

    pub fn can_edit(self) -> bool {
        self.contains(Self::EDIT)
    }

    pub fn can_delete(self) -> bool {
        self.contains(Self::DELETE)
    }

    pub fn can_change_role(self) -> bool {
        self.contains(Self::CHANGE_ROLE)
    }
}

/// Kind of entity a capability check is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Prediction,
    User,
}

pub fn capabilities(acting: &User, target: Target, owner_id: UserId) -> Capabilities {
    let is_owner = acting.id == owner_id;
    let is_admin = acting.role.is_administrator();

    let mut caps = Capabilities::VIEW;
    match target {
        Target::Prediction => {
            if is_owner || is_admin {
                caps |= Capabilities::DELETE;
            }
        }
        Target::User => {
            if is_owner || is_admin {
                caps |= Capabilities::EDIT;
            }
            if is_admin {
                caps |= Capabilities::DELETE | Capabilities::CHANGE_ROLE;
            }
        }
    }
    caps
}

/// One menu entry of the main navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub route: Route,
}

const COMMON_ENTRIES: [NavEntry; 4] = [
    NavEntry {
        label: "Predictions",
        route: Route::Predictions,
    },
    NavEntry {
        label: "New Prediction",
        route: Route::NewPrediction,
    },
    NavEntry {
        label: "About The Model",
        route: Route::AboutModel,
    },
    NavEntry {
        label: "Account",
        route: Route::Account,
    },
];

/// Menu for `acting`. Role management is only listed for administrators.
pub fn navigation(acting: &User) -> Vec<NavEntry> {
    let mut entries = COMMON_ENTRIES.to_vec();
    if acting.role.is_administrator() {
        entries.insert(
            2,
            NavEntry {
                label: "Users",
                route: Route::Users,
            },
        );
    }
    entries
}
