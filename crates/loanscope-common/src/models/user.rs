use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend primary key for users
pub type UserId = i64;

/// Account role.
///
/// The backend sends `{ "id": 2, "role_name": "admin" }`. Access decisions are
/// made on the role id only; the name is carried for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RoleRecord", into = "RoleRecord")]
pub enum Role {
    Regular,
    Administrator,
}

impl Role {
    pub const REGULAR_ID: i64 = 1;
    pub const ADMINISTRATOR_ID: i64 = 2;

    pub fn id(self) -> i64 {
        match self {
            Self::Regular => Self::REGULAR_ID,
            Self::Administrator => Self::ADMINISTRATOR_ID,
        }
    }

    /// Name the backend stores for this role
    pub fn name(self) -> &'static str {
        match self {
            Self::Regular => "user",
            Self::Administrator => "admin",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            Self::REGULAR_ID => Some(Self::Regular),
            Self::ADMINISTRATOR_ID => Some(Self::Administrator),
            _ => None,
        }
    }

    pub fn is_administrator(self) -> bool {
        self == Self::Administrator
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "regular" | "1" => Ok(Self::Regular),
            "admin" | "administrator" | "2" => Ok(Self::Administrator),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoleRecord {
    id: i64,
    #[serde(default)]
    role_name: String,
}

impl TryFrom<RoleRecord> for Role {
    type Error = String;

    fn try_from(record: RoleRecord) -> Result<Self, Self::Error> {
        let role =
            Role::from_id(record.id).ok_or_else(|| format!("unknown role id {}", record.id))?;
        if !record.role_name.is_empty() && record.role_name != role.name() {
            tracing::warn!(
                "Role id {} arrived with name '{}', expected '{}'; using the id",
                record.id,
                record.role_name,
                role.name()
            );
        }
        Ok(role)
    }
}

impl From<Role> for RoleRecord {
    fn from(role: Role) -> Self {
        Self {
            id: role.id(),
            role_name: role.name().to_string(),
        }
    }
}

/// User account as returned by every `/users` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The self-editable subset of this account
    pub fn profile(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Body of `PUT /users/update` and `PUT /users/update/{id}`.
///
/// Identity and role are deliberately absent: they cannot travel through
/// the profile path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_parses_backend_shape() {
        let json = r#"{
            "id": 7,
            "username": "ana",
            "first_name": "Ana",
            "last_name": "Lee",
            "role": {"id": 2, "role_name": "admin"}
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.role, Role::Administrator);
        assert_eq!(user.full_name(), "Ana Lee");
    }

    #[test]
    fn test_role_id_wins_over_name() {
        let role: Role = serde_json::from_str(r#"{"id": 1, "role_name": "admin"}"#).unwrap();
        assert_eq!(role, Role::Regular);
    }

    #[test]
    fn test_unknown_role_id_rejected() {
        let result: Result<Role, _> = serde_json::from_str(r#"{"id": 9, "role_name": "root"}"#);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown role id 9"));
    }

    #[test]
    fn test_role_serializes_to_record() {
        let value = serde_json::to_value(Role::Administrator).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["role_name"], "admin");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Administrator);
        assert_eq!("Regular".parse::<Role>().unwrap(), Role::Regular);
        assert_eq!("2".parse::<Role>().unwrap(), Role::Administrator);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_profile_excludes_identity() {
        let user = User {
            id: 3,
            username: "bo".to_string(),
            first_name: "Bo".to_string(),
            last_name: "Ng".to_string(),
            role: Role::Regular,
        };
        let value = serde_json::to_value(user.profile()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.get("role").is_none());
        assert!(obj.get("id").is_none());
    }
}
