//! Staff user models.

use serde::{Deserialize, Serialize};

use super::timestamp_now;

/// Staff role. Closed set; every authorization decision is made on this enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
}

impl Role {
    /// Database string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Receptionist => "receptionist",
        }
    }

    /// Parse from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "doctor" => Some(Self::Doctor),
            "receptionist" => Some(Self::Receptionist),
            _ => None,
        }
    }
}

/// Hospital department a staff member belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Eye,
    Ent,
    Skin,
    Reception,
}

impl Department {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eye => "eye",
            Self::Ent => "ent",
            Self::Skin => "skin",
            Self::Reception => "reception",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eye" => Some(Self::Eye),
            "ent" => Some(Self::Ent),
            "skin" => Some(Self::Skin),
            "reception" => Some(Self::Reception),
            _ => None,
        }
    }
}

/// A staff account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Surrogate ID, 0 until inserted
    pub id: i64,
    pub name: String,
    /// Unique login email
    pub email: String,
    /// Encoded password credential, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub department: Option<Department>,
    /// Free-text work schedule
    pub schedule: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl User {
    /// Create a new active user with an already-encoded credential.
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        role: Role,
        department: Option<Department>,
    ) -> Self {
        Self {
            id: 0,
            name,
            email,
            password_hash,
            role,
            department,
            schedule: None,
            is_active: true,
            created_at: timestamp_now(),
        }
    }

    /// Staff members are doctors and receptionists; admins are not listed as staff.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Doctor | Role::Receptionist)
    }
}

/// Public face of a user, as returned at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub department: Option<Department>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            department: user.department,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DoctorRef {
    pub id: i64,
    pub name: String,
}

/// Fields accepted when registering a staff member.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: Option<Department>,
    #[serde(default)]
    pub schedule: Option<String>,
}

/// Admin edit of a user. Password is only replaced when non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffUpdate {
    pub name: String,
    pub email: String,
    pub department: Option<Department>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
