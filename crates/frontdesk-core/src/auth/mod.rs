//! Identity and session handling.
//!
//! - `password`: PBKDF2 credential hashing and verification
//! - `session`: server-side token store mapping to a [`Principal`]
//! - `policy`: typed role policies checked before every operation

mod password;
mod policy;
mod session;

pub use password::{PasswordHasher, DEFAULT_ITERATIONS};
pub use policy::{
    AdminOnly, AdminOrReceptionist, AnyStaff, DoctorOnly, DoctorOrAdmin, Policy, Principal,
    ReceptionistOnly, VitalsWriters,
};
pub use session::SessionStore;
