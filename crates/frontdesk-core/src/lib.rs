//! Front Desk Core Library
//!
//! Role-based hospital front desk: patient registration, appointments, the
//! doctor visit queue, consultations, vitals and billing.
//!
//! # Architecture
//!
//! ```text
//!   request + session token
//!            │
//!     SessionStore ──▶ Principal {user_id, role, department}
//!            │
//!     Principal::require::<Policy>()        (403 on mismatch)
//!            │
//!   ┌────────┼───────────────┬──────────────────┐
//!   ▼        ▼               ▼                  ▼
//! Records  VisitEngine     Reports          Vitals
//! (CRUD)   (lifecycle,     (dashboards,     (append-only)
//!          cascades)       7-day series)
//!   │        │               │                  │
//!   └────────┴───────┬───────┴──────────────────┘
//!                    ▼
//!          Database (SQLite, foreign keys on)
//! ```
//!
//! # Core Principle
//!
//! **Every multi-step write is one transaction.** Saving a consultation and
//! every cascade delete either fully applies or leaves no trace.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, Appointment, QueueEntry, etc.)
//! - [`auth`]: Passwords, sessions and role policies
//! - [`visits`]: Visit lifecycle engine and cascade deletes
//! - [`reporting`]: Dashboard aggregates

pub mod auth;
pub mod db;
pub mod models;
pub mod reporting;
pub mod visits;

// Re-export commonly used types
pub use auth::{PasswordHasher, Principal, SessionStore};
pub use db::Database;
pub use models::{
    Appointment, AppointmentView, Billing, BillingView, Charge, Consultation, ConsultationEdit,
    ConsultationNote, Department, NewStaff, Patient, PatientForm, PaymentMethod, QueueView, Role,
    StaffUpdate, User, UserProfile, VitalsReading,
};
pub use reporting::{DateRange, Reports};
pub use visits::{CascadeSummary, SavedConsultation, VisitEngine};

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use auth::{
    AdminOnly, AdminOrReceptionist, AnyStaff, DoctorOnly, DoctorOrAdmin, ReceptionistOnly,
    VitalsWriters,
};
use models::{
    DoctorRef, PatientDetails, PatientHistory, PatientSnapshot, PatientSummary, VitalSigns,
    VitalsEntry,
};
use reporting::{
    AdminSummary, DoctorDashboard, HospitalOverview, QuickDashboard, ReceptionistSummary,
};

// =========================================================================
// Error Type
// =========================================================================

#[derive(Debug, thiserror::Error)]
pub enum FrontDeskError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),
}

impl From<db::DbError> for FrontDeskError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Constraint(msg) => FrontDeskError::Validation(msg),
            db::DbError::NotFound(what) => FrontDeskError::NotFound(what),
            other => FrontDeskError::Transaction(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for FrontDeskError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        FrontDeskError::Transaction(format!("Lock poisoned: {}", e))
    }
}

/// A fresh session.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    #[serde(skip)]
    pub token: String,
    pub user: UserProfile,
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe front desk service. Every operation authorizes first.
pub struct FrontDesk {
    db: Mutex<Database>,
    sessions: SessionStore,
    hasher: PasswordHasher,
}

impl FrontDesk {
    pub fn new(db: Database, hasher: PasswordHasher) -> Self {
        Self {
            db: Mutex::new(db),
            sessions: SessionStore::new(),
            hasher,
        }
    }

    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, hasher: PasswordHasher) -> Result<Self, FrontDeskError> {
        Ok(Self::new(Database::open(path)?, hasher))
    }

    /// Create an in-memory front desk (for testing).
    pub fn open_in_memory(hasher: PasswordHasher) -> Result<Self, FrontDeskError> {
        Ok(Self::new(Database::open_in_memory()?, hasher))
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>, FrontDeskError> {
        Ok(self.db.lock()?)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Create the bootstrap administrator unless the email is already taken.
    ///
    /// Returns true if an account was created.
    pub fn ensure_admin(&self, email: &str, password: &str, name: &str) -> Result<bool, FrontDeskError> {
        let db = self.db()?;
        if db.get_user_by_email(email)?.is_some() {
            return Ok(false);
        }
        let admin = User::new(
            name.to_string(),
            email.to_string(),
            self.hasher.hash(password),
            Role::Admin,
            None,
        );
        let id = db.insert_user(&admin)?;
        tracing::info!(user_id = id, email, "bootstrap admin created");
        Ok(true)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, FrontDeskError> {
        let user = self.db()?.get_user_by_email(email)?;
        let user = match user {
            Some(user) if user.is_active && self.hasher.verify(password, &user.password_hash) => user,
            _ => {
                tracing::warn!(email, "failed login");
                return Err(FrontDeskError::Authentication("Invalid credentials".into()));
            }
        };

        let token = self.sessions.issue(Principal::for_user(&user));
        tracing::info!(user_id = user.id, role = user.role.as_str(), "login");
        Ok(LoginOutcome {
            token,
            user: UserProfile::from(&user),
        })
    }

    /// Resolve a session token.
    pub fn principal(&self, token: &str) -> Option<Principal> {
        self.sessions.lookup(token)
    }

    pub fn logout(&self, token: &str) -> bool {
        let revoked = self.sessions.revoke(token);
        if revoked {
            tracing::info!("logout");
        }
        revoked
    }

    /// Change the caller's own password.
    ///
    /// A wrong current password is reported as `Ok(false)` and changes nothing.
    pub fn change_password(
        &self,
        principal: &Principal,
        current: &str,
        new: &str,
    ) -> Result<bool, FrontDeskError> {
        principal.require::<AnyStaff>()?;
        if new.is_empty() {
            return Err(FrontDeskError::Validation("New password must not be empty".into()));
        }
        let db = self.db()?;
        let user = db
            .get_user(principal.user_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("User {}", principal.user_id)))?;
        if !self.hasher.verify(current, &user.password_hash) {
            return Ok(false);
        }
        db.set_password_hash(user.id, &self.hasher.hash(new))?;
        tracing::info!(user_id = user.id, "password changed");
        Ok(true)
    }

    // =========================================================================
    // Admin Operations
    // =========================================================================

    pub fn admin_summary(&self, principal: &Principal, range: DateRange) -> Result<AdminSummary, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        let db = self.db()?;
        Ok(Reports::new(&db).admin_summary(range)?)
    }

    pub fn hospital_overview(&self, principal: &Principal) -> Result<HospitalOverview, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        let db = self.db()?;
        Ok(Reports::new(&db).hospital_overview()?)
    }

    /// Doctors and receptionists.
    pub fn list_staff(&self, principal: &Principal) -> Result<Vec<User>, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        Ok(self
            .db()?
            .list_users_with_roles(&[Role::Doctor, Role::Receptionist])?)
    }

    /// Register a staff account. Receptionists always land in reception.
    pub fn register_staff(&self, principal: &Principal, staff: NewStaff) -> Result<i64, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        if staff.name.trim().is_empty() || staff.email.trim().is_empty() {
            return Err(FrontDeskError::Validation("Name and email are required".into()));
        }
        if staff.password.is_empty() {
            return Err(FrontDeskError::Validation("Password is required".into()));
        }
        let department = match staff.role {
            Role::Receptionist => Some(Department::Reception),
            Role::Doctor => match staff.department {
                Some(Department::Reception) | None => {
                    return Err(FrontDeskError::Validation(
                        "Doctors need a clinical department".into(),
                    ));
                }
                clinical => clinical,
            },
            Role::Admin => staff.department,
        };

        let db = self.db()?;
        if db.get_user_by_email(&staff.email)?.is_some() {
            return Err(FrontDeskError::Validation(
                "User with this email already exists".into(),
            ));
        }
        let mut user = User::new(
            staff.name,
            staff.email,
            self.hasher.hash(&staff.password),
            staff.role,
            department,
        );
        user.schedule = staff.schedule;
        let id = db.insert_user(&user)?;
        tracing::info!(user_id = id, role = user.role.as_str(), "staff registered");
        Ok(id)
    }

    /// Edit a staff account. An empty or absent password leaves the credential alone.
    pub fn update_user(
        &self,
        principal: &Principal,
        user_id: i64,
        update: StaffUpdate,
    ) -> Result<(), FrontDeskError> {
        principal.require::<AdminOnly>()?;
        let db = self.db()?;
        let mut user = db
            .get_user(user_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("User {}", user_id)))?;
        if let Some(other) = db.get_user_by_email(&update.email)? {
            if other.id != user_id {
                return Err(FrontDeskError::Validation(
                    "User with this email already exists".into(),
                ));
            }
        }

        user.name = update.name;
        user.email = update.email;
        user.department = update.department;
        if update.schedule.is_some() {
            user.schedule = update.schedule;
        }
        let password_hash = update
            .password
            .filter(|p| !p.is_empty())
            .map(|p| self.hasher.hash(&p));

        db.atomically(|db| {
            db.update_user(&user)?;
            if let Some(hash) = &password_hash {
                db.set_password_hash(user_id, hash)?;
            }
            Ok::<_, FrontDeskError>(())
        })?;
        tracing::info!(user_id, password_reset = password_hash.is_some(), "user updated");
        Ok(())
    }

    /// Delete a doctor or receptionist and everything referencing them.
    pub fn delete_user(&self, principal: &Principal, user_id: i64) -> Result<CascadeSummary, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        let db = self.db()?;
        let summary = VisitEngine::new(&db).delete_staff(user_id)?;
        self.sessions.revoke_user(user_id);
        Ok(summary)
    }

    pub fn all_patients(&self, principal: &Principal) -> Result<Vec<Patient>, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        Ok(self.db()?.list_patients()?)
    }

    pub fn update_patient(
        &self,
        principal: &Principal,
        patient_id: i64,
        form: PatientForm,
    ) -> Result<(), FrontDeskError> {
        principal.require::<AdminOnly>()?;
        validate_patient_form(&form)?;
        let db = self.db()?;
        let mut patient = db
            .get_patient(patient_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Patient {}", patient_id)))?;
        patient.name = form.name;
        patient.age = form.age;
        patient.gender = form.gender;
        patient.phone = form.phone;
        patient.department = form.department;
        if form.address.is_some() {
            patient.address = form.address;
        }
        db.update_patient(&patient)?;
        Ok(())
    }

    pub fn delete_patient(&self, principal: &Principal, patient_id: i64) -> Result<CascadeSummary, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).delete_patient(patient_id)
    }

    pub fn delete_consultation(
        &self,
        principal: &Principal,
        consultation_id: i64,
    ) -> Result<CascadeSummary, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).delete_consultation(consultation_id)
    }

    pub fn all_appointments(&self, principal: &Principal) -> Result<Vec<AppointmentView>, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        Ok(self.db()?.list_appointment_views(None)?)
    }

    pub fn billing_overview(&self, principal: &Principal) -> Result<Vec<BillingView>, FrontDeskError> {
        principal.require::<AdminOnly>()?;
        Ok(self.db()?.list_billing_views()?)
    }

    // =========================================================================
    // Front Office (admin or receptionist)
    // =========================================================================

    /// Patient record with bills and latest consultation time.
    pub fn patient_details(&self, principal: &Principal, patient_id: i64) -> Result<PatientDetails, FrontDeskError> {
        principal.require::<AdminOrReceptionist>()?;
        let db = self.db()?;
        let patient = db
            .get_patient(patient_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Patient {}", patient_id)))?;
        Ok(PatientDetails {
            last_session: db.last_consultation_at(patient_id)?,
            bills: db.bills_for_patient(patient_id)?,
            patient,
        })
    }

    // =========================================================================
    // Receptionist Operations
    // =========================================================================

    pub fn receptionist_summary(
        &self,
        principal: &Principal,
        range: DateRange,
    ) -> Result<ReceptionistSummary, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let db = self.db()?;
        Ok(Reports::new(&db).receptionist_summary(range)?)
    }

    pub fn quick_dashboard(&self, principal: &Principal) -> Result<QuickDashboard, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let db = self.db()?;
        Ok(Reports::new(&db).quick_dashboard()?)
    }

    pub fn register_patient(&self, principal: &Principal, form: PatientForm) -> Result<i64, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        validate_patient_form(&form)?;
        let id = self.db()?.insert_patient(&form.into_patient())?;
        tracing::info!(patient_id = id, "patient registered");
        Ok(id)
    }

    pub fn book_appointment(
        &self,
        principal: &Principal,
        patient_name: &str,
        doctor_name: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<i64, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).book_appointment(patient_name, doctor_name, date, time)
    }

    /// All patients with their latest consultation time.
    pub fn patient_summaries(&self, principal: &Principal) -> Result<Vec<PatientSummary>, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        Ok(self.db()?.list_patient_summaries()?)
    }

    pub fn billing(&self, principal: &Principal) -> Result<Vec<BillingView>, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        Ok(self.db()?.list_billing_views()?)
    }

    /// Record payment. The method defaults to cash.
    pub fn mark_bill_paid(
        &self,
        principal: &Principal,
        billing_id: i64,
        method: Option<PaymentMethod>,
    ) -> Result<(), FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let method = method.unwrap_or_default();
        if !self.db()?.mark_billing_paid(billing_id, method)? {
            return Err(FrontDeskError::NotFound(format!("Bill {}", billing_id)));
        }
        tracing::info!(billing_id, method = method.as_str(), "bill paid");
        Ok(())
    }

    pub fn doctors_in_department(
        &self,
        principal: &Principal,
        department: Department,
    ) -> Result<Vec<DoctorRef>, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        Ok(self
            .db()?
            .list_doctors(Some(department))?
            .into_iter()
            .map(|d| DoctorRef { id: d.id, name: d.name })
            .collect())
    }

    pub fn doctor_names(&self, principal: &Principal) -> Result<Vec<String>, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        Ok(self
            .db()?
            .list_doctors(None)?
            .into_iter()
            .map(|d| d.name)
            .collect())
    }

    pub fn patient_names(&self, principal: &Principal) -> Result<Vec<String>, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        Ok(self.db()?.list_patient_names()?)
    }

    pub fn appointments(&self, principal: &Principal) -> Result<Vec<AppointmentView>, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        Ok(self.db()?.list_appointment_views(None)?)
    }

    /// Every doctor's queue, oldest first.
    pub fn queue(&self, principal: &Principal) -> Result<Vec<QueueView>, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        Ok(self.db()?.list_queue()?)
    }

    pub fn add_walk_in(
        &self,
        principal: &Principal,
        patient_name: &str,
        doctor_name: &str,
    ) -> Result<i64, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).queue_walk_in(patient_name, doctor_name)
    }

    pub fn queue_appointment(&self, principal: &Principal, appointment_id: i64) -> Result<i64, FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).queue_appointment(appointment_id)
    }

    pub fn remove_from_queue(&self, principal: &Principal, queue_id: i64) -> Result<(), FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).remove_from_queue(queue_id)
    }

    pub fn cancel_appointment(&self, principal: &Principal, appointment_id: i64) -> Result<(), FrontDeskError> {
        principal.require::<ReceptionistOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).cancel_appointment(appointment_id)
    }

    // =========================================================================
    // Doctor Operations (scoped to the caller)
    // =========================================================================

    pub fn doctor_dashboard(&self, principal: &Principal, range: DateRange) -> Result<DoctorDashboard, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        let db = self.db()?;
        let doctor = db
            .get_user(principal.user_id)?
            .ok_or_else(|| FrontDeskError::NotFound("Doctor".into()))?;
        Ok(Reports::new(&db).doctor_dashboard(&doctor, range)?)
    }

    pub fn doctor_info(&self, principal: &Principal) -> Result<UserProfile, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        let doctor = self
            .db()?
            .get_user(principal.user_id)?
            .ok_or_else(|| FrontDeskError::NotFound("Doctor".into()))?;
        Ok(UserProfile::from(&doctor))
    }

    pub fn start_consultation(&self, principal: &Principal, queue_id: i64) -> Result<PatientSnapshot, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).start_consultation(principal.user_id, queue_id)
    }

    pub fn save_consultation(
        &self,
        principal: &Principal,
        patient_id: i64,
        note: ConsultationNote,
        charge: Option<Charge>,
    ) -> Result<SavedConsultation, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).save_consultation(principal.user_id, patient_id, note, charge)
    }

    pub fn update_consultation(
        &self,
        principal: &Principal,
        consultation_id: i64,
        edit: ConsultationEdit,
    ) -> Result<Consultation, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        let db = self.db()?;
        VisitEngine::new(&db).update_consultation(principal.user_id, consultation_id, edit)
    }

    /// Patient record with every consultation. Open to doctors and admins.
    pub fn patient_history(&self, principal: &Principal, patient_id: i64) -> Result<PatientHistory, FrontDeskError> {
        principal.require::<DoctorOrAdmin>()?;
        let db = self.db()?;
        let patient = db
            .get_patient(patient_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Patient {}", patient_id)))?;
        Ok(PatientHistory {
            consultations: db.consultation_history(patient_id)?,
            patient,
        })
    }

    /// Patients with any consultation, appointment or queue entry for the caller.
    pub fn my_patients(&self, principal: &Principal) -> Result<Vec<PatientSummary>, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        Ok(self.db()?.list_patients_for_doctor(principal.user_id)?)
    }

    pub fn my_queue(&self, principal: &Principal) -> Result<Vec<QueueView>, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        Ok(self.db()?.list_queue_for_doctor(principal.user_id)?)
    }

    pub fn my_appointments(&self, principal: &Principal) -> Result<Vec<AppointmentView>, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        Ok(self.db()?.list_appointment_views(Some(principal.user_id))?)
    }

    pub fn patient(&self, principal: &Principal, patient_id: i64) -> Result<Patient, FrontDeskError> {
        principal.require::<DoctorOnly>()?;
        self.db()?
            .get_patient(patient_id)?
            .ok_or_else(|| FrontDeskError::NotFound(format!("Patient {}", patient_id)))
    }

    // =========================================================================
    // Vitals
    // =========================================================================

    pub fn record_vitals(
        &self,
        principal: &Principal,
        patient_id: i64,
        reading: VitalsReading,
    ) -> Result<i64, FrontDeskError> {
        principal.require::<VitalsWriters>()?;
        let db = self.db()?;
        if db.get_patient(patient_id)?.is_none() {
            return Err(FrontDeskError::NotFound(format!("Patient {}", patient_id)));
        }
        let id = db.insert_vitals(&VitalSigns::new(patient_id, principal.user_id, reading))?;
        tracing::info!(vitals_id = id, patient_id, recorded_by = principal.user_id, "vitals recorded");
        Ok(id)
    }

    /// Vitals history, newest first.
    pub fn vitals_history(&self, principal: &Principal, patient_id: i64) -> Result<Vec<VitalsEntry>, FrontDeskError> {
        principal.require::<AnyStaff>()?;
        Ok(self.db()?.list_vitals_for_patient(patient_id)?)
    }

    pub fn latest_vitals(&self, principal: &Principal, patient_id: i64) -> Result<Option<VitalsEntry>, FrontDeskError> {
        principal.require::<AnyStaff>()?;
        Ok(self.db()?.latest_vitals(patient_id)?)
    }
}

fn validate_patient_form(form: &PatientForm) -> Result<(), FrontDeskError> {
    if form.name.trim().is_empty() {
        return Err(FrontDeskError::Validation("Patient name is required".into()));
    }
    if form.age < 0 {
        return Err(FrontDeskError::Validation("Age must not be negative".into()));
    }
    Ok(())
}
