//! Per-role dashboard payloads.

use serde::Serialize;

use super::{ConsultationPoint, DateRange, PatientFlowPoint, Reports};
use crate::db::DbResult;
use crate::models::{AppointmentView, BillingStatus, DailyBill, Department, QueueStatus, Role, User};

/// Appointments listed on the admin dashboard.
pub const RECENT_APPOINTMENTS: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_doctors: i64,
    pub receptionists: i64,
    pub total_patients: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub stats: AdminStats,
    pub patient_flow: Vec<PatientFlowPoint>,
    pub recent_appointments: Vec<AppointmentView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub patient_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HospitalOverview {
    pub total_staff: i64,
    pub total_doctors: i64,
    pub total_receptionists: i64,
    pub total_patients: i64,
    pub total_appointments: i64,
    pub department_stats: Vec<DepartmentCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceptionistStats {
    pub patients_registered: i64,
    pub total_appointments: i64,
    pub pending_queue: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceptionistSummary {
    pub stats: ReceptionistStats,
    pub billing_summary: Vec<DailyBill>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuickDashboard {
    pub today_patients: i64,
    pub pending_bills: i64,
    pub queue_length: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboard {
    /// Appointments dated within the requested range.
    pub appointments: i64,
    /// Patients registered under the doctor's department.
    pub total_patients: i64,
    pub queue_length: i64,
    pub completed_consultations: i64,
    pub consultation_data: Vec<ConsultationPoint>,
    pub department: Option<Department>,
}

impl Reports<'_> {
    pub fn admin_summary(&self, range: DateRange) -> DbResult<AdminSummary> {
        Ok(AdminSummary {
            stats: AdminStats {
                total_doctors: self.db.count_users_with_role(Role::Doctor)?,
                receptionists: self.db.count_users_with_role(Role::Receptionist)?,
                total_patients: self.db.count_patients()?,
                revenue: self.revenue(range)?,
            },
            patient_flow: self.patient_flow()?,
            recent_appointments: self.db.recent_appointment_views(RECENT_APPOINTMENTS)?,
        })
    }

    pub fn hospital_overview(&self) -> DbResult<HospitalOverview> {
        let total_doctors = self.db.count_users_with_role(Role::Doctor)?;
        let total_receptionists = self.db.count_users_with_role(Role::Receptionist)?;
        Ok(HospitalOverview {
            total_staff: total_doctors + total_receptionists,
            total_doctors,
            total_receptionists,
            total_patients: self.db.count_patients()?,
            total_appointments: self.db.count_appointments()?,
            department_stats: self.department_breakdown()?,
        })
    }

    /// Range counts plus today's bills. The waiting count ignores the range.
    pub fn receptionist_summary(&self, range: DateRange) -> DbResult<ReceptionistSummary> {
        Ok(ReceptionistSummary {
            stats: ReceptionistStats {
                patients_registered: self.db.count_patients_registered(range.start, range.end)?,
                total_appointments: self
                    .db
                    .count_appointments_between(range.start, range.end, None)?,
                pending_queue: self.db.count_queue(Some(QueueStatus::Waiting), None)?,
            },
            billing_summary: self.db.bills_created_on(self.today)?,
        })
    }

    pub fn quick_dashboard(&self) -> DbResult<QuickDashboard> {
        Ok(QuickDashboard {
            today_patients: self.db.count_patients_registered(self.today, self.today)?,
            pending_bills: self.db.count_bills_with_status(BillingStatus::Pending)?,
            queue_length: self.db.count_queue(Some(QueueStatus::Waiting), None)?,
        })
    }

    pub fn doctor_dashboard(&self, doctor: &User, range: DateRange) -> DbResult<DoctorDashboard> {
        let total_patients = match doctor.department {
            Some(department) => self.db.count_patients_in_department(department.as_str())?,
            None => 0,
        };
        Ok(DoctorDashboard {
            appointments: self
                .db
                .count_appointments_between(range.start, range.end, Some(doctor.id))?,
            total_patients,
            queue_length: self.db.count_queue(None, Some(doctor.id))?,
            completed_consultations: self.db.count_consultations_between(
                range.start,
                range.end,
                Some(doctor.id),
            )?,
            consultation_data: self.doctor_activity(doctor.id)?,
            department: doctor.department,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Appointment, Patient, QueueEntry};
    use chrono::{NaiveDate, NaiveTime};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn setup() -> (Database, User) {
        let db = Database::open_in_memory().unwrap();
        let mut doctor = User::new(
            "Dr. Smith".into(),
            "smith@hospital.com".into(),
            "x".into(),
            Role::Doctor,
            Some(Department::Eye),
        );
        doctor.id = db.insert_user(&doctor).unwrap();
        db.insert_user(&User::new(
            "Rita".into(),
            "rita@hospital.com".into(),
            "x".into(),
            Role::Receptionist,
            Some(Department::Reception),
        ))
        .unwrap();
        (db, doctor)
    }

    fn register(db: &Database, name: &str, department: &str, created_at: &str) -> i64 {
        let mut patient = Patient::new(name.into(), 40, "male".into(), "0700".into(), department.into());
        patient.created_at = created_at.into();
        db.insert_patient(&patient).unwrap()
    }

    #[test]
    fn test_hospital_overview() {
        let (db, _) = setup();
        register(&db, "Jane Doe", "eye", "2024-01-15T09:00:00.000000Z");
        register(&db, "John Roe", "skin", "2024-01-15T09:00:00.000000Z");

        let overview = Reports::on(&db, day(15)).hospital_overview().unwrap();
        assert_eq!(overview.total_staff, 2);
        assert_eq!(overview.total_patients, 2);
        assert_eq!(overview.department_stats.len(), 2);

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["departmentStats"][0]["patientCount"], 1);
    }

    #[test]
    fn test_patient_flow_counts_three_sources() {
        let (db, doctor) = setup();
        let patient_id = register(&db, "Jane Doe", "eye", "2024-01-14T09:00:00.000000Z");
        db.insert_appointment(&Appointment::new(
            patient_id,
            doctor.id,
            day(14),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        ))
        .unwrap();

        let summary = Reports::on(&db, day(15))
            .admin_summary(DateRange::single(day(15)))
            .unwrap();
        let sunday = &summary.patient_flow[5];
        assert_eq!(sunday.date, day(14));
        assert_eq!(sunday.patients, 2);
        assert_eq!(summary.recent_appointments.len(), 1);
        assert_eq!(summary.stats.total_doctors, 1);
    }

    #[test]
    fn test_doctor_dashboard_scoped() {
        let (db, doctor) = setup();
        let patient_id = register(&db, "Jane Doe", "eye", "2024-01-15T09:00:00.000000Z");
        register(&db, "John Roe", "skin", "2024-01-15T09:00:00.000000Z");
        db.insert_queue_entry(&QueueEntry::walk_in(patient_id, doctor.id)).unwrap();

        let dashboard = Reports::on(&db, day(15))
            .doctor_dashboard(&doctor, DateRange::single(day(15)))
            .unwrap();
        assert_eq!(dashboard.total_patients, 1);
        assert_eq!(dashboard.queue_length, 1);
        assert_eq!(dashboard.consultation_data.len(), 7);
        assert_eq!(dashboard.department, Some(Department::Eye));
    }

    #[test]
    fn test_quick_dashboard_counts_today() {
        let (db, doctor) = setup();
        let patient_id = register(&db, "Jane Doe", "eye", "2024-01-15T09:00:00.000000Z");
        register(&db, "John Roe", "skin", "2024-01-14T09:00:00.000000Z");
        db.insert_queue_entry(&QueueEntry::walk_in(patient_id, doctor.id)).unwrap();

        let quick = Reports::on(&db, day(15)).quick_dashboard().unwrap();
        assert_eq!(quick.today_patients, 1);
        assert_eq!(quick.pending_bills, 0);
        assert_eq!(quick.queue_length, 1);
    }
}
