//! Visit lifecycle integration tests, driven through the service facade.

use chrono::{Duration, NaiveTime};

use frontdesk_core::db::Database;
use frontdesk_core::models::{
    today, AppointmentStatus, BillingStatus, Charge, ConsultationNote, Department, NewStaff,
    PatientForm, PaymentMethod, QueueStatus, Role, VitalsReading,
};
use frontdesk_core::{
    DateRange, FrontDesk, FrontDeskError, PasswordHasher, Principal, VisitEngine,
};

struct Hospital {
    desk: FrontDesk,
    admin: Principal,
    receptionist: Principal,
    doctor: Principal,
}

fn login(desk: &FrontDesk, email: &str, password: &str) -> Principal {
    let outcome = desk.login(email, password).unwrap();
    desk.principal(&outcome.token).unwrap()
}

fn hospital() -> Hospital {
    let desk = FrontDesk::open_in_memory(PasswordHasher::new(1_000)).unwrap();
    desk.ensure_admin("admin@hospital.com", "admin123", "System Administrator")
        .unwrap();
    let admin = login(&desk, "admin@hospital.com", "admin123");

    desk.register_staff(
        &admin,
        NewStaff {
            name: "Dr. Smith".into(),
            email: "smith@hospital.com".into(),
            password: "doctor123".into(),
            role: Role::Doctor,
            department: Some(Department::Eye),
            schedule: Some("Mon-Fri 9-5".into()),
        },
    )
    .unwrap();
    desk.register_staff(
        &admin,
        NewStaff {
            name: "Rita".into(),
            email: "rita@hospital.com".into(),
            password: "front123".into(),
            role: Role::Receptionist,
            department: None,
            schedule: None,
        },
    )
    .unwrap();

    let receptionist = login(&desk, "rita@hospital.com", "front123");
    let doctor = login(&desk, "smith@hospital.com", "doctor123");
    Hospital {
        desk,
        admin,
        receptionist,
        doctor,
    }
}

fn jane() -> PatientForm {
    PatientForm {
        name: "Jane Doe".into(),
        age: 30,
        gender: "female".into(),
        phone: "0700000000".into(),
        address: None,
        department: "eye".into(),
    }
}

fn note(diagnosis: &str) -> ConsultationNote {
    ConsultationNote {
        symptoms: Some("red, itchy eyes".into()),
        diagnosis: diagnosis.into(),
        ..Default::default()
    }
}

fn charge(amount: f64) -> Option<Charge> {
    Some(Charge {
        amount,
        payment_method: None,
    })
}

#[test]
fn test_jane_doe_scenario() {
    let h = hospital();
    let desk = &h.desk;

    let patient_id = desk.register_patient(&h.receptionist, jane()).unwrap();
    let tomorrow = today() + Duration::days(1);
    let appointment_id = desk
        .book_appointment(
            &h.receptionist,
            "Jane Doe",
            "Dr. Smith",
            tomorrow,
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        )
        .unwrap();
    let queue_id = desk.queue_appointment(&h.receptionist, appointment_id).unwrap();

    let snapshot = desk.start_consultation(&h.doctor, queue_id).unwrap();
    assert_eq!(snapshot.name, "Jane Doe");
    assert_eq!(snapshot.age, 30);
    assert_eq!(snapshot.department, "eye");
    assert_eq!(desk.my_queue(&h.doctor).unwrap()[0].status, QueueStatus::InProgress);

    desk.save_consultation(&h.doctor, patient_id, note("Conjunctivitis"), charge(1000.0))
        .unwrap();

    let history = desk.patient_history(&h.doctor, patient_id).unwrap();
    assert_eq!(history.consultations.len(), 1);
    assert_eq!(history.consultations[0].diagnosis, "Conjunctivitis");
    assert_eq!(history.consultations[0].amount, 1000.0);

    let bills = desk.billing(&h.receptionist).unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].amount, 1000.0);
    assert_eq!(bills[0].status, BillingStatus::Pending);
    assert_eq!(bills[0].doctor_name, "Dr. Smith");

    assert!(desk.my_queue(&h.doctor).unwrap().is_empty());
    let appointments = desk.my_appointments(&h.doctor).unwrap();
    assert_eq!(appointments[0].status, AppointmentStatus::Scheduled);
}

#[test]
fn test_save_completes_todays_appointment() {
    let h = hospital();
    let desk = &h.desk;
    let patient_id = desk.register_patient(&h.receptionist, jane()).unwrap();
    desk.book_appointment(
        &h.receptionist,
        "Jane Doe",
        "Dr. Smith",
        today(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    )
    .unwrap();
    desk.add_walk_in(&h.receptionist, "Jane Doe", "Dr. Smith").unwrap();
    desk.add_walk_in(&h.receptionist, "Jane Doe", "Dr. Smith").unwrap();

    let saved = desk
        .save_consultation(&h.doctor, patient_id, note("Dry eye"), None)
        .unwrap();
    assert!(saved.billing_id.is_none());

    assert!(desk.my_queue(&h.doctor).unwrap().is_empty());
    let appointments = desk.my_appointments(&h.doctor).unwrap();
    assert_eq!(appointments[0].status, AppointmentStatus::Completed);
    let details = desk.patient_details(&h.receptionist, patient_id).unwrap();
    assert!(details.bills.is_empty());
    assert!(details.last_session.is_some());
}

#[test]
fn test_revenue_counts_paid_bills_only() {
    let h = hospital();
    let desk = &h.desk;
    let patient_id = desk.register_patient(&h.receptionist, jane()).unwrap();

    let mut bill_ids = Vec::new();
    for amount in [500.0, 1500.0, 300.0] {
        let saved = desk
            .save_consultation(&h.doctor, patient_id, note("Follow-up"), charge(amount))
            .unwrap();
        bill_ids.push(saved.billing_id.unwrap());
    }
    desk.mark_bill_paid(&h.receptionist, bill_ids[0], Some(PaymentMethod::Mpesa))
        .unwrap();
    desk.mark_bill_paid(&h.receptionist, bill_ids[1], None).unwrap();

    let summary = desk.admin_summary(&h.admin, DateRange::single(today())).unwrap();
    assert_eq!(summary.stats.revenue, 2000.0);
    assert_eq!(desk.quick_dashboard(&h.receptionist).unwrap().pending_bills, 1);
}

#[test]
fn test_delete_patient_leaves_no_references() {
    let h = hospital();
    let desk = &h.desk;
    let patient_id = desk.register_patient(&h.receptionist, jane()).unwrap();
    desk.record_vitals(
        &h.receptionist,
        patient_id,
        VitalsReading {
            blood_pressure: Some("120/80".into()),
            ..Default::default()
        },
    )
    .unwrap();
    desk.book_appointment(
        &h.receptionist,
        "Jane Doe",
        "Dr. Smith",
        today() + Duration::days(3),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    )
    .unwrap();
    desk.save_consultation(&h.doctor, patient_id, note("Conjunctivitis"), charge(1000.0))
        .unwrap();
    desk.add_walk_in(&h.receptionist, "Jane Doe", "Dr. Smith").unwrap();

    let summary = desk.delete_patient(&h.admin, patient_id).unwrap();
    assert_eq!(summary.vitals, 1);
    assert_eq!(summary.appointments, 1);
    assert_eq!(summary.queue_entries, 1);
    assert_eq!(summary.consultations, 1);
    assert_eq!(summary.bills, 1);

    assert!(desk.all_patients(&h.admin).unwrap().is_empty());
    assert!(desk.billing_overview(&h.admin).unwrap().is_empty());
    assert!(desk.all_appointments(&h.admin).unwrap().is_empty());
    assert!(desk.queue(&h.receptionist).unwrap().is_empty());
    assert!(desk.vitals_history(&h.doctor, patient_id).unwrap().is_empty());
}

#[test]
fn test_deleting_admin_always_fails() {
    let h = hospital();
    let err = h.desk.delete_user(&h.admin, h.admin.user_id).unwrap_err();
    assert!(matches!(err, FrontDeskError::Validation(_)));
    assert!(h.desk.hospital_overview(&h.admin).is_ok());
    assert!(h.desk.login("admin@hospital.com", "admin123").is_ok());
}

#[test]
fn test_deleted_doctor_loses_session() {
    let h = hospital();
    let staff = h.desk.list_staff(&h.admin).unwrap();
    let doctor = staff.iter().find(|u| u.role == Role::Doctor).unwrap();

    h.desk.delete_user(&h.admin, doctor.id).unwrap();
    assert!(h.desk.login("smith@hospital.com", "doctor123").is_err());
    assert_eq!(h.desk.sessions().len(), 2);
}

#[test]
fn test_wrong_current_password_changes_nothing() {
    let h = hospital();
    let changed = h
        .desk
        .change_password(&h.doctor, "not-my-password", "new-secret")
        .unwrap();
    assert!(!changed);
    assert!(h.desk.login("smith@hospital.com", "doctor123").is_ok());
    assert!(h.desk.login("smith@hospital.com", "new-secret").is_err());

    assert!(h
        .desk
        .change_password(&h.doctor, "doctor123", "new-secret")
        .unwrap());
    assert!(h.desk.login("smith@hospital.com", "new-secret").is_ok());
}

#[test]
fn test_roles_enforced_per_endpoint_group() {
    let h = hospital();
    let desk = &h.desk;

    assert!(matches!(
        desk.hospital_overview(&h.doctor),
        Err(FrontDeskError::Authorization(_))
    ));
    assert!(matches!(
        desk.queue(&h.doctor),
        Err(FrontDeskError::Authorization(_))
    ));
    assert!(matches!(
        desk.my_queue(&h.receptionist),
        Err(FrontDeskError::Authorization(_))
    ));
    assert!(matches!(
        desk.record_vitals(&h.admin, 1, VitalsReading::default()),
        Err(FrontDeskError::Authorization(_))
    ));
    assert!(matches!(
        desk.patient_history(&h.receptionist, 1),
        Err(FrontDeskError::Authorization(_))
    ));
    assert!(matches!(
        desk.patient_history(&h.admin, 1),
        Err(FrontDeskError::NotFound(_))
    ));
}

#[test]
fn test_vitals_history_fallbacks() {
    let h = hospital();
    let patient_id = h.desk.register_patient(&h.receptionist, jane()).unwrap();
    h.desk
        .record_vitals(
            &h.doctor,
            patient_id,
            VitalsReading {
                heart_rate: Some(72),
                ..Default::default()
            },
        )
        .unwrap();

    let history = h.desk.vitals_history(&h.admin, patient_id).unwrap();
    assert_eq!(history[0].reading.blood_pressure.as_deref(), Some("N/A"));
    assert_eq!(history[0].recorded_by, "Dr. Smith");

    let latest = h.desk.latest_vitals(&h.receptionist, patient_id).unwrap().unwrap();
    assert_eq!(latest.reading.blood_pressure, None);
    assert_eq!(latest.reading.heart_rate, Some(72));
}

#[test]
fn test_forced_failure_rolls_back_consultation_save() {
    let db = Database::open_in_memory().unwrap();
    db.conn()
        .execute_batch(
            r#"
            INSERT INTO patients (name, age, gender, phone, department, created_at)
            VALUES ('Jane Doe', 30, 'female', '0700', 'eye', '2024-01-15T08:00:00.000000Z');
            INSERT INTO users (name, email, password_hash, role, department, created_at)
            VALUES ('Dr. Smith', 'smith@hospital.com', 'x', 'doctor', 'eye', '2024-01-01T08:00:00.000000Z');
            INSERT INTO queue (patient_id, doctor_id, status, priority, created_at)
            VALUES (1, 1, 'waiting', 0, '2024-01-15T09:00:00.000000Z');
            CREATE TRIGGER block_queue_delete BEFORE DELETE ON queue
            BEGIN SELECT RAISE(ABORT, 'queue locked'); END;
            "#,
        )
        .unwrap();

    let result = VisitEngine::new(&db).save_consultation(1, 1, note("Conjunctivitis"), charge(1000.0));
    assert!(result.is_err());

    for (table, expected) in [("consultations", 0), ("billing", 0), ("queue", 1)] {
        let count: i64 = db
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, expected, "{}", table);
    }
}

#[test]
fn test_deleting_receptionist_keeps_clinical_records() {
    let h = hospital();
    let desk = &h.desk;
    let patient_id = desk.register_patient(&h.receptionist, jane()).unwrap();
    desk.record_vitals(&h.receptionist, patient_id, VitalsReading::default())
        .unwrap();
    desk.save_consultation(&h.doctor, patient_id, note("Conjunctivitis"), charge(1000.0))
        .unwrap();

    let staff = desk.list_staff(&h.admin).unwrap();
    let receptionist = staff.iter().find(|u| u.role == Role::Receptionist).unwrap();
    let summary = desk.delete_user(&h.admin, receptionist.id).unwrap();

    assert_eq!(summary.vitals, 1);
    assert_eq!(summary.consultations, 0);
    assert_eq!(desk.billing_overview(&h.admin).unwrap().len(), 1);
    assert_eq!(desk.patient_history(&h.admin, patient_id).unwrap().consultations.len(), 1);
}
