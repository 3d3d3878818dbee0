//! Read-only aggregates for the dashboards.
//!
//! Every figure is an independent query; no cross-query isolation.

mod dashboards;

pub use dashboards::{
    AdminStats, AdminSummary, DepartmentCount, DoctorDashboard, HospitalOverview, QuickDashboard,
    ReceptionistStats, ReceptionistSummary, RECENT_APPOINTMENTS,
};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::db::{Database, DbError, DbResult};
use crate::models::{parse_date, today};
use crate::FrontDeskError;

/// Number of days in the activity series.
pub const ACTIVITY_DAYS: i64 = 7;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// Range from optional query parameters. Unless both ends are given the
    /// range is `today` alone.
    pub fn from_params(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, FrontDeskError> {
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(Self::single(today));
        };
        if start.is_empty() || end.is_empty() {
            return Ok(Self::single(today));
        }
        let parse = |s: &str| {
            parse_date(s).ok_or_else(|| FrontDeskError::Validation(format!("Invalid date: {}", s)))
        };
        let range = Self {
            start: parse(start)?,
            end: parse(end)?,
        };
        if range.start > range.end {
            return Err(FrontDeskError::Validation(
                "startDate must not be after endDate".into(),
            ));
        }
        Ok(range)
    }
}

/// One day of admin patient flow: registrations, appointments dated that day
/// and consultations created that day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientFlowPoint {
    pub day: String,
    pub date: NaiveDate,
    pub patients: i64,
}

/// One day of a doctor's activity: their consultations plus appointments.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConsultationPoint {
    pub day: String,
    pub date: NaiveDate,
    pub consultations: i64,
}

/// Aggregate queries, with "today" fixed at construction.
pub struct Reports<'a> {
    db: &'a Database,
    today: NaiveDate,
}

impl<'a> Reports<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::on(db, today())
    }

    pub fn on(db: &'a Database, day: NaiveDate) -> Self {
        Self { db, today: day }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Sum of paid bills created within the range.
    pub fn revenue(&self, range: DateRange) -> DbResult<f64> {
        self.db.paid_revenue_between(range.start, range.end)
    }

    /// Admin activity for the last seven days ending today, oldest first.
    ///
    /// Independent of any requested range.
    pub fn patient_flow(&self) -> DbResult<Vec<PatientFlowPoint>> {
        self.last_week()
            .map(|date| {
                let registrations = self.db.count_patients_registered(date, date)?;
                let appointments = self.db.count_appointments_between(date, date, None)?;
                let consultations = self.db.count_consultations_between(date, date, None)?;
                Ok::<_, DbError>(PatientFlowPoint {
                    day: weekday(date),
                    date,
                    patients: registrations + appointments + consultations,
                })
            })
            .collect()
    }

    /// A doctor's activity for the last seven days ending today, oldest first.
    pub fn doctor_activity(&self, doctor_id: i64) -> DbResult<Vec<ConsultationPoint>> {
        self.last_week()
            .map(|date| {
                let consultations = self
                    .db
                    .count_consultations_between(date, date, Some(doctor_id))?;
                let appointments = self
                    .db
                    .count_appointments_between(date, date, Some(doctor_id))?;
                Ok::<_, DbError>(ConsultationPoint {
                    day: weekday(date),
                    date,
                    consultations: consultations + appointments,
                })
            })
            .collect()
    }

    /// Patient counts grouped by department.
    pub fn department_breakdown(&self) -> DbResult<Vec<DepartmentCount>> {
        Ok(self
            .db
            .count_patients_by_department()?
            .into_iter()
            .map(|(department, patient_count)| DepartmentCount {
                department,
                patient_count,
            })
            .collect())
    }

    fn last_week(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..ACTIVITY_DAYS)
            .rev()
            .map(move |offset| self.today - Duration::days(offset))
    }
}

fn weekday(date: NaiveDate) -> String {
    date.format("%a").to_string()
}
