/// Data models for the clinic core.
///
/// This module defines the entities shared by every pipeline:
/// - Hospital: a facility people are affiliated with
/// - Role: the exclusive role held by each person
/// - Person: any user of the system, patient through administrator
/// - MedicalInformation / Insurance: patient-owned sub-records
/// - Appointment: a scheduled window between a patient and a doctor
/// - Prescription: a drug order for a patient
/// - MessageGroup / Message: membership-gated conversations
/// - LogEntry: one immutable audit record

use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClinicError, ClinicResult};
use crate::sanitize;

pub type HospitalId = Uuid;
pub type PersonId = Uuid;
pub type AppointmentId = Uuid;
pub type PrescriptionId = Uuid;
pub type GroupId = Uuid;

/// The single role a person holds.
///
/// Role membership is exclusive: assigning a new role replaces the old
/// one, so a person can never sit in two roles at once. `Admin` is the
/// superuser role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Patient,
    Doctor,
    Nurse,
    Admin,
}

impl Role {
    /// Convert a form value to a Role.
    pub fn from_string(value: &str) -> ClinicResult<Self> {
        match value.to_lowercase().trim() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "admin" | "administrator" => Ok(Role::Admin),
            _ => Err(ClinicError::validation(format!(
                "Invalid role: '{}'. Must be one of: patient, doctor, nurse, admin",
                value
            ))),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::Admin => "Administrator",
        }
    }
}

/// A hospital or clinic facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

impl Hospital {
    pub fn new(
        name: String,
        address: String,
        city: String,
        state: String,
        zipcode: String,
    ) -> ClinicResult<Self> {
        if name.is_empty() {
            return Err(ClinicError::validation("Hospital name cannot be empty"));
        }
        Ok(Hospital {
            id: Uuid::new_v4(),
            name,
            address,
            city,
            state,
            zipcode,
        })
    }
}

impl std::fmt::Display for Hospital {
    // "St. Jude Hospital at 1 Hospital Road, Waterbury, CT 06470"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}, {}, {} {}",
            self.name, self.address, self.city, self.state, self.zipcode
        )
    }
}

/// An insurance policy. At most one per patient, owned by the patient's
/// medical information record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurance {
    pub policy_number: String,
    pub company: String,
}

impl Insurance {
    pub fn new(policy_number: String, company: String) -> ClinicResult<Self> {
        if policy_number.is_empty() || company.is_empty() {
            return Err(ClinicError::validation(
                "Insurance policy number and company cannot be empty",
            ));
        }
        Ok(Insurance {
            policy_number,
            company,
        })
    }
}

/// A patient's medical details, created lazily the first time any of its
/// fields is edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalInformation {
    pub sex: Option<String>,
    pub medications: Option<String>,
    pub allergies: Option<String>,
    pub medical_conditions: Option<String>,
    pub family_history: Option<String>,
    pub additional_info: Option<String>,
    pub insurance: Option<Insurance>,
}

impl MedicalInformation {
    pub fn builder() -> MedicalInformationBuilder {
        MedicalInformationBuilder::default()
    }
}

/// Builder for medical information so a record is never half-initialised:
/// either every provided field lands, or nothing is created.
#[derive(Debug, Default)]
pub struct MedicalInformationBuilder {
    record: MedicalInformation,
}

impl MedicalInformationBuilder {
    pub fn sex(mut self, value: impl Into<String>) -> Self {
        self.record.sex = Some(value.into());
        self
    }

    pub fn medications(mut self, value: impl Into<String>) -> Self {
        self.record.medications = Some(value.into());
        self
    }

    pub fn allergies(mut self, value: impl Into<String>) -> Self {
        self.record.allergies = Some(value.into());
        self
    }

    pub fn medical_conditions(mut self, value: impl Into<String>) -> Self {
        self.record.medical_conditions = Some(value.into());
        self
    }

    pub fn family_history(mut self, value: impl Into<String>) -> Self {
        self.record.family_history = Some(value.into());
        self
    }

    pub fn additional_info(mut self, value: impl Into<String>) -> Self {
        self.record.additional_info = Some(value.into());
        self
    }

    pub fn insurance(mut self, value: Insurance) -> Self {
        self.record.insurance = Some(value);
        self
    }

    pub fn build(self) -> MedicalInformation {
        self.record
    }
}

/// Any user of the system: patient, doctor, nurse, or administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    /// Always stored lowercased; uniqueness is case-insensitive.
    pub email: String,
    /// Digits only, via the sanitizer.
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub role: Role,
    pub hospital: Option<HospitalId>,
    pub medical_information: Option<MedicalInformation>,
}

impl Person {
    /// Create a new person with validation. The email is lowercased and
    /// syntax-checked, the phone stripped to digits.
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        phone: String,
        date_of_birth: NaiveDate,
        role: Role,
        hospital: Option<HospitalId>,
    ) -> ClinicResult<Self> {
        if first_name.is_empty() || last_name.is_empty() {
            return Err(ClinicError::validation("Name cannot be empty"));
        }
        let email = email.to_lowercase();
        if !sanitize::email_is_valid(&email) {
            return Err(ClinicError::validation("Invalid email."));
        }
        let phone = sanitize::sanitize_phone(&phone)
            .ok_or_else(|| ClinicError::validation("Phone number cannot be empty"))?;

        Ok(Person {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            phone,
            date_of_birth,
            role,
            hospital,
            medical_information: None,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }

    pub fn is_nurse(&self) -> bool {
        self.role == Role::Nurse
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A scheduled window between one patient and one doctor.
///
/// Durations are whole seconds. A zero duration is permitted at the model
/// level and still blocks an identical start instant; the appointment
/// manager requires a positive duration on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient: PersonId,
    pub doctor: PersonId,
    pub start: DateTime<Local>,
    pub duration_seconds: i64,
}

impl Appointment {
    pub fn new(
        patient: PersonId,
        doctor: PersonId,
        start: DateTime<Local>,
        duration_seconds: i64,
    ) -> ClinicResult<Self> {
        if duration_seconds < 0 {
            return Err(ClinicError::validation("Duration cannot be negative"));
        }
        Ok(Appointment {
            id: Uuid::new_v4(),
            patient,
            doctor,
            start,
            duration_seconds,
        })
    }

    pub fn end(&self) -> DateTime<Local> {
        self.start + Duration::seconds(self.duration_seconds)
    }
}

/// A drug order for a patient. No overlap constraints; mutable only by
/// roles that can prescribe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub patient: PersonId,
    pub name: String,
    pub dosage: f64,
    pub unit: String,
    pub directions: String,
}

impl Prescription {
    pub fn new(
        patient: PersonId,
        name: String,
        dosage: f64,
        unit: String,
        directions: String,
    ) -> ClinicResult<Self> {
        if name.is_empty() {
            return Err(ClinicError::validation("Drug name cannot be empty"));
        }
        if dosage <= 0.0 {
            return Err(ClinicError::validation("Dosage must be positive"));
        }
        if directions.is_empty() {
            return Err(ClinicError::validation("Directions cannot be empty"));
        }
        Ok(Prescription {
            id: Uuid::new_v4(),
            patient,
            name,
            dosage,
            unit,
            directions,
        })
    }
}

/// One message inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: PersonId,
    pub body: String,
    pub date: DateTime<Local>,
}

/// A named conversation whose membership gates both reading and posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageGroup {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<PersonId>,
    pub messages: Vec<Message>,
}

impl MessageGroup {
    pub fn new(name: String, members: Vec<PersonId>) -> ClinicResult<Self> {
        if name.is_empty() {
            return Err(ClinicError::validation("Group name cannot be empty"));
        }
        if members.is_empty() {
            return Err(ClinicError::validation(
                "Group must have at least one member",
            ));
        }
        Ok(MessageGroup {
            id: Uuid::new_v4(),
            name,
            members,
            messages: Vec::new(),
        })
    }

    pub fn has_member(&self, person: PersonId) -> bool {
        self.members.contains(&person)
    }
}

/// One immutable audit record: who did what, when. Created once, never
/// updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub user: PersonId,
    pub action: String,
    pub date: DateTime<Local>,
}
