/// Persistence layer for the clinic core.
///
/// This module provides the Store struct, an in-memory relational table
/// set with filter-by-field queries, and the Clinic facade whose
/// transaction wrapper is the only way mutations reach the store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::ClinicResult;
use crate::models::{
    Appointment, AppointmentId, GroupId, Hospital, HospitalId, LogEntry, MessageGroup, Person,
    PersonId, Prescription, PrescriptionId,
};
use crate::scheduler::ValidationRules;

/// Every table in the system, keyed by id. Cloning a Store clones the
/// whole snapshot, which is what the transaction wrapper relies on.
#[derive(Debug, Clone, Default)]
pub struct Store {
    hospitals: HashMap<HospitalId, Hospital>,
    persons: HashMap<PersonId, Person>,
    appointments: HashMap<AppointmentId, Appointment>,
    prescriptions: HashMap<PrescriptionId, Prescription>,
    groups: HashMap<GroupId, MessageGroup>,
    log: Vec<LogEntry>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    // --- hospitals ---

    pub fn add_hospital(&mut self, hospital: Hospital) {
        self.hospitals.insert(hospital.id, hospital);
    }

    pub fn hospital(&self, id: HospitalId) -> Option<&Hospital> {
        self.hospitals.get(&id)
    }

    pub fn hospitals(&self) -> Vec<&Hospital> {
        let mut all: Vec<&Hospital> = self.hospitals.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Everyone affiliated with a facility. The roster is derived by
    /// query, so reassigning a person's hospital can never leave them on
    /// two rosters.
    pub fn members_of(&self, hospital: HospitalId) -> Vec<&Person> {
        let mut members: Vec<&Person> = self
            .persons
            .values()
            .filter(|p| p.hospital == Some(hospital))
            .collect();
        members.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        members
    }

    // --- persons ---

    pub fn add_person(&mut self, person: Person) {
        self.persons.insert(person.id, person);
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(&id)
    }

    pub fn remove_person(&mut self, id: PersonId) -> Option<Person> {
        self.persons.remove(&id)
    }

    /// Case-insensitive email lookup. Emails are stored lowercased, so
    /// the argument is lowercased before comparing.
    pub fn person_by_email(&self, email: &str) -> Option<&Person> {
        let needle = email.to_lowercase();
        self.persons.values().find(|p| p.email == needle)
    }

    pub fn patients(&self) -> Vec<&Person> {
        let mut patients: Vec<&Person> =
            self.persons.values().filter(|p| p.is_patient()).collect();
        patients.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        patients
    }

    // --- appointments ---

    /// Insert or replace by id.
    pub fn upsert_appointment(&mut self, appointment: Appointment) {
        self.appointments.insert(appointment.id, appointment);
    }

    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.get(&id)
    }

    pub fn remove_appointment(&mut self, id: AppointmentId) -> Option<Appointment> {
        self.appointments.remove(&id)
    }

    pub fn all_appointments(&self) -> Vec<&Appointment> {
        let mut all: Vec<&Appointment> = self.appointments.values().collect();
        all.sort_by_key(|a| a.start);
        all
    }

    pub fn appointments_for_doctor(&self, doctor: PersonId) -> Vec<&Appointment> {
        let mut found: Vec<&Appointment> = self
            .appointments
            .values()
            .filter(|a| a.doctor == doctor)
            .collect();
        found.sort_by_key(|a| a.start);
        found
    }

    pub fn appointments_for_patient(&self, patient: PersonId) -> Vec<&Appointment> {
        let mut found: Vec<&Appointment> = self
            .appointments
            .values()
            .filter(|a| a.patient == patient)
            .collect();
        found.sort_by_key(|a| a.start);
        found
    }

    // --- prescriptions ---

    pub fn upsert_prescription(&mut self, prescription: Prescription) {
        self.prescriptions.insert(prescription.id, prescription);
    }

    pub fn prescription(&self, id: PrescriptionId) -> Option<&Prescription> {
        self.prescriptions.get(&id)
    }

    pub fn remove_prescription(&mut self, id: PrescriptionId) -> Option<Prescription> {
        self.prescriptions.remove(&id)
    }

    pub fn prescriptions_for(&self, patient: PersonId) -> Vec<&Prescription> {
        let mut found: Vec<&Prescription> = self
            .prescriptions
            .values()
            .filter(|p| p.patient == patient)
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    // --- message groups ---

    pub fn add_group(&mut self, group: MessageGroup) {
        self.groups.insert(group.id, group);
    }

    pub fn group(&self, id: GroupId) -> Option<&MessageGroup> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut MessageGroup> {
        self.groups.get_mut(&id)
    }

    pub fn groups_for(&self, person: PersonId) -> Vec<&MessageGroup> {
        let mut found: Vec<&MessageGroup> = self
            .groups
            .values()
            .filter(|g| g.has_member(person))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    // --- audit log ---

    /// Append-only. There is deliberately no update or remove for log
    /// entries.
    pub fn append_log(&mut self, entry: LogEntry) {
        self.log.push(entry);
    }

    pub fn log_entries(&self) -> &[LogEntry] {
        &self.log
    }
}

/// Shared handle to the clinic's data. One Clinic serves every request;
/// the mutex gives each request a consistent snapshot to work against,
/// and `transact` rolls the store back when an operation fails partway.
#[derive(Debug, Default)]
pub struct Clinic {
    store: Mutex<Store>,
    rules: ValidationRules,
}

impl Clinic {
    pub fn new() -> Self {
        Clinic::default()
    }

    pub fn with_rules(rules: ValidationRules) -> Self {
        Clinic {
            store: Mutex::new(Store::new()),
            rules,
        }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Run a read-only closure against the store.
    pub fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> T {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&store)
    }

    /// Run a mutation atomically: the closure sees a consistent snapshot,
    /// and if it returns an error every change it made is rolled back,
    /// audit appends included. Two racing bookings for the same window
    /// serialize here, so at most one can see the slot as free.
    pub fn transact<T>(&self, f: impl FnOnce(&mut Store) -> ClinicResult<T>) -> ClinicResult<T> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = store.clone();
        match f(&mut store) {
            Ok(value) => Ok(value),
            Err(err) => {
                *store = snapshot;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClinicError;
    use crate::models::Role;
    use chrono::NaiveDate;

    fn person(email: &str, role: Role) -> Person {
        Person::new(
            "Test".to_string(),
            "Person".to_string(),
            email.to_string(),
            "5551234567".to_string(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            role,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_email_lookup_is_case_insensitive() {
        let mut store = Store::new();
        store.add_person(person("jd@sacredheart.org", Role::Doctor));
        assert!(store.person_by_email("JD@SacredHeart.ORG").is_some());
        assert!(store.person_by_email("someone@else.org").is_none());
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let clinic = Clinic::new();
        let doctor = person("drcox@sacredheart.org", Role::Doctor);
        let doctor_id = doctor.id;

        let result: ClinicResult<()> = clinic.transact(|store| {
            store.add_person(doctor);
            Err(ClinicError::conflict("forced failure"))
        });

        assert!(result.is_err());
        assert!(clinic.read(|store| store.person(doctor_id).is_none()));
    }

    #[test]
    fn test_successful_transaction_commits() {
        let clinic = Clinic::new();
        let patient = person("duwayne@theroc-johnson.com", Role::Patient);
        let patient_id = patient.id;

        clinic
            .transact(|store| {
                store.add_person(patient);
                Ok(())
            })
            .unwrap();

        assert!(clinic.read(|store| store.person(patient_id).is_some()));
    }

    #[test]
    fn test_roster_is_derived_from_affiliation() {
        let mut store = Store::new();
        let hospital = Hospital::new(
            "RIT Health Center".to_string(),
            "1 Lomb Memorial Drive".to_string(),
            "Rochester".to_string(),
            "NY".to_string(),
            "14623".to_string(),
        )
        .unwrap();
        let other = Hospital::new(
            "Highland Hospital".to_string(),
            "1000 South Ave".to_string(),
            "Rochester".to_string(),
            "NY".to_string(),
            "14620".to_string(),
        )
        .unwrap();
        let mut nurse = person("carla@sacredheart.org", Role::Nurse);
        nurse.hospital = Some(hospital.id);
        let nurse_id = nurse.id;
        let (hospital_id, other_id) = (hospital.id, other.id);

        store.add_hospital(hospital);
        store.add_hospital(other);
        store.add_person(nurse);
        assert_eq!(store.members_of(hospital_id).len(), 1);

        // Reassignment moves the person; the old roster is empty without
        // any explicit removal step.
        let mut moved = store.person(nurse_id).cloned().unwrap();
        moved.hospital = Some(other_id);
        store.add_person(moved);
        assert!(store.members_of(hospital_id).is_empty());
        assert_eq!(store.members_of(other_id).len(), 1);
    }
}
