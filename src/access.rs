/// Access-control resolver.
///
/// Every permission question the pipelines ask is answered here, as a
/// pure function of role and relationship state, so handlers never
/// re-derive role booleans inline. Precedence is fixed: admin, then
/// doctor, then nurse, then everyone else.

use crate::models::{Person, PersonId};
use crate::store::Store;

/// The patients an actor may see. Admins and doctors see every patient;
/// nurses see everyone affiliated with their own facility; anyone else
/// sees only themself.
pub fn visible_patients(store: &Store, actor: &Person) -> Vec<Person> {
    if actor.is_admin() || actor.is_doctor() {
        store.patients().into_iter().cloned().collect()
    } else if actor.is_nurse() {
        match actor.hospital {
            Some(hospital) => store.members_of(hospital).into_iter().cloned().collect(),
            None => vec![actor.clone()],
        }
    } else {
        vec![actor.clone()]
    }
}

/// Whether the actor may edit the target's profile: themself, or an
/// admin. Plain doctors and nurses cannot edit arbitrary profiles.
pub fn can_edit(actor: &Person, target: &Person) -> bool {
    actor.id == target.id || actor.is_admin()
}

pub fn can_add_prescription(actor: &Person) -> bool {
    actor.is_admin() || actor.is_doctor()
}

pub fn can_view_logs(actor: &Person) -> bool {
    actor.is_admin()
}

/// Whether the actor may create or change an appointment between this
/// patient and doctor: a participant, or an admin.
pub fn can_schedule(actor: &Person, patient: PersonId, doctor: PersonId) -> bool {
    actor.is_admin() || actor.id == patient || actor.id == doctor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Hospital, Role};
    use chrono::NaiveDate;

    fn person(email: &str, role: Role) -> Person {
        Person::new(
            "Test".to_string(),
            email.split('@').next().unwrap_or("x").to_string(),
            email.to_string(),
            "5551234567".to_string(),
            NaiveDate::from_ymd_opt(1985, 2, 2).unwrap(),
            role,
            None,
        )
        .unwrap()
    }

    fn seeded() -> (Store, Person, Person, Person, Person) {
        let mut store = Store::new();
        let hospital = Hospital::new(
            "Sacred Heart".to_string(),
            "1 Hospital Rd".to_string(),
            "San DiFrangeles".to_string(),
            "CA".to_string(),
            "90001".to_string(),
        )
        .unwrap();
        let admin = person("admin@sacredheart.org", Role::Admin);
        let doctor = person("jd@sacredheart.org", Role::Doctor);
        let mut nurse = person("carla@sacredheart.org", Role::Nurse);
        nurse.hospital = Some(hospital.id);
        let mut patient = person("duwayne@theroc-johnson.com", Role::Patient);
        patient.hospital = Some(hospital.id);

        store.add_hospital(hospital);
        for p in [&admin, &doctor, &nurse, &patient] {
            store.add_person(p.clone());
        }
        (store, admin, doctor, nurse, patient)
    }

    #[test]
    fn test_admin_and_doctor_see_all_patients() {
        let (store, admin, doctor, _, patient) = seeded();
        let for_admin = visible_patients(&store, &admin);
        let for_doctor = visible_patients(&store, &doctor);
        assert_eq!(for_admin.len(), 1);
        assert_eq!(for_admin[0].id, patient.id);
        assert_eq!(for_doctor.len(), 1);
    }

    #[test]
    fn test_nurse_sees_own_facility() {
        let (store, _, _, nurse, patient) = seeded();
        let visible = visible_patients(&store, &nurse);
        let ids: Vec<_> = visible.iter().map(|p| p.id).collect();
        assert!(ids.contains(&patient.id));
        assert!(ids.contains(&nurse.id));
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_patient_sees_only_themself() {
        let (store, _, _, _, patient) = seeded();
        let visible = visible_patients(&store, &patient);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, patient.id);
    }

    #[test]
    fn test_can_edit() {
        let (_, admin, doctor, nurse, patient) = seeded();
        assert!(can_edit(&patient, &patient));
        assert!(can_edit(&admin, &patient));
        assert!(!can_edit(&doctor, &patient));
        assert!(!can_edit(&nurse, &patient));
    }

    #[test]
    fn test_can_add_prescription() {
        let (_, admin, doctor, nurse, patient) = seeded();
        assert!(can_add_prescription(&admin));
        assert!(can_add_prescription(&doctor));
        assert!(!can_add_prescription(&nurse));
        assert!(!can_add_prescription(&patient));
    }

    #[test]
    fn test_log_visibility_is_admin_only() {
        let (_, admin, doctor, _, _) = seeded();
        assert!(can_view_logs(&admin));
        assert!(!can_view_logs(&doctor));
    }
}
