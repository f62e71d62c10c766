/// Availability checking.
///
/// Decides whether a person is free for a proposed window by scanning
/// their commitment set. Read-only; nothing in here mutates the store.

use chrono::{DateTime, Duration, Local};

use crate::models::{Appointment, AppointmentId, Person};
use crate::store::Store;

/// A person's commitments, ordered by start time. Doctors are committed
/// to the appointments they hold as the doctor, admins to everything,
/// everyone else to the appointments where they are the patient.
pub fn schedule<'a>(store: &'a Store, person: &Person) -> Vec<&'a Appointment> {
    if person.is_doctor() {
        store.appointments_for_doctor(person.id)
    } else if person.is_admin() {
        store.all_appointments()
    } else {
        store.appointments_for_patient(person.id)
    }
}

/// Upcoming commitments at `now`, soonest first.
pub fn upcoming(store: &Store, person: &Person, now: DateTime<Local>) -> Vec<Appointment> {
    schedule(store, person)
        .into_iter()
        .filter(|a| a.start >= now)
        .cloned()
        .collect()
}

/// Past commitments at `now`, most recent first.
pub fn past(store: &Store, person: &Person, now: DateTime<Local>) -> Vec<Appointment> {
    let mut earlier: Vec<Appointment> = schedule(store, person)
        .into_iter()
        .filter(|a| a.start < now)
        .cloned()
        .collect();
    earlier.reverse();
    earlier
}

/// Inclusive-boundary interval test: the windows conflict when either
/// start falls within the closed range of the other interval. This means
/// back-to-back appointments that share an exact boundary instant are
/// treated as conflicting.
fn overlaps(
    proposed_start: DateTime<Local>,
    proposed_end: DateTime<Local>,
    existing: &Appointment,
) -> bool {
    (proposed_start <= existing.start && existing.start <= proposed_end)
        || (existing.start <= proposed_start && proposed_start <= existing.end())
}

/// Whether the person is free for the proposed window. A zero duration
/// still blocks an identical start; no commitments means always free.
pub fn is_free(
    store: &Store,
    person: &Person,
    proposed_start: DateTime<Local>,
    duration_seconds: i64,
) -> bool {
    is_free_excluding(store, person, proposed_start, duration_seconds, None)
}

/// `is_free`, ignoring one appointment id. An update provisionally
/// removes the prior appointment from consideration so a time can be
/// moved without conflicting with itself.
pub fn is_free_excluding(
    store: &Store,
    person: &Person,
    proposed_start: DateTime<Local>,
    duration_seconds: i64,
    excluding: Option<AppointmentId>,
) -> bool {
    let proposed_end = proposed_start + Duration::seconds(duration_seconds);
    schedule(store, person)
        .into_iter()
        .filter(|a| Some(a.id) != excluding)
        .all(|a| !overlaps(proposed_start, proposed_end, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, Role};
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 9, 14, hour, minute, 0)
            .single()
            .unwrap()
    }

    fn doctor() -> Person {
        Person::new(
            "Perry".to_string(),
            "Cox".to_string(),
            "drcox@sacredheart.org".to_string(),
            "18005553333".to_string(),
            NaiveDate::from_ymd_opt(1980, 6, 7).unwrap(),
            Role::Doctor,
            None,
        )
        .unwrap()
    }

    fn store_with(doctor: &Person, appointments: &[(DateTime<Local>, i64)]) -> Store {
        let mut store = Store::new();
        store.add_person(doctor.clone());
        for &(start, duration) in appointments {
            store.upsert_appointment(
                Appointment::new(Uuid::new_v4(), doctor.id, start, duration).unwrap(),
            );
        }
        store
    }

    #[test]
    fn test_no_commitments_is_always_free() {
        let doc = doctor();
        let store = store_with(&doc, &[]);
        assert!(is_free(&store, &doc, at(9, 0), 1800));
    }

    #[test]
    fn test_identical_window_is_not_free() {
        let doc = doctor();
        let store = store_with(&doc, &[(at(9, 0), 1800)]);
        assert!(!is_free(&store, &doc, at(9, 0), 1800));
    }

    #[test]
    fn test_back_to_back_boundary_conflicts() {
        // Existing 09:00-09:30; proposing 09:30 for any duration is not
        // free under the inclusive-boundary rule.
        let doc = doctor();
        let store = store_with(&doc, &[(at(9, 0), 1800)]);
        assert!(!is_free(&store, &doc, at(9, 30), 1800));
        assert!(!is_free(&store, &doc, at(9, 30), 0));
        // A window ending exactly at 09:00 conflicts too.
        assert!(!is_free(&store, &doc, at(8, 30), 1800));
    }

    #[test]
    fn test_strictly_between_neighbours_is_free() {
        let doc = doctor();
        let store = store_with(&doc, &[(at(9, 0), 1800), (at(11, 0), 1800)]);
        // Strictly after the first appointment's end and strictly before
        // the next start.
        assert!(is_free(&store, &doc, at(9, 31), 1740));
        assert!(!is_free(&store, &doc, at(9, 15), 1800));
    }

    #[test]
    fn test_zero_duration_blocks_identical_start() {
        let doc = doctor();
        let store = store_with(&doc, &[(at(10, 0), 0)]);
        assert!(!is_free(&store, &doc, at(10, 0), 1800));
    }

    #[test]
    fn test_excluding_own_appointment_allows_move() {
        let doc = doctor();
        let mut store = Store::new();
        store.add_person(doc.clone());
        let appointment = Appointment::new(Uuid::new_v4(), doc.id, at(9, 0), 1800).unwrap();
        let id = appointment.id;
        store.upsert_appointment(appointment);

        assert!(!is_free(&store, &doc, at(9, 0), 1800));
        assert!(is_free_excluding(&store, &doc, at(9, 0), 1800, Some(id)));
    }

    #[test]
    fn test_upcoming_ascending_past_descending() {
        let doc = doctor();
        let store = store_with(
            &doc,
            &[(at(9, 0), 1800), (at(11, 0), 1800), (at(14, 0), 1800)],
        );
        let now = at(10, 0);

        let upcoming = upcoming(&store, &doc, now);
        assert_eq!(upcoming.len(), 2);
        assert!(upcoming[0].start < upcoming[1].start);

        let past = past(&store, &doc, now);
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].start, at(9, 0));
    }
}
