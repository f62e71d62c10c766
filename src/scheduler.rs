/// Appointment management.
///
/// This module validates and persists appointment create, update, and
/// delete requests. Both participants are checked through the
/// availability module before anything is written, and every successful
/// mutation appends an audit entry in the same transaction.

use tracing::{debug, info, warn};

use crate::access;
use crate::audit;
use crate::availability;
use crate::error::{ClinicError, ClinicResult};
use crate::forms::FormFields;
use crate::models::{Appointment, AppointmentId, PersonId};
use crate::store::Clinic;
use chrono::Local;

/// Bounds applied to incoming appointment requests. A missing duration
/// field falls back to the default visit length.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRules {
    pub min_duration_seconds: i64,
    pub max_duration_seconds: i64,
    pub default_duration_seconds: i64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        ValidationRules {
            min_duration_seconds: 60,
            max_duration_seconds: 8 * 60 * 60,
            default_duration_seconds: 30 * 60,
        }
    }
}

/// Validate form fields and create a new appointment, or update
/// `existing` in place. Expected fields: "date" (YYYY-MM-DD), "time"
/// (HH:MM), optional "duration" in seconds, and optional "doctor" /
/// "patient" ids — a missing side defaults to the actor, which is what
/// makes self-service booking work.
///
/// On update the prior appointment is excluded from the availability
/// check so a time can be moved without conflicting with itself; if
/// either participant turns out to be busy the transaction rolls back
/// and the prior record is untouched.
pub fn create_or_update(
    clinic: &Clinic,
    actor: PersonId,
    fields: &FormFields,
    existing: Option<AppointmentId>,
) -> ClinicResult<Appointment> {
    let rules = *clinic.rules();
    clinic.transact(|store| {
        let actor = store
            .person(actor)
            .cloned()
            .ok_or(ClinicError::NotFound)?;

        let start = fields
            .get_datetime("date", "time")
            .ok_or_else(|| ClinicError::validation("Invalid date or time."))?;

        let duration_seconds = match fields.get("duration") {
            None => rules.default_duration_seconds,
            Some(_) => fields
                .get_i64("duration")
                .filter(|d| *d > 0)
                .ok_or_else(|| ClinicError::validation("Invalid duration."))?,
        };
        if duration_seconds < rules.min_duration_seconds
            || duration_seconds > rules.max_duration_seconds
        {
            return Err(ClinicError::validation(format!(
                "Appointment duration must be between {} and {} seconds",
                rules.min_duration_seconds, rules.max_duration_seconds
            )));
        }

        let doctor_id = fields.get_uuid("doctor").unwrap_or(actor.id);
        let patient_id = fields.get_uuid("patient").unwrap_or(actor.id);
        if doctor_id == patient_id {
            return Err(ClinicError::validation(
                "Patient and doctor cannot be the same person.",
            ));
        }

        let doctor = store
            .person(doctor_id)
            .cloned()
            .ok_or(ClinicError::NotFound)?;
        if !doctor.is_doctor() {
            return Err(ClinicError::validation(
                "The selected doctor is not a doctor.",
            ));
        }
        let patient = store
            .person(patient_id)
            .cloned()
            .ok_or(ClinicError::NotFound)?;

        if !access::can_schedule(&actor, patient_id, doctor_id) {
            return Err(ClinicError::Denied);
        }

        debug!(
            doctor = %doctor.email,
            patient = %patient.email,
            %start,
            duration_seconds,
            "checking availability"
        );

        if !availability::is_free_excluding(store, &doctor, start, duration_seconds, existing) {
            warn!(doctor = %doctor.email, %start, "doctor not free");
            return Err(ClinicError::conflict(
                "The doctor is not free at that time.",
            ));
        }
        if !availability::is_free_excluding(store, &patient, start, duration_seconds, existing) {
            warn!(patient = %patient.email, %start, "patient not free");
            return Err(ClinicError::conflict(
                "The patient is not free at that time.",
            ));
        }

        let appointment = match existing {
            None => {
                let appointment =
                    Appointment::new(patient_id, doctor_id, start, duration_seconds)?;
                store.upsert_appointment(appointment.clone());
                audit::record(
                    store,
                    actor.id,
                    "Created appointment (patient, doctor, date, duration)",
                    Local::now(),
                );
                info!(id = %appointment.id, "appointment created");
                appointment
            }
            Some(id) => {
                let prior = store
                    .appointment(id)
                    .cloned()
                    .ok_or(ClinicError::NotFound)?;

                let mut changed = Vec::new();
                if prior.patient != patient_id {
                    changed.push("patient");
                }
                if prior.doctor != doctor_id {
                    changed.push("doctor");
                }
                if prior.start != start {
                    changed.push("date");
                }
                if prior.duration_seconds != duration_seconds {
                    changed.push("duration");
                }

                let updated = Appointment {
                    id,
                    patient: patient_id,
                    doctor: doctor_id,
                    start,
                    duration_seconds,
                };
                store.upsert_appointment(updated.clone());

                let action = if changed.is_empty() {
                    "Updated appointment (no fields changed)".to_string()
                } else {
                    format!("Updated appointment ({})", changed.join(", "))
                };
                audit::record(store, actor.id, action, Local::now());
                info!(id = %updated.id, "appointment updated");
                updated
            }
        };

        Ok(appointment)
    })
}

/// Remove an appointment by id, recording a human-readable description
/// of what was deleted.
pub fn delete_appointment(
    clinic: &Clinic,
    actor: PersonId,
    id: AppointmentId,
) -> ClinicResult<()> {
    clinic.transact(|store| {
        let actor = store
            .person(actor)
            .cloned()
            .ok_or(ClinicError::NotFound)?;
        let appointment = store
            .appointment(id)
            .cloned()
            .ok_or(ClinicError::NotFound)?;

        if !access::can_schedule(&actor, appointment.patient, appointment.doctor) {
            return Err(ClinicError::Denied);
        }

        let patient_name = store
            .person(appointment.patient)
            .map(|p| p.full_name())
            .unwrap_or_else(|| "unknown patient".to_string());
        let doctor_name = store
            .person(appointment.doctor)
            .map(|p| p.full_name())
            .unwrap_or_else(|| "unknown doctor".to_string());

        store.remove_appointment(id);
        audit::record(
            store,
            actor.id,
            format!(
                "Deleted appointment for {} with {} on {}",
                patient_name,
                doctor_name,
                appointment.start.format("%Y-%m-%d %H:%M")
            ),
            Local::now(),
        );
        info!(%id, "appointment deleted");
        Ok(())
    })
}
