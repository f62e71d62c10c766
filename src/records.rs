/// Record mutation pipeline.
///
/// Validates and applies partial updates to user, medical-information,
/// insurance, and prescription records, tracking which fields changed so
/// the audit entry can name them. All writes go through the clinic
/// transaction wrapper, so a failure partway through a multi-step
/// creation leaves no partial rows behind.

use chrono::Local;
use tracing::{debug, info};

use crate::access;
use crate::audit;
use crate::error::{ClinicError, ClinicResult};
use crate::forms::FormFields;
use crate::models::{
    Insurance, MedicalInformation, Person, PersonId, Prescription, PrescriptionId, Role,
};
use crate::sanitize;
use crate::store::{Clinic, Store};

const CORE_FIELDS: [&str; 7] = [
    "first_name",
    "last_name",
    "email",
    "phone",
    "birth_year",
    "birth_month",
    "birth_day",
];

fn require_core_fields(fields: &FormFields) -> ClinicResult<()> {
    if CORE_FIELDS.iter().any(|key| !fields.contains(key)) {
        return Err(ClinicError::validation("All fields are required."));
    }
    Ok(())
}

/// Apply a signup or profile form. With `existing` unset this creates a
/// person (self-service signup when `actor` is unset, admin-driven
/// creation otherwise); with `existing` set it edits that person's
/// profile, gated by the access resolver.
pub fn apply_person_form(
    clinic: &Clinic,
    actor: Option<PersonId>,
    fields: &FormFields,
    existing: Option<PersonId>,
) -> ClinicResult<Person> {
    clinic.transact(|store| match existing {
        None => create_person(store, actor, fields),
        Some(target) => update_person(store, actor, fields, target),
    })
}

fn create_person(
    store: &mut Store,
    actor: Option<PersonId>,
    fields: &FormFields,
) -> ClinicResult<Person> {
    let creator = match actor {
        Some(id) => Some(store.person(id).cloned().ok_or(ClinicError::NotFound)?),
        None => None,
    };
    // Self-service signup is open; creating someone else's account is an
    // administrator action.
    if let Some(creator) = &creator {
        if !creator.is_admin() {
            return Err(ClinicError::Denied);
        }
    }

    require_core_fields(fields)?;

    let email = fields
        .get("email")
        .unwrap_or_default()
        .to_lowercase();
    if !sanitize::email_is_valid(&email) {
        return Err(ClinicError::validation("Invalid email."));
    }
    if store.person_by_email(&email).is_some() {
        return Err(ClinicError::conflict(
            "A user with that email already exists.",
        ));
    }

    let date_of_birth = fields
        .get_date_parts("birth_year", "birth_month", "birth_day")
        .ok_or_else(|| ClinicError::validation("Invalid date of birth."))?;

    let role = match (creator.as_ref(), fields.get("role")) {
        (Some(c), Some(value)) if c.is_admin() => Role::from_string(value)?,
        _ => Role::Patient,
    };

    let hospital = match fields.get_uuid("hospital") {
        Some(id) => {
            store.hospital(id).ok_or(ClinicError::NotFound)?;
            Some(id)
        }
        None => None,
    };

    let mut person = Person::new(
        fields.get("first_name").unwrap_or_default().to_string(),
        fields.get("last_name").unwrap_or_default().to_string(),
        email,
        fields.get("phone").unwrap_or_default().to_string(),
        date_of_birth,
        role,
        hospital,
    )?;

    // Insurance offered at signup lands inside a freshly built medical
    // information record. If anything after this point fails, the
    // transaction throws the whole creation away, insurance included.
    if role == Role::Patient {
        if let (Some(policy), Some(company)) =
            (fields.get("policy_number"), fields.get("insurance_company"))
        {
            let insurance = Insurance::new(policy.to_string(), company.to_string())?;
            person.medical_information =
                Some(MedicalInformation::builder().insurance(insurance).build());
        }
    }

    let audit_actor = creator.as_ref().map(|c| c.id).unwrap_or(person.id);
    store.add_person(person.clone());
    audit::record(
        store,
        audit_actor,
        format!("Created user {}", person.email),
        Local::now(),
    );
    info!(email = %person.email, role = person.role.name(), "user created");
    Ok(person)
}

fn update_person(
    store: &mut Store,
    actor: Option<PersonId>,
    fields: &FormFields,
    target: PersonId,
) -> ClinicResult<Person> {
    let actor = store
        .person(actor.ok_or(ClinicError::Denied)?)
        .cloned()
        .ok_or(ClinicError::NotFound)?;
    let prior = store.person(target).cloned().ok_or(ClinicError::NotFound)?;
    if !access::can_edit(&actor, &prior) {
        return Err(ClinicError::Denied);
    }

    require_core_fields(fields)?;

    let email = fields
        .get("email")
        .unwrap_or_default()
        .to_lowercase();
    if !sanitize::email_is_valid(&email) {
        return Err(ClinicError::validation("Invalid email."));
    }
    if let Some(holder) = store.person_by_email(&email) {
        if holder.id != target {
            return Err(ClinicError::conflict(
                "A user with that email already exists.",
            ));
        }
    }

    let date_of_birth = fields
        .get_date_parts("birth_year", "birth_month", "birth_day")
        .ok_or_else(|| ClinicError::validation("Invalid date of birth."))?;
    let phone = sanitize::sanitize_phone(fields.get("phone").unwrap_or_default())
        .ok_or_else(|| ClinicError::validation("All fields are required."))?;

    let mut updated = prior.clone();
    let mut changed = Vec::new();

    let first_name = fields.get("first_name").unwrap_or_default().to_string();
    if updated.first_name != first_name {
        updated.first_name = first_name;
        changed.push("first_name");
    }
    let last_name = fields.get("last_name").unwrap_or_default().to_string();
    if updated.last_name != last_name {
        updated.last_name = last_name;
        changed.push("last_name");
    }
    if updated.email != email {
        updated.email = email;
        changed.push("email");
    }
    if updated.phone != phone {
        updated.phone = phone;
        changed.push("phone");
    }
    if updated.date_of_birth != date_of_birth {
        updated.date_of_birth = date_of_birth;
        changed.push("date_of_birth");
    }

    // A facility change is one reassignment; the rosters are derived, so
    // the person leaves the old one the instant this commits.
    if let Some(hospital) = fields.get_uuid("hospital") {
        store.hospital(hospital).ok_or(ClinicError::NotFound)?;
        if updated.hospital != Some(hospital) {
            updated.hospital = Some(hospital);
            changed.push("hospital");
        }
    }

    // Role membership is exclusive by construction: the enum can only
    // hold one value, so assigning the new role is the whole dance.
    if let Some(value) = fields.get("role") {
        if actor.is_admin() {
            let role = Role::from_string(value)?;
            if updated.role != role {
                updated.role = role;
                changed.push("role");
            }
        }
    }

    store.add_person(updated.clone());
    let action = if changed.is_empty() {
        format!("Updated user {} (changed fields)", updated.email)
    } else {
        format!("Updated user {} ({})", updated.email, changed.join(", "))
    };
    audit::record(store, actor.id, action, Local::now());
    info!(email = %updated.email, "user updated");
    Ok(updated)
}

/// Edit a patient's medical information, creating the record on first
/// edit. Only fields present in the form are touched.
pub fn update_medical_information(
    clinic: &Clinic,
    actor: PersonId,
    patient: PersonId,
    fields: &FormFields,
) -> ClinicResult<Person> {
    clinic.transact(|store| {
        let actor = store.person(actor).cloned().ok_or(ClinicError::NotFound)?;
        let mut target = store.person(patient).cloned().ok_or(ClinicError::NotFound)?;
        if !access::can_edit(&actor, &target) {
            return Err(ClinicError::Denied);
        }
        if !target.is_patient() {
            return Err(ClinicError::validation(
                "Only patients have medical information.",
            ));
        }

        let mut info = target.medical_information.take().unwrap_or_default();
        let mut changed = Vec::new();

        let text_fields: [(&str, &mut Option<String>); 6] = [
            ("sex", &mut info.sex),
            ("medications", &mut info.medications),
            ("allergies", &mut info.allergies),
            ("medical_conditions", &mut info.medical_conditions),
            ("family_history", &mut info.family_history),
            ("additional_info", &mut info.additional_info),
        ];
        for (key, slot) in text_fields {
            if let Some(value) = fields.get(key) {
                if slot.as_deref() != Some(value) {
                    *slot = Some(value.to_string());
                    changed.push(key);
                }
            }
        }

        if let (Some(policy), Some(company)) =
            (fields.get("policy_number"), fields.get("insurance_company"))
        {
            let insurance = Insurance::new(policy.to_string(), company.to_string())?;
            if info.insurance.as_ref() != Some(&insurance) {
                info.insurance = Some(insurance);
                changed.push("insurance");
            }
        }

        target.medical_information = Some(info);
        store.add_person(target.clone());

        let action = if changed.is_empty() {
            format!("Updated medical information for {} (changed fields)", target.email)
        } else {
            format!(
                "Updated medical information for {} ({})",
                target.email,
                changed.join(", ")
            )
        };
        audit::record(store, actor.id, action, Local::now());
        debug!(patient = %target.email, "medical information updated");
        Ok(target)
    })
}

/// Create a prescription. Only admins and doctors may prescribe.
pub fn add_prescription(
    clinic: &Clinic,
    actor: PersonId,
    fields: &FormFields,
) -> ClinicResult<Prescription> {
    clinic.transact(|store| {
        let actor = store.person(actor).cloned().ok_or(ClinicError::NotFound)?;
        if !access::can_add_prescription(&actor) {
            return Err(ClinicError::Denied);
        }

        let patient_id = fields
            .get_uuid("patient")
            .ok_or_else(|| ClinicError::validation("All fields are required."))?;
        let patient = store
            .person(patient_id)
            .cloned()
            .ok_or(ClinicError::NotFound)?;

        let name = fields
            .get("name")
            .ok_or_else(|| ClinicError::validation("All fields are required."))?;
        let directions = fields
            .get("directions")
            .ok_or_else(|| ClinicError::validation("All fields are required."))?;
        let unit = fields.get("unit").unwrap_or("mg");
        let dosage = fields
            .get_f64("dosage")
            .ok_or_else(|| ClinicError::validation("Invalid dosage."))?;

        let prescription = Prescription::new(
            patient_id,
            name.to_string(),
            dosage,
            unit.to_string(),
            directions.to_string(),
        )?;
        store.upsert_prescription(prescription.clone());
        audit::record(
            store,
            actor.id,
            format!(
                "Added prescription {} for {}",
                prescription.name,
                patient.full_name()
            ),
            Local::now(),
        );
        info!(drug = %prescription.name, patient = %patient.email, "prescription added");
        Ok(prescription)
    })
}

/// Edit an existing prescription, auditing the fields that changed.
pub fn update_prescription(
    clinic: &Clinic,
    actor: PersonId,
    id: PrescriptionId,
    fields: &FormFields,
) -> ClinicResult<Prescription> {
    clinic.transact(|store| {
        let actor = store.person(actor).cloned().ok_or(ClinicError::NotFound)?;
        if !access::can_add_prescription(&actor) {
            return Err(ClinicError::Denied);
        }
        let prior = store.prescription(id).cloned().ok_or(ClinicError::NotFound)?;

        let mut updated = prior.clone();
        let mut changed = Vec::new();

        if let Some(name) = fields.get("name") {
            if updated.name != name {
                updated.name = name.to_string();
                changed.push("name");
            }
        }
        if fields.contains("dosage") {
            let dosage = fields
                .get_f64("dosage")
                .filter(|d| *d > 0.0)
                .ok_or_else(|| ClinicError::validation("Invalid dosage."))?;
            if updated.dosage != dosage {
                updated.dosage = dosage;
                changed.push("dosage");
            }
        }
        if let Some(unit) = fields.get("unit") {
            if updated.unit != unit {
                updated.unit = unit.to_string();
                changed.push("unit");
            }
        }
        if let Some(directions) = fields.get("directions") {
            if updated.directions != directions {
                updated.directions = directions.to_string();
                changed.push("directions");
            }
        }

        store.upsert_prescription(updated.clone());
        let action = if changed.is_empty() {
            format!("Updated prescription {} (changed fields)", updated.name)
        } else {
            format!("Updated prescription {} ({})", updated.name, changed.join(", "))
        };
        audit::record(store, actor.id, action, Local::now());
        Ok(updated)
    })
}

/// Delete a prescription, auditing a description of what was removed.
pub fn delete_prescription(
    clinic: &Clinic,
    actor: PersonId,
    id: PrescriptionId,
) -> ClinicResult<()> {
    clinic.transact(|store| {
        let actor = store.person(actor).cloned().ok_or(ClinicError::NotFound)?;
        if !access::can_add_prescription(&actor) {
            return Err(ClinicError::Denied);
        }
        let prescription = store
            .prescription(id)
            .cloned()
            .ok_or(ClinicError::NotFound)?;
        let patient_name = store
            .person(prescription.patient)
            .map(|p| p.full_name())
            .unwrap_or_else(|| "unknown patient".to_string());

        store.remove_prescription(id);
        audit::record(
            store,
            actor.id,
            format!(
                "Deleted prescription {} {}{} for {}",
                prescription.name, prescription.dosage, prescription.unit, patient_name
            ),
            Local::now(),
        );
        info!(drug = %prescription.name, "prescription deleted");
        Ok(())
    })
}
