/// Command-line interface for the clinic management core.
///
/// This binary stands in for the web-delivery collaborator: it collects
/// form fields interactively, hands them to the core pipelines, and
/// prints whatever comes back. Every mutation flows through the same
/// Clinic facade a web front end would use.

use chrono::{Duration, Local};
use std::io::{self, Write};

use healthnet::models::{Person, PersonId, Role};
use healthnet::store::Clinic;
use healthnet::{access, audit, availability, messages, records, scheduler};
use healthnet::{ClinicError, FormFields, Hospital};

struct ClinicCli {
    clinic: Clinic,
    current: Option<PersonId>,
    running: bool,
}

impl ClinicCli {
    fn new() -> Self {
        ClinicCli {
            clinic: Clinic::new(),
            current: None,
            running: true,
        }
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("       HEALTHNET CLINIC MANAGEMENT");
        println!("{}", "=".repeat(60));
    }

    fn print_menu(&self) {
        let who = self
            .current
            .and_then(|id| self.clinic.read(|store| store.person(id).cloned()))
            .map(|p| format!("{} ({})", p.full_name(), p.role.name()))
            .unwrap_or_else(|| "not logged in".to_string());

        println!("\n--- Main Menu [{}] ---", who);
        println!("1. Seed demo clinic");
        println!("2. Log in");
        println!("3. Register as a new patient");
        println!("4. Book appointment");
        println!("5. Move appointment");
        println!("6. Cancel appointment");
        println!("7. View my schedule");
        println!("8. View my patients");
        println!("9. Edit medical information");
        println!("10. Prescriptions");
        println!("11. Messages");
        println!("12. Audit log");
        println!("13. Exit");
        println!("{}", "-".repeat(20));
    }

    fn get_input(&self, prompt: &str, default: Option<&str>) -> String {
        if let Some(def) = default {
            print!("{} [{}]: ", prompt, def);
        } else {
            print!("{}: ", prompt);
        }
        io::stdout().flush().unwrap();

        let mut input = String::new();
        io::stdin().read_line(&mut input).unwrap();
        let input = input.trim();

        if input.is_empty() {
            default.unwrap_or("").to_string()
        } else {
            input.to_string()
        }
    }

    fn get_int_input(&self, prompt: &str, default: Option<i64>) -> i64 {
        loop {
            let default_str = default.map(|d| d.to_string());
            let input = self.get_input(prompt, default_str.as_deref());

            if let Ok(value) = input.parse::<i64>() {
                return value;
            }
            println!("Please enter a valid number");
        }
    }

    fn report(&self, err: &ClinicError) {
        if err.is_displayable() {
            println!("\n{}", err);
        } else {
            println!("\nRequest failed: {}", err);
        }
    }

    fn require_login(&self) -> Option<PersonId> {
        let current = self.current;
        if current.is_none() {
            println!("\nPlease log in first (option 2)");
        }
        current
    }

    fn person_by_email(&self, email: &str) -> Option<Person> {
        self.clinic
            .read(|store| store.person_by_email(email).cloned())
    }

    // --- seeding ---

    fn seed_demo(&mut self) {
        println!("\n--- Seeding Demo Clinic ---");

        let hospital = match Hospital::new(
            "Lakeside Medical Center".to_string(),
            "100 Lakeside Drive".to_string(),
            "Rochester".to_string(),
            "NY".to_string(),
            "14620".to_string(),
        ) {
            Ok(h) => h,
            Err(e) => {
                self.report(&e);
                return;
            }
        };
        let hospital_id = hospital.id;

        let admin = match Person::new(
            "Alice".to_string(),
            "Alvarez".to_string(),
            "admin@lakeside.health".to_string(),
            "5855550100".to_string(),
            chrono::NaiveDate::from_ymd_opt(1975, 4, 27).unwrap(),
            Role::Admin,
            Some(hospital_id),
        ) {
            Ok(p) => p,
            Err(e) => {
                self.report(&e);
                return;
            }
        };
        let admin_id = admin.id;

        let seeded = self.clinic.transact(|store| {
            store.add_hospital(hospital);
            store.add_person(admin);
            Ok(())
        });
        if let Err(e) = seeded {
            self.report(&e);
            return;
        }

        let staff = [
            ("Gregory", "Smith", "dr.smith@lakeside.health", "doctor"),
            ("Priya", "Patel", "dr.patel@lakeside.health", "doctor"),
            ("Nina", "Lopez", "nina@lakeside.health", "nurse"),
        ];
        for (first, last, email, role) in staff {
            let fields = FormFields::new()
                .set("first_name", first)
                .set("last_name", last)
                .set("email", email)
                .set("phone", "585-555-0123")
                .set("birth_year", "1980")
                .set("birth_month", "6")
                .set("birth_day", "7")
                .set("role", role)
                .set("hospital", hospital_id.to_string());
            if let Err(e) = records::apply_person_form(&self.clinic, Some(admin_id), &fields, None)
            {
                self.report(&e);
                return;
            }
        }

        let patients = [
            ("John", "Smith", "john@email.com", "8675309"),
            ("Jane", "Doe", "jane@email.com", "5550199"),
        ];
        for (first, last, email, policy) in patients {
            let fields = FormFields::new()
                .set("first_name", first)
                .set("last_name", last)
                .set("email", email)
                .set("phone", "585-555-0188")
                .set("birth_year", "1991")
                .set("birth_month", "3")
                .set("birth_day", "29")
                .set("hospital", hospital_id.to_string())
                .set("policy_number", policy)
                .set("insurance_company", "Rochester Mutual");
            if let Err(e) = records::apply_person_form(&self.clinic, Some(admin_id), &fields, None)
            {
                self.report(&e);
                return;
            }
        }

        // One booked visit so the schedule views have something to show.
        let tomorrow = (Local::now() + Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let doctor = self.person_by_email("dr.smith@lakeside.health");
        let patient = self.person_by_email("john@email.com");
        if let (Some(doctor), Some(patient)) = (doctor, patient) {
            let fields = FormFields::new()
                .set("date", tomorrow)
                .set("time", "10:00")
                .set("duration", "1800")
                .set("doctor", doctor.id.to_string());
            match scheduler::create_or_update(&self.clinic, patient.id, &fields, None) {
                Ok(appointment) => println!(
                    "Booked demo appointment {} at {}",
                    appointment.id,
                    appointment.start.format("%Y-%m-%d %H:%M")
                ),
                Err(e) => self.report(&e),
            }
        }

        println!("Seeded 1 hospital, 6 users, 1 appointment");
        println!("Log in as admin@lakeside.health to see everything");
        self.current = Some(admin_id);
    }

    // --- sessions ---

    fn log_in(&mut self) {
        let email = self.get_input("\nEmail", None);
        match self.person_by_email(&email) {
            Some(person) => {
                println!("\nLogged in as {} ({})", person.full_name(), person.role.name());
                self.current = Some(person.id);
            }
            None => println!("\nNo account with that email"),
        }
    }

    fn register(&mut self) {
        println!("\n--- Register as a New Patient ---");
        let mut fields = FormFields::new();
        fields.insert("first_name", self.get_input("First name", None));
        fields.insert("last_name", self.get_input("Last name", None));
        fields.insert("email", self.get_input("Email", None));
        fields.insert("phone", self.get_input("Phone", None));
        fields.insert("birth_year", self.get_input("Birth year", None));
        fields.insert("birth_month", self.get_input("Birth month", None));
        fields.insert("birth_day", self.get_input("Birth day", None));

        let policy = self.get_input("Insurance policy number (blank to skip)", Some(""));
        if !policy.is_empty() {
            fields.insert("policy_number", policy);
            fields.insert(
                "insurance_company",
                self.get_input("Insurance company", None),
            );
        }

        match records::apply_person_form(&self.clinic, None, &fields, None) {
            Ok(person) => {
                println!("\nWelcome, {}! You are now logged in.", person.full_name());
                self.current = Some(person.id);
            }
            Err(e) => self.report(&e),
        }
    }

    // --- scheduling ---

    fn booking_fields(&self) -> Option<FormFields> {
        let mut fields = FormFields::new();
        fields.insert("date", self.get_input("Date (YYYY-MM-DD)", None));
        fields.insert("time", self.get_input("Time (HH:MM)", None));
        let duration = self.get_int_input("Duration in seconds", Some(1800));
        fields.insert("duration", duration.to_string());

        let doctor_email = self.get_input("Doctor email", Some("dr.smith@lakeside.health"));
        match self.person_by_email(&doctor_email) {
            Some(doctor) => {
                fields.insert("doctor", doctor.id.to_string());
                Some(fields)
            }
            None => {
                println!("\nNo doctor with that email");
                None
            }
        }
    }

    fn book_appointment(&mut self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        println!("\n--- Book Appointment ---");
        let Some(fields) = self.booking_fields() else {
            return;
        };
        match scheduler::create_or_update(&self.clinic, actor, &fields, None) {
            Ok(appointment) => println!(
                "\nBooked for {} ({} seconds)",
                appointment.start.format("%Y-%m-%d %H:%M"),
                appointment.duration_seconds
            ),
            Err(e) => self.report(&e),
        }
    }

    /// List the actor's upcoming appointments and let them pick one.
    fn choose_appointment(&self, actor: PersonId) -> Option<healthnet::Appointment> {
        let upcoming = self.clinic.read(|store| {
            store
                .person(actor)
                .cloned()
                .map(|person| availability::upcoming(store, &person, Local::now()))
        })?;

        if upcoming.is_empty() {
            println!("\nNo upcoming appointments");
            return None;
        }

        println!();
        for (i, appointment) in upcoming.iter().enumerate() {
            let names = self.clinic.read(|store| {
                let patient = store
                    .person(appointment.patient)
                    .map(|p| p.full_name())
                    .unwrap_or_else(|| "?".to_string());
                let doctor = store
                    .person(appointment.doctor)
                    .map(|p| p.full_name())
                    .unwrap_or_else(|| "?".to_string());
                (patient, doctor)
            });
            println!(
                "  {}. {} - {} with {}",
                i + 1,
                appointment.start.format("%Y-%m-%d %H:%M"),
                names.0,
                names.1
            );
        }

        let choice = self.get_int_input("Select appointment (0 to go back)", Some(0));
        if choice <= 0 || choice as usize > upcoming.len() {
            return None;
        }
        Some(upcoming[choice as usize - 1].clone())
    }

    fn move_appointment(&mut self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        println!("\n--- Move Appointment ---");
        let Some(appointment) = self.choose_appointment(actor) else {
            return;
        };

        let mut fields = FormFields::new();
        fields.insert("date", self.get_input("New date (YYYY-MM-DD)", None));
        fields.insert("time", self.get_input("New time (HH:MM)", None));
        fields.insert("duration", appointment.duration_seconds.to_string());
        fields.insert("doctor", appointment.doctor.to_string());
        fields.insert("patient", appointment.patient.to_string());

        match scheduler::create_or_update(&self.clinic, actor, &fields, Some(appointment.id)) {
            Ok(moved) => println!("\nMoved to {}", moved.start.format("%Y-%m-%d %H:%M")),
            Err(e) => self.report(&e),
        }
    }

    fn cancel_appointment(&mut self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        println!("\n--- Cancel Appointment ---");
        let Some(appointment) = self.choose_appointment(actor) else {
            return;
        };
        match scheduler::delete_appointment(&self.clinic, actor, appointment.id) {
            Ok(()) => println!("\nAppointment cancelled"),
            Err(e) => self.report(&e),
        }
    }

    fn view_schedule(&self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        let now = Local::now();
        let (person, upcoming, past) = match self.clinic.read(|store| {
            store.person(actor).cloned().map(|person| {
                let upcoming = availability::upcoming(store, &person, now);
                let past = availability::past(store, &person, now);
                (person, upcoming, past)
            })
        }) {
            Some(v) => v,
            None => return,
        };

        println!("\n--- Schedule for {} ---", person.full_name());
        println!("\nUpcoming ({}):", upcoming.len());
        for appointment in &upcoming {
            println!(
                "  {} ({} seconds)",
                appointment.start.format("%Y-%m-%d %H:%M"),
                appointment.duration_seconds
            );
        }
        println!("\nPast ({}):", past.len());
        for appointment in &past {
            println!(
                "  {} ({} seconds)",
                appointment.start.format("%Y-%m-%d %H:%M"),
                appointment.duration_seconds
            );
        }
    }

    fn view_patients(&self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        let visible = self.clinic.read(|store| {
            store
                .person(actor)
                .cloned()
                .map(|person| access::visible_patients(store, &person))
        });
        let Some(visible) = visible else {
            return;
        };

        println!("\n--- Visible Patients ({}) ---", visible.len());
        for person in visible {
            println!("  {} <{}> {}", person.full_name(), person.email, person.role.name());
        }
    }

    // --- records ---

    fn edit_medical_information(&mut self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        println!("\n--- Edit Medical Information ---");
        println!("(blank fields are left unchanged)");

        let target_email = self.get_input("Patient email (blank for yourself)", Some(""));
        let target = if target_email.is_empty() {
            actor
        } else {
            match self.person_by_email(&target_email) {
                Some(person) => person.id,
                None => {
                    println!("\nNo account with that email");
                    return;
                }
            }
        };

        let mut fields = FormFields::new();
        for key in [
            "sex",
            "medications",
            "allergies",
            "medical_conditions",
            "family_history",
            "additional_info",
        ] {
            let value = self.get_input(key, Some(""));
            if !value.is_empty() {
                fields.insert(key, value);
            }
        }

        match records::update_medical_information(&self.clinic, actor, target, &fields) {
            Ok(person) => println!("\nMedical information saved for {}", person.full_name()),
            Err(e) => self.report(&e),
        }
    }

    fn prescriptions_menu(&mut self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        println!("\n--- Prescriptions ---");
        println!("1. List for a patient");
        println!("2. Add");
        println!("3. Delete");

        match self.get_int_input("Enter choice", Some(1)) {
            1 => {
                let email = self.get_input("Patient email", None);
                let Some(patient) = self.person_by_email(&email) else {
                    println!("\nNo account with that email");
                    return;
                };
                let list = self.clinic.read(|store| {
                    store
                        .prescriptions_for(patient.id)
                        .into_iter()
                        .cloned()
                        .collect::<Vec<_>>()
                });
                println!("\n{} prescription(s):", list.len());
                for p in list {
                    println!("  {} {}{} - {}", p.name, p.dosage, p.unit, p.directions);
                }
            }
            2 => {
                let email = self.get_input("Patient email", None);
                let Some(patient) = self.person_by_email(&email) else {
                    println!("\nNo account with that email");
                    return;
                };
                let fields = FormFields::new()
                    .set("patient", patient.id.to_string())
                    .set("name", self.get_input("Drug name", None))
                    .set("dosage", self.get_input("Dosage", Some("500")))
                    .set("unit", self.get_input("Unit", Some("mg")))
                    .set("directions", self.get_input("Directions", None));
                match records::add_prescription(&self.clinic, actor, &fields) {
                    Ok(p) => println!("\nAdded {} {}{}", p.name, p.dosage, p.unit),
                    Err(e) => self.report(&e),
                }
            }
            3 => {
                let email = self.get_input("Patient email", None);
                let Some(patient) = self.person_by_email(&email) else {
                    println!("\nNo account with that email");
                    return;
                };
                let list = self.clinic.read(|store| {
                    store
                        .prescriptions_for(patient.id)
                        .into_iter()
                        .cloned()
                        .collect::<Vec<_>>()
                });
                for (i, p) in list.iter().enumerate() {
                    println!("  {}. {} {}{}", i + 1, p.name, p.dosage, p.unit);
                }
                let choice = self.get_int_input("Select prescription (0 to go back)", Some(0));
                if choice <= 0 || choice as usize > list.len() {
                    return;
                }
                match records::delete_prescription(&self.clinic, actor, list[choice as usize - 1].id)
                {
                    Ok(()) => println!("\nPrescription deleted"),
                    Err(e) => self.report(&e),
                }
            }
            _ => println!("Invalid choice"),
        }
    }

    fn messages_menu(&mut self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        println!("\n--- Messages ---");
        let groups = self.clinic.read(|store| {
            store
                .groups_for(actor)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        });
        println!("Your groups:");
        for (i, group) in groups.iter().enumerate() {
            println!("  {}. {} ({} messages)", i + 1, group.name, group.messages.len());
        }
        println!("\n1. Read a group");
        println!("2. Post to a group");
        println!("3. Start a group");

        match self.get_int_input("Enter choice", Some(1)) {
            1 => {
                let choice = self.get_int_input("Group number", Some(1));
                if choice <= 0 {
                    return;
                }
                let Some(group) = groups.get(choice as usize - 1) else {
                    return;
                };
                match messages::messages_in(&self.clinic, actor, group.id) {
                    Ok(list) => {
                        for message in list {
                            let sender = self.clinic.read(|store| {
                                store
                                    .person(message.sender)
                                    .map(|p| p.full_name())
                                    .unwrap_or_else(|| "?".to_string())
                            });
                            println!(
                                "  [{}] {}: {}",
                                message.date.format("%Y-%m-%d %H:%M"),
                                sender,
                                message.body
                            );
                        }
                    }
                    Err(e) => self.report(&e),
                }
            }
            2 => {
                let choice = self.get_int_input("Group number", Some(1));
                if choice <= 0 {
                    return;
                }
                let Some(group) = groups.get(choice as usize - 1) else {
                    return;
                };
                let body = self.get_input("Message", None);
                match messages::post_message(&self.clinic, actor, group.id, &body) {
                    Ok(_) => println!("\nPosted"),
                    Err(e) => self.report(&e),
                }
            }
            3 => {
                let name = self.get_input("Group name", None);
                let email = self.get_input("Other member's email", None);
                let Some(member) = self.person_by_email(&email) else {
                    println!("\nNo account with that email");
                    return;
                };
                match messages::create_group(&self.clinic, actor, &name, &[member.id]) {
                    Ok(group) => println!("\nCreated group '{}'", group.name),
                    Err(e) => self.report(&e),
                }
            }
            _ => println!("Invalid choice"),
        }
    }

    fn audit_menu(&self) {
        let Some(actor) = self.require_login() else {
            return;
        };
        let limit = self.get_int_input("\nHow many entries", Some(20));
        let entries = match audit::recent_for(&self.clinic, actor, Some(limit.max(0) as usize)) {
            Ok(entries) => entries,
            Err(e) => {
                self.report(&e);
                return;
            }
        };

        println!("\n--- Audit Log ({} entries) ---", entries.len());
        for entry in &entries {
            let who = self.clinic.read(|store| {
                store
                    .person(entry.user)
                    .map(|p| p.full_name())
                    .unwrap_or_else(|| "?".to_string())
            });
            println!("  [{}] {}: {}", entry.date.format("%Y-%m-%d %H:%M"), who, entry.action);
        }

        let export = self.get_input("Export as JSON? (y/n)", Some("n"));
        if export.to_lowercase() == "y" {
            match serde_json::to_string_pretty(&entries) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("\nExport failed: {}", e),
            }
        }
    }

    fn run(&mut self) {
        self.print_header();

        while self.running {
            self.print_menu();

            let choice = self.get_int_input("Enter choice", Some(1));

            match choice {
                1 => self.seed_demo(),
                2 => self.log_in(),
                3 => self.register(),
                4 => self.book_appointment(),
                5 => self.move_appointment(),
                6 => self.cancel_appointment(),
                7 => self.view_schedule(),
                8 => self.view_patients(),
                9 => self.edit_medical_information(),
                10 => self.prescriptions_menu(),
                11 => self.messages_menu(),
                12 => self.audit_menu(),
                13 => {
                    self.running = false;
                    println!("\nGoodbye!");
                }
                _ => println!("Invalid choice"),
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut cli = ClinicCli::new();
    cli.run();
}
