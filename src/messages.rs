/// Membership-gated messaging.
///
/// Groups are small named rosters; only members can read or post.

use chrono::Local;
use uuid::Uuid;

use crate::error::{ClinicError, ClinicResult};
use crate::models::{GroupId, Message, MessageGroup, PersonId};
use crate::store::Clinic;

/// Create a group. The creator is always a member, and every listed
/// member must resolve to a real person.
pub fn create_group(
    clinic: &Clinic,
    actor: PersonId,
    name: &str,
    members: &[PersonId],
) -> ClinicResult<MessageGroup> {
    clinic.transact(|store| {
        store.person(actor).ok_or(ClinicError::NotFound)?;
        let mut roster = vec![actor];
        for &member in members {
            store.person(member).ok_or(ClinicError::NotFound)?;
            if !roster.contains(&member) {
                roster.push(member);
            }
        }
        let group = MessageGroup::new(name.to_string(), roster)?;
        store.add_group(group.clone());
        Ok(group)
    })
}

/// Post to a group the actor belongs to.
pub fn post_message(
    clinic: &Clinic,
    actor: PersonId,
    group: GroupId,
    body: &str,
) -> ClinicResult<Message> {
    clinic.transact(|store| {
        store.person(actor).ok_or(ClinicError::NotFound)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(ClinicError::validation("Message body cannot be empty."));
        }
        let group = store.group_mut(group).ok_or(ClinicError::NotFound)?;
        if !group.has_member(actor) {
            return Err(ClinicError::Denied);
        }
        let message = Message {
            id: Uuid::new_v4(),
            sender: actor,
            body: body.to_string(),
            date: Local::now(),
        };
        group.messages.push(message.clone());
        Ok(message)
    })
}

/// Read a group's messages, oldest first. Non-members are denied.
pub fn messages_in(
    clinic: &Clinic,
    actor: PersonId,
    group: GroupId,
) -> ClinicResult<Vec<Message>> {
    clinic.read(|store| {
        store.person(actor).ok_or(ClinicError::NotFound)?;
        let group = store.group(group).ok_or(ClinicError::NotFound)?;
        if !group.has_member(actor) {
            return Err(ClinicError::Denied);
        }
        let mut messages = group.messages.clone();
        messages.sort_by_key(|m| m.date);
        Ok(messages)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, Role};
    use chrono::NaiveDate;

    fn add_person(clinic: &Clinic, email: &str) -> PersonId {
        let person = Person::new(
            "Test".to_string(),
            "Person".to_string(),
            email.to_string(),
            "5551234567".to_string(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            Role::Patient,
            None,
        )
        .unwrap();
        let id = person.id;
        clinic
            .transact(|store| {
                store.add_person(person);
                Ok(())
            })
            .unwrap();
        id
    }

    #[test]
    fn test_membership_gates_reading_and_posting() {
        let clinic = Clinic::new();
        let alice = add_person(&clinic, "alice@example.com");
        let bob = add_person(&clinic, "bob@example.com");
        let outsider = add_person(&clinic, "mallory@example.com");

        let group = create_group(&clinic, alice, "Care team", &[bob]).unwrap();
        post_message(&clinic, alice, group.id, "Lab results are in").unwrap();

        assert_eq!(messages_in(&clinic, bob, group.id).unwrap().len(), 1);
        assert_eq!(
            messages_in(&clinic, outsider, group.id).unwrap_err(),
            ClinicError::Denied
        );
        assert_eq!(
            post_message(&clinic, outsider, group.id, "hello?").unwrap_err(),
            ClinicError::Denied
        );
    }

    #[test]
    fn test_messages_read_oldest_first() {
        let clinic = Clinic::new();
        let alice = add_person(&clinic, "alice@example.com");
        let group = create_group(&clinic, alice, "Notes", &[]).unwrap();
        post_message(&clinic, alice, group.id, "first").unwrap();
        post_message(&clinic, alice, group.id, "second").unwrap();

        let messages = messages_in(&clinic, alice, group.id).unwrap();
        assert_eq!(messages[0].body, "first");
        assert_eq!(messages[1].body, "second");
    }

    #[test]
    fn test_empty_body_rejected() {
        let clinic = Clinic::new();
        let alice = add_person(&clinic, "alice@example.com");
        let group = create_group(&clinic, alice, "Notes", &[]).unwrap();
        assert!(post_message(&clinic, alice, group.id, "   ").is_err());
    }
}
