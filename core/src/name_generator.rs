//! Deterministic user name and e-mail generation from curated lists.
//!
//! All generation is deterministic (same RNG seed = same names).

use crate::rng::StreamRng;

/// A generated identity: display name plus a unique e-mail address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
}

pub struct NameGenerator;

impl NameGenerator {
    /// Generate a name and an address on one of `domains`.
    ///
    /// `suffix` must be unique per user; it is appended to the local part
    /// so that two users with the same name never share an address.
    pub fn generate_identity(rng: &mut StreamRng, domains: &[String], suffix: usize) -> UserIdentity {
        let first = Self::generate_first_name(rng);
        let last = Self::generate_last_name(rng);
        let domain = rng
            .pick(domains)
            .map(String::as_str)
            .unwrap_or("example.com");
        UserIdentity {
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}{suffix}@{domain}",
                email_local(first),
                email_local(last)
            ),
        }
    }

    pub fn generate_first_name(rng: &mut StreamRng) -> &'static str {
        let idx = rng.next_u64_below(FIRST_NAMES.len() as u64) as usize;
        FIRST_NAMES[idx]
    }

    pub fn generate_last_name(rng: &mut StreamRng) -> &'static str {
        let idx = rng.next_u64_below(LAST_NAMES.len() as u64) as usize;
        LAST_NAMES[idx]
    }
}

/// Lowercase ASCII letters only: "O'Brien" -> "obrien".
fn email_local(part: &str) -> String {
    part.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "Michael", "Jennifer", "David", "Linda",
    "William", "Elizabeth", "Joseph", "Susan", "Thomas", "Jessica", "Daniel", "Sarah",
    "Matthew", "Karen", "Anthony", "Nancy", "Andrew", "Emily", "Joshua", "Michelle",
    "Kevin", "Amanda", "Brian", "Melissa", "Ryan", "Rebecca", "Jacob", "Laura",
    "Nicholas", "Angela", "Samuel", "Emma", "Tyler", "Olivia", "Noah", "Sophia",
    "Ethan", "Ava", "Liam", "Isabella", "Mateo", "Mia", "Hiroshi", "Yuki",
    "Wei", "Mei", "Arjun", "Priya", "Omar", "Fatima", "Kwame", "Amara",
    "Luca", "Giulia", "Santiago", "Valentina", "Lars", "Ingrid", "Dmitri", "Anya",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas",
    "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White",
    "Harris", "Clark", "Lewis", "Robinson", "Walker", "Young", "Allen", "King",
    "Nguyen", "Kim", "Patel", "Chen", "Tanaka", "Singh", "Okafor", "Mensah",
    "Rossi", "Silva", "Novak", "Ivanova", "Larsen", "O'Brien", "Murphy", "Kowalski",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{GeneratorSlot, RngBank};

    fn domains() -> Vec<String> {
        vec!["example.com".into()]
    }

    #[test]
    fn identity_generation_is_deterministic() {
        let mut rng1 = RngBank::new(12345).for_slot(GeneratorSlot::Users);
        let mut rng2 = RngBank::new(12345).for_slot(GeneratorSlot::Users);

        let a = NameGenerator::generate_identity(&mut rng1, &domains(), 1);
        let b = NameGenerator::generate_identity(&mut rng2, &domains(), 1);

        assert_eq!(a, b, "Same seed should produce same identity");
    }

    #[test]
    fn emails_are_well_formed() {
        let mut rng = RngBank::new(12345).for_slot(GeneratorSlot::Users);

        for i in 0..200 {
            let id = NameGenerator::generate_identity(&mut rng, &domains(), i);
            assert_eq!(id.name.split_whitespace().count(), 2, "Name: {}", id.name);

            let (local, domain) = id.email.split_once('@').expect("email has an @");
            assert_eq!(domain, "example.com");
            assert!(local.ends_with(&i.to_string()), "Suffix missing: {}", id.email);
            assert!(
                local.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.'),
                "Unexpected character in {}",
                id.email
            );
        }
    }
}
