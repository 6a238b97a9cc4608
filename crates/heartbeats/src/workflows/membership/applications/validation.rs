use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::domain::{
    normalize_roll_number, ApplicantProfile, ApplicationSubmission, FormField, MemberRole,
};

/// Institute roll numbers are exactly nine ASCII letters or digits.
const ROLL_NUMBER_PATTERN: &str = r"^[a-zA-Z0-9]{9}$";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
/// Indian mobile: optional +91 with one separator, then ten digits starting 6-9.
const PHONE_PATTERN: &str = r"^(\+91[\-\s]?)?[6-9][0-9]{9}$";

pub const MIN_MOTIVATION_WORDS: usize = 20;

static ROLL_NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();

fn roll_number_regex() -> &'static Regex {
    ROLL_NUMBER_REGEX
        .get_or_init(|| Regex::new(ROLL_NUMBER_PATTERN).expect("invalid regex pattern"))
}

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("invalid regex pattern"))
}

fn phone_regex() -> &'static Regex {
    PHONE_REGEX.get_or_init(|| Regex::new(PHONE_PATTERN).expect("invalid regex pattern"))
}

/// Field-keyed messages from a full-form pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} form field(s) failed validation", .0.len())]
pub struct ValidationErrors(BTreeMap<FormField, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    pub(crate) fn record(&mut self, field: FormField, message: Option<String>) {
        match message {
            Some(message) => {
                self.0.insert(field, message);
            }
            None => {
                self.0.remove(&field);
            }
        }
    }
}

/// Whitespace-delimited, non-empty tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Validate one field in isolation. `otherRole` consults the selected role.
pub fn validate_field(field: FormField, submission: &ApplicationSubmission) -> Option<String> {
    let value = submission.value(field);
    match field {
        FormField::RollNumber => {
            if value.is_empty() {
                Some("Roll number is required".to_string())
            } else if !roll_number_regex().is_match(value) {
                Some("Roll number must be exactly 9 alphanumeric characters".to_string())
            } else {
                None
            }
        }
        FormField::Name => value
            .trim()
            .is_empty()
            .then(|| "Name is required".to_string()),
        FormField::Email => {
            if value.is_empty() {
                Some("Email is required".to_string())
            } else if !email_regex().is_match(value) {
                Some("Please enter a valid email address".to_string())
            } else {
                None
            }
        }
        FormField::Phone => {
            if value.is_empty() {
                return Some("Phone number is required".to_string());
            }
            let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            (!phone_regex().is_match(&compact)).then(|| {
                "Please enter a valid Indian phone number (10 digits starting with 6-9)"
                    .to_string()
            })
        }
        FormField::Role => {
            if value.is_empty() {
                Some("Please select a role".to_string())
            } else if MemberRole::from_label(value).is_none() {
                Some("Please select a valid role".to_string())
            } else {
                None
            }
        }
        FormField::OtherRole => {
            let needs_description = MemberRole::from_label(&submission.role)
                .is_some_and(MemberRole::requires_description);
            (needs_description && value.trim().is_empty())
                .then(|| "Please specify your role".to_string())
        }
        FormField::WhyRole | FormField::WhyHeartbeats => motivation_error(value),
        FormField::DemoLink => {
            if value.trim().is_empty() {
                Some("Demo link is required".to_string())
            } else if url::Url::parse(value).is_err() {
                Some("Please enter a valid URL".to_string())
            } else {
                None
            }
        }
    }
}

fn motivation_error(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some("This field is required".to_string());
    }

    let words = word_count(value);
    (words < MIN_MOTIVATION_WORDS).then(|| {
        format!("Please write at least {MIN_MOTIVATION_WORDS} words (currently {words} words)")
    })
}

/// Run every field rule and collect all failures.
pub fn collect_errors(submission: &ApplicationSubmission) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for field in FormField::ordered() {
        errors.record(field, validate_field(field, submission));
    }
    errors
}

/// Full pre-submit pass producing the normalized profile or the complete error set.
pub fn validate_form(
    submission: &ApplicationSubmission,
) -> Result<ApplicantProfile, ValidationErrors> {
    let errors = collect_errors(submission);
    if !errors.is_empty() {
        return Err(errors);
    }

    let role = MemberRole::from_label(&submission.role).ok_or_else(|| {
        let mut errors = ValidationErrors::default();
        errors.record(
            FormField::Role,
            Some("Please select a valid role".to_string()),
        );
        errors
    })?;

    let other_role = if role.requires_description() {
        submission.other_role.trim().to_string()
    } else {
        String::new()
    };

    Ok(ApplicantProfile {
        roll_number: normalize_roll_number(&submission.roll_number),
        name: submission.name.trim().to_string(),
        email: submission.email.trim().to_string(),
        phone: submission.phone.trim().to_string(),
        role,
        other_role,
        why_role: submission.why_role.trim().to_string(),
        why_heartbeats: submission.why_heartbeats.trim().to_string(),
        demo_link: submission.demo_link.trim().to_string(),
    })
}
