//! Interactive form session: touched-field tracking, live re-validation, and the
//! institution e-mail default derived from the roll number.

use std::collections::BTreeSet;

use super::domain::{ApplicantProfile, ApplicationSubmission, FormField};
use super::validation::{collect_errors, validate_field, validate_form, ValidationErrors};

/// Where the current e-mail value came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmailAutofill {
    /// Nothing typed and nothing derived yet.
    #[default]
    Unset,
    /// Filled in from the roll number; follows further roll number edits.
    AutoDerived { roll_number: String },
    /// Typed by the candidate; roll number edits leave it alone.
    ManuallyOverridden,
}

/// `<lowercase roll>@<domain>`.
pub fn derived_email(roll_number: &str, institution_domain: &str) -> String {
    format!(
        "{}@{}",
        roll_number.trim().to_lowercase(),
        institution_domain
    )
}

#[derive(Debug, Clone)]
pub struct IntakeForm {
    institution_domain: String,
    values: ApplicationSubmission,
    touched: BTreeSet<FormField>,
    errors: ValidationErrors,
    email_source: EmailAutofill,
}

impl IntakeForm {
    pub fn new(institution_domain: impl Into<String>) -> Self {
        Self {
            institution_domain: institution_domain.into(),
            values: ApplicationSubmission::default(),
            touched: BTreeSet::new(),
            errors: ValidationErrors::default(),
            email_source: EmailAutofill::Unset,
        }
    }

    pub fn values(&self) -> &ApplicationSubmission {
        &self.values
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn is_touched(&self, field: FormField) -> bool {
        self.touched.contains(&field)
    }

    pub fn email_source(&self) -> &EmailAutofill {
        &self.email_source
    }

    /// Record a change. Touched fields re-validate immediately; untouched ones stay quiet.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        self.values.set(field, value);

        match field {
            FormField::RollNumber => self.apply_email_default(),
            FormField::Email => {
                self.email_source = if self.values.email.is_empty() {
                    EmailAutofill::Unset
                } else {
                    EmailAutofill::ManuallyOverridden
                };
            }
            _ => {}
        }

        if self.is_touched(field) {
            self.revalidate(field);
        }
    }

    /// Mark a field as interacted with and surface its error.
    pub fn blur(&mut self, field: FormField) {
        self.touched.insert(field);
        self.revalidate(field);
    }

    /// Touch every field and run the full pass.
    pub fn submit_attempt(&mut self) -> Result<ApplicantProfile, ValidationErrors> {
        self.touched.extend(FormField::ordered());
        self.errors = collect_errors(&self.values);
        validate_form(&self.values)
    }

    /// Start over after a successful submission.
    pub fn reset(&mut self) {
        self.values = ApplicationSubmission::default();
        self.touched.clear();
        self.errors = ValidationErrors::default();
        self.email_source = EmailAutofill::Unset;
    }

    fn revalidate(&mut self, field: FormField) {
        let message = validate_field(field, &self.values);
        self.errors.record(field, message);
    }

    fn apply_email_default(&mut self) {
        let roll_number = self.values.roll_number.clone();
        if roll_number.is_empty() {
            return;
        }

        match self.email_source {
            EmailAutofill::ManuallyOverridden => {}
            EmailAutofill::Unset | EmailAutofill::AutoDerived { .. } => {
                self.values.email = derived_email(&roll_number, &self.institution_domain);
                self.email_source = EmailAutofill::AutoDerived { roll_number };
                if self.is_touched(FormField::Email) {
                    self.revalidate(FormField::Email);
                }
            }
        }
    }
}
