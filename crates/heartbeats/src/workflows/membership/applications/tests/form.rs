use super::common::*;
use crate::workflows::membership::applications::domain::FormField;
use crate::workflows::membership::applications::form::{derived_email, EmailAutofill, IntakeForm};

fn form() -> IntakeForm {
    IntakeForm::new("nitrkl.ac.in")
}

fn fill_valid(form: &mut IntakeForm) {
    let valid = submission();
    for field in FormField::ordered() {
        form.set(field, valid.value(field));
    }
}

#[test]
fn roll_number_derives_institution_email() {
    let mut form = form();
    form.set(FormField::RollNumber, "121cs0123");

    assert_eq!(form.values().email, "121cs0123@nitrkl.ac.in");
    assert_eq!(
        form.email_source(),
        &EmailAutofill::AutoDerived {
            roll_number: "121cs0123".to_string()
        }
    );

    form.set(FormField::RollNumber, "121CS0999");
    assert_eq!(form.values().email, "121cs0999@nitrkl.ac.in");
}

#[test]
fn manual_email_survives_roll_number_edits() {
    let mut form = form();
    form.set(FormField::RollNumber, "121cs0123");
    form.set(FormField::Email, "asha.rao@gmail.com");
    assert_eq!(form.email_source(), &EmailAutofill::ManuallyOverridden);

    form.set(FormField::RollNumber, "121cs0124");
    assert_eq!(form.values().email, "asha.rao@gmail.com");
}

#[test]
fn manual_edit_ending_in_institution_domain_still_counts_as_manual() {
    let mut form = form();
    form.set(FormField::Email, "asha@nitrkl.ac.in");
    form.set(FormField::RollNumber, "121cs0123");

    assert_eq!(form.values().email, "asha@nitrkl.ac.in");
}

#[test]
fn clearing_email_rearms_the_default() {
    let mut form = form();
    form.set(FormField::Email, "asha.rao@gmail.com");
    form.set(FormField::Email, "");
    assert_eq!(form.email_source(), &EmailAutofill::Unset);

    form.set(FormField::RollNumber, "121cs0123");
    assert_eq!(form.values().email, derived_email("121cs0123", "nitrkl.ac.in"));
}

#[test]
fn empty_roll_number_leaves_email_alone() {
    let mut form = form();
    form.set(FormField::RollNumber, "121cs0123");
    form.set(FormField::RollNumber, "");

    assert_eq!(form.values().email, "121cs0123@nitrkl.ac.in");
}

#[test]
fn untouched_fields_stay_quiet_until_blurred() {
    let mut form = form();
    form.set(FormField::Name, "   ");
    assert_eq!(form.error(FormField::Name), None);

    form.blur(FormField::Name);
    assert!(form.is_touched(FormField::Name));
    assert_eq!(form.error(FormField::Name), Some("Name is required"));

    form.set(FormField::Name, "Asha Rao");
    assert_eq!(form.error(FormField::Name), None);
}

#[test]
fn touched_field_recomputes_on_every_change() {
    let mut form = form();
    form.blur(FormField::WhyRole);
    assert_eq!(form.error(FormField::WhyRole), Some("This field is required"));

    form.set(FormField::WhyRole, words(5));
    assert_eq!(
        form.error(FormField::WhyRole),
        Some("Please write at least 20 words (currently 5 words)")
    );

    form.set(FormField::WhyRole, words(20));
    assert_eq!(form.error(FormField::WhyRole), None);
}

#[test]
fn submit_attempt_touches_everything_and_reports_all_errors() {
    let mut form = form();
    form.set(FormField::RollNumber, "121cs0123");

    let errors = form.submit_attempt().expect_err("form incomplete");
    assert!(FormField::ordered()
        .iter()
        .all(|field| form.is_touched(*field)));
    assert!(!errors.contains(FormField::RollNumber));
    assert!(!errors.contains(FormField::Email));
    assert!(errors.contains(FormField::Phone));
    assert_eq!(form.errors(), &errors);
}

#[test]
fn submit_attempt_yields_profile_for_complete_form() {
    let mut form = form();
    fill_valid(&mut form);

    let profile = form.submit_attempt().expect("form valid");
    assert_eq!(profile.roll_number, "121CS0123");
    assert!(form.errors().is_empty());

    form.reset();
    assert!(form.values().roll_number.is_empty());
    assert_eq!(form.email_source(), &EmailAutofill::Unset);
}
