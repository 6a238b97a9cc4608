use chrono::Utc;
use clap::Args;
use heartbeats::config::{AdminCredentials, AppConfig};
use heartbeats::error::AppError;
use heartbeats::workflows::membership::applications::{
    ApplicationRepository, ApplicationStatus, Authenticator, EmailAutofill, FormField,
    InMemoryApplicationRepository, IntakeForm, MembershipApplicationService, ReviewConsole,
    ReviewFilter, ReviewService, ReviewSummary, StaticCredentialAuthenticator, StatusFilter,
    SubmissionError,
};
use std::sync::Arc;

const DEMO_ADMIN_EMAIL: &str = "staff@heartbeats.example";
const DEMO_ADMIN_PASSWORD: &str = "encore";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Institution domain used for the auto-filled contact e-mail (defaults to APP_INSTITUTION_DOMAIN)
    #[arg(long)]
    pub(crate) institution_domain: Option<String>,
    /// Print the stored application documents as JSON
    #[arg(long)]
    pub(crate) show_json: bool,
    /// Skip the staff review portion of the demo
    #[arg(long)]
    pub(crate) skip_review: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let institution_domain = match args.institution_domain.clone() {
        Some(domain) => domain,
        None => AppConfig::load()?.intake.institution_domain,
    };
    let repository = Arc::new(InMemoryApplicationRepository::new());
    let intake = MembershipApplicationService::new(repository.clone());

    println!("HeartBeats membership demo");
    println!("\nApplication form");

    let mut form = IntakeForm::new(institution_domain.clone());
    form.set(FormField::RollNumber, "121cs0456");
    if let EmailAutofill::AutoDerived { .. } = form.email_source() {
        println!("  Contact e-mail auto-filled: {}", form.values().email);
    }

    form.set(FormField::Name, "Kavya Menon");
    form.set(FormField::Phone, "98765 43210");
    form.set(FormField::Role, "Keyboard");
    form.set(FormField::WhyRole, "I have played keys for six years");
    form.set(FormField::WhyHeartbeats, motivation("HeartBeats", 24));
    form.set(FormField::DemoLink, "https://youtu.be/heartbeats-demo");

    if let Err(errors) = form.submit_attempt() {
        println!("  First attempt blocked:");
        for (field, message) in errors.iter() {
            println!("  - {}: {}", field.key(), message);
        }
    }

    form.set(FormField::WhyRole, motivation("the keyboard", 22));
    let receipt = match form.submit_attempt() {
        Ok(profile) => match intake.submit_profile_at(profile, Utc::now()) {
            Ok(receipt) => receipt,
            Err(err) => {
                println!("  Submission failed: {}", err);
                return Ok(());
            }
        },
        Err(errors) => {
            println!("  Submission still invalid: {}", errors);
            return Ok(());
        }
    };
    println!(
        "  Submitted {} as {} ({})",
        receipt.roll_number,
        receipt.application_id,
        receipt.status.label()
    );

    let mut repeat = form.values().clone();
    repeat.roll_number = repeat.roll_number.to_lowercase();
    match intake.submit(repeat) {
        Err(SubmissionError::AlreadyApplied { roll_number }) => {
            println!("  Repeat submission for {} refused: already applied", roll_number)
        }
        Err(err) => println!("  Repeat submission rejected: {}", err),
        Ok(_) => println!("  Repeat submission unexpectedly accepted"),
    }

    for (roll_number, name, role) in [
        ("121ee0101", "Rohan Iyer", "Drums"),
        ("121me0202", "Sara Thomas", "Vocalist"),
    ] {
        let mut form = IntakeForm::new(institution_domain.clone());
        form.set(FormField::RollNumber, roll_number);
        form.set(FormField::Name, name);
        form.set(FormField::Phone, "+91-9123456789");
        form.set(FormField::Role, role);
        form.set(FormField::WhyRole, motivation(role, 22));
        form.set(FormField::WhyHeartbeats, motivation("HeartBeats", 24));
        form.set(FormField::DemoLink, "https://drive.google.com/demo");
        match form.submit_attempt() {
            Ok(profile) => {
                if let Err(err) = intake.submit_profile_at(profile, Utc::now()) {
                    println!("  Could not seed {}: {}", roll_number, err);
                }
            }
            Err(errors) => println!("  Could not seed {}: {}", roll_number, errors),
        }
    }

    if args.skip_review {
        return Ok(());
    }

    println!("\nStaff review");
    let auth = Arc::new(StaticCredentialAuthenticator::new(
        Some(AdminCredentials {
            email: DEMO_ADMIN_EMAIL.to_string(),
            password: DEMO_ADMIN_PASSWORD.to_string(),
        }),
        5,
    ));

    if let Err(err) = auth.sign_in(DEMO_ADMIN_EMAIL, "guess") {
        println!("  Sign-in with wrong password: {}", err);
    }
    let token = match auth.sign_in(DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD) {
        Ok(token) => token,
        Err(err) => {
            println!("  Sign-in failed: {}", err);
            return Ok(());
        }
    };

    let review = Arc::new(ReviewService::new(repository.clone()));
    let mut console = match ReviewConsole::open(review, auth, token) {
        Ok(console) => console,
        Err(err) => {
            println!("  Console unavailable: {}", err);
            return Ok(());
        }
    };
    if let Err(err) = console.refresh() {
        println!("  {}", err);
        return Ok(());
    }

    print_summary(&console.summary());
    for record in console.applications() {
        println!(
            "  - {} | {} | {} | {}",
            record.profile.roll_number,
            record.profile.name,
            record.profile.role.label(),
            record.status.label()
        );
    }

    let search = ReviewFilter::new("drums", StatusFilter::All);
    println!(
        "  Search \"{}\" matches {} application(s)",
        search.search,
        console.filtered(&search).len()
    );

    match console.set_status(&receipt.application_id, ApplicationStatus::Accepted) {
        Ok(()) => println!("  Marked {} as accepted", receipt.roll_number),
        Err(err) => println!("  {}", err),
    }

    let to_remove = console
        .filtered(&search)
        .first()
        .map(|record| record.id.clone());
    if let Some(id) = to_remove {
        match console.request_delete(&id) {
            Ok(pending) => {
                println!(
                    "  Delete {}? Confirming. This cannot be undone.",
                    pending.roll_number()
                );
                if let Err(err) = console.confirm_delete(pending) {
                    println!("  {}", err);
                }
            }
            Err(err) => println!("  {}", err),
        }
    }

    print_summary(&console.summary());
    console.sign_out();

    if args.show_json {
        let records = repository.list_recent()?;
        match serde_json::to_string_pretty(&records) {
            Ok(json) => println!("\nStored documents:\n{}", json),
            Err(err) => println!("\nStored documents unavailable: {}", err),
        }
    }

    Ok(())
}

fn print_summary(summary: &ReviewSummary) {
    println!(
        "  Total {} | Pending {} | Reviewed {} | Accepted {} | Rejected {}",
        summary.total, summary.pending, summary.reviewed, summary.accepted, summary.rejected
    );
}

fn motivation(topic: &str, words: usize) -> String {
    let mut text = format!("I want to bring {topic} energy to every HeartBeats rehearsal and gig");
    let filler = ["and", "keep", "learning", "with", "the", "band"];
    let mut count = text.split_whitespace().count();
    let mut index = 0;
    while count < words {
        text.push(' ');
        text.push_str(filler[index % filler.len()]);
        index += 1;
        count += 1;
    }
    text
}
