//! Integration specifications for the membership application intake and staff review workflow.
//!
//! Scenarios drive the public service facade, the review console, and the HTTP router against
//! both store backends without reaching into private modules.

mod common {
    use chrono::{DateTime, TimeZone, Utc};

    use heartbeats::config::AdminCredentials;
    use heartbeats::workflows::membership::applications::{
        ApplicationSubmission, StaticCredentialAuthenticator,
    };

    pub(super) const ADMIN_EMAIL: &str = "staff@heartbeats.example";
    pub(super) const ADMIN_PASSWORD: &str = "encore";

    pub(super) fn motivation(count: usize) -> String {
        (1..=count)
            .map(|index| format!("reason{index}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(super) fn submission(roll_number: &str, name: &str, role: &str) -> ApplicationSubmission {
        ApplicationSubmission {
            roll_number: roll_number.to_string(),
            name: name.to_string(),
            email: format!("{}@nitrkl.ac.in", roll_number.to_lowercase()),
            phone: "9876543210".to_string(),
            role: role.to_string(),
            other_role: String::new(),
            why_role: motivation(21),
            why_heartbeats: motivation(25),
            demo_link: "https://soundcloud.com/heartbeats/demo".to_string(),
        }
    }

    pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn authenticator() -> StaticCredentialAuthenticator {
        StaticCredentialAuthenticator::new(
            Some(AdminCredentials {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
            3,
        )
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use common::*;
use heartbeats::workflows::membership::applications::{
    application_router, ApplicationRepository, ApplicationState, ApplicationStatus,
    Authenticator, EmailAutofill, FormField, InMemoryApplicationRepository, IntakeForm,
    JsonFileApplicationRepository, MembershipApplicationService, ReviewConsole, ReviewFilter,
    ReviewService, StatusFilter, SubmissionError,
};

#[test]
fn form_submission_flows_into_review_console() {
    let repository = Arc::new(InMemoryApplicationRepository::new());
    let intake = MembershipApplicationService::new(repository.clone());

    let mut form = IntakeForm::new("nitrkl.ac.in");
    form.set(FormField::RollNumber, "122ec0777");
    assert_eq!(
        form.email_source(),
        &EmailAutofill::AutoDerived {
            roll_number: "122ec0777".to_string()
        }
    );
    form.set(FormField::Name, "Dev Kumar");
    form.set(FormField::Phone, "+91 7012345678");
    form.set(FormField::Role, "Others");
    form.set(FormField::OtherRole, "Violin");
    form.set(FormField::WhyRole, motivation(20));
    form.set(FormField::WhyHeartbeats, motivation(20));
    form.set(FormField::DemoLink, "http://example.com/violin");

    let profile = form.submit_attempt().expect("form is valid");
    assert_eq!(profile.email, "122ec0777@nitrkl.ac.in");
    let receipt = intake
        .submit_profile_at(profile, at(3, 9))
        .expect("submission stored");
    intake
        .submit_at(submission("121cs0001", "Asha Rao", "Guitar"), at(4, 9))
        .expect("second submission stored");

    let auth = Arc::new(authenticator());
    let token = auth
        .sign_in(ADMIN_EMAIL, ADMIN_PASSWORD)
        .expect("staff sign-in");
    let mut console = ReviewConsole::open(
        Arc::new(ReviewService::new(repository.clone())),
        auth.clone(),
        token,
    )
    .expect("console opens");
    console.refresh().expect("list loads");

    assert_eq!(console.applications()[0].profile.roll_number, "121CS0001");
    let violinist = console.find(&receipt.application_id).expect("listed");
    assert_eq!(violinist.profile.other_role, "Violin");

    console
        .set_status(&receipt.application_id, ApplicationStatus::Reviewed)
        .expect("status updated");
    let reviewed = ReviewFilter::new("", StatusFilter::Only(ApplicationStatus::Reviewed));
    assert_eq!(console.filtered(&reviewed).len(), 1);

    let pending = console
        .request_delete(&receipt.application_id)
        .expect("delete requested");
    console.confirm_delete(pending).expect("deleted");
    assert_eq!(console.summary().total, 1);
    assert_eq!(repository.list_recent().expect("list").len(), 1);

    console.sign_out();
    assert_eq!(
        intake
            .existing_application("122EC0777")
            .expect("lookup")
            .map(|record| record.id),
        None
    );
}

#[test]
fn json_store_keeps_applications_and_uniqueness_across_restarts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("applications.json");

    let receipt = {
        let repository = Arc::new(JsonFileApplicationRepository::open(&path).expect("open"));
        let intake = MembershipApplicationService::new(repository.clone());
        let receipt = intake
            .submit_at(submission("121cs0042", "Ira Sen", "Flute"), at(5, 12))
            .expect("stored");
        ReviewService::new(repository)
            .set_status_at(&receipt.application_id, ApplicationStatus::Accepted, at(6, 8))
            .expect("accepted");
        receipt
    };

    let repository = Arc::new(JsonFileApplicationRepository::open(&path).expect("reopen"));
    let record = repository
        .fetch(&receipt.application_id)
        .expect("fetch")
        .expect("persisted");
    assert_eq!(record.status, ApplicationStatus::Accepted);
    assert_eq!(record.updated_at, Some(at(6, 8)));

    let intake = MembershipApplicationService::new(repository);
    assert!(matches!(
        intake.submit(submission("121CS0042", "Ira Sen", "Flute")),
        Err(SubmissionError::AlreadyApplied { .. })
    ));
}

#[tokio::test]
async fn http_surface_supports_intake_and_review() {
    let repository = Arc::new(InMemoryApplicationRepository::new());
    let router = application_router(ApplicationState::new(
        repository.clone(),
        Arc::new(authenticator()),
    ));

    let created = router
        .clone()
        .oneshot(
            Request::post("/api/v1/applications")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&submission("121cs0500", "Neel Shah", "Bass")).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let signed_in = router
        .clone()
        .oneshot(
            Request::post("/api/v1/admin/session")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(signed_in.status(), StatusCode::OK);
    let body = axum::body::to_bytes(signed_in.into_body(), 16 * 1024)
        .await
        .unwrap();
    let token = serde_json::from_slice::<Value>(&body).unwrap()["token"]
        .as_str()
        .expect("token")
        .to_string();

    let listed = router
        .oneshot(
            Request::get("/api/v1/admin/applications?search=neel")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    let body = axum::body::to_bytes(listed.into_body(), 64 * 1024)
        .await
        .unwrap();
    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["matched"], 1);
    assert_eq!(payload["applications"][0]["role"], "Bass");
    assert_eq!(payload["applications"][0]["status"], "pending");
}
