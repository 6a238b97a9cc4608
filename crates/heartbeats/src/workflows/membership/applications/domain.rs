use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review state of an application. Staff may move between any two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Pending, Self::Reviewed, Self::Accepted, Self::Rejected]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
    }
}

/// Positions the band recruits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRole {
    Vocalist,
    Drums,
    Guitar,
    Bass,
    Keyboard,
    Tabla,
    Flute,
    Manager,
    Photographer,
    Videographer,
    #[serde(rename = "Photo-Video Editor")]
    PhotoVideoEditor,
    Others,
}

impl MemberRole {
    pub const fn ordered() -> [Self; 12] {
        [
            Self::Vocalist,
            Self::Drums,
            Self::Guitar,
            Self::Bass,
            Self::Keyboard,
            Self::Tabla,
            Self::Flute,
            Self::Manager,
            Self::Photographer,
            Self::Videographer,
            Self::PhotoVideoEditor,
            Self::Others,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vocalist => "Vocalist",
            Self::Drums => "Drums",
            Self::Guitar => "Guitar",
            Self::Bass => "Bass",
            Self::Keyboard => "Keyboard",
            Self::Tabla => "Tabla",
            Self::Flute => "Flute",
            Self::Manager => "Manager",
            Self::Photographer => "Photographer",
            Self::Videographer => "Videographer",
            Self::PhotoVideoEditor => "Photo-Video Editor",
            Self::Others => "Others",
        }
    }

    /// Exact match against the labels offered by the form.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|role| role.label() == value)
    }

    pub const fn requires_description(self) -> bool {
        matches!(self, Self::Others)
    }
}

/// Fields of the public application form, keyed the way the form names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    RollNumber,
    Name,
    Email,
    Phone,
    Role,
    OtherRole,
    WhyRole,
    WhyHeartbeats,
    DemoLink,
}

impl FormField {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::RollNumber,
            Self::Name,
            Self::Email,
            Self::Phone,
            Self::Role,
            Self::OtherRole,
            Self::WhyRole,
            Self::WhyHeartbeats,
            Self::DemoLink,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::RollNumber => "rollNumber",
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Role => "role",
            Self::OtherRole => "otherRole",
            Self::WhyRole => "whyRole",
            Self::WhyHeartbeats => "whyHeartbeats",
            Self::DemoLink => "demoLink",
        }
    }
}

/// Raw form input exactly as the candidate typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationSubmission {
    pub roll_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub other_role: String,
    pub why_role: String,
    pub why_heartbeats: String,
    pub demo_link: String,
}

impl ApplicationSubmission {
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::RollNumber => &self.roll_number,
            FormField::Name => &self.name,
            FormField::Email => &self.email,
            FormField::Phone => &self.phone,
            FormField::Role => &self.role,
            FormField::OtherRole => &self.other_role,
            FormField::WhyRole => &self.why_role,
            FormField::WhyHeartbeats => &self.why_heartbeats,
            FormField::DemoLink => &self.demo_link,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::RollNumber => self.roll_number = value,
            FormField::Name => self.name = value,
            FormField::Email => self.email = value,
            FormField::Phone => self.phone = value,
            FormField::Role => self.role = value,
            FormField::OtherRole => self.other_role = value,
            FormField::WhyRole => self.why_role = value,
            FormField::WhyHeartbeats => self.why_heartbeats = value,
            FormField::DemoLink => self.demo_link = value,
        }
    }
}

/// Validated, normalized applicant data ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    /// Uppercase roll number; the uniqueness key.
    pub roll_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: MemberRole,
    /// Empty unless `role` is `Others`.
    pub other_role: String,
    pub why_role: String,
    pub why_heartbeats: String,
    pub demo_link: String,
}

/// Stored application document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    #[serde(flatten)]
    pub profile: ApplicantProfile,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Normalize a roll number into its stored form.
pub fn normalize_roll_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}
