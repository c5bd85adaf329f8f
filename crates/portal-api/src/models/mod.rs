//! Portal API models.
//!
//! Row types map 1:1 to the tables in `migrations/` and are serialized
//! directly as response bodies. Request bodies use a single-key envelope
//! named after the resource (`{"task": {...}}`); every field inside is
//! optional so the same params type serves create and partial update.
//!
//! Ownership (`uid`) is never accepted from clients and never serialized.

use chrono::{DateTime, NaiveDate, Utc};
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

// ============================================================================
// Probes
// ============================================================================

/// Returned by `GET /ready`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    pub database: &'static str,
}

/// Returned by `GET /api/v1/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub uid: String,
}

// ============================================================================
// Validation helpers
// ============================================================================

/// Presence rules shared by every resource.
///
/// On create a required field must be present and, for text, non-blank.
/// On update absent fields are left untouched, but a present text field
/// must still be non-blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_text(
    errors: &mut Vec<&'static str>,
    mode: WriteMode,
    value: Option<&str>,
    message: &'static str,
) {
    let failed = match (mode, value) {
        (_, Some(v)) => is_blank(v),
        (WriteMode::Create, None) => true,
        (WriteMode::Update, None) => false,
    };
    if failed {
        errors.push(message);
    }
}

fn check_value<T>(
    errors: &mut Vec<&'static str>,
    mode: WriteMode,
    value: Option<&T>,
    message: &'static str,
) {
    if mode == WriteMode::Create && value.is_none() {
        errors.push(message);
    }
}

fn finish(errors: Vec<&'static str>) -> Result<(), Vec<&'static str>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub dead_line: Option<NaiveDate>,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub dead_line: Option<NaiveDate>,
    pub is_complete: Option<bool>,
}

impl TaskParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_text(&mut errors, mode, self.title.as_deref(), "Title can't be blank");
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskEnvelope {
    pub task: TaskParams,
}

// ============================================================================
// Task lists
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskListRow {
    pub id: Uuid,
    pub name: String,
    pub seq: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub name: Option<String>,
    pub seq: Option<i32>,
}

impl TaskListParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_text(&mut errors, mode, self.name.as_deref(), "Name can't be blank");
        check_value(&mut errors, mode, self.seq.as_ref(), "Seq can't be blank");
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskListEnvelope {
    pub task_list: TaskListParams,
}

// ============================================================================
// Cars
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CarRow {
    pub id: Uuid,
    pub name: String,
    pub seq: i32,
    pub maker: String,
    pub model: String,
    pub model_year: i32,
    pub license_plate: String,
    pub tank_capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarParams {
    pub name: Option<String>,
    pub seq: Option<i32>,
    pub maker: Option<String>,
    pub model: Option<String>,
    pub model_year: Option<i32>,
    pub license_plate: Option<String>,
    pub tank_capacity: Option<i32>,
}

impl CarParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_text(&mut errors, mode, self.name.as_deref(), "Name can't be blank");
        check_value(&mut errors, mode, self.seq.as_ref(), "Seq can't be blank");
        check_text(&mut errors, mode, self.maker.as_deref(), "Maker can't be blank");
        check_text(&mut errors, mode, self.model.as_deref(), "Model can't be blank");
        check_value(
            &mut errors,
            mode,
            self.model_year.as_ref(),
            "Model year can't be blank",
        );
        check_text(
            &mut errors,
            mode,
            self.license_plate.as_deref(),
            "License plate can't be blank",
        );
        check_value(
            &mut errors,
            mode,
            self.tank_capacity.as_ref(),
            "Tank capacity can't be blank",
        );
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarEnvelope {
    pub car: CarParams,
}

// ============================================================================
// Refuelings
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RefuelingRow {
    pub id: Uuid,
    pub car_id: Uuid,
    pub refuel_datetime: DateTime<Utc>,
    pub odometer: i32,
    pub fuel_type: String,
    pub price: i32,
    pub total_cost: i32,
    pub is_full: bool,
    pub gas_stand: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The parent car comes from the path, never from the body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefuelingParams {
    pub refuel_datetime: Option<DateTime<Utc>>,
    pub odometer: Option<i32>,
    pub fuel_type: Option<String>,
    pub price: Option<i32>,
    pub total_cost: Option<i32>,
    pub is_full: Option<bool>,
    pub gas_stand: Option<String>,
}

impl RefuelingParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_value(
            &mut errors,
            mode,
            self.refuel_datetime.as_ref(),
            "Refuel datetime can't be blank",
        );
        check_value(&mut errors, mode, self.odometer.as_ref(), "Odometer can't be blank");
        check_text(
            &mut errors,
            mode,
            self.fuel_type.as_deref(),
            "Fuel type can't be blank",
        );
        check_value(&mut errors, mode, self.price.as_ref(), "Price can't be blank");
        check_value(
            &mut errors,
            mode,
            self.total_cost.as_ref(),
            "Total cost can't be blank",
        );
        check_value(&mut errors, mode, self.is_full.as_ref(), "Is full can't be blank");
        check_text(
            &mut errors,
            mode,
            self.gas_stand.as_deref(),
            "Gas stand can't be blank",
        );
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefuelingEnvelope {
    pub refueling: RefuelingParams,
}

// ============================================================================
// Notes
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub name: String,
    pub seq: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteParams {
    pub name: Option<String>,
    pub seq: Option<i32>,
}

impl NoteParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_text(&mut errors, mode, self.name.as_deref(), "Name can't be blank");
        check_value(&mut errors, mode, self.seq.as_ref(), "Seq can't be blank");
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteEnvelope {
    pub note: NoteParams,
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SectionRow {
    pub id: Uuid,
    pub note_id: Uuid,
    pub name: String,
    pub seq: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The parent note comes from the path, never from the body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionParams {
    pub name: Option<String>,
    pub seq: Option<i32>,
}

impl SectionParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_text(&mut errors, mode, self.name.as_deref(), "Name can't be blank");
        check_value(&mut errors, mode, self.seq.as_ref(), "Seq can't be blank");
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionEnvelope {
    pub section: SectionParams,
}

// ============================================================================
// Pages
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PageRow {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub content: String,
    pub seq: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub title: Option<String>,
    pub content: Option<String>,
    pub seq: Option<i32>,
}

impl PageParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_text(&mut errors, mode, self.title.as_deref(), "Title can't be blank");
        check_text(
            &mut errors,
            mode,
            self.content.as_deref(),
            "Content can't be blank",
        );
        check_value(&mut errors, mode, self.seq.as_ref(), "Seq can't be blank");
        finish(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope {
    pub page: PageParams,
}

// ============================================================================
// Confidentials
// ============================================================================

/// A stored service credential.
///
/// `password` is returned to its owner in the response body but is redacted
/// in Debug output, so it never reaches the logs.
#[derive(Debug, Clone, Serialize)]
pub struct ConfidentialRow {
    pub id: Uuid,
    pub service_name: String,
    pub login_id: String,
    #[serde(serialize_with = "expose_optional_secret")]
    pub password: Option<SecretString>,
    pub other: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// sqlx has no decoder for `SecretString`.
impl<'r> sqlx::FromRow<'r, PgRow> for ConfidentialRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            service_name: row.try_get("service_name")?,
            login_id: row.try_get("login_id")?,
            password: row
                .try_get::<Option<String>, _>("password")?
                .map(SecretString::from),
            other: row.try_get("other")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn expose_optional_secret<S: Serializer>(
    value: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfidentialParams {
    pub service_name: Option<String>,
    pub login_id: Option<String>,
    pub password: Option<SecretString>,
    pub other: Option<String>,
}

impl ConfidentialParams {
    /// # Errors
    ///
    /// Returns one message per failing field.
    pub fn validate(&self, mode: WriteMode) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        check_text(
            &mut errors,
            mode,
            self.service_name.as_deref(),
            "Service name can't be blank",
        );
        check_text(
            &mut errors,
            mode,
            self.login_id.as_deref(),
            "Login can't be blank",
        );
        finish(errors)
    }

    /// The password as bound into a query.
    pub(crate) fn exposed_password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.expose_secret())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfidentialEnvelope {
    pub confidential: ConfidentialParams,
}
