use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};
use shared_database::ClinicStores;
use shared_models::auth::User;
use shared_models::{Doctor, Patient, ScheduleEntry, ScheduleRule};

use crate::clock::{Clock, FixedClock};
use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "clinic-test-jwt-secret-0123456789abcdef".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            store_backend: StoreBackend::Memory,
            bind_addr: ([127, 0, 0, 1], 0).into(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "patient@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn receptionist(email: &str) -> Self {
        Self::new(email, "receptionist")
    }

    pub fn nurse(email: &str) -> Self {
        Self::new(email, "nurse")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

/// Signs HS256 tokens shaped like the ones Supabase issues.
pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Token whose app role is `user.role`. `exp_hours` defaults to a day.
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let issued = Utc::now();
        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "app_metadata": { "role": user.role },
            "iat": issued.timestamp(),
            "exp": (issued + Duration::hours(exp_hours.unwrap_or(24))).timestamp()
        });

        Self::sign(&claims, secret)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "not-the-clinic-secret", None)
    }

    pub fn create_malformed_token() -> String {
        "not.a.jwt".to_string()
    }

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        let encode = |value: &serde_json::Value| general_purpose::URL_SAFE_NO_PAD.encode(value.to_string());
        let signing_input = format!("{}.{}", encode(&json!({"alg": "HS256", "typ": "JWT"})), encode(claims));

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(signing_input.as_bytes());

        format!(
            "{}.{}",
            signing_input,
            general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        )
    }
}

/// Monday 2030-01-07, 08:00. Far enough ahead that no fixture date is in the past.
pub fn default_now() -> NaiveDateTime {
    date(2030, 1, 7).and_time(time(8, 0))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid fixture time")
}

/// In-memory state with a controllable clock and directory seeding helpers.
pub struct TestContext {
    pub state: AppState,
    pub clock: Arc<FixedClock>,
    pub config: TestConfig,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::at(default_now())
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(now: NaiveDateTime) -> Self {
        let config = TestConfig::default();
        let clock = Arc::new(FixedClock::new(now));
        let state = AppState::with_parts(config.to_arc(), ClinicStores::in_memory(), clock.clone());
        Self { state, clock, config }
    }

    pub async fn seed_doctor(&self, user: &TestUser, first_name: &str, last_name: &str) -> Doctor {
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: user.id.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            specialization: Some("General Practice".to_string()),
            department_name: Some("Outpatients".to_string()),
        };
        self.state
            .stores
            .directory
            .insert_doctor(doctor)
            .await
            .expect("seed doctor")
    }

    pub async fn seed_patient(&self, user: Option<&TestUser>, first_name: &str, last_name: &str) -> Patient {
        let patient = Patient {
            id: Uuid::new_v4(),
            user_id: user.map(|u| u.id.clone()),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            patient_unique_id: Some(format!("PAT-{}", &Uuid::new_v4().simple().to_string()[..8])),
        };
        self.state
            .stores
            .directory
            .insert_patient(patient)
            .await
            .expect("seed patient")
    }

    pub async fn seed_weekly(
        &self,
        doctor_id: Uuid,
        day: Weekday,
        start: NaiveTime,
        end: NaiveTime,
        slot_minutes: i32,
    ) -> ScheduleEntry {
        self.seed_schedule(doctor_id, ScheduleRule::RecurringWeekly(day), start, end, slot_minutes, true)
            .await
    }

    pub async fn seed_schedule(
        &self,
        doctor_id: Uuid,
        rule: ScheduleRule,
        start: NaiveTime,
        end: NaiveTime,
        slot_minutes: i32,
        is_available: bool,
    ) -> ScheduleEntry {
        let now = self.clock.now();
        let entry = ScheduleEntry {
            id: Uuid::new_v4(),
            doctor_id,
            rule,
            start_time: start,
            end_time: end,
            slot_duration_minutes: slot_minutes,
            is_available,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.state
            .stores
            .schedules
            .insert_schedule(entry)
            .await
            .expect("seed schedule")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.store_backend, StoreBackend::Memory);
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        let user_model = user.to_user();

        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role, Some("doctor".to_string()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let token = JwtTestUtils::create_test_token(&TestUser::default(), "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }

    #[tokio::test]
    async fn context_seeds_directory_and_clock() {
        let ctx = TestContext::new();
        let doctor_user = TestUser::doctor("doc@example.com");
        let doctor = ctx.seed_doctor(&doctor_user, "Ada", "Okafor").await;

        let found = ctx
            .state
            .stores
            .directory
            .find_doctor_by_user(&doctor_user.id)
            .await
            .unwrap();

        assert_eq!(found.map(|d| d.id), Some(doctor.id));
        assert_eq!(ctx.state.clock.today(), date(2030, 1, 7));
        assert_eq!(ctx.state.clock.today().weekday(), Weekday::Mon);
    }
}
