use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub allow_booked_schedule_delete: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            allow_booked_schedule_delete: true,
        }
    }
}

impl TestConfig {
    /// Config pointed at a mock Supabase server, usually `MockServer::uri()`.
    pub fn with_base_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            allow_booked_schedule_delete: self.allow_booked_schedule_delete,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST row bodies for wiremock responses.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn account_response(account_id: &str) -> serde_json::Value {
        json!({
            "id": account_id,
            "username": "drjones",
            "email": "jones@example.com",
            "first_name": "Sarah",
            "last_name": "Jones",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_profile_response(profile_id: &str, account_id: &str) -> serde_json::Value {
        json!({
            "id": profile_id,
            "account_id": account_id,
            "licence_number": "TES12345",
            "city": "London",
            "hospital": "St. Mary's Hospital",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn specialty_response(specialty_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": specialty_id,
            "name": name
        })
    }

    pub fn schedule_response(
        schedule_id: &str,
        doctor_id: &str,
        date: &str,
        timeslot: u8,
        is_booked: bool,
    ) -> serde_json::Value {
        json!({
            "id": schedule_id,
            "doctor_id": doctor_id,
            "date": date,
            "timeslot": timeslot,
            "is_booked": is_booked,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        doctor_id: &str,
        schedule_id: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "doctor_id": doctor_id,
            "schedule_id": schedule_id,
            "first_name": "Alice",
            "last_name": "Brown",
            "email": "alice@example.com",
            "phone": "5550001111",
            "insurance_number": "INS-778899",
            "comments": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    /// PostgREST `select=count` responses come back as a one-element array.
    pub fn count_response(count: i64) -> serde_json::Value {
        json!([{ "count": count }])
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

/// Fresh UUID as the string form PostgREST rows carry.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(app_config.allow_booked_schedule_delete);
    }

    #[test]
    fn test_config_with_base_url() {
        let config = TestConfig::with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.supabase_url, "http://127.0.0.1:9999");
        assert_eq!(config.supabase_anon_key, "test-anon-key");
    }

    #[test]
    fn test_count_response_shape() {
        let body = MockSupabaseResponses::count_response(4);
        assert_eq!(body[0]["count"], 4);
    }
}
