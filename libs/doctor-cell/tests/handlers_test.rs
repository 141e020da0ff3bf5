use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assert_matches::assert_matches;
use doctor_cell::handlers;
use doctor_cell::models::{RegisterDoctorRequest, UpdateDoctorRequest};
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn test_state(mock_server: &MockServer) -> Arc<AppConfig> {
    TestConfig::with_base_url(&mock_server.uri()).to_arc()
}

fn sample_registration(specialty_ids: Vec<Uuid>) -> RegisterDoctorRequest {
    RegisterDoctorRequest {
        username: "drjones".to_string(),
        email: "jones@example.com".to_string(),
        first_name: "Sarah".to_string(),
        last_name: "Jones".to_string(),
        licence_number: "TES12345".to_string(),
        city: "London".to_string(),
        hospital: "St. Mary's Hospital".to_string(),
        specialty_ids,
    }
}

async fn mock_specialty_lookup(mock_server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

async fn mock_account_insert(mock_server: &MockServer, account_id: Uuid) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/accounts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::account_response(&account_id.to_string())
        ])))
        .mount(mock_server)
        .await;
}

// ==============================================================================
// REGISTRATION
// ==============================================================================

#[tokio::test]
async fn test_register_doctor_success() {
    let mock_server = MockServer::start().await;
    let account_id = Uuid::new_v4();
    let profile_id = Uuid::new_v4();
    let specialty_id = Uuid::new_v4();

    mock_specialty_lookup(
        &mock_server,
        json!([MockSupabaseResponses::specialty_response(
            &specialty_id.to_string(),
            "Cardiology"
        )]),
    )
    .await;
    mock_account_insert(&mock_server, account_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_profiles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::doctor_profile_response(
                &profile_id.to_string(),
                &account_id.to_string(),
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_specialties"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let result = handlers::register_doctor(
        State(test_state(&mock_server)),
        Json(sample_registration(vec![specialty_id])),
    )
    .await;

    let (status, Json(body)) = result.expect("registration should succeed");
    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["doctor"]["profile"]["id"], profile_id.to_string());
    assert_eq!(body["doctor"]["account"]["id"], account_id.to_string());
    assert_eq!(body["doctor"]["specialties"][0]["name"], "Cardiology");
}

#[tokio::test]
async fn test_register_doctor_duplicate_licence_discards_account() {
    let mock_server = MockServer::start().await;
    let account_id = Uuid::new_v4();

    mock_account_insert(&mock_server, account_id).await;

    // Unique licence_number violation on the profile insert.
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_profiles"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response(
                "duplicate key value violates unique constraint",
                "23505",
            ),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("id", format!("eq.{}", account_id)))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let result = handlers::register_doctor(
        State(test_state(&mock_server)),
        Json(sample_registration(Vec::new())),
    )
    .await;

    assert_matches!(result, Err(AppError::Conflict(_)));

    // The half-created account row was taken back out.
    let requests = mock_server.received_requests().await.unwrap();
    let account_deletes = requests
        .iter()
        .filter(|r| r.method.as_str() == "DELETE" && r.url.path() == "/rest/v1/accounts")
        .count();
    assert_eq!(account_deletes, 1);
}

#[tokio::test]
async fn test_register_doctor_unknown_specialty_writes_nothing() {
    let mock_server = MockServer::start().await;

    // One of the two requested specialties does not exist.
    let known_id = Uuid::new_v4();
    mock_specialty_lookup(
        &mock_server,
        json!([MockSupabaseResponses::specialty_response(
            &known_id.to_string(),
            "Dermatology"
        )]),
    )
    .await;

    let result = handlers::register_doctor(
        State(test_state(&mock_server)),
        Json(sample_registration(vec![known_id, Uuid::new_v4()])),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(_)));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_register_doctor_rejects_blank_fields() {
    let mock_server = MockServer::start().await;

    let mut request = sample_registration(Vec::new());
    request.licence_number = "  ".to_string();

    let result =
        handlers::register_doctor(State(test_state(&mock_server)), Json(request)).await;

    assert_matches!(result, Err(AppError::BadRequest(_)));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

// ==============================================================================
// LOOKUP AND UPDATE
// ==============================================================================

async fn mock_doctor_assembly(
    mock_server: &MockServer,
    profile_id: Uuid,
    account_id: Uuid,
    specialty_id: Uuid,
) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("id", format!("eq.{}", profile_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_profile_response(
                &profile_id.to_string(),
                &account_id.to_string(),
            )
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("id", format!("eq.{}", account_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::account_response(&account_id.to_string())
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_specialties"))
        .and(query_param("doctor_id", format!("eq.{}", profile_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "specialty_id": specialty_id.to_string() }])),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::specialty_response(&specialty_id.to_string(), "Neurology")
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_get_doctor_assembles_profile_account_and_specialties() {
    let mock_server = MockServer::start().await;
    let profile_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let specialty_id = Uuid::new_v4();

    mock_doctor_assembly(&mock_server, profile_id, account_id, specialty_id).await;

    let result = handlers::get_doctor(State(test_state(&mock_server)), Path(profile_id)).await;

    let Json(body) = result.expect("lookup should succeed");
    assert_eq!(body["doctor"]["profile"]["licence_number"], "TES12345");
    assert_eq!(body["doctor"]["account"]["username"], "drjones");
    assert_eq!(body["doctor"]["specialties"][0]["name"], "Neurology");
}

#[tokio::test]
async fn test_get_doctor_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result =
        handlers::get_doctor(State(test_state(&mock_server)), Path(Uuid::new_v4())).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_doctor_patches_profile_fields() {
    let mock_server = MockServer::start().await;
    let profile_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let specialty_id = Uuid::new_v4();

    mock_doctor_assembly(&mock_server, profile_id, account_id, specialty_id).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("id", format!("eq.{}", profile_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_profile_response(
                &profile_id.to_string(),
                &account_id.to_string(),
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = UpdateDoctorRequest {
        city: Some("Manchester".to_string()),
        ..Default::default()
    };

    let result = handlers::update_doctor(
        State(test_state(&mock_server)),
        Path(profile_id),
        Json(request),
    )
    .await;

    let Json(body) = result.expect("update should succeed");
    assert!(body["success"].as_bool().unwrap());

    // The patch body carried the new city and a refreshed updated_at.
    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|r| r.method.as_str() == "PATCH")
        .expect("profile patch sent");
    let patch_body: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(patch_body["city"], "Manchester");
    assert!(patch_body.get("updated_at").is_some());
    assert!(patch_body.get("licence_number").is_none());
}

#[tokio::test]
async fn test_update_doctor_replaces_specialty_links() {
    let mock_server = MockServer::start().await;
    let profile_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let specialty_id = Uuid::new_v4();

    mock_doctor_assembly(&mock_server, profile_id, account_id, specialty_id).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_specialties"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_specialties"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let request = UpdateDoctorRequest {
        specialty_ids: Some(vec![specialty_id]),
        ..Default::default()
    };

    let result = handlers::update_doctor(
        State(test_state(&mock_server)),
        Path(profile_id),
        Json(request),
    )
    .await;

    result.expect("update should succeed");

    // Old links go out before the new set goes in.
    let requests = mock_server.received_requests().await.unwrap();
    let link_ops: Vec<&str> = requests
        .iter()
        .filter(|r| r.url.path() == "/rest/v1/doctor_specialties")
        .map(|r| r.method.as_str())
        .filter(|m| *m != "GET")
        .collect();
    assert_eq!(link_ops, vec!["DELETE", "POST"]);
}

#[tokio::test]
async fn test_update_doctor_licence_conflict() {
    let mock_server = MockServer::start().await;
    let profile_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();
    let specialty_id = Uuid::new_v4();

    mock_doctor_assembly(&mock_server, profile_id, account_id, specialty_id).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_profiles"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response(
                "duplicate key value violates unique constraint",
                "23505",
            ),
        ))
        .mount(&mock_server)
        .await;

    let request = UpdateDoctorRequest {
        licence_number: Some("TES99999".to_string()),
        ..Default::default()
    };

    let result = handlers::update_doctor(
        State(test_state(&mock_server)),
        Path(profile_id),
        Json(request),
    )
    .await;

    assert_matches!(result, Err(AppError::Conflict(_)));
}

// ==============================================================================
// DELETION CASCADE
// ==============================================================================

#[tokio::test]
async fn test_delete_doctor_cascades_dependents_first() {
    let mock_server = MockServer::start().await;
    let profile_id = Uuid::new_v4();
    let account_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .and(query_param("id", format!("eq.{}", profile_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_profile_response(
                &profile_id.to_string(),
                &account_id.to_string(),
            )
        ])))
        .mount(&mock_server)
        .await;

    for table in [
        "appointments",
        "doctor_schedules",
        "doctor_specialties",
        "doctor_profiles",
        "accounts",
    ] {
        Mock::given(method("DELETE"))
            .and(path(format!("/rest/v1/{}", table)))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;
    }

    let result =
        handlers::delete_doctor(State(test_state(&mock_server)), Path(profile_id)).await;

    let Json(body) = result.expect("deletion should succeed");
    assert!(body["success"].as_bool().unwrap());

    // Rows leave in dependency order, ledger rows first and the identity row
    // last.
    let requests = mock_server.received_requests().await.unwrap();
    let delete_paths: Vec<&str> = requests
        .iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .map(|r| r.url.path())
        .collect();
    assert_eq!(
        delete_paths,
        vec![
            "/rest/v1/appointments",
            "/rest/v1/doctor_schedules",
            "/rest/v1/doctor_specialties",
            "/rest/v1/doctor_profiles",
            "/rest/v1/accounts",
        ]
    );
}

#[tokio::test]
async fn test_delete_doctor_not_found_removes_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result =
        handlers::delete_doctor(State(test_state(&mock_server)), Path(Uuid::new_v4())).await;

    assert_matches!(result, Err(AppError::NotFound(_)));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "DELETE"));
}
