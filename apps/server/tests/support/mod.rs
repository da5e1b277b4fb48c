//! Shared helpers for integration tests: an app over in-memory stores,
//! request plumbing and document fixtures.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use kurier::api::create_router;
use kurier::config::Config;
use kurier::db::{
    CommunicationStore, InMemoryCommunicationStore, InMemoryPractitionerDirectory,
    InMemoryRecordStore, PractitionerDirectory, RecordStore,
};
use kurier::models::Practitioner;
use kurier::state::AppState;

pub use kurier::api::extract::ACTOR_HEADER;

/// A fully wired application over in-memory stores, with one seeded
/// practitioner acting as the default caller and a second one for
/// isolation checks.
pub struct TestApp {
    pub state: AppState,
    pub router: axum::Router,
    pub practitioner: Practitioner,
    pub second_practitioner: Practitioner,
    pub records_store: Arc<InMemoryRecordStore>,
    pub communications_store: Arc<InMemoryCommunicationStore>,
    pub practitioners_store: Arc<InMemoryPractitionerDirectory>,
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        // Port 9 refuses connections immediately, so a test that reaches
        // the registry by accident fails fast instead of calling out.
        Self::with_registry("http://127.0.0.1:9", 15).await
    }

    pub async fn with_registry(base_url: &str, timeout_seconds: u64) -> anyhow::Result<Self> {
        let mut config = Config::default();
        config.registry.base_url = base_url.to_string();
        config.registry.timeout_seconds = timeout_seconds;

        let records_store = Arc::new(InMemoryRecordStore::new());
        let communications_store = Arc::new(InMemoryCommunicationStore::new());
        let practitioners_store = Arc::new(InMemoryPractitionerDirectory::new());

        let practitioner = sample_practitioner("Greta Hausmann", "greta.hausmann@clinic.example");
        let second_practitioner = sample_practitioner("Jon Idris", "jon.idris@clinic.example");
        practitioners_store.insert(practitioner.clone());
        practitioners_store.insert(second_practitioner.clone());

        let records: Arc<dyn RecordStore> = records_store.clone();
        let communications: Arc<dyn CommunicationStore> = communications_store.clone();
        let practitioners: Arc<dyn PractitionerDirectory> = practitioners_store.clone();
        let state = AppState::with_stores(Arc::new(config), records, communications, practitioners)?;
        let router = create_router(state.clone());

        Ok(Self {
            state,
            router,
            practitioner,
            second_practitioner,
            records_store,
            communications_store,
            practitioners_store,
        })
    }

    /// Issues a request as the default seeded practitioner.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_as(Some(self.practitioner.id), method, path, body)
            .await
    }

    /// Issues a request with an explicit (or absent) caller identity.
    pub async fn request_as(
        &self,
        actor: Option<Uuid>,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(actor) = actor {
            builder = builder.header(ACTOR_HEADER, actor.to_string());
        }
        let request = match body {
            Some(bytes) => builder
                .header("content-type", "application/json")
                .body(Body::from(bytes))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, body))
    }
}

pub async fn with_test_app<F>(test: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(
        &'a TestApp,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>,
{
    let app = TestApp::new().await?;
    test(&app).await
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "unexpected status for {context}");
}

pub fn to_json_body(value: &Value) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

pub fn parse_json(body: &[u8]) -> anyhow::Result<Value> {
    Ok(serde_json::from_slice(body)?)
}

fn sample_practitioner(name: &str, email: &str) -> Practitioner {
    Practitioner {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        organization: "Clinic Example".to_string(),
    }
}

/// A patient with an id and a telecom email, the richest shape the
/// assembler and the ingestion path both care about.
pub fn minimal_patient() -> Value {
    json!({
        "resourceType": "Patient",
        "id": "pat-1",
        "name": [{"family": "Muster", "given": ["Anna"]}],
        "telecom": [{"system": "email", "value": "anna.muster@example.org"}]
    })
}

/// A create-record request body covering every slot of the record graph.
pub fn full_record_body(subject_email: &str) -> Value {
    json!({
        "subjectEmail": subject_email,
        "patient": minimal_patient(),
        "encounter": {"resourceType": "Encounter", "id": "enc-1", "status": "finished"},
        "condition": {
            "resourceType": "Condition",
            "id": "cond-1",
            "code": {"text": "Hypertension"}
        },
        "procedure": {
            "resourceType": "Procedure",
            "id": "proc-1",
            "status": "completed"
        },
        "allergies": [{
            "resourceType": "AllergyIntolerance",
            "id": "all-1",
            "code": {"text": "Penicillin"}
        }],
        "observations": [{
            "resourceType": "Observation",
            "id": "obs-1",
            "status": "final",
            "code": {"text": "Blood pressure"}
        }],
        "medications": [{
            "resourceType": "MedicationRequest",
            "id": "med-1",
            "status": "active"
        }]
    })
}

/// A well-formed inbound transaction document.
pub fn inbound_bundle() -> Value {
    json!({
        "resourceType": "Bundle",
        "type": "transaction",
        "entry": [
            {
                "fullUrl": "urn:uuid:11111111-1111-4111-8111-111111111111",
                "resource": {
                    "resourceType": "Patient",
                    "name": [{"family": "Besucher", "given": ["Bert"]}],
                    "telecom": [{"system": "email", "value": "bert.besucher@example.org"}]
                },
                "request": {"method": "POST", "url": "Patient"}
            },
            {
                "fullUrl": "urn:uuid:22222222-2222-4222-8222-222222222222",
                "resource": {
                    "resourceType": "Observation",
                    "status": "final",
                    "code": {"text": "Heart rate"},
                    "subject": {"reference": "urn:uuid:11111111-1111-4111-8111-111111111111"}
                },
                "request": {"method": "POST", "url": "Observation"}
            }
        ]
    })
}

/// A receive-endpoint body addressed to the given local practitioner.
pub fn receive_body(recipient_email: &str, document: Value) -> Value {
    json!({
        "counterpartyEmail": recipient_email,
        "counterpartyName": "St. Elsewhere",
        "document": document
    })
}

/// Creates a record through the API and returns its id.
pub async fn seed_record(app: &TestApp, subject_email: &str) -> anyhow::Result<Uuid> {
    let (status, _headers, body) = app
        .request(
            Method::POST,
            "/records",
            Some(to_json_body(&full_record_body(subject_email))?),
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "create record");
    let created = parse_json(&body)?;
    let id = created["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("created record has no id"))?;
    Ok(id.parse()?)
}

/// Accepts one inbound document through the API and returns the pending
/// communication's id.
pub async fn seed_incoming(app: &TestApp, document: Value) -> anyhow::Result<Uuid> {
    let (status, _headers, body) = app
        .request_as(
            None,
            Method::POST,
            "/communications/receive",
            Some(to_json_body(&receive_body(&app.practitioner.email, document))?),
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "receive communication");
    let created = parse_json(&body)?;
    let id = created["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("accepted communication has no id"))?;
    Ok(id.parse()?)
}
