//! Request extraction helpers

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Header carrying the calling practitioner's id.
pub const ACTOR_HEADER: &str = "x-practitioner-id";

/// Identity of the calling practitioner.
///
/// Authentication proper terminates in front of this service; the gateway
/// forwards the authenticated practitioner id in `x-practitioner-id` and
/// the header is trusted as-is. A missing or malformed header rejects the
/// request before any handler runs.
#[derive(Debug, Clone, Copy)]
pub struct ActorId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = crate::Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(crate::Error::Unauthenticated)?;
        let id = raw.parse::<Uuid>().map_err(|_| crate::Error::Unauthenticated)?;
        Ok(ActorId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<ActorId, crate::Error> {
        let mut builder = Request::builder().uri("/records");
        if let Some(value) = header {
            builder = builder.header(ACTOR_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        ActorId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_valid_practitioner_id() {
        let id = Uuid::new_v4();
        let actor = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(actor.0, id);
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        assert!(matches!(
            extract(None).await,
            Err(crate::Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        assert!(matches!(
            extract(Some("not-a-uuid")).await,
            Err(crate::Error::Unauthenticated)
        ));
    }
}
