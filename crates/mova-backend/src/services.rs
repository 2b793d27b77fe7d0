//! Auth, geocoding, routing and recommendation collaborators.
//!
//! These are interfaces only: session lifecycle, map tiles and the LLM call
//! live outside the sync core. Null implementations are provided for tests
//! and for running without the external services configured.

use mova_core::{GeoPoint, Role, UserId, UserProfile};

use crate::datastore::BoxFuture;
use crate::error::AuthError;

/// The current actor's identity as the auth provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
}

/// Current-session lookup. Sign-in/out flows are external.
pub trait AuthService: Send + Sync {
    /// The active session, or an error that forces the logged-out view.
    fn current_session(&self) -> BoxFuture<'_, Result<Session, AuthError>>;
}

/// Fixed-identity auth for tests and local mode.
pub struct StaticAuth {
    session: Option<Session>,
}

impl StaticAuth {
    pub fn signed_in(user_id: UserId, role: Role) -> Self {
        Self {
            session: Some(Session { user_id, role }),
        }
    }

    pub fn signed_out() -> Self {
        Self { session: None }
    }
}

impl AuthService for StaticAuth {
    fn current_session(&self) -> BoxFuture<'_, Result<Session, AuthError>> {
        let result = self.session.clone().ok_or(AuthError::NotSignedIn);
        Box::pin(async move { result })
    }
}

/// Route geometry and cost between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Vec<GeoPoint>,
}

/// Address to coordinate lookup.
pub trait GeocodingService: Send + Sync {
    /// Resolve an address; `None` when the geocoder has no answer.
    fn geocode(&self, address: &str) -> BoxFuture<'_, Option<GeoPoint>>;

    /// Reverse lookup; `None` when the point resolves to nothing useful.
    fn reverse(&self, point: GeoPoint) -> BoxFuture<'_, Option<String>>;
}

/// Route computation between two geo-points.
pub trait RoutingService: Send + Sync {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> BoxFuture<'_, Option<RouteSummary>>;
}

/// Free-text "smart search" over the executor roster.
///
/// Best effort by contract: every failure degrades silently to `None`.
pub trait RecommendationService: Send + Sync {
    fn recommend(&self, query: &str, executors: &[UserProfile]) -> BoxFuture<'_, Option<String>>;
}

/// Geocoder/router that never resolves anything.
#[derive(Debug, Default)]
pub struct NullGeocoder;

impl GeocodingService for NullGeocoder {
    fn geocode(&self, _address: &str) -> BoxFuture<'_, Option<GeoPoint>> {
        Box::pin(async { None })
    }

    fn reverse(&self, _point: GeoPoint) -> BoxFuture<'_, Option<String>> {
        Box::pin(async { None })
    }
}

impl RoutingService for NullGeocoder {
    fn route(&self, _from: GeoPoint, _to: GeoPoint) -> BoxFuture<'_, Option<RouteSummary>> {
        Box::pin(async { None })
    }
}

/// Recommender that always degrades to no recommendation.
#[derive(Debug, Default)]
pub struct NullRecommender;

impl RecommendationService for NullRecommender {
    fn recommend(&self, _query: &str, _executors: &[UserProfile]) -> BoxFuture<'_, Option<String>> {
        Box::pin(async { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_auth_signed_in() {
        let auth = StaticAuth::signed_in(UserId::from("u1"), Role::Customer);
        let session = auth.current_session().await.unwrap();
        assert_eq!(session.user_id, UserId::from("u1"));
        assert_eq!(session.role, Role::Customer);
    }

    #[tokio::test]
    async fn test_static_auth_signed_out() {
        let auth = StaticAuth::signed_out();
        assert!(matches!(
            auth.current_session().await,
            Err(AuthError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_null_recommender_degrades_silently() {
        let recommender = NullRecommender;
        assert_eq!(recommender.recommend("wheelchair van", &[]).await, None);
    }
}
