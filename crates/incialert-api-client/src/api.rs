//! Domain methods for the Inci-Alert API client.
//!
//! Incident and stats reads are public. Mutations of existing incidents and
//! everything under `/auth/profile` send the session token. Register and login
//! store the returned token before handing the response back.

use incialert_core::models::{
    AuthResponse, CategoryStats, Credentials, ForgotPasswordRequest, Incident, IncidentQuery,
    IncidentUpdate, LocationStats, MessageResponse, NewIncident, OverviewStats, ProfileResponse,
    ProfileUpdate, RegisterRequest, ResetPasswordRequest, TimelinePeriod, TimelineStats, User,
};

use crate::error::ClientResult;
use crate::media::{incident_form, MediaUpload};
use crate::{Access, ApiClient};

impl ApiClient {
    // Incidents

    /// List incidents with optional filters and pagination.
    pub async fn get_incidents(&self, query: &IncidentQuery) -> ClientResult<Vec<Incident>> {
        self.get("/incidents", &query.to_pairs(), Access::Public)
            .await
    }

    pub async fn get_incident(&self, id: i64) -> ClientResult<Incident> {
        self.get(&format!("/incidents/{}", id), &[], Access::Public)
            .await
    }

    /// Create an incident from a JSON body.
    pub async fn create_incident(&self, data: &NewIncident) -> ClientResult<Incident> {
        self.post_json("/incidents", data, Access::Public).await
    }

    /// Create an incident, as multipart form data when media accompanies it and as
    /// plain JSON when `media` is empty.
    pub async fn create_incident_with_media(
        &self,
        data: &NewIncident,
        media: Vec<MediaUpload>,
    ) -> ClientResult<Incident> {
        if media.is_empty() {
            return self.create_incident(data).await;
        }
        tracing::debug!(files = media.len(), "Encoding incident report as multipart");
        let form = incident_form(data, media)?;
        self.post_multipart("/incidents", form, Access::Public)
            .await
    }

    pub async fn update_incident(&self, id: i64, data: &IncidentUpdate) -> ClientResult<Incident> {
        self.put_json(&format!("/incidents/{}", id), data, Access::Authenticated)
            .await
    }

    pub async fn delete_incident(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/incidents/{}", id), Access::Authenticated)
            .await
    }

    // Authentication

    /// Register an account. On success the returned token becomes the session token.
    pub async fn register(&self, data: &RegisterRequest) -> ClientResult<AuthResponse> {
        let response: AuthResponse = self
            .post_json("/auth/register", data, Access::Public)
            .await?;
        self.set_token(&response.access_token);
        tracing::info!(username = %response.user.username, "Registered and signed in");
        Ok(response)
    }

    /// Log in. On success the returned token becomes the session token.
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<AuthResponse> {
        let response: AuthResponse = self
            .post_json("/auth/login", credentials, Access::Public)
            .await?;
        self.set_token(&response.access_token);
        tracing::info!(username = %response.user.username, "Signed in");
        Ok(response)
    }

    /// Log out. The local token is cleared whatever the outcome; the server's
    /// answer is ignored and only a transport failure is reported.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.post_empty("/auth/logout", Access::Authenticated).await;
        self.clear_token();
        match result {
            Err(crate::ClientError::Api { status, .. }) => {
                tracing::debug!(status, "Server rejected logout; local session cleared anyway");
                Ok(())
            }
            other => other,
        }
    }

    pub async fn get_profile(&self) -> ClientResult<ProfileResponse> {
        self.get("/auth/profile", &[], Access::Authenticated).await
    }

    pub async fn update_profile(&self, data: &ProfileUpdate) -> ClientResult<ProfileResponse> {
        self.put_json("/auth/profile", data, Access::Authenticated)
            .await
    }

    pub async fn request_password_reset(&self, email: &str) -> ClientResult<MessageResponse> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.post_json("/auth/forgot-password", &body, Access::Public)
            .await
    }

    pub async fn reset_password(
        &self,
        data: &ResetPasswordRequest,
    ) -> ClientResult<MessageResponse> {
        self.post_json("/auth/reset-password", data, Access::Public)
            .await
    }

    /// The signed-in user, or `None`.
    ///
    /// Without a persisted token nothing is requested. When the profile fetch
    /// fails for any reason the token is treated as invalid and cleared.
    pub async fn current_user(&self) -> Option<User> {
        if !self.is_authenticated() {
            return None;
        }
        match self.get_profile().await {
            Ok(profile) => Some(profile.user),
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed; clearing session");
                self.clear_token();
                None
            }
        }
    }

    // Statistics

    pub async fn get_overview_stats(&self) -> ClientResult<OverviewStats> {
        self.get("/stats/overview", &[], Access::Public).await
    }

    pub async fn get_category_stats(&self, days: Option<u32>) -> ClientResult<CategoryStats> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(d) = days {
            query.push(("days", d.to_string()));
        }
        self.get("/stats/category", &query, Access::Public).await
    }

    pub async fn get_location_stats(&self) -> ClientResult<LocationStats> {
        self.get("/stats/location", &[], Access::Public).await
    }

    pub async fn get_timeline_stats(
        &self,
        period: TimelinePeriod,
        category: Option<&str>,
    ) -> ClientResult<TimelineStats> {
        let mut query = vec![("period", period.to_string())];
        if let Some(c) = category {
            query.push(("category", c.to_string()));
        }
        self.get("/stats/timeline", &query, Access::Public).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientError, MemoryTokenStore, Session};
    use mockito::Matcher;

    const USER_JSON: &str = r#"{
        "id": 1,
        "username": "dispatch",
        "email": "dispatch@example.org",
        "role": "user",
        "is_active": true,
        "is_verified": true
    }"#;

    fn auth_body(token: &str) -> String {
        format!(
            r#"{{"message": "ok", "user": {}, "access_token": "{}"}}"#,
            USER_JSON, token
        )
    }

    fn incident_json(id: i64) -> String {
        format!(
            r#"{{"id": {}, "title": "Fire", "description": "d", "category": "fire",
                "location": "Dock", "status": "reported", "source": "user",
                "created_at": "2024-05-01T10:00:00", "media": []}}"#,
            id
        )
    }

    fn report() -> NewIncident {
        NewIncident {
            title: "Warehouse fire".into(),
            description: "Smoke".into(),
            category: "fire".into(),
            location: "Dock 4".into(),
            latitude: Some(51.5),
            longitude: Some(-0.12),
        }
    }

    fn client(server: &mockito::Server, session: Session) -> ApiClient {
        ApiClient::new(server.url(), session).unwrap()
    }

    #[tokio::test]
    async fn login_stores_token_and_authenticates() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(serde_json::json!({
                "username": "dispatch",
                "password": "secret1"
            })))
            .with_status(200)
            .with_body(auth_body("tok-123"))
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        assert!(!api.is_authenticated());

        let response = api
            .login(&Credentials {
                username: "dispatch".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(response.user.username, "dispatch");
        assert!(api.is_authenticated());
        assert_eq!(api.session().token().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn failed_login_rejects_with_server_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"error": "Invalid credentials"}"#)
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        let err = api
            .login(&Credentials {
                username: "dispatch".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!api.is_authenticated());
    }

    #[tokio::test]
    async fn register_stores_token() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/register")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "username": "dispatch",
                "email": "dispatch@example.org"
            })))
            .with_status(201)
            .with_body(auth_body("fresh"))
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        api.register(&RegisterRequest {
            username: "dispatch".into(),
            email: "dispatch@example.org".into(),
            password: "secret1".into(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(api.session().token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn public_reads_never_send_token() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", "/incidents")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("category".into(), "fire".into()),
                Matcher::UrlEncoded("q".into(), "dock fire".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(format!("[{}]", incident_json(1)))
            .create_async()
            .await;
        let stats = server
            .mock("GET", "/stats/timeline")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("period".into(), "month".into()),
                Matcher::UrlEncoded("category".into(), "fire".into()),
            ]))
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"period": "month", "category": "fire", "timeline": []}"#)
            .create_async()
            .await;

        let api = client(&server, Session::new(MemoryTokenStore::with_token("tok")));
        let incidents = api
            .get_incidents(&IncidentQuery {
                category: Some("fire".into()),
                q: Some("dock fire".into()),
                limit: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(incidents.len(), 1);

        let timeline = api
            .get_timeline_stats(TimelinePeriod::Month, Some("fire"))
            .await
            .unwrap();
        assert_eq!(timeline.period, "month");

        list.assert_async().await;
        stats.assert_async().await;
    }

    #[tokio::test]
    async fn news_rows_with_null_fields_load() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/incidents")
            .with_status(200)
            .with_body(
                r#"[{"id": 1, "source": "news", "category": "fire", "title": "Blaze",
                    "description": null, "location": null, "latitude": null,
                    "longitude": null, "status": "reported", "url": null,
                    "published_at": "2024-05-01T09:30:00", "created_at": null}]"#,
            )
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        let incidents = api.get_incidents(&IncidentQuery::default()).await.unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].location, "");
        assert_eq!(incidents[0].description, "");
    }

    #[tokio::test]
    async fn authenticated_calls_send_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("PUT", "/incidents/7")
            .match_header("authorization", "Bearer tok")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({"title": "Updated"})))
            .with_status(200)
            .with_body(incident_json(7))
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/incidents/7")
            .match_header("authorization", "Bearer tok")
            .with_status(204)
            .create_async()
            .await;

        let api = client(&server, Session::new(MemoryTokenStore::with_token("tok")));
        let updated = api
            .update_incident(
                7,
                &IncidentUpdate {
                    title: Some("Updated".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, 7);
        api.delete_incident(7).await.unwrap();

        put.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn create_without_media_posts_json() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/incidents")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "title": "Warehouse fire",
                "category": "fire",
                "latitude": 51.5
            })))
            .with_status(201)
            .with_body(incident_json(11))
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        let created = api
            .create_incident_with_media(&report(), Vec::new())
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(created.id, 11);
    }

    #[tokio::test]
    async fn create_with_media_posts_multipart_with_every_file() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/incidents")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".into()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="title"\r\n\r\nWarehouse fire"#.into()),
                Matcher::Regex(r#"name="longitude"\r\n\r\n-0.12"#.into()),
                Matcher::Regex(r#"name="media"; filename="front.jpg""#.into()),
                Matcher::Regex(r#"name="media"; filename="back.png""#.into()),
                Matcher::Regex("Content-Type: image/png".into()),
            ]))
            .with_status(201)
            .with_body(incident_json(12))
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        let media = vec![
            MediaUpload::new("front.jpg", b"jpeg-bytes".to_vec()),
            MediaUpload::new("back.png", b"png-bytes".to_vec()),
        ];
        let created = api
            .create_incident_with_media(&report(), media)
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(created.id, 12);
    }

    #[tokio::test]
    async fn logout_clears_token_even_when_server_refuses() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/auth/logout")
            .match_header("authorization", "Bearer tok")
            .with_status(401)
            .with_body(r#"{"error": "Token expired"}"#)
            .create_async()
            .await;

        let api = client(&server, Session::new(MemoryTokenStore::with_token("tok")));
        api.logout().await.unwrap();

        m.assert_async().await;
        assert!(!api.is_authenticated());
        assert_eq!(api.session().token(), None);
    }

    #[tokio::test]
    async fn logout_clears_token_on_transport_failure() {
        let api = ApiClient::new(
            "http://127.0.0.1:9",
            Session::new(MemoryTokenStore::with_token("tok")),
        )
        .unwrap();
        let err = api.logout().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(!api.is_authenticated());
    }

    #[tokio::test]
    async fn current_user_clears_invalid_session() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/auth/profile")
            .with_status(401)
            .with_body(r#"{"error": "Token has expired"}"#)
            .create_async()
            .await;

        let api = client(&server, Session::new(MemoryTokenStore::with_token("stale")));
        // A stale token still reads as authenticated until a request fails.
        assert!(api.is_authenticated());
        assert!(api.current_user().await.is_none());
        assert!(!api.is_authenticated());
    }

    #[tokio::test]
    async fn current_user_returns_profile() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/auth/profile")
            .match_header("authorization", "Bearer good")
            .with_status(200)
            .with_body(format!(r#"{{"user": {}}}"#, USER_JSON))
            .create_async()
            .await;

        let api = client(&server, Session::new(MemoryTokenStore::with_token("good")));
        let user = api.current_user().await.unwrap();
        assert_eq!(user.email, "dispatch@example.org");
        assert!(api.is_authenticated());
    }

    #[tokio::test]
    async fn current_user_without_token_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/auth/profile")
            .expect(0)
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        assert!(api.current_user().await.is_none());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn password_reset_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let forgot = server
            .mock("POST", "/auth/forgot-password")
            .match_body(Matcher::Json(serde_json::json!({"email": "a@b.io"})))
            .with_status(200)
            .with_body(r#"{"message": "Reset link sent"}"#)
            .create_async()
            .await;
        let reset = server
            .mock("POST", "/auth/reset-password")
            .match_body(Matcher::Json(
                serde_json::json!({"token": "t", "password": "newpass"}),
            ))
            .with_status(200)
            .with_body(r#"{"message": "Password updated"}"#)
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        let sent = api.request_password_reset("a@b.io").await.unwrap();
        assert_eq!(sent.message, "Reset link sent");
        let done = api
            .reset_password(&ResetPasswordRequest {
                token: "t".into(),
                password: "newpass".into(),
            })
            .await
            .unwrap();
        assert_eq!(done.message, "Password updated");

        forgot.assert_async().await;
        reset.assert_async().await;
    }

    #[tokio::test]
    async fn category_stats_sends_days() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/stats/category")
            .match_query(Matcher::UrlEncoded("days".into(), "7".into()))
            .with_status(200)
            .with_body(r#"{"period_days": 7, "categories": []}"#)
            .create_async()
            .await;

        let api = client(&server, Session::ephemeral());
        let stats = api.get_category_stats(Some(7)).await.unwrap();
        assert_eq!(stats.period_days, 7);
        m.assert_async().await;
    }
}
