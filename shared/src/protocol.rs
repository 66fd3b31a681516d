use crate::{Model, OAuthConfig, SessionUser, SubscriptionStatus};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize + DeserializeOwned {
    /// The response type returned by this request.
    type Response: Serialize + DeserializeOwned;
    /// The URL path (or suffix).
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;
}

// =========================================================
// Auth
// =========================================================

/// Current session user (cookie based)
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserRequest;

impl ApiRequest for CurrentUserRequest {
    type Response = SessionUser;
    const PATH: &'static str = "/api/auth/moi";
    const METHOD: HttpMethod = HttpMethod::Get;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: SessionUser,
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const PATH: &'static str = "/api/auth/connexion";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Braced so the body serializes as `{}` rather than `null`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest {}

impl ApiRequest for LogoutRequest {
    type Response = ();
    const PATH: &'static str = "/api/auth/deconnexion";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Error body returned by the auth endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// =========================================================
// Billing
// =========================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionStatusRequest;

impl ApiRequest for SubscriptionStatusRequest {
    type Response = SubscriptionStatus;
    const PATH: &'static str = "/api/stripe/status";
    const METHOD: HttpMethod = HttpMethod::Get;
}

/// Confirms a checkout after returning from the billing provider (`?success=true`)
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub plan: Option<String>,
}

impl ApiRequest for VerifyPaymentRequest {
    type Response = VerifyPaymentResponse;
    const PATH: &'static str = "/api/stripe/verify-payment";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Hosted billing page the browser is sent to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRedirect {
    pub url: String,
}

/// Opens the billing provider's customer portal (existing customers)
#[derive(Debug, Serialize, Deserialize)]
pub struct BillingPortalRequest {}

impl ApiRequest for BillingPortalRequest {
    type Response = BillingRedirect;
    const PATH: &'static str = "/api/stripe/portal";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Starts a Premium checkout session (free or cancelled plans)
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {}

impl ApiRequest for CreateCheckoutRequest {
    type Response = BillingRedirect;
    const PATH: &'static str = "/api/stripe/create-checkout";
    const METHOD: HttpMethod = HttpMethod::Post;
}

// =========================================================
// OAuth / Models
// =========================================================

/// Where the platform authorization endpoints live
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthConfigRequest;

impl ApiRequest for OAuthConfigRequest {
    type Response = OAuthConfig;
    const PATH: &'static str = "/api/oauth/config";
    const METHOD: HttpMethod = HttpMethod::Get;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListModelsRequest;

impl ApiRequest for ListModelsRequest {
    type Response = Vec<Model>;
    const PATH: &'static str = "/api/models";
    const METHOD: HttpMethod = HttpMethod::Get;
}

/// Path of the per-platform connection status of a model.
///
/// Not an [`ApiRequest`]: the path carries the model id.
pub fn oauth_status_path(model_id: &str, platform: crate::Platform) -> String {
    format!(
        "/api/models/{}/oauth-status?platform={}",
        urlencoding::encode(model_id),
        platform.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Platform;

    #[test]
    fn test_oauth_status_path() {
        assert_eq!(
            oauth_status_path("m-42", Platform::Instagram),
            "/api/models/m-42/oauth-status?platform=instagram"
        );
    }

    #[test]
    fn test_empty_post_body_is_object() {
        assert_eq!(serde_json::to_string(&LogoutRequest {}).unwrap(), "{}");
        assert_eq!(serde_json::to_string(&VerifyPaymentRequest {}).unwrap(), "{}");
    }

    #[test]
    fn test_billing_redirect_endpoints() {
        assert_eq!(BillingPortalRequest::PATH, "/api/stripe/portal");
        assert_eq!(CreateCheckoutRequest::PATH, "/api/stripe/create-checkout");
        assert_eq!(CreateCheckoutRequest::METHOD, HttpMethod::Post);
        let res: BillingRedirect =
            serde_json::from_str(r#"{"url":"https://checkout.stripe.com/c/pay/cs_1"}"#).unwrap();
        assert!(res.url.starts_with("https://checkout.stripe.com"));
    }

    #[test]
    fn test_login_request_shape() {
        let body = serde_json::to_string(&LoginRequest {
            email: "a@b.fr".into(),
            password: "pw".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"email":"a@b.fr","password":"pw"}"#);
    }
}
