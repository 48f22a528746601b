use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::json;

use super::{ApiClient, check_status};
use crate::{
    error::{ApiError, ApiResult},
    models::{AuthStatus, UserProfile},
};

const COGNITO: &str = "/api/cognito";
const UAE_PASS: &str = "/api/uaepass";

impl ApiClient {
    /// Hosted-UI login; the browser is sent here and comes back with a
    /// session cookie.
    pub fn login_url(&self) -> String {
        self.url(&format!("{COGNITO}/login"))
    }

    pub fn logout_url(&self) -> String {
        self.url(&format!("{COGNITO}/logout"))
    }

    pub fn uae_pass_login_url(&self) -> String {
        self.url(&format!("{UAE_PASS}/login"))
    }

    pub fn uae_pass_logout_url(&self) -> String {
        self.url(&format!("{UAE_PASS}/logout"))
    }

    /// Clear local session flags and return the URL that ends the provider
    /// session.
    pub fn logout(&self) -> String {
        if let Err(e) = self.storage().clear() {
            tracing::warn!("Failed to clear session storage on logout: {e:#}");
        }
        tracing::info!("Local session cleared");
        self.logout_url()
    }

    /// Whether the current session is signed in. A 401 is a normal
    /// "signed out" answer here, not an error.
    pub async fn auth_status(&self) -> ApiResult<AuthStatus> {
        let response = self
            .http()
            .get(self.url(&format!("{COGNITO}/status")))
            .send()
            .await
            .map_err(ApiError::Transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(AuthStatus {
                authenticated: false,
                user: None,
            });
        }

        check_status(response, "Failed to check authentication status")
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let response = self
            .http()
            .get(self.url(&format!("{COGNITO}/profile")))
            .send()
            .await
            .map_err(ApiError::Transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::NotAuthenticated);
        }

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "Profile request failed");
            return Err(ApiError::Status {
                status,
                message: "Failed to fetch profile".to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn change_password(&self, previous: &str, proposed: &str) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url(&format!("{COGNITO}/change-password")))
            .json(&json!({
                "previous_password": previous,
                "proposed_password": proposed,
            }));
        self.send_unit(request, "Failed to change password").await
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url(&format!("{COGNITO}/forgot-password")))
            .json(&json!({ "email": email }));
        self.send_unit(request, "Failed to send reset code").await
    }

    pub async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url(&format!("{COGNITO}/confirm-forgot-password")))
            .json(&json!({
                "email": email,
                "confirmation_code": code,
                "new_password": new_password,
            }));
        self.send_unit(request, "Failed to reset password").await
    }

    pub async fn refresh_token(&self) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url(&format!("{COGNITO}/refresh-token")));
        self.send_unit(request, "Failed to refresh session").await
    }

    pub async fn update_attributes(&self, attributes: &BTreeMap<String, String>) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url(&format!("{COGNITO}/update-attributes")))
            .json(&json!({ "attributes": attributes }));
        self.send_unit(request, "Failed to update profile").await
    }

    pub async fn verify_attribute(&self, attribute: &str, code: &str) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url(&format!("{COGNITO}/verify-attribute")))
            .json(&json!({ "attribute_name": attribute, "code": code }));
        self.send_unit(request, "Failed to verify code").await
    }

    pub async fn resend_code(&self, attribute: &str) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url(&format!("{COGNITO}/resend-code")))
            .json(&json!({ "attribute_name": attribute }));
        self.send_unit(request, "Failed to resend code").await
    }

    /// Delete the account on the provider, then drop every local flag.
    pub async fn delete_account(&self) -> ApiResult<()> {
        let request = self
            .http()
            .delete(self.url(&format!("{COGNITO}/delete-account")));
        self.send_unit(request, "Failed to delete account").await?;

        if let Err(e) = self.storage().clear() {
            tracing::warn!("Failed to clear session storage after account deletion: {e:#}");
        }
        Ok(())
    }
}
