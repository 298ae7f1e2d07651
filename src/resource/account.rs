//! Account controller backed by the bulk-create endpoint.
//!
//! The remote API returns no identifier for bulk-created accounts, so the
//! only remote effect is on create. Read, update and delete keep the stored
//! state as it is.

use std::sync::Arc;

use reqwest::StatusCode;

use super::{ControllerFuture, ResourceController, expect_status, log_settled};
use crate::error::{Operation, ProviderError};
use crate::translate::{AccountSpec, BulkAccountResult};
use crate::transport::{ApiRequest, ApiResponse, AuthenticatedTransport, Transport};

/// Bulk-create endpoint for accounts.
pub const BULK_ACCOUNTS_PATH: &str = "/api/v1/accounts/accounts/bulk/";

/// State of an account after a successful bulk create.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountState {
    /// Attributes as submitted.
    pub spec: AccountSpec,
    /// Per-asset outcome reported by the API.
    pub results: Vec<BulkAccountResult>,
}

/// Drives the lifecycle of `jumpserver_account` resources.
#[derive(Debug)]
pub struct AccountController<T> {
    transport: Arc<AuthenticatedTransport<T>>,
}

impl<T> Clone for AccountController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

/// Applies the bulk outcome check. Only the first entry decides success; an
/// empty list is accepted. Later entries that were not created are logged.
fn check_bulk_outcome(
    response: &ApiResponse,
    results: &[BulkAccountResult],
) -> Result<(), ProviderError> {
    let Some((first, rest)) = results.split_first() else {
        return Ok(());
    };
    if !first.is_created() {
        return Err(ProviderError::Api {
            operation: Operation::Create,
            status: response.status,
            body: response.text(),
        });
    }
    for result in rest.iter().filter(|result| !result.is_created()) {
        tracing::warn!(
            asset = result.asset.as_deref().unwrap_or("<unknown>"),
            state = result.state.as_deref().unwrap_or("<missing>"),
            "account was not created on asset; only the first asset decides success"
        );
    }
    Ok(())
}

impl<T: Transport> AccountController<T> {
    /// Creates a controller sharing `transport`.
    #[must_use]
    pub const fn new(transport: Arc<AuthenticatedTransport<T>>) -> Self {
        Self { transport }
    }

    async fn create_account(&self, planned: &AccountSpec) -> Result<AccountState, ProviderError> {
        let assets = planned.validate()?;
        let request = ApiRequest::post_json(
            self.transport.url(BULK_ACCOUNTS_PATH),
            &planned.bulk_payload(&assets),
        )?;
        let raw = self.transport.send(request).await?;
        let response = expect_status(Operation::Create, raw, &[StatusCode::OK])?;
        let results = BulkAccountResult::list_from_body(&response.body)?;
        check_bulk_outcome(&response, &results)?;
        tracing::debug!(
            username = %planned.username,
            assets = assets.len(),
            "account created"
        );
        Ok(AccountState {
            spec: planned.clone(),
            results,
        })
    }
}

impl<T: Transport> ResourceController for AccountController<T> {
    type Config = AccountSpec;
    type State = AccountState;

    const TYPE_NAME: &'static str = "jumpserver_account";

    fn create<'a>(&'a self, planned: &'a AccountSpec) -> ControllerFuture<'a, AccountState> {
        Box::pin(async move {
            let result = self.create_account(planned).await;
            log_settled(Self::TYPE_NAME, None, Operation::Create, result.is_ok());
            result
        })
    }

    fn read<'a>(&'a self, prior: &'a AccountState) -> ControllerFuture<'a, AccountState> {
        Box::pin(async move { Ok(prior.clone()) })
    }

    fn update<'a>(
        &'a self,
        prior: &'a AccountState,
        planned: &'a AccountSpec,
    ) -> ControllerFuture<'a, AccountState> {
        Box::pin(async move {
            if planned != &prior.spec {
                tracing::warn!(
                    username = %prior.spec.username,
                    "account update is not supported by this provider; remote accounts left unchanged"
                );
            }
            Ok(prior.clone())
        })
    }

    fn delete<'a>(&'a self, prior: &'a AccountState) -> ControllerFuture<'a, ()> {
        Box::pin(async move {
            tracing::warn!(
                username = %prior.spec.username,
                "account delete only forgets local state; remote accounts are kept"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use crate::translate::ValidationError;
    use crate::transport::Session;
    use reqwest::Method;
    use rstest::{fixture, rstest};
    use serde_json::json;

    const ASSET_A: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
    const ASSET_B: &str = "0b7b3b7e-6a53-4c4f-9a2f-8f0fb0a1c2d3";

    struct Harness {
        scripted: ScriptedTransport,
        controller: AccountController<ScriptedTransport>,
    }

    #[fixture]
    fn harness() -> Harness {
        let scripted = ScriptedTransport::new();
        let transport = AuthenticatedTransport::new(
            scripted.clone(),
            Session::new("https://js.example.com", "tok"),
        )
        .expect("session is valid");
        Harness {
            scripted,
            controller: AccountController::new(Arc::new(transport)),
        }
    }

    #[fixture]
    fn deploy_account() -> AccountSpec {
        AccountSpec {
            name: String::from("deploy"),
            username: String::from("deploy"),
            privileged: true,
            is_active: true,
            assets: vec![String::from(ASSET_A), String::from(ASSET_B)],
        }
    }

    #[rstest]
    #[tokio::test]
    async fn create_posts_to_bulk_endpoint(harness: Harness, deploy_account: AccountSpec) {
        harness.scripted.push_json(
            StatusCode::OK,
            &json!([
                {"asset": "web-1(10.0.0.5)", "state": "created", "changed": true},
                {"asset": "db-1(10.0.0.6)", "state": "created", "changed": true},
            ]),
        );

        let state = harness
            .controller
            .create(&deploy_account)
            .await
            .expect("create should succeed");

        assert_eq!(state.spec, deploy_account);
        assert_eq!(state.results.len(), 2);
        let requests = harness.scripted.requests();
        let [request] = requests.as_slice() else {
            panic!("expected one request, got {}", requests.len());
        };
        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.url,
            "https://js.example.com/api/v1/accounts/accounts/bulk/"
        );
        assert_eq!(
            request.body.as_ref().and_then(|body| body.get("assets")),
            Some(&json!([ASSET_A, ASSET_B]))
        );
    }

    #[rstest]
    #[case::first(vec![String::from("not-a-uuid"), String::from(ASSET_A)], "assets[0]")]
    #[case::last(vec![String::from(ASSET_A), String::from("web-1")], "assets[1]")]
    #[tokio::test]
    async fn invalid_asset_fails_before_any_request(
        harness: Harness,
        mut deploy_account: AccountSpec,
        #[case] assets: Vec<String>,
        #[case] field: &str,
    ) {
        deploy_account.assets = assets;

        let err = harness
            .controller
            .create(&deploy_account)
            .await
            .expect_err("invalid uuid");

        let ProviderError::Validation(ValidationError::InvalidUuid { field: ref reported, .. }) = err
        else {
            panic!("expected InvalidUuid, got {err:?}");
        };
        assert_eq!(reported, field);
        assert_eq!(harness.scripted.call_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn valid_assets_always_send_one_request(harness: Harness, deploy_account: AccountSpec) {
        harness.scripted.push_json(StatusCode::OK, &json!([]));

        harness
            .controller
            .create(&deploy_account)
            .await
            .expect("empty result list is accepted");

        assert_eq!(harness.scripted.call_count(), 1);
    }

    #[rstest]
    #[case::blank_name(String::new(), String::from("deploy"))]
    #[case::blank_username(String::from("deploy"), String::new())]
    #[tokio::test]
    async fn blank_names_are_sent_when_assets_parse(
        harness: Harness,
        mut deploy_account: AccountSpec,
        #[case] name: String,
        #[case] username: String,
    ) {
        deploy_account.name = name;
        deploy_account.username = username;
        harness.scripted.push_json(
            StatusCode::OK,
            &json!([{"asset": "web-1(10.0.0.5)", "state": "created", "changed": true}]),
        );

        harness
            .controller
            .create(&deploy_account)
            .await
            .expect("only asset identifiers are checked locally");

        let requests = harness.scripted.requests();
        let [request] = requests.as_slice() else {
            panic!("expected one request, got {}", requests.len());
        };
        assert_eq!(
            request.body.as_ref().and_then(|body| body.get("name")),
            Some(&json!(deploy_account.name))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn first_entry_not_created_fails(harness: Harness, deploy_account: AccountSpec) {
        harness.scripted.push_json(
            StatusCode::OK,
            &json!([{"asset": "web-1(10.0.0.5)", "state": "existed", "changed": false}]),
        );

        let err = harness
            .controller
            .create(&deploy_account)
            .await
            .expect_err("first entry decides");

        assert_eq!(err.status(), Some(StatusCode::OK));
        assert!(
            matches!(err, ProviderError::Api { ref body, .. } if body.contains("existed")),
            "unexpected error: {err:?}"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn later_entries_do_not_decide(harness: Harness, deploy_account: AccountSpec) {
        harness.scripted.push_json(
            StatusCode::OK,
            &json!([
                {"asset": "web-1(10.0.0.5)", "state": "created", "changed": true},
                {"asset": "db-1(10.0.0.6)", "state": "error", "changed": false},
            ]),
        );

        let state = harness
            .controller
            .create(&deploy_account)
            .await
            .expect("only the first entry is checked");

        assert!(state.results.get(1).is_some_and(|result| !result.is_created()));
    }

    #[rstest]
    #[tokio::test]
    async fn non_ok_status_is_api_error(harness: Harness, deploy_account: AccountSpec) {
        harness
            .scripted
            .push_json(StatusCode::BAD_REQUEST, &json!({"assets": ["invalid"]}));

        let err = harness
            .controller
            .create(&deploy_account)
            .await
            .expect_err("400 fails");

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[rstest]
    #[tokio::test]
    async fn read_update_delete_touch_nothing(harness: Harness, deploy_account: AccountSpec) {
        let prior = AccountState {
            spec: deploy_account.clone(),
            results: Vec::new(),
        };
        let planned = AccountSpec {
            privileged: false,
            ..deploy_account
        };

        let read = harness.controller.read(&prior).await.expect("read is a no-op");
        let updated = harness
            .controller
            .update(&prior, &planned)
            .await
            .expect("update is a no-op");
        harness
            .controller
            .delete(&prior)
            .await
            .expect("delete is a no-op");

        assert_eq!(read, prior);
        assert_eq!(updated, prior);
        assert_eq!(harness.scripted.call_count(), 0);
    }
}
