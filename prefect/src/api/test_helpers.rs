//! Test helpers for the Prefect API

pub const TEST_ACCOUNT: &str = "acct-1";

pub const TEST_WORKSPACE: &str = "w1";

pub const TEST_AUTH_HEADER: &str = "Bearer pnu_test";

pub fn create_test_client(url: &str) -> super::Client {
    super::Client::new(url, Some("pnu_test"), TEST_ACCOUNT).unwrap()
}

/// Path of a workspace-scoped route on the test account.
pub fn workspace_path(route: &str) -> String {
    format!(
        "/api/accounts/{}/workspaces/{}/{}",
        TEST_ACCOUNT, TEST_WORKSPACE, route
    )
}
