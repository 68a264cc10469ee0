//! Integration tests for the GitHub client.
//!
//! These tests run `GitHubForge` against a local wiremock server standing in
//! for the REST and GraphQL endpoints. Live GitHub API tests are behind the
//! `live_github_tests` feature flag.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ghup::core::config::token::Token;
use ghup::core::types::{Oid, RefName, RefType, RepoSlug};
use ghup::engine::{
    reconcile_deployment, reconcile_resolve, DeploymentOptions, ResolveOptions,
};
use ghup::forge::github::GitHubForge;
use ghup::forge::{DeploymentState, Forge, ForgeError, ObjectKind};

const REPO_PATH: &str = "/repos/octocat/hello-world";

fn sha(c: char) -> String {
    c.to_string().repeat(40)
}

fn forge(server: &MockServer) -> GitHubForge {
    GitHubForge::with_api_base(
        Token::new("test-token"),
        RepoSlug::new("octocat", "hello-world").unwrap(),
        server.uri(),
    )
}

// =============================================================================
// Request shape
// =============================================================================

mod requests {
    use super::*;

    #[tokio::test]
    async fn sends_auth_and_api_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/ref/heads/main")))
            .and(header("authorization", "Bearer test-token"))
            .and(header("accept", "application/vnd.github+json"))
            .and(header("x-github-api-version", "2022-11-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/main",
                "object": { "sha": sha('a'), "type": "commit" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let name = RefName::new("refs/heads/main").unwrap();
        let found = forge(&server).get_ref(&name).await.unwrap().unwrap();
        assert_eq!(found.oid.as_str(), sha('a'));
        assert_eq!(found.kind, ObjectKind::Commit);
    }

    #[tokio::test]
    async fn forced_update_sends_force_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{REPO_PATH}/git/refs/tags/v1")))
            .and(body_partial_json(json!({ "sha": sha('b'), "force": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let name = RefName::for_tag("v1").unwrap();
        let oid = Oid::new(sha('b')).unwrap();
        forge(&server).update_ref(&name, &oid, true).await.unwrap();
    }

    #[tokio::test]
    async fn ref_names_are_escaped_in_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/ref/heads/fix")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/fix",
                "object": { "sha": sha('b'), "type": "commit" }
            })))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/ref/heads/fix%2312")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/fix#12",
                "object": { "sha": sha('a'), "type": "commit" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{REPO_PATH}/git/refs/heads/fix")))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{REPO_PATH}/git/refs/heads/fix%2312")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let forge = forge(&server);
        let name = RefName::new("refs/heads/fix#12").unwrap();
        let found = forge.get_ref(&name).await.unwrap().unwrap();
        assert_eq!(found.oid.as_str(), sha('a'));
        forge.delete_ref(&name).await.unwrap();
    }
}

// =============================================================================
// Response mapping
// =============================================================================

mod responses {
    use super::*;

    #[tokio::test]
    async fn missing_ref_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/ref/heads/gone")))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
            )
            .mount(&server)
            .await;

        let name = RefName::new("refs/heads/gone").unwrap();
        assert_eq!(forge(&server).get_ref(&name).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_commit_hash_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/commits/deadbee")))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "message": "No commit found" })),
            )
            .mount(&server)
            .await;

        assert_eq!(forge(&server).commit_sha("deadbee").await.unwrap(), None);
    }

    #[tokio::test]
    async fn repository_info_from_graphql() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({
                "variables": { "owner": "octocat", "name": "hello-world" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": {
                    "id": "R_1",
                    "isEmpty": false,
                    "autoMergeAllowed": true,
                    "mergeCommitAllowed": false,
                    "squashMergeAllowed": true,
                    "rebaseMergeAllowed": false,
                    "defaultBranchRef": { "name": "trunk", "target": { "oid": sha('c') } }
                } }
            })))
            .mount(&server)
            .await;

        let info = forge(&server).repository_info().await.unwrap();
        assert_eq!(info.node_id, "R_1");
        assert_eq!(info.default_branch, "trunk");
        assert_eq!(info.default_branch_oid.unwrap().as_str(), sha('c'));
        assert!(info.merge.auto_merge_allowed);
        assert!(!info.merge.merge_commit_allowed);
    }

    #[tokio::test]
    async fn graphql_errors_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a Repository" }]
            })))
            .mount(&server)
            .await;

        let err = forge(&server).repository_info().await.unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn http_errors_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/ref/heads/auth")))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/ref/heads/limited")))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("X-RateLimit-Remaining", "0")
                    .set_body_json(json!({ "message": "API rate limit exceeded" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/ref/heads/denied")))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("X-Accepted-GitHub-Permissions", "contents=write")
                    .set_body_json(json!({ "message": "Resource not accessible" })),
            )
            .mount(&server)
            .await;

        let forge = forge(&server);
        let get = |name: &str| RefName::new(format!("refs/heads/{name}")).unwrap();

        let err = forge.get_ref(&get("auth")).await.unwrap_err();
        assert!(matches!(err, ForgeError::AuthFailed(_)), "{err:?}");

        let err = forge.get_ref(&get("limited")).await.unwrap_err();
        assert!(matches!(err, ForgeError::RateLimited), "{err:?}");

        let err = forge.get_ref(&get("denied")).await.unwrap_err();
        assert!(err.to_string().contains("contents=write"), "{err}");
    }

    #[tokio::test]
    async fn annotated_tags_are_peeled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/matching-refs/tags")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ref": "refs/tags/light", "object": { "sha": sha('a'), "type": "commit" } },
                { "ref": "refs/tags/annotated", "object": { "sha": sha('f'), "type": "tag" } }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/tags/{}", sha('f'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": sha('f'),
                "tag": "annotated",
                "message": "release",
                "object": { "sha": sha('a'), "type": "commit" }
            })))
            .mount(&server)
            .await;

        let refs = forge(&server).list_refs(RefType::Tags).await.unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.commit.as_str() == sha('a')));
    }
}

// =============================================================================
// Reconcilers over HTTP
// =============================================================================

mod reconcile {
    use super::*;

    #[tokio::test]
    async fn resolve_hash_and_matching_branches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/commits/abcdef1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": sha('a') })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/git/matching-refs/heads")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ref": "refs/heads/main", "object": { "sha": sha('a'), "type": "commit" } },
                { "ref": "refs/heads/other", "object": { "sha": sha('b'), "type": "commit" } }
            ])))
            .mount(&server)
            .await;

        let report = reconcile_resolve(
            &forge(&server),
            &ResolveOptions {
                commitish: "abcdef1".into(),
                branches: true,
                tags: false,
            },
        )
        .await;

        assert_eq!(report.error(), None);
        assert_eq!(report.repository, "octocat/hello-world");
        assert_eq!(report.sha.unwrap().as_str(), sha('a'));
        assert_eq!(report.branches, Some(vec!["main".to_string()]));
        assert_eq!(report.tags, None);
    }

    #[tokio::test]
    async fn deployment_created_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/commits/{}", sha('d'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": sha('d') })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{REPO_PATH}/deployments")))
            .and(query_param("environment", "staging"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{REPO_PATH}/deployments")))
            .and(body_partial_json(json!({
                "ref": sha('d'),
                "environment": "staging",
                "auto_merge": false,
                "required_contexts": []
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 42, "sha": sha('d'), "environment": "staging"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{REPO_PATH}/deployments/42/statuses")))
            .and(body_partial_json(json!({ "state": "in_progress" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        let report = reconcile_deployment(
            &forge(&server),
            &DeploymentOptions {
                environment: "staging".into(),
                commitish: sha('d'),
                state: DeploymentState::InProgress,
                ..Default::default()
            },
        )
        .await;

        assert_eq!(report.error(), None);
        assert!(report.created);
        assert_eq!(report.deployment_id, 42);
        assert_eq!(report.status_id, 7);
        assert_eq!(
            report.url.as_deref(),
            Some(format!("{}/octocat/hello-world/commit/{}", server.uri(), sha('d')).as_str())
        );
    }
}

#[cfg(feature = "live_github_tests")]
mod live {
    use super::*;

    /// Requires `GHUP_TEST_TOKEN` and `GHUP_TEST_REPO` (`owner/name`).
    #[tokio::test]
    async fn resolves_default_branch() {
        let token = std::env::var("GHUP_TEST_TOKEN").expect("GHUP_TEST_TOKEN");
        let repo: RepoSlug = std::env::var("GHUP_TEST_REPO")
            .expect("GHUP_TEST_REPO")
            .parse()
            .unwrap();
        let forge = GitHubForge::new(Token::new(token), repo);

        let info = forge.repository_info().await.unwrap();
        let report = reconcile_resolve(
            &forge,
            &ResolveOptions {
                commitish: info.default_branch.clone(),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(report.sha, info.default_branch_oid);
    }
}
