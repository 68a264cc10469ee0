//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge is a small in-memory repository: commits with full file
//! trees and parent links, refs, annotated tag objects, pull requests and
//! deployments. Object ids are derived from content, so two runs that seed
//! the same history produce the same ids.
//!
//! Every call can be configured to fail, and calls that matter to the
//! reconcilers (all writes plus pull-request search) are recorded.
//!
//! # Example
//!
//! ```
//! use ghup::forge::mock::MockForge;
//! use ghup::forge::Forge;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//! let head = forge.commit_files("main", &[("README.md", "hello")]);
//!
//! let oid = forge.file_oid("main", "README.md").await.unwrap();
//! assert!(oid.is_some());
//! assert_eq!(forge.head("main"), Some(head));
//! # });
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{
    CommitRequest, CreatePrRequest, Deployment, DeploymentRequest, DeploymentStatus,
    DeploymentStatusRequest, Forge, ForgeError, MergeCapabilities, MergeMethod, ObjectKind,
    PullRequest, RefEntry, RemoteRef, RepositoryInfo, TagObject,
};
use crate::core::hash::blob_hash;
use crate::core::types::{Oid, RefName, RefType, RepoSlug};

/// Forge operations, used to select where an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    RepositoryInfo,
    CommitSha,
    ResolveExpression,
    FileOid,
    FileText,
    GetRef,
    CreateRef,
    UpdateRef,
    DeleteRef,
    CreateTagObject,
    GetTagObject,
    ListRefs,
    CreateCommit,
    FindPullRequest,
    CreatePullRequest,
    EnableAutoMerge,
    ListDeployments,
    CreateDeployment,
    CreateDeploymentStatus,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateRef {
        name: String,
        oid: Oid,
    },
    UpdateRef {
        name: String,
        oid: Oid,
        force: bool,
    },
    DeleteRef {
        name: String,
    },
    CreateTagObject {
        tag: String,
        target: Oid,
    },
    CreateCommit {
        branch: String,
        expected_head: Oid,
        additions: Vec<String>,
        deletions: Vec<String>,
    },
    FindPullRequest {
        head: String,
        base: String,
    },
    CreatePullRequest {
        head: String,
        base: String,
        title: String,
        draft: bool,
    },
    EnableAutoMerge {
        number: u64,
        method: MergeMethod,
    },
    CreateDeployment {
        sha: Oid,
        environment: String,
    },
    CreateDeploymentStatus {
        deployment_id: u64,
        state: String,
    },
}

impl MockOperation {
    /// True for operations that change remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, MockOperation::FindPullRequest { .. })
    }
}

#[derive(Debug, Clone)]
struct MockCommit {
    parent: Option<Oid>,
    tree: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone)]
struct MockPullRequest {
    pr: PullRequest,
    open: bool,
    cross_repository: bool,
    auto_merge: Option<MergeMethod>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    node_id: String,
    default_branch: String,
    merge: MergeCapabilities,
    commits: HashMap<Oid, MockCommit>,
    /// Full ref name to the object it points at.
    refs: BTreeMap<String, Oid>,
    tags: HashMap<Oid, TagObject>,
    prs: Vec<MockPullRequest>,
    deployments: Vec<Deployment>,
    statuses: Vec<(u64, DeploymentStatus)>,
    next_id: u64,
    fail_on: HashMap<Op, ForgeError>,
    operations: Vec<MockOperation>,
}

impl MockForgeInner {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn head(&self, branch: &str) -> Option<Oid> {
        self.refs.get(&format!("refs/heads/{branch}")).cloned()
    }

    /// Follow tag objects down to a commit.
    fn peel(&self, oid: &Oid) -> Oid {
        let mut current = oid.clone();
        while let Some(tag) = self.tags.get(&current) {
            current = tag.target.clone();
        }
        current
    }

    fn kind(&self, oid: &Oid) -> ObjectKind {
        if self.tags.contains_key(oid) {
            ObjectKind::Tag
        } else {
            ObjectKind::Commit
        }
    }

    /// True if `ancestor` is reachable from `descendant` through parents.
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> bool {
        let mut current = Some(descendant.clone());
        while let Some(oid) = current {
            if &oid == ancestor {
                return true;
            }
            current = self.commits.get(&oid).and_then(|c| c.parent.clone());
        }
        false
    }

    fn store_commit(
        &mut self,
        parent: Option<Oid>,
        tree: BTreeMap<String, Vec<u8>>,
        message: &str,
    ) -> Oid {
        let mut payload = format!(
            "commit {}\nparent {}\nmessage {}\n",
            self.next_id(),
            parent.as_ref().map(Oid::as_str).unwrap_or("-"),
            message
        )
        .into_bytes();
        for (path, content) in &tree {
            payload.extend_from_slice(path.as_bytes());
            payload.extend_from_slice(blob_hash(content).as_str().as_bytes());
        }

        let oid = blob_hash(&payload);
        self.commits.insert(oid.clone(), MockCommit { parent, tree });
        oid
    }

    /// Resolve `name` the way a symbolic expression query would.
    fn resolve_name(&self, name: &str) -> Option<Oid> {
        if name == "HEAD" {
            return self.head(&self.default_branch);
        }
        let candidates = [
            name.to_string(),
            format!("refs/{name}"),
            format!("refs/heads/{name}"),
            format!("refs/tags/{name}"),
        ];
        if let Some(oid) = candidates.iter().find_map(|c| self.refs.get(c)) {
            return Some(self.peel(oid));
        }
        Oid::new(name).ok().filter(|o| self.commits.contains_key(o))
    }
}

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockForge {
    repo: RepoSlug,
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

impl MockForge {
    /// A repository whose `main` branch holds a single commit with an empty tree.
    pub fn new() -> Self {
        let forge = Self::empty();
        {
            let mut inner = forge.lock();
            let root = inner.store_commit(None, BTreeMap::new(), "Initial commit");
            inner.refs.insert("refs/heads/main".into(), root);
        }
        forge
    }

    /// A repository with no commits at all.
    pub fn empty() -> Self {
        Self {
            repo: RepoSlug {
                owner: "mock".into(),
                name: "repo".into(),
            },
            inner: Arc::new(Mutex::new(MockForgeInner {
                node_id: "R_mock".into(),
                default_branch: "main".into(),
                merge: MergeCapabilities {
                    auto_merge_allowed: true,
                    merge_commit_allowed: true,
                    squash_merge_allowed: true,
                    rebase_merge_allowed: true,
                },
                commits: HashMap::new(),
                refs: BTreeMap::new(),
                tags: HashMap::new(),
                prs: Vec::new(),
                deployments: Vec::new(),
                statuses: Vec::new(),
                next_id: 1,
                fail_on: HashMap::new(),
                operations: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the repository's merge settings.
    pub fn with_merge_capabilities(self, merge: MergeCapabilities) -> Self {
        self.lock().merge = merge;
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use ghup::forge::mock::{MockForge, Op};
    /// use ghup::forge::ForgeError;
    ///
    /// let forge = MockForge::new().fail_on(Op::CreateCommit, ForgeError::RateLimited);
    /// ```
    pub fn fail_on(self, op: Op, error: ForgeError) -> Self {
        self.lock().fail_on.insert(op, error);
        self
    }

    /// Clear all failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Recorded operations that changed remote state.
    pub fn mutations(&self) -> Vec<MockOperation> {
        self.lock()
            .operations
            .iter()
            .filter(|op| op.is_mutation())
            .cloned()
            .collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    // =========================================================================
    // Seeding (not recorded)
    // =========================================================================

    /// Commit files on top of `branch`, creating the branch from the default
    /// branch if needed. Returns the new head.
    pub fn commit_files(&self, branch: &str, files: &[(&str, &str)]) -> Oid {
        let mut inner = self.lock();
        let parent = inner
            .head(branch)
            .or_else(|| inner.head(&inner.default_branch));
        let mut tree = parent
            .as_ref()
            .and_then(|p| inner.commits.get(p))
            .map(|c| c.tree.clone())
            .unwrap_or_default();
        for (path, content) in files {
            tree.insert(path.to_string(), content.as_bytes().to_vec());
        }
        let oid = inner.store_commit(parent, tree, "seed");
        inner.refs.insert(format!("refs/heads/{branch}"), oid.clone());
        oid
    }

    /// Store a binary file on `branch`.
    pub fn commit_binary(&self, branch: &str, path: &str, content: &[u8]) -> Oid {
        let mut inner = self.lock();
        let parent = inner.head(branch);
        let mut tree = parent
            .as_ref()
            .and_then(|p| inner.commits.get(p))
            .map(|c| c.tree.clone())
            .unwrap_or_default();
        tree.insert(path.to_string(), content.to_vec());
        let oid = inner.store_commit(parent, tree, "seed binary");
        inner.refs.insert(format!("refs/heads/{branch}"), oid.clone());
        oid
    }

    /// Point `name` (fully qualified) at `oid`.
    pub fn set_ref(&self, name: &str, oid: &Oid) {
        self.lock().refs.insert(name.to_string(), oid.clone());
    }

    /// Seed an annotated tag. Returns the tag object id.
    pub fn seed_annotated_tag(&self, tag: &str, target: &Oid, message: &str) -> Oid {
        let mut inner = self.lock();
        let oid = blob_hash(format!("tag {tag}\nobject {target}\n{message}").as_bytes());
        inner.tags.insert(
            oid.clone(),
            TagObject {
                oid: oid.clone(),
                tag: tag.to_string(),
                message: message.to_string(),
                target: target.clone(),
            },
        );
        inner.refs.insert(format!("refs/tags/{tag}"), oid.clone());
        oid
    }

    /// Seed an open pull request.
    pub fn seed_pull_request(
        &self,
        head: &str,
        base: &str,
        title: &str,
        cross_repository: bool,
    ) -> PullRequest {
        let mut inner = self.lock();
        let number = inner.next_id();
        let pr = PullRequest {
            number,
            url: format!("https://github.com/mock/repo/pull/{number}"),
            is_draft: false,
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            node_id: Some(format!("PR_{number}")),
        };
        inner.prs.push(MockPullRequest {
            pr: pr.clone(),
            open: true,
            cross_repository,
            auto_merge: None,
        });
        pr
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Head of `branch`.
    pub fn head(&self, branch: &str) -> Option<Oid> {
        self.lock().head(branch)
    }

    /// Object a fully-qualified ref points at (unpeeled).
    pub fn ref_target(&self, name: &str) -> Option<Oid> {
        self.lock().refs.get(name).cloned()
    }

    /// Content of `path` at the head of `branch`.
    pub fn file(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        let inner = self.lock();
        let head = inner.head(branch)?;
        inner.commits.get(&head)?.tree.get(path).cloned()
    }

    /// Parent of a commit.
    pub fn parent(&self, oid: &Oid) -> Option<Oid> {
        self.lock().commits.get(oid).and_then(|c| c.parent.clone())
    }

    /// Tag object by id.
    pub fn tag_object(&self, oid: &Oid) -> Option<TagObject> {
        self.lock().tags.get(oid).cloned()
    }

    /// All pull requests.
    pub fn pull_requests(&self) -> Vec<PullRequest> {
        self.lock().prs.iter().map(|p| p.pr.clone()).collect()
    }

    /// Auto-merge method enabled on a PR.
    pub fn auto_merge(&self, number: u64) -> Option<MergeMethod> {
        self.lock()
            .prs
            .iter()
            .find(|p| p.pr.number == number)
            .and_then(|p| p.auto_merge)
    }

    /// All deployments.
    pub fn deployments(&self) -> Vec<Deployment> {
        self.lock().deployments.clone()
    }

    /// All deployment statuses with their deployment id.
    pub fn deployment_statuses(&self) -> Vec<(u64, DeploymentStatus)> {
        self.lock().statuses.clone()
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    /// Return the configured failure for `op`, if any.
    fn check_fail(&self, op: Op) -> Result<(), ForgeError> {
        match self.lock().fail_on.get(&op) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

fn unprocessable(message: impl Into<String>) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: message.into(),
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn repository(&self) -> &RepoSlug {
        &self.repo
    }

    fn commit_url(&self, sha: &Oid) -> String {
        format!("https://github.com/mock/repo/commit/{sha}")
    }

    async fn repository_info(&self) -> Result<RepositoryInfo, ForgeError> {
        self.check_fail(Op::RepositoryInfo)?;
        let inner = self.lock();
        Ok(RepositoryInfo {
            node_id: inner.node_id.clone(),
            is_empty: inner.commits.is_empty(),
            default_branch: inner.default_branch.clone(),
            default_branch_oid: inner.head(&inner.default_branch),
            merge: inner.merge,
        })
    }

    async fn commit_sha(&self, hash: &str) -> Result<Option<Oid>, ForgeError> {
        self.check_fail(Op::CommitSha)?;
        let inner = self.lock();
        let mut matches = inner.commits.keys().filter(|oid| oid.starts_with(hash));
        match (matches.next(), matches.next()) {
            (Some(oid), None) => Ok(Some(oid.clone())),
            (Some(_), Some(_)) => Err(unprocessable(format!("short SHA {hash} is ambiguous"))),
            _ => Ok(None),
        }
    }

    async fn resolve_expression(&self, expression: &str) -> Result<Option<Oid>, ForgeError> {
        self.check_fail(Op::ResolveExpression)?;
        let inner = self.lock();

        let (name, steps) = match expression.rsplit_once('~') {
            Some((name, n)) => match n.parse::<usize>() {
                Ok(n) => (name, n),
                Err(_) if n.is_empty() => (name, 1),
                Err(_) => return Ok(None),
            },
            None => (expression, 0),
        };

        let mut current = inner.resolve_name(name);
        for _ in 0..steps {
            current = current.and_then(|oid| inner.commits.get(&oid)?.parent.clone());
        }
        Ok(current)
    }

    async fn file_oid(&self, branch: &str, path: &str) -> Result<Option<Oid>, ForgeError> {
        self.check_fail(Op::FileOid)?;
        Ok(self.file(branch, path).map(|content| blob_hash(&content)))
    }

    async fn file_text(&self, branch: &str, path: &str) -> Result<Option<String>, ForgeError> {
        self.check_fail(Op::FileText)?;
        Ok(self
            .file(branch, path)
            .and_then(|content| String::from_utf8(content).ok()))
    }

    async fn get_ref(&self, name: &RefName) -> Result<Option<RemoteRef>, ForgeError> {
        self.check_fail(Op::GetRef)?;
        let inner = self.lock();
        Ok(inner.refs.get(name.as_str()).map(|oid| RemoteRef {
            name: name.clone(),
            oid: oid.clone(),
            kind: inner.kind(oid),
        }))
    }

    async fn create_ref(&self, name: &RefName, oid: &Oid) -> Result<(), ForgeError> {
        self.record(MockOperation::CreateRef {
            name: name.to_string(),
            oid: oid.clone(),
        });
        self.check_fail(Op::CreateRef)?;

        let mut inner = self.lock();
        if inner.refs.contains_key(name.as_str()) {
            return Err(unprocessable("Reference already exists"));
        }
        if !inner.commits.contains_key(oid) && !inner.tags.contains_key(oid) {
            return Err(unprocessable("Object does not exist"));
        }
        inner.refs.insert(name.to_string(), oid.clone());
        Ok(())
    }

    async fn update_ref(&self, name: &RefName, oid: &Oid, force: bool) -> Result<(), ForgeError> {
        self.record(MockOperation::UpdateRef {
            name: name.to_string(),
            oid: oid.clone(),
            force,
        });
        self.check_fail(Op::UpdateRef)?;

        let mut inner = self.lock();
        let current = inner
            .refs
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| unprocessable("Reference does not exist"))?;
        if !inner.commits.contains_key(oid) && !inner.tags.contains_key(oid) {
            return Err(unprocessable("Object does not exist"));
        }
        if !force {
            let old = inner.peel(&current);
            let new = inner.peel(oid);
            if !inner.is_ancestor(&old, &new) {
                return Err(unprocessable("Update is not a fast forward"));
            }
        }
        inner.refs.insert(name.to_string(), oid.clone());
        Ok(())
    }

    async fn delete_ref(&self, name: &RefName) -> Result<(), ForgeError> {
        self.record(MockOperation::DeleteRef {
            name: name.to_string(),
        });
        self.check_fail(Op::DeleteRef)?;

        match self.lock().refs.remove(name.as_str()) {
            Some(_) => Ok(()),
            None => Err(unprocessable("Reference does not exist")),
        }
    }

    async fn create_tag_object(
        &self,
        tag: &str,
        message: &str,
        target: &Oid,
    ) -> Result<Oid, ForgeError> {
        self.record(MockOperation::CreateTagObject {
            tag: tag.to_string(),
            target: target.clone(),
        });
        self.check_fail(Op::CreateTagObject)?;

        let mut inner = self.lock();
        if !inner.commits.contains_key(target) {
            return Err(unprocessable("Object does not exist"));
        }
        let id = inner.next_id();
        let oid = blob_hash(format!("tag {tag}\nobject {target}\n{id}\n{message}").as_bytes());
        inner.tags.insert(
            oid.clone(),
            TagObject {
                oid: oid.clone(),
                tag: tag.to_string(),
                message: message.to_string(),
                target: target.clone(),
            },
        );
        Ok(oid)
    }

    async fn get_tag_object(&self, oid: &Oid) -> Result<TagObject, ForgeError> {
        self.check_fail(Op::GetTagObject)?;
        self.lock()
            .tags
            .get(oid)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("tag object {oid}")))
    }

    async fn list_refs(&self, ref_type: RefType) -> Result<Vec<RefEntry>, ForgeError> {
        self.check_fail(Op::ListRefs)?;
        let inner = self.lock();
        let mut entries = Vec::new();
        for (name, oid) in inner.refs.range(ref_type.prefix().to_string()..) {
            if !name.starts_with(ref_type.prefix()) {
                break;
            }
            if let Ok(name) = RefName::new(name.as_str()) {
                entries.push(RefEntry {
                    name,
                    commit: inner.peel(oid),
                });
            }
        }
        Ok(entries)
    }

    async fn create_commit(&self, request: CommitRequest) -> Result<Oid, ForgeError> {
        self.record(MockOperation::CreateCommit {
            branch: request.branch.to_string(),
            expected_head: request.expected_head.clone(),
            additions: request.additions.iter().map(|a| a.path.clone()).collect(),
            deletions: request.deletions.clone(),
        });
        self.check_fail(Op::CreateCommit)?;

        let mut inner = self.lock();
        let head = inner
            .head(request.branch.as_str())
            .ok_or_else(|| ForgeError::NotFound(format!("branch {}", request.branch)))?;
        if head != request.expected_head {
            return Err(ForgeError::Conflict(format!(
                "Expected branch to point to \"{}\" but it did not",
                request.expected_head
            )));
        }

        let mut tree = inner
            .commits
            .get(&head)
            .map(|c| c.tree.clone())
            .unwrap_or_default();
        for addition in request.additions {
            tree.insert(addition.path, addition.contents);
        }
        for path in &request.deletions {
            tree.remove(path);
        }

        let oid = inner.store_commit(Some(head), tree, &request.message.full());
        inner
            .refs
            .insert(request.branch.as_ref_name().to_string(), oid.clone());
        Ok(oid)
    }

    async fn find_pull_request(
        &self,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>, ForgeError> {
        self.record(MockOperation::FindPullRequest {
            head: head.to_string(),
            base: base.to_string(),
        });
        self.check_fail(Op::FindPullRequest)?;

        Ok(self
            .lock()
            .prs
            .iter()
            .find(|p| p.open && !p.cross_repository && p.pr.head == head && p.pr.base == base)
            .map(|p| p.pr.clone()))
    }

    async fn create_pull_request(
        &self,
        request: CreatePrRequest,
    ) -> Result<PullRequest, ForgeError> {
        self.record(MockOperation::CreatePullRequest {
            head: request.head.clone(),
            base: request.base.clone(),
            title: request.title.clone(),
            draft: request.draft,
        });
        self.check_fail(Op::CreatePullRequest)?;

        let mut inner = self.lock();
        if inner.head(&request.head).is_none() {
            return Err(unprocessable(format!("head {} does not exist", request.head)));
        }
        if inner.prs.iter().any(|p| {
            p.open
                && !p.cross_repository
                && p.pr.head == request.head
                && p.pr.base == request.base
        }) {
            return Err(unprocessable(format!(
                "A pull request already exists for mock:{}.",
                request.head
            )));
        }

        let number = inner.next_id();
        let pr = PullRequest {
            number,
            url: format!("https://github.com/mock/repo/pull/{number}"),
            is_draft: request.draft,
            head: request.head,
            base: request.base,
            title: request.title,
            node_id: Some(format!("PR_{number}")),
        };
        inner.prs.push(MockPullRequest {
            pr: pr.clone(),
            open: true,
            cross_repository: false,
            auto_merge: None,
        });
        Ok(pr)
    }

    async fn enable_auto_merge(
        &self,
        pr: &PullRequest,
        method: MergeMethod,
    ) -> Result<(), ForgeError> {
        self.record(MockOperation::EnableAutoMerge {
            number: pr.number,
            method,
        });
        self.check_fail(Op::EnableAutoMerge)?;

        let mut inner = self.lock();
        if !inner.merge.auto_merge_allowed || !inner.merge.allows(method) {
            return Err(unprocessable(format!(
                "Pull request auto merge with method {} is not allowed",
                method
            )));
        }
        let entry = inner
            .prs
            .iter_mut()
            .find(|p| p.pr.number == pr.number)
            .ok_or_else(|| ForgeError::NotFound(format!("PR #{}", pr.number)))?;
        entry.auto_merge = Some(method);
        Ok(())
    }

    async fn list_deployments(
        &self,
        sha: &Oid,
        environment: &str,
    ) -> Result<Vec<Deployment>, ForgeError> {
        self.check_fail(Op::ListDeployments)?;
        Ok(self
            .lock()
            .deployments
            .iter()
            .rev()
            .filter(|d| &d.sha == sha && d.environment == environment)
            .cloned()
            .collect())
    }

    async fn create_deployment(
        &self,
        request: DeploymentRequest,
    ) -> Result<Deployment, ForgeError> {
        self.record(MockOperation::CreateDeployment {
            sha: request.sha.clone(),
            environment: request.environment.clone(),
        });
        self.check_fail(Op::CreateDeployment)?;

        let mut inner = self.lock();
        let deployment = Deployment {
            id: inner.next_id(),
            sha: request.sha,
            environment: request.environment,
        };
        inner.deployments.push(deployment.clone());
        Ok(deployment)
    }

    async fn create_deployment_status(
        &self,
        deployment_id: u64,
        request: DeploymentStatusRequest,
    ) -> Result<DeploymentStatus, ForgeError> {
        self.record(MockOperation::CreateDeploymentStatus {
            deployment_id,
            state: request.state.to_string(),
        });
        self.check_fail(Op::CreateDeploymentStatus)?;

        let mut inner = self.lock();
        if !inner.deployments.iter().any(|d| d.id == deployment_id) {
            return Err(ForgeError::NotFound(format!("deployment {deployment_id}")));
        }
        let status = DeploymentStatus {
            id: inner.next_id(),
            state: request.state,
        };
        inner.statuses.push((deployment_id, status.clone()));
        Ok(status)
    }
}
