//! In-memory hosting service
//!
//! Holds repositories as flat maps from file path to blob sha per branch.
//! Directories exist implicitly through the paths below them. Every
//! successful mutation is appended to a log so tests can assert on exactly
//! what was changed.

use crate::{HostingClient, PullRequestDraft};
use migsweep_errors::{Error, HostingError};
use migsweep_types::{CommitRef, ContentEntry, EntryKind, PullRequestRef, RepoId, Repository};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A change applied to the in-memory host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    ForkCreated {
        source: RepoId,
        fork: RepoId,
    },
    BranchCreated {
        repo: RepoId,
        branch: String,
        from: CommitRef,
    },
    BranchDeleted {
        repo: RepoId,
        branch: String,
    },
    FileDeleted {
        repo: RepoId,
        branch: String,
        path: String,
        message: String,
    },
    PullRequestOpened {
        base: RepoId,
        number: u64,
    },
}

/// A pull request opened against the in-memory host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub number: u64,
    pub draft: PullRequestDraft,
}

#[derive(Debug, Clone, Default)]
struct Branch {
    head: u64,
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct HostedRepo {
    repository: Repository,
    branches: BTreeMap<String, Branch>,
}

#[derive(Debug, Default)]
struct State {
    repos: BTreeMap<RepoId, HostedRepo>,
    organizations: BTreeMap<String, Vec<RepoId>>,
    listing_failures: HashMap<(RepoId, String), HostingError>,
    delete_failures: HashMap<(RepoId, String), HostingError>,
    pull_requests: Vec<PullRequestRecord>,
    mutations: Vec<Mutation>,
    commits: u64,
}

impl State {
    fn repo(&self, id: &RepoId) -> Result<&HostedRepo, Error> {
        self.repos.get(id).ok_or_else(|| not_found(id.to_string()))
    }

    fn repo_mut(&mut self, id: &RepoId) -> Result<&mut HostedRepo, Error> {
        self.repos
            .get_mut(id)
            .ok_or_else(|| not_found(id.to_string()))
    }

    fn next_commit(&mut self) -> u64 {
        self.commits += 1;
        self.commits
    }
}

/// In-memory [`HostingClient`]
#[derive(Debug)]
pub struct MemoryHost {
    login: String,
    credentials_valid: bool,
    report_existing_forks: bool,
    state: Mutex<State>,
}

impl MemoryHost {
    /// Create an empty host acting as `login`
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            credentials_valid: true,
            report_existing_forks: false,
            state: Mutex::new(State::default()),
        }
    }

    /// Reject every call with an authentication error
    #[must_use]
    pub fn with_rejected_credentials(mut self) -> Self {
        self.credentials_valid = false;
        self
    }

    /// Answer `create_fork` with `AlreadyExists` when the fork is present
    #[must_use]
    pub fn with_fork_conflicts(mut self) -> Self {
        self.report_existing_forks = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn authorize(&self) -> Result<(), Error> {
        if self.credentials_valid {
            Ok(())
        } else {
            Err(HostingError::Authentication {
                message: "Bad credentials".to_string(),
            }
            .into())
        }
    }

    /// Add a repository whose default branch holds `files` (path, sha)
    pub fn add_repository<'a, I>(&self, repository: Repository, files: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut state = self.state();
        let head = state.next_commit();
        let branch = Branch {
            head,
            files: files
                .into_iter()
                .map(|(path, sha)| (path.to_string(), sha.to_string()))
                .collect(),
        };
        let mut branches = BTreeMap::new();
        branches.insert(repository.default_branch.clone(), branch);
        state.repos.insert(
            repository.id.clone(),
            HostedRepo {
                repository,
                branches,
            },
        );
    }

    /// Register `repo` as belonging to organization `org`
    pub fn add_to_organization(&self, org: &str, repo: &RepoId) {
        self.state()
            .organizations
            .entry(org.to_string())
            .or_default()
            .push(repo.clone());
    }

    /// Make listings of `path` in `repo` fail with `error`
    pub fn fail_listing(&self, repo: &RepoId, path: &str, error: HostingError) {
        self.state()
            .listing_failures
            .insert((repo.clone(), path.to_string()), error);
    }

    /// Make deletes of `path` in `repo` fail with `error`
    pub fn fail_delete(&self, repo: &RepoId, path: &str, error: HostingError) {
        self.state()
            .delete_failures
            .insert((repo.clone(), path.to_string()), error);
    }

    /// File paths on `branch`, sorted
    #[must_use]
    pub fn files(&self, repo: &RepoId, branch: &str) -> Option<Vec<String>> {
        let state = self.state();
        let branch = state.repos.get(repo)?.branches.get(branch)?;
        Some(branch.files.keys().cloned().collect())
    }

    #[must_use]
    pub fn branches(&self, repo: &RepoId) -> Vec<String> {
        self.state()
            .repos
            .get(repo)
            .map(|hosted| hosted.branches.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_repository(&self, repo: &RepoId) -> bool {
        self.state().repos.contains_key(repo)
    }

    #[must_use]
    pub fn pull_requests(&self) -> Vec<PullRequestRecord> {
        self.state().pull_requests.clone()
    }

    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }
}

#[async_trait::async_trait]
impl HostingClient for MemoryHost {
    async fn authenticated_user(&self) -> Result<String, Error> {
        self.authorize()?;
        Ok(self.login.clone())
    }

    async fn repository(&self, id: &RepoId) -> Result<Repository, Error> {
        self.authorize()?;
        Ok(self.state().repo(id)?.repository.clone())
    }

    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<Repository>, Error> {
        self.authorize()?;
        let state = self.state();
        let members = state
            .organizations
            .get(org)
            .ok_or_else(|| not_found(format!("organization {org}")))?;
        members
            .iter()
            .map(|id| Ok(state.repo(id)?.repository.clone()))
            .collect()
    }

    async fn list_dir(
        &self,
        repo: &RepoId,
        path: &str,
        reference: &str,
    ) -> Result<Vec<ContentEntry>, Error> {
        self.authorize()?;
        let state = self.state();
        let path = path.trim_matches('/');
        if let Some(error) = state
            .listing_failures
            .get(&(repo.clone(), path.to_string()))
        {
            return Err(error.clone().into());
        }

        let hosted = state.repo(repo)?;
        let branch = hosted
            .branches
            .get(reference)
            .ok_or_else(|| not_found(format!("{repo}@{reference}")))?;

        let what = format!("{repo}:{path}");
        if branch.files.contains_key(path) {
            return Err(HostingError::NotADirectory { path: what }.into());
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();
        for (file, sha) in branch.files.range(prefix.clone()..) {
            let Some(rest) = file.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => files.push(ContentEntry::new(file.clone(), EntryKind::File, sha.clone())),
            }
        }

        // An empty repository and a missing directory both answer NotFound
        if files.is_empty() && dirs.is_empty() {
            return Err(not_found(what));
        }

        let mut entries: Vec<ContentEntry> = dirs
            .into_iter()
            .map(|dir| {
                let dir_path = format!("{prefix}{dir}");
                let sha = format!("tree:{dir_path}");
                ContentEntry::new(dir_path, EntryKind::Dir, sha)
            })
            .collect();
        entries.extend(files);
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn default_branch_head(&self, repo: &Repository) -> Result<CommitRef, Error> {
        self.authorize()?;
        let state = self.state();
        let branch = state
            .repo(&repo.id)?
            .branches
            .get(&repo.default_branch)
            .ok_or_else(|| not_found(format!("{}@{}", repo.id, repo.default_branch)))?;
        Ok(commit_ref(branch.head))
    }

    async fn create_fork(&self, repo: &RepoId) -> Result<Repository, Error> {
        self.authorize()?;
        let mut state = self.state();
        let fork_id = repo.with_owner(self.login.clone());
        if let Some(existing) = state.repos.get(&fork_id) {
            if self.report_existing_forks {
                return Err(HostingError::AlreadyExists {
                    what: format!("fork {fork_id}"),
                }
                .into());
            }
            return Ok(existing.repository.clone());
        }

        let source = state.repo(repo)?;
        let default_branch = source.repository.default_branch.clone();
        let branch = source
            .branches
            .get(&default_branch)
            .cloned()
            .unwrap_or_default();
        let mut repository = Repository::new(fork_id.clone(), default_branch.clone());
        repository.fork = true;
        repository.html_url = Some(format!("https://memory.invalid/{fork_id}"));

        let mut branches = BTreeMap::new();
        branches.insert(default_branch, branch);
        state.repos.insert(
            fork_id.clone(),
            HostedRepo {
                repository: repository.clone(),
                branches,
            },
        );
        state.mutations.push(Mutation::ForkCreated {
            source: repo.clone(),
            fork: fork_id,
        });
        Ok(repository)
    }

    async fn create_branch(
        &self,
        repo: &RepoId,
        name: &str,
        from: &CommitRef,
    ) -> Result<(), Error> {
        self.authorize()?;
        let mut state = self.state();
        let hosted = state.repo(repo)?;
        if hosted.branches.contains_key(name) {
            return Err(HostingError::AlreadyExists {
                what: format!("branch {name} on {repo}"),
            }
            .into());
        }
        let base = hosted
            .branches
            .values()
            .find(|branch| commit_ref(branch.head) == *from)
            .cloned()
            .ok_or_else(|| HostingError::HttpError {
                status: 422,
                message: format!("Object does not exist: {from}"),
            })?;
        state
            .repo_mut(repo)?
            .branches
            .insert(name.to_string(), base);
        state.mutations.push(Mutation::BranchCreated {
            repo: repo.clone(),
            branch: name.to_string(),
            from: from.clone(),
        });
        Ok(())
    }

    async fn delete_branch(&self, repo: &RepoId, name: &str) -> Result<(), Error> {
        self.authorize()?;
        let mut state = self.state();
        if state.repo_mut(repo)?.branches.remove(name).is_none() {
            return Err(not_found(format!("branch {name} on {repo}")));
        }
        state.mutations.push(Mutation::BranchDeleted {
            repo: repo.clone(),
            branch: name.to_string(),
        });
        Ok(())
    }

    async fn delete_file(
        &self,
        repo: &RepoId,
        path: &str,
        sha: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), Error> {
        self.authorize()?;
        let mut state = self.state();
        if let Some(error) = state.delete_failures.get(&(repo.clone(), path.to_string())) {
            return Err(error.clone().into());
        }
        let head = state.next_commit();
        let target = state
            .repo_mut(repo)?
            .branches
            .get_mut(branch)
            .ok_or_else(|| not_found(format!("{repo}@{branch}")))?;
        match target.files.get(path) {
            None => return Err(not_found(format!("{repo}:{path}"))),
            Some(current) if current != sha => {
                return Err(HostingError::HttpError {
                    status: 409,
                    message: format!("{path} does not match {sha}"),
                }
                .into())
            }
            Some(_) => {}
        }
        target.files.remove(path);
        target.head = head;
        state.mutations.push(Mutation::FileDeleted {
            repo: repo.clone(),
            branch: branch.to_string(),
            path: path.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequestRef, Error> {
        self.authorize()?;
        let mut state = self.state();
        state.repo(&draft.base)?;
        if !state
            .repo(&draft.head)?
            .branches
            .contains_key(&draft.head_branch)
        {
            return Err(HostingError::HttpError {
                status: 422,
                message: format!("head {} does not exist", draft.head_ref()),
            }
            .into());
        }
        if state
            .pull_requests
            .iter()
            .any(|pr| pr.draft.base == draft.base && pr.draft.head_ref() == draft.head_ref())
        {
            return Err(HostingError::AlreadyExists {
                what: format!("pull request for {}", draft.head_ref()),
            }
            .into());
        }
        let number = state.pull_requests.len() as u64 + 1;
        state.pull_requests.push(PullRequestRecord {
            number,
            draft: draft.clone(),
        });
        state.mutations.push(Mutation::PullRequestOpened {
            base: draft.base.clone(),
            number,
        });
        Ok(PullRequestRef {
            number,
            url: format!("https://memory.invalid/{}/pull/{number}", draft.base),
        })
    }
}

fn not_found(path: String) -> Error {
    HostingError::NotFound { path }.into()
}

fn commit_ref(head: u64) -> CommitRef {
    CommitRef(format!("{head:040x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryHost, RepoId) {
        let host = MemoryHost::new("sweeper");
        let id = RepoId::new("clld", "afbo");
        host.add_repository(
            Repository::new(id.clone(), "master"),
            [
                ("alembic.ini", "s-ini"),
                ("migrations/env.py", "s-env"),
                ("migrations/versions/001_init.py", "s-001"),
                ("setup.py", "s-setup"),
            ],
        );
        (host, id)
    }

    #[tokio::test]
    async fn test_listing_derives_directories() {
        let (host, id) = seeded();
        let root = host.list_root(&id, "master").await.unwrap();
        let names: Vec<_> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alembic.ini", "migrations", "setup.py"]);
        assert!(root[1].is_dir());

        let migrations = host.list_dir(&id, "migrations", "master").await.unwrap();
        assert_eq!(migrations[0].path, "migrations/env.py");
        assert_eq!(migrations[1].path, "migrations/versions");
    }

    #[tokio::test]
    async fn test_listing_a_file_is_not_a_directory() {
        let (host, id) = seeded();
        let err = host
            .list_dir(&id, "alembic.ini", "master")
            .await
            .unwrap_err();
        assert!(err.is_not_a_directory());
        let err = host.list_dir(&id, "absent", "master").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_requires_matching_sha() {
        let (host, id) = seeded();
        let err = host
            .delete_file(&id, "setup.py", "stale", "delete setup.py", "master")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Hosting(HostingError::HttpError { status: 409, .. })
        ));
        host.delete_file(&id, "setup.py", "s-setup", "delete setup.py", "master")
            .await
            .unwrap();
        assert!(!host
            .files(&id, "master")
            .unwrap()
            .contains(&"setup.py".to_string()));
    }
}
