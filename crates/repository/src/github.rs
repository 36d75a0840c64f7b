//! GitHub REST v3 implementation of [`HostingClient`]

use crate::{HostingClient, PullRequestDraft};
use migsweep_config::NetworkConfig;
use migsweep_errors::{Error, HostingError};
use migsweep_net::{join_segments, parse_url, read_json, read_text, NetClient, NetConfig};
use migsweep_types::{CommitRef, ContentEntry, EntryKind, PullRequestRef, RepoId, Repository};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

/// Client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    net: NetClient,
    base: Url,
}

impl GitHubClient {
    /// Create a client talking to `api_url` with the given token
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(api_url: &str, token: &str, net: NetConfig) -> Result<Self, Error> {
        let base = parse_url(api_url)?;
        let net = NetClient::new(
            net.with_token(token)
                .with_header("Accept", ACCEPT)
                .with_header("X-GitHub-Api-Version", API_VERSION),
        )?;
        Ok(Self { net, base })
    }

    /// Create a client from the `[network]` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the configured API URL is invalid.
    pub fn from_config(config: &NetworkConfig, token: &str) -> Result<Self, Error> {
        let net = NetConfig {
            timeout: config.timeout(),
            retry_count: config.retries,
            retry_delay: config.retry_delay(),
            ..NetConfig::default()
        };
        Self::new(&config.api_url, token, net)
    }

    fn url(&self, segments: &[&str]) -> Result<String, Error> {
        Ok(join_segments(&self.base, segments)?.to_string())
    }

    fn repo_url(&self, repo: &RepoId, rest: &[&str]) -> Result<String, Error> {
        let mut segments = vec!["repos", repo.owner(), repo.name()];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }
}

#[async_trait::async_trait]
impl HostingClient for GitHubClient {
    async fn authenticated_user(&self) -> Result<String, Error> {
        let url = self.url(&["user"])?;
        let response = check(self.net.get(&url).await?, "user").await?;
        let user: UserDto = read_json(response, &url).await?;
        Ok(user.login)
    }

    async fn repository(&self, id: &RepoId) -> Result<Repository, Error> {
        let url = self.repo_url(id, &[])?;
        let response = check(self.net.get(&url).await?, &id.to_string()).await?;
        let dto: RepoDto = read_json(response, &url).await?;
        dto.into_repository()
    }

    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<Repository>, Error> {
        let url = self.url(&["orgs", org, "repos"])?;
        let mut repositories = Vec::new();
        let mut page = 1u32;
        loop {
            let query = [
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let response = check(
                self.net.get_with_query(&url, &query).await?,
                &format!("organization {org}"),
            )
            .await?;
            let batch: Vec<RepoDto> = read_json(response, &url).await?;
            let short = batch.len() < PAGE_SIZE;
            for dto in batch {
                repositories.push(dto.into_repository()?);
            }
            if short {
                break;
            }
            page += 1;
        }
        tracing::debug!(org, count = repositories.len(), "listed organization repositories");
        Ok(repositories)
    }

    async fn list_dir(
        &self,
        repo: &RepoId,
        path: &str,
        reference: &str,
    ) -> Result<Vec<ContentEntry>, Error> {
        let url = self.repo_url(repo, &["contents", path])?;
        let what = format!("{repo}:{path}");
        let response = check(
            self.net.get_with_query(&url, &[("ref", reference)]).await?,
            &what,
        )
        .await?;
        // A single object comes back when `path` names a file
        let body: Value = read_json(response, &url).await?;
        if !body.is_array() {
            return Err(HostingError::NotADirectory { path: what }.into());
        }
        let items: Vec<ContentDto> =
            serde_json::from_value(body).map_err(|e| HostingError::InvalidResponse {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;
        Ok(items.into_iter().map(ContentDto::into_entry).collect())
    }

    async fn default_branch_head(&self, repo: &Repository) -> Result<CommitRef, Error> {
        let url = self.repo_url(
            &repo.id,
            &["git", "ref", "heads", repo.default_branch.as_str()],
        )?;
        let response = check(
            self.net.get(&url).await?,
            &format!("{}@{}", repo.id, repo.default_branch),
        )
        .await?;
        let reference: RefDto = read_json(response, &url).await?;
        Ok(CommitRef(reference.object.sha))
    }

    async fn create_fork(&self, repo: &RepoId) -> Result<Repository, Error> {
        let url = self.repo_url(repo, &["forks"])?;
        let response = check(
            self.net.post_json(&url, &json!({})).await?,
            &format!("fork of {repo}"),
        )
        .await?;
        let dto: RepoDto = read_json(response, &url).await?;
        dto.into_repository()
    }

    async fn create_branch(
        &self,
        repo: &RepoId,
        name: &str,
        from: &CommitRef,
    ) -> Result<(), Error> {
        let url = self.repo_url(repo, &["git", "refs"])?;
        let body = json!({ "ref": format!("refs/heads/{name}"), "sha": from.as_str() });
        check(
            self.net.post_json(&url, &body).await?,
            &format!("branch {name} on {repo}"),
        )
        .await?;
        Ok(())
    }

    async fn delete_branch(&self, repo: &RepoId, name: &str) -> Result<(), Error> {
        let url = self.repo_url(repo, &["git", "refs", "heads", name])?;
        check(
            self.net.delete(&url).await?,
            &format!("branch {name} on {repo}"),
        )
        .await?;
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
        let url = self.repo_url(repo, &["contents", path])?;
        let body = json!({ "message": message, "sha": sha, "branch": branch });
        check(
            self.net.delete_json(&url, &body).await?,
            &format!("{repo}:{path}"),
        )
        .await?;
        Ok(())
    }

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequestRef, Error> {
        let url = self.repo_url(&draft.base, &["pulls"])?;
        let body = json!({
            "title": draft.title,
            "head": draft.head_ref(),
            "base": draft.base_branch,
            "body": draft.body,
        });
        let response = check(
            self.net.post_json(&url, &body).await?,
            &format!("pull request {} -> {}", draft.head_ref(), draft.base),
        )
        .await?;
        let pull: PullDto = read_json(response, &url).await?;
        Ok(PullRequestRef {
            number: pull.number,
            url: pull.html_url,
        })
    }
}

/// Map a non-success answer onto the hosting error taxonomy
async fn check(response: Response, what: &str) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(&read_text(response).await);
    let err = match status {
        StatusCode::UNAUTHORIZED => HostingError::Authentication { message },
        StatusCode::NOT_FOUND => HostingError::NotFound {
            path: what.to_string(),
        },
        StatusCode::UNPROCESSABLE_ENTITY if message.to_lowercase().contains("already exists") => {
            HostingError::AlreadyExists {
                what: what.to_string(),
            }
        }
        _ => HostingError::HttpError {
            status: status.as_u16(),
            message,
        },
    };
    Err(err.into())
}

/// Pull the human-readable message out of a GitHub error body
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let mut parts: Vec<String> = value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .into_iter()
        .collect();
    if let Some(errors) = value.get("errors").and_then(Value::as_array) {
        parts.extend(
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .map(str::to_string),
        );
    }
    parts.join(": ")
}

#[derive(Debug, Deserialize)]
struct UserDto {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    full_name: String,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    fork: bool,
}

impl RepoDto {
    fn into_repository(self) -> Result<Repository, Error> {
        let id: RepoId = self.full_name.parse()?;
        Ok(Repository {
            id,
            archived: self.archived,
            default_branch: self.default_branch.unwrap_or_else(|| "main".to_string()),
            html_url: self.html_url,
            fork: self.fork,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ContentDto {
    path: String,
    name: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

impl ContentDto {
    fn into_entry(self) -> ContentEntry {
        let kind = match self.kind.as_str() {
            "dir" => EntryKind::Dir,
            "symlink" => EntryKind::Symlink,
            "submodule" => EntryKind::Submodule,
            _ => EntryKind::File,
        };
        ContentEntry {
            path: self.path,
            name: self.name,
            kind,
            sha: self.sha,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefDto {
    object: RefObjectDto,
}

#[derive(Debug, Deserialize)]
struct RefObjectDto {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullDto {
    number: u64,
    html_url: String,
}
