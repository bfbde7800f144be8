use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::GitHubConfig;
use crate::credentials::Credentials;
use crate::error::{PrivacyError, Result};

/// Repository visibility as far as this tool is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Readable by anyone
    Public,
    /// Access-restricted (private or enterprise-internal)
    Private,
}

/// A repository owned by the authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub name: String,
    pub owner: String,
    pub visibility: Visibility,
    pub stars: u32,
    pub forks: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RepositoryRecord {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// GitHub logins are case-insensitive
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner.eq_ignore_ascii_case(username)
    }
}

/// Subset of GitHub's repository payload that the tool reads
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepository {
    pub name: String,
    pub owner: ApiOwner,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOwner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

impl From<ApiRepository> for RepositoryRecord {
    fn from(repo: ApiRepository) -> Self {
        // `visibility` is authoritative when present; older payloads only carry `private`
        let visibility = match repo.visibility.as_deref() {
            Some("public") => Visibility::Public,
            Some(_) => Visibility::Private,
            None if repo.private => Visibility::Private,
            None => Visibility::Public,
        };

        Self {
            name: repo.name,
            owner: repo.owner.login,
            visibility,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            updated_at: repo.updated_at,
        }
    }
}

/// Keep only public repositories owned by `username`, preserving order
pub fn owned_public(records: Vec<RepositoryRecord>, username: &str) -> Vec<RepositoryRecord> {
    records
        .into_iter()
        .filter(|repo| {
            let keep = repo.is_public() && repo.is_owned_by(username);
            if !keep {
                debug!(
                    "Skipping {}/{} ({:?})",
                    repo.owner, repo.name, repo.visibility
                );
            }
            keep
        })
        .collect()
}

/// Query string for `GET /user/repos`
#[derive(Debug)]
struct ListReposParams<'a> {
    visibility: &'a str,
    affiliation: &'a str,
    sort: &'a str,
    direction: &'a str,
    per_page: u8,
    page: u32,
}

impl ListReposParams<'_> {
    /// Relative route; octocrab only attaches the token to relative URIs
    fn route(&self) -> String {
        format!(
            "/user/repos?visibility={}&affiliation={}&sort={}&direction={}&per_page={}&page={}",
            self.visibility, self.affiliation, self.sort, self.direction, self.per_page, self.page
        )
    }
}

#[derive(Debug, Serialize)]
struct UpdateVisibility {
    private: bool,
}

/// Hosting-service operations a run needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// All public repositories owned by the authenticated user, in API order
    async fn list_public_repositories(&self) -> Result<Vec<RepositoryRecord>>;

    /// Set a single repository's visibility to private
    async fn make_private(&self, name: &str) -> Result<()>;
}

/// GitHub client wrapper bound to one set of credentials
pub struct GitHubClient {
    client: Octocrab,
    username: String,
    per_page: u8,
}

impl GitHubClient {
    /// Build a client for the configured API endpoint
    pub fn new(credentials: &Credentials, config: &GitHubConfig) -> Result<Self> {
        // Every request is sent once; a 429 or 5xx is reported, not resent
        let client = Octocrab::builder()
            .add_retry_config(RetryConfig::None)
            .base_uri(config.api_url.as_str())
            .map_err(|e| {
                PrivacyError::Network(format!("invalid API URL {}: {}", config.api_url, e))
            })?
            .personal_token(credentials.token().expose_secret().to_string())
            .build()
            .map_err(PrivacyError::from_octocrab)?;

        Ok(Self {
            client,
            username: credentials.username().to_string(),
            per_page: config.per_page,
        })
    }

    /// Check the token against `GET /user` and return the authenticated login
    pub async fn verify_authentication(&self) -> Result<String> {
        let response = self
            .client
            ._get("/user")
            .await
            .map_err(PrivacyError::from_octocrab)?;
        let status = response.status();
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(PrivacyError::from_octocrab)?;
        let user: ApiUser = decode(status.as_u16(), status.canonical_reason(), &body)?;

        info!("Authenticated as GitHub user: {}", user.login);

        if !user.login.eq_ignore_ascii_case(&self.username) {
            warn!(
                "Token belongs to {} but username is {}; only repositories owned by {} will be listed",
                user.login, self.username, self.username
            );
        }

        Ok(user.login)
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<ApiRepository>> {
        let params = ListReposParams {
            visibility: "public",
            affiliation: "owner",
            sort: "updated",
            direction: "desc",
            per_page: self.per_page,
            page,
        };

        let response = self
            .client
            ._get(params.route())
            .await
            .map_err(PrivacyError::from_octocrab)?;
        let status = response.status();
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(PrivacyError::from_octocrab)?;
        decode(status.as_u16(), status.canonical_reason(), &body)
    }
}

/// Decode a 2xx body, or classify the status of anything else
fn decode<T: DeserializeOwned>(status: u16, reason: Option<&str>, body: &str) -> Result<T> {
    if !(200..300).contains(&status) {
        return Err(PrivacyError::from_response(
            status,
            reason.unwrap_or("Unexpected status"),
            body,
        ));
    }

    // PATCH responses may legitimately be empty
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| PrivacyError::Api {
        status,
        message: format!("Unexpected response body: {}", e),
    })
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn list_public_repositories(&self) -> Result<Vec<RepositoryRecord>> {
        debug!("Fetching public repositories for: {}", self.username);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let items = match self.fetch_page(page).await {
                Ok(items) => items,
                Err(e) => {
                    // Partial listings are never returned
                    error!("Failed to fetch repositories page {}: {}", page, e);
                    return Err(e);
                }
            };

            if items.is_empty() {
                break;
            }

            debug!("Page {} returned {} repositories", page, items.len());
            repositories.extend(items.into_iter().map(RepositoryRecord::from));
            page += 1;
        }

        let total = repositories.len();
        let owned = owned_public(repositories, &self.username);

        info!(
            "Found {} public repositories owned by {} ({} listed)",
            owned.len(),
            self.username,
            total
        );
        Ok(owned)
    }

    async fn make_private(&self, name: &str) -> Result<()> {
        let route = format!("/repos/{}/{}", self.username, name);
        debug!("PATCH {}", route);

        let response = self
            .client
            ._patch(route, Some(&UpdateVisibility { private: true }))
            .await
            .map_err(PrivacyError::from_octocrab)?;
        let status = response.status();
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(PrivacyError::from_octocrab)?;
        let response: serde_json::Value =
            decode(status.as_u16(), status.canonical_reason(), &body).map_err(|e| match e {
                PrivacyError::NotFound(_) => {
                    PrivacyError::NotFound(format!("{}/{}", self.username, name))
                }
                other => other,
            })?;

        if response.get("private").and_then(|v| v.as_bool()) == Some(false) {
            return Err(PrivacyError::Api {
                status: 200,
                message: format!("{} is still public after the update", name),
            });
        }

        info!("Made {}/{} private", self.username, name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn record(name: &str, owner: &str, visibility: Visibility) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_string(),
            owner: owner.to_string(),
            visibility,
            stars: 0,
            forks: 0,
            updated_at: None,
        }
    }

    #[test]
    fn test_visibility_field_wins_over_private_flag() {
        let repo: ApiRepository = serde_json::from_str(
            r#"{"name": "a", "owner": {"login": "me"}, "private": false, "visibility": "internal"}"#,
        )
        .unwrap();
        assert_eq!(RepositoryRecord::from(repo).visibility, Visibility::Private);

        let repo: ApiRepository = serde_json::from_str(
            r#"{"name": "b", "owner": {"login": "me"}, "private": true}"#,
        )
        .unwrap();
        assert_eq!(RepositoryRecord::from(repo).visibility, Visibility::Private);

        let repo: ApiRepository = serde_json::from_str(
            r#"{"name": "c", "owner": {"login": "me"}, "visibility": "public",
                "stargazers_count": 7, "forks_count": 2, "updated_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        let record = RepositoryRecord::from(repo);
        assert!(record.is_public());
        assert_eq!(record.stars, 7);
        assert_eq!(record.forks, 2);
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn test_owned_public_filters_and_keeps_order() {
        let records = vec![
            record("z", "me", Visibility::Public),
            record("private-one", "me", Visibility::Private),
            record("theirs", "someone-else", Visibility::Public),
            record("a", "Me", Visibility::Public),
        ];

        let names: Vec<_> = owned_public(records, "me")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_listing_route_carries_all_filters() {
        let params = ListReposParams {
            visibility: "public",
            affiliation: "owner",
            sort: "updated",
            direction: "desc",
            per_page: 50,
            page: 3,
        };
        assert_eq!(
            params.route(),
            "/user/repos?visibility=public&affiliation=owner&sort=updated&direction=desc&per_page=50&page=3"
        );
    }

    #[test]
    fn test_decode_classifies_non_success_status() {
        let err = decode::<serde_json::Value>(502, Some("Bad Gateway"), "").unwrap_err();
        assert_eq!(
            err,
            PrivacyError::Api {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );

        let value: serde_json::Value = decode(200, Some("OK"), "").unwrap();
        assert!(value.is_null());

        let user: ApiUser = decode(200, Some("OK"), r#"{"login": "octocat"}"#).unwrap();
        assert_eq!(user.login, "octocat");
    }

    #[quickcheck]
    fn prop_owned_public_only_yields_eligible(entries: Vec<(bool, bool)>) -> bool {
        let records: Vec<_> = entries
            .iter()
            .enumerate()
            .map(|(i, (public, mine))| {
                record(
                    &format!("repo-{}", i),
                    if *mine { "me" } else { "other" },
                    if *public {
                        Visibility::Public
                    } else {
                        Visibility::Private
                    },
                )
            })
            .collect();
        let expected = entries.iter().filter(|(public, mine)| *public && *mine).count();

        let kept = owned_public(records, "me");
        kept.len() == expected && kept.iter().all(|r| r.is_public() && r.is_owned_by("me"))
    }
}
