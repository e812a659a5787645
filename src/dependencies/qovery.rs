//! The platform REST API.
//!
//! Every capability a command needs is a separate trait so commands only depend on what they use,
//! and [`QoveryClient`] implements all of them over HTTPS.
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    Response,
    header::{AUTHORIZATION, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, trace};
use url::Url;

use crate::{
    config::ApiConfig,
    models::{DeployRequest, EnvironmentState, NamedEntity, Resource, ResourceKind, Source},
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("invalid {kind} '{id}' returned by the API: {reason}")]
    InvalidResource {
        kind: ResourceKind,
        id: String,
        reason: String,
    },
}

// Dependencies to resolve organization, project and environment names
#[async_trait]
pub trait OrganizationLister {
    async fn list_organizations(&self) -> Result<Vec<NamedEntity>, ApiError>;
}

#[async_trait]
pub trait ProjectLister {
    async fn list_projects(&self, organization_id: &str) -> Result<Vec<NamedEntity>, ApiError>;
}

#[async_trait]
pub trait EnvironmentLister {
    async fn list_environments(&self, project_id: &str) -> Result<Vec<NamedEntity>, ApiError>;
}

// Dependency to read the state of an environment
#[async_trait]
pub trait EnvironmentStatusGetter {
    async fn get_environment_state(
        &self,
        environment_id: &str,
    ) -> Result<EnvironmentState, ApiError>;
}

#[async_trait]
pub trait ResourceLister {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        environment_id: &str,
    ) -> Result<Vec<Resource>, ApiError>;
}

#[async_trait]
pub trait ResourceDeployer {
    async fn deploy(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        request: &DeployRequest,
    ) -> Result<(), ApiError>;
}

#[async_trait]
pub trait ProjectVariableCreator {
    async fn create_project_variable(
        &self,
        project_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError>;
}

/// HTTP client for the platform API.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct QoveryClient {
    http: reqwest::Client,
    base_url: Url,
    authorization: HeaderValue,
}

impl QoveryClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Client whose requests fail once `timeout` elapses without a complete response.
    pub fn with_timeout(config: &ApiConfig, timeout: Duration) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&config.authorization()?)?;
        authorization.set_sensitive(true);

        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("qovery-cli/", env!("CARGO_PKG_VERSION")))
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(timeout)
                .build()?,
            base_url: config.base_url.clone(),
            authorization,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        debug!(%url, "GET");

        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;

        let response = error_for_status(response).await?;

        response.json().await.map_err(|source| ApiError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let url = self.base_url.join(path)?;
        debug!(%url, "POST");

        let response = self
            .http
            .post(url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;

        error_for_status(response).await?;

        Ok(())
    }
}

async fn error_for_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    trace!(%status, url = %response.url(), "response received");

    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();

    Err(ApiError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}

#[derive(Deserialize)]
struct ResultsDto<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
struct StatusDto {
    state: EnvironmentState,
}

#[derive(Serialize)]
struct VariableDto<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourceDto {
    id: String,
    name: String,
    environment: Option<IdDto>,
    git_repository: Option<GitRepositoryDto>,
    source: Option<JobSourceDto>,
    tag: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdDto {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GitRepositoryDto {
    url: Option<String>,
    deployed_commit_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobSourceDto {
    image: Option<ImageSourceDto>,
    docker: Option<DockerSourceDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageSourceDto {
    tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DockerSourceDto {
    git_repository: Option<GitRepositoryDto>,
}

impl From<GitRepositoryDto> for Source {
    fn from(repository: GitRepositoryDto) -> Self {
        Source::Git {
            repository_url: repository.url.unwrap_or_default(),
            deployed_commit_id: repository.deployed_commit_id,
        }
    }
}

impl ResourceDto {
    /// Collapse the nullable source fields of the wire format into a [`Source`].
    fn into_resource(self, kind: ResourceKind, environment_id: &str) -> Result<Resource, ApiError> {
        let (job_image, job_git) = match self.source {
            Some(JobSourceDto { image, docker }) => {
                (image.and_then(|image| image.tag), docker.and_then(|docker| docker.git_repository))
            }
            None => (None, None),
        };

        let source = if let Some(repository) = job_git {
            Source::from(repository)
        } else if let Some(tag) = job_image {
            Source::Image { tag }
        } else if let Some(repository) = self.git_repository {
            Source::from(repository)
        } else if let Some(tag) = self.tag.or(self.version) {
            Source::Image { tag }
        } else {
            return Err(ApiError::InvalidResource {
                kind,
                id: self.id,
                reason: "neither an image tag nor a git repository is set".to_string(),
            });
        };

        Ok(Resource {
            id: self.id,
            name: self.name,
            kind,
            environment_id: self
                .environment
                .map(|environment| environment.id)
                .unwrap_or_else(|| environment_id.to_string()),
            source,
        })
    }
}

#[async_trait]
impl OrganizationLister for QoveryClient {
    async fn list_organizations(&self) -> Result<Vec<NamedEntity>, ApiError> {
        let organizations: ResultsDto<NamedEntity> = self.get("organization").await?;
        Ok(organizations.results)
    }
}

#[async_trait]
impl ProjectLister for QoveryClient {
    async fn list_projects(&self, organization_id: &str) -> Result<Vec<NamedEntity>, ApiError> {
        let projects: ResultsDto<NamedEntity> = self
            .get(&format!("organization/{organization_id}/project"))
            .await?;
        Ok(projects.results)
    }
}

#[async_trait]
impl EnvironmentLister for QoveryClient {
    async fn list_environments(&self, project_id: &str) -> Result<Vec<NamedEntity>, ApiError> {
        let environments: ResultsDto<NamedEntity> = self
            .get(&format!("project/{project_id}/environment"))
            .await?;
        Ok(environments.results)
    }
}

#[async_trait]
impl EnvironmentStatusGetter for QoveryClient {
    async fn get_environment_state(
        &self,
        environment_id: &str,
    ) -> Result<EnvironmentState, ApiError> {
        let status: StatusDto = self
            .get(&format!("environment/{environment_id}/status"))
            .await?;
        Ok(status.state)
    }
}

#[async_trait]
impl ResourceLister for QoveryClient {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        environment_id: &str,
    ) -> Result<Vec<Resource>, ApiError> {
        let resources: ResultsDto<ResourceDto> = self
            .get(&format!("environment/{environment_id}/{}", kind.api_path()))
            .await?;

        resources
            .results
            .into_iter()
            .map(|resource| resource.into_resource(kind, environment_id))
            .collect()
    }
}

#[async_trait]
impl ResourceDeployer for QoveryClient {
    async fn deploy(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        request: &DeployRequest,
    ) -> Result<(), ApiError> {
        self.post(&format!("{}/{resource_id}/deploy", kind.api_path()), request)
            .await
    }
}

#[async_trait]
impl ProjectVariableCreator for QoveryClient {
    async fn create_project_variable(
        &self,
        project_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        self.post(
            &format!("project/{project_id}/environmentVariable"),
            &VariableDto { key, value },
        )
        .await
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;
    use crate::config::TokenType;

    async fn create_client(server: &MockServer) -> QoveryClient {
        let config = ApiConfig::new(
            &server.uri(),
            Some("qov_test".to_string()),
            TokenType::Token,
        )
        .unwrap();
        QoveryClient::new(&config).unwrap()
    }

    fn parse_resource(kind: ResourceKind, value: serde_json::Value) -> Result<Resource, ApiError> {
        serde_json::from_value::<ResourceDto>(value)
            .unwrap()
            .into_resource(kind, "env-1")
    }

    #[test]
    fn test_job_with_docker_source_is_git_backed() {
        let resource = parse_resource(
            ResourceKind::Cronjob,
            json!({
                "id": "job-1",
                "name": "nightly",
                "environment": { "id": "env-2" },
                "source": {
                    "image": null,
                    "docker": {
                        "git_repository": {
                            "url": "https://github.com/acme/jobs.git",
                            "deployed_commit_id": "abc123"
                        }
                    }
                }
            }),
        )
        .unwrap();

        assert_eq!(resource.environment_id, "env-2");
        assert_eq!(
            resource.source,
            Source::Git {
                repository_url: "https://github.com/acme/jobs.git".to_string(),
                deployed_commit_id: Some("abc123".to_string()),
            }
        );
    }

    #[test]
    fn test_job_with_image_source_is_image_backed() {
        let resource = parse_resource(
            ResourceKind::Cronjob,
            json!({
                "id": "job-1",
                "name": "nightly",
                "source": { "image": { "image_name": "acme/nightly", "tag": "1.2.0" } }
            }),
        )
        .unwrap();

        assert_eq!(resource.environment_id, "env-1");
        assert_eq!(
            resource.source,
            Source::Image {
                tag: "1.2.0".to_string()
            }
        );
    }

    #[test]
    fn test_application_and_database_sources() {
        let application = parse_resource(
            ResourceKind::Application,
            json!({
                "id": "app-1",
                "name": "api",
                "git_repository": { "url": "https://github.com/acme/api.git", "deployed_commit_id": null }
            }),
        )
        .unwrap();
        assert!(matches!(
            application.source,
            Source::Git { deployed_commit_id: None, .. }
        ));

        let database = parse_resource(
            ResourceKind::Database,
            json!({ "id": "db-1", "name": "main", "version": "15" }),
        )
        .unwrap();
        assert_eq!(
            database.source,
            Source::Image {
                tag: "15".to_string()
            }
        );
    }

    #[test]
    fn test_resource_without_source_is_invalid() {
        let result = parse_resource(
            ResourceKind::Cronjob,
            json!({ "id": "job-1", "name": "nightly", "source": { "image": null, "docker": null } }),
        );

        assert!(matches!(
            result,
            Err(ApiError::InvalidResource { ref id, .. }) if id == "job-1"
        ));
    }

    #[tokio::test]
    async fn test_get_environment_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/environment/env-1/status"))
            .and(header("Authorization", "Token qov_test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "env-1", "state": "DEPLOYING" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        let state = client.get_environment_state("env-1").await.unwrap();

        assert_eq!(state, EnvironmentState::Deploying);
    }

    #[tokio::test]
    async fn test_get_environment_state_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/environment/env-1/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "env-1", "state": "DEPLOYING" }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let config = ApiConfig::new(
            &server.uri(),
            Some("qov_test".to_string()),
            TokenType::Token,
        )
        .unwrap();
        let client = QoveryClient::with_timeout(&config, Duration::from_millis(50)).unwrap();

        let result = client.get_environment_state("env-1").await;

        assert!(matches!(
            result,
            Err(ApiError::Request { ref source, .. }) if source.is_timeout()
        ));
    }

    #[tokio::test]
    async fn test_list_resources_uses_kind_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/environment/env-1/job"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "id": "job-1", "name": "nightly", "source": { "image": { "tag": "1.0" } } }
                ]
            })))
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        let resources = client
            .list_resources(ResourceKind::Cronjob, "env-1")
            .await
            .unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "nightly");
        assert_eq!(resources[0].kind, ResourceKind::Cronjob);
    }

    #[tokio::test]
    async fn test_deploy_posts_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/job/job-1/deploy"))
            .and(body_json(json!({ "git_commit_id": "abc123" })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        client
            .deploy(
                ResourceKind::Cronjob,
                "job-1",
                &DeployRequest::GitCommitId("abc123".to_string()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organization"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        let error = client.list_organizations().await.unwrap_err();

        assert!(matches!(
            error,
            ApiError::Status { status: 401, ref body, .. } if body == "invalid token"
        ));
    }

    #[tokio::test]
    async fn test_create_project_variable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/project/proj-1/environmentVariable"))
            .and(body_json(json!({ "key": "RUST_LOG", "value": "debug" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        client
            .create_project_variable("proj-1", "RUST_LOG", "debug")
            .await
            .unwrap();
    }
}
