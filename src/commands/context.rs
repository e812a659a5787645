//! Resolution of the organization, project and environment a command applies to.
//!
//! Each level is picked, in order of precedence:
//! 1. from its flag, which must match a name exactly,
//! 2. for the project only, from the `.qovery.yml` file of the current directory,
//! 3. automatically when there is a single candidate,
//! 4. by prompting the operator.
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::{
    args::ContextArgs,
    config::QoveryYml,
    dependencies::{
        ApiError, EnvironmentLister, FileReader, OrganizationLister, ProjectLister,
        WorkingDirectory,
    },
    error::CommandError,
    interaction::{SelectPrompt, SelectPromptOptions, SelectPromptResult},
    models::NamedEntity,
};

pub trait ContextApi: OrganizationLister + ProjectLister + EnvironmentLister + Send + Sync {}

impl<T> ContextApi for T where
    T: OrganizationLister + ProjectLister + EnvironmentLister + Send + Sync + ?Sized
{
}

/// Project files the context is read from.
pub trait ProjectFiles: FileReader + WorkingDirectory + Send + Sync {}

impl<T> ProjectFiles for T where T: FileReader + WorkingDirectory + Send + Sync + ?Sized {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    pub organization: NamedEntity,
    pub project: NamedEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentContext {
    pub organization: NamedEntity,
    pub project: NamedEntity,
    pub environment: NamedEntity,
}

pub async fn resolve_project<A, I, F>(
    organization: Option<&str>,
    project: Option<&str>,
    api: &A,
    prompt: &I,
    files: &F,
) -> Result<ProjectContext>
where
    A: ContextApi + ?Sized,
    I: SelectPrompt + Sync + ?Sized,
    F: ProjectFiles + ?Sized,
{
    let organizations = api.list_organizations().await.map_err(network)?;
    let organization = pick(prompt, "organization", organization, organizations)?;

    let project = match project {
        Some(project) => Some(project.to_string()),
        None => project_from_files(files).await?,
    };

    let projects = api
        .list_projects(&organization.id)
        .await
        .map_err(network)?;
    let project = pick(prompt, "project", project.as_deref(), projects)?;

    Ok(ProjectContext {
        organization,
        project,
    })
}

pub async fn resolve_environment<A, I, F>(
    context: &ContextArgs,
    api: &A,
    prompt: &I,
    files: &F,
) -> Result<EnvironmentContext>
where
    A: ContextApi + ?Sized,
    I: SelectPrompt + Sync + ?Sized,
    F: ProjectFiles + ?Sized,
{
    let ProjectContext {
        organization,
        project,
    } = resolve_project(
        context.organization.as_deref(),
        context.project.as_deref(),
        api,
        prompt,
        files,
    )
    .await?;

    let environments = api
        .list_environments(&project.id)
        .await
        .map_err(network)?;
    let environment = pick(
        prompt,
        "environment",
        context.environment.as_deref(),
        environments,
    )?;

    debug!(
        organization = %organization.name,
        project = %project.name,
        environment = %environment.name,
        "resolved context"
    );

    Ok(EnvironmentContext {
        organization,
        project,
        environment,
    })
}

async fn project_from_files<F>(files: &F) -> Result<Option<String>>
where
    F: ProjectFiles + ?Sized,
{
    let directory = files.current_dir()?;
    let project = QoveryYml::load(files, &directory)
        .await?
        .and_then(|yml| yml.project_name().map(str::to_string));

    if let Some(project) = &project {
        debug!(project, "using project from .qovery.yml");
    }

    Ok(project)
}

fn pick<I>(
    prompt: &I,
    kind: &str,
    wanted: Option<&str>,
    candidates: Vec<NamedEntity>,
) -> Result<NamedEntity>
where
    I: SelectPrompt + ?Sized,
{
    if let Some(wanted) = wanted {
        return candidates
            .into_iter()
            .find(|candidate| candidate.name == wanted)
            .ok_or_else(|| CommandError::not_found(kind, wanted).into());
    }

    if candidates.len() <= 1 {
        return candidates.into_iter().next().ok_or_else(|| {
            CommandError::invalid_input(format!("no {kind} is available to this account")).into()
        });
    }

    let selection = prompt
        .select(
            SelectPromptOptions::builder()
                .message(format!("Choose the {kind}:"))
                .options(candidates.iter().map(|candidate| candidate.name.clone()))
                .build(),
        )
        .with_context(|| format!("prompting for the {kind}"))?;

    match selection {
        SelectPromptResult::Selected(name) => candidates
            .into_iter()
            .find(|candidate| candidate.name == name)
            .ok_or_else(|| CommandError::not_found(kind, name).into()),
        SelectPromptResult::Canceled => Err(CommandError::invalid_input(format!(
            "no {kind} selected, pass it with --{kind}"
        ))
        .into()),
    }
}

fn network(error: ApiError) -> CommandError {
    CommandError::Network(error.into())
}


#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::test_support::*;
    use super::*;
    use crate::dependencies::mocks::{MockQovery, MockTokioFs};
    use crate::interaction::mocks::MockInteraction;

    fn context(project: Option<&str>, environment: Option<&str>) -> ContextArgs {
        ContextArgs {
            organization: None,
            project: project.map(str::to_string),
            environment: environment.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_single_candidates_are_picked_without_prompt() {
        let mut api = MockQovery::new();
        expect_single_context(&mut api);
        let mut prompt = MockInteraction::new();
        prompt.expect_select().never();
        let files = files_without_qovery_yml();

        let resolved = resolve_environment(&context(None, None), &api, &prompt, &files)
            .await
            .unwrap();

        assert_eq!(
            resolved,
            EnvironmentContext {
                organization: entity("org-1", "acme"),
                project: entity("proj-1", "backend"),
                environment: entity("env-1", "production"),
            }
        );
    }

    #[tokio::test]
    async fn test_flag_must_match_exactly() {
        let mut api = MockQovery::new();
        api.expect_list_organizations()
            .returning(|| Ok(vec![entity("org-1", "acme")]));
        api.expect_list_projects()
            .withf(|organization_id| organization_id == "org-1")
            .returning(|_| Ok(vec![entity("proj-1", "backend"), entity("proj-2", "Frontend")]));
        api.expect_list_environments().never();
        let prompt = MockInteraction::new();
        let files = MockTokioFs::new();

        let result =
            resolve_environment(&context(Some("frontend"), None), &api, &prompt, &files).await;

        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CommandError>(),
            Some(CommandError::NotFound { kind, name }) if kind == "project" && name == "frontend"
        ));
    }

    #[tokio::test]
    async fn test_project_defaults_to_qovery_yml() {
        let mut api = MockQovery::new();
        api.expect_list_organizations()
            .returning(|| Ok(vec![entity("org-1", "acme")]));
        api.expect_list_projects()
            .returning(|_| Ok(vec![entity("proj-1", "backend"), entity("proj-2", "frontend")]));
        api.expect_list_environments()
            .withf(|project_id| project_id == "proj-2")
            .returning(|_| Ok(vec![entity("env-2", "staging")]));
        let mut prompt = MockInteraction::new();
        prompt.expect_select().never();
        let mut files = MockTokioFs::new();
        files
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work")));
        files
            .expect_read_to_string()
            .withf(|path| path == Path::new("/work/.qovery.yml"))
            .returning(|_| Ok("application:\n  name: web\n  project: frontend\n".to_string()));

        let resolved = resolve_environment(&context(None, None), &api, &prompt, &files)
            .await
            .unwrap();

        assert_eq!(resolved.project, entity("proj-2", "frontend"));
        assert_eq!(resolved.environment, entity("env-2", "staging"));
    }

    #[tokio::test]
    async fn test_prompts_when_ambiguous() {
        let mut api = MockQovery::new();
        api.expect_list_organizations()
            .returning(|| Ok(vec![entity("org-1", "acme")]));
        api.expect_list_projects()
            .returning(|_| Ok(vec![entity("proj-1", "backend")]));
        api.expect_list_environments().returning(|_| {
            Ok(vec![
                entity("env-1", "production"),
                entity("env-2", "staging"),
            ])
        });
        let mut prompt = MockInteraction::new();
        prompt
            .expect_select()
            .withf(|options| {
                options.message() == "Choose the environment:"
                    && options.options() == ["production".to_string(), "staging".to_string()]
            })
            .times(1)
            .returning(|_| Ok(SelectPromptResult::Selected("staging".to_string())));
        let files = files_without_qovery_yml();

        let resolved = resolve_environment(&context(None, None), &api, &prompt, &files)
            .await
            .unwrap();

        assert_eq!(resolved.environment, entity("env-2", "staging"));
    }

    #[tokio::test]
    async fn test_canceled_prompt_is_invalid_input() {
        let mut api = MockQovery::new();
        api.expect_list_organizations().returning(|| {
            Ok(vec![entity("org-1", "acme"), entity("org-2", "globex")])
        });
        let mut prompt = MockInteraction::new();
        prompt
            .expect_select()
            .returning(|_| Ok(SelectPromptResult::Canceled));
        let files = MockTokioFs::new();

        let error = resolve_project(None, Some("backend"), &api, &prompt, &files)
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<CommandError>(),
            Some(CommandError::InvalidInput(message)) if message.contains("--organization")
        ));
    }

    #[tokio::test]
    async fn test_no_candidate_is_invalid_input() {
        let mut api = MockQovery::new();
        api.expect_list_organizations().returning(|| Ok(vec![]));
        let prompt = MockInteraction::new();
        let files = MockTokioFs::new();

        let error = resolve_project(None, None, &api, &prompt, &files)
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<CommandError>(),
            Some(CommandError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_api_failure_is_network_error() {
        let mut api = MockQovery::new();
        api.expect_list_organizations().returning(|| {
            Err(ApiError::Status {
                url: "https://api.qovery.com/organization".to_string(),
                status: 401,
                body: "unauthorized".to_string(),
            })
        });
        let prompt = MockInteraction::new();
        let files = MockTokioFs::new();

        let error = resolve_project(None, None, &api, &prompt, &files)
            .await
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<CommandError>(),
            Some(CommandError::Network(_))
        ));
    }
}
