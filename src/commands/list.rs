//! `qovery <kind> list`: the resources of one kind in an environment.
use std::fmt::Display;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::trace;

use crate::{
    args,
    commands::{
        CommandWithOutput,
        context::{ContextApi, ProjectFiles, resolve_environment},
        with_client::TryFromWithQoveryClient,
    },
    dependencies::{QoveryClient, ResourceLister, TokioFs},
    error::CommandError,
    interaction::{Interaction, SelectPrompt},
    models::{Resource, ResourceKind},
    table::{Table, TableColumn},
};

pub trait ListApi: ContextApi + ResourceLister {}
impl<T: ContextApi + ResourceLister + ?Sized> ListApi for T {}

pub struct List {
    kind: ResourceKind,
    context: args::ContextArgs,

    api: Box<dyn ListApi>,
    prompt: Box<dyn SelectPrompt + Send + Sync>,
    files: Box<dyn ProjectFiles>,
}

impl TryFromWithQoveryClient<(ResourceKind, args::List)> for List {
    fn try_from_with_client(
        (kind, args): (ResourceKind, args::List),
        client: QoveryClient,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            context: args.context,
            api: Box::new(client),
            prompt: Box::new(Interaction::new()),
            files: Box::new(TokioFs::new()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult(Vec<Resource>);

const COLUMNS: &[TableColumn<Resource>] = &[
    ("NAME", |r: &Resource| r.name.clone()),
    ("ID", |r: &Resource| r.id.clone()),
    ("SOURCE", |r: &Resource| r.source.to_string()),
];

impl Display for ListResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Table::from_items(&self.0, COLUMNS).fmt(f)
    }
}

#[async_trait]
impl CommandWithOutput for List {
    type Output = ListResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        trace!(kind = %self.kind, context = ?self.context, "executing list command");

        let context =
            resolve_environment(&self.context, &*self.api, &*self.prompt, &*self.files).await?;

        let resources = self
            .api
            .list_resources(self.kind, &context.environment.id)
            .await
            .map_err(|e| CommandError::Network(e.into()))?;

        Ok(ListResult(resources))
    }
}
