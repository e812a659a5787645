//! Command abstractions shared by every subcommand.
//!
//! - [`Command`] is what `main` executes.
//! - [`CommandWithOutput`] is what subcommands implement: they produce a value and leave
//!   rendering to the caller.
//! - [`CommandWithOutputExt::with_print_to_stdout`] bridges the two by printing the value in the
//!   format requested with `--output`.
use anyhow::Result;
use async_trait::async_trait;

use crate::formatting::{Format, Formattable};

#[async_trait]
pub trait Command {
    async fn execute(&mut self) -> Result<()>;
}

/// A command producing a value, such as the list of resources or the outcome of a deploy.
#[async_trait]
pub trait CommandWithOutput {
    type Output;

    async fn execute(&mut self) -> Result<Self::Output>;
}

pub trait CommandWithOutputExt {
    /// Box the command so that executing it prints its output to stdout in `format`.
    fn with_print_to_stdout(self, format: Format) -> Result<Box<dyn Command>>;
}

/// Prints the output of the inner command once it succeeded.
///
/// Nothing is printed to stdout on failure, errors are reported by `main` on stderr.
pub struct PrintToStdout<C> {
    command: C,
    format: Format,
}

impl<C> PrintToStdout<C> {
    pub fn new(command: C, format: Format) -> Self {
        Self { command, format }
    }
}

#[async_trait]
impl<C, O> Command for PrintToStdout<C>
where
    C: CommandWithOutput<Output = O> + Send,
    O: Formattable + Send,
{
    async fn execute(&mut self) -> Result<()> {
        let output = self.command.execute().await?;
        println!("{}", output.format(self.format)?);

        Ok(())
    }
}

impl<C, O> CommandWithOutputExt for C
where
    C: CommandWithOutput<Output = O> + Send + 'static,
    O: Formattable + Send + 'static,
{
    fn with_print_to_stdout(self, format: Format) -> Result<Box<dyn Command>> {
        Ok(Box::new(PrintToStdout::new(self, format)))
    }
}
