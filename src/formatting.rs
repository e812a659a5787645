//! Rendering of command outputs.
//!
//! Every command output implements [`Display`] for humans and [`Serialize`] for scripts, the
//! [`Formattable`] trait picks one based on `--output`.
use std::fmt::Display;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Format of the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

pub trait Formattable {
    fn format(&self, format: Format) -> Result<String>;
}

impl<T> Formattable for T
where
    T: Display + Serialize,
{
    fn format(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Text => self.to_string(),
            Format::Json => serde_json::to_string(self).context("serializing output to json")?,
        })
    }
}
