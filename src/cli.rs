//! Clap adapter for paramtree.
//!
//! Compiled only with the opt-in `clap` Cargo feature. Provides
//! [`ParamArgs`] and [`ParamSubcommand`], which you embed in your own clap
//! derive to get `list|get|set|unset` subcommands over a parameter container.
//!
//! The only bridge to the core is [`ParamArgs::into_action()`], which
//! converts clap-parsed arguments into a [`ParamAction`](crate::ParamAction)
//! for [`handle`](crate::handle). Without clap, build `ParamAction` values
//! directly.

use clap::{Args, Subcommand};

use crate::types::ParamAction;

/// Clap-derived args for a parameters subcommand group.
///
/// ```ignore
/// #[derive(Subcommand)]
/// enum Commands {
///     Params(ParamArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ParamArgs {
    #[command(subcommand)]
    pub action: Option<ParamSubcommand>,
}

/// Available parameter subcommands.
#[derive(Debug, Subcommand)]
pub enum ParamSubcommand {
    /// Show every leaf key-value pair.
    List,
    /// Show the value at a key path.
    Get {
        /// Key path (e.g. "database.url").
        key: String,
    },
    /// Store a value at a key path.
    Set {
        /// Key path (e.g. "database.url").
        key: String,
        /// Raw value; typed by the schema when there is one.
        value: String,
    },
    /// Remove the value at a key path.
    Unset {
        /// Key path (e.g. "database.url").
        key: String,
    },
}

impl ParamArgs {
    /// Convert clap-parsed args into a framework-agnostic `ParamAction`.
    /// A bare invocation (no subcommand) means `list`.
    pub fn into_action(self) -> ParamAction {
        match self.action {
            None | Some(ParamSubcommand::List) => ParamAction::List,
            Some(ParamSubcommand::Get { key }) => ParamAction::Get { key },
            Some(ParamSubcommand::Set { key, value }) => ParamAction::Set { key, value },
            Some(ParamSubcommand::Unset { key }) => ParamAction::Unset { key },
        }
    }
}
