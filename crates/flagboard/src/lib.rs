//! `flagboard` - flagged projects for an issue tracker plugin
//!
//! The plugin has two halves. The flag service keeps an in-memory set of
//! flagged project IDs behind `GET/POST /flags`. The project panel lists the
//! tracker's projects, shows which are flagged and toggles them through the
//! service.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod flags;
pub mod host;
pub mod logging;
pub mod panel;
pub mod server;

pub use client::{FlagClient, HttpFlagClient};
pub use config::Config;
pub use directory::{HttpProjectDirectory, Project, ProjectDirectory};
pub use error::{Error, Result};
pub use flags::{FlagSet, FlagStore, ProjectId, SetFlagRequest};
pub use host::{HostCapabilities, HostRuntime, HttpHost};
pub use logging::init_logging;
pub use panel::{Panel, PanelState, ProjectRow};
pub use server::{start_server, Server};
