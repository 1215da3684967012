//! The project panel.
//!
//! Lists the tracker's projects next to their flag state and toggles flags on
//! request. The panel never edits its flag set locally: every toggle goes to
//! the flag service and the set it answers with replaces ours.
//!
//! State rules:
//! - `Loading` until both initial reads have finished
//! - a failure of either read (or of host registration) is fatal: `Failed`
//! - zero projects is `Empty`, which is not an error
//! - otherwise `Ready`

use std::fmt::Write as _;

use tracing::{debug, info, warn};

use crate::directory::Project;
use crate::error::{Error, Result};
use crate::flags::{FlagSet, ProjectId};
use crate::host::{HostCapabilities, HostRuntime};

/// Where the panel is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    /// Initial reads are still outstanding.
    Loading,
    /// Loading failed; nothing else is shown.
    Failed {
        /// What went wrong.
        message: String,
    },
    /// The directory has no projects.
    Empty,
    /// Projects and flags are loaded.
    Ready {
        /// Projects in directory order.
        projects: Vec<Project>,
        /// The flag set last returned by the flag service.
        flags: FlagSet,
    },
}

/// One line of the project list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRow<'a> {
    /// The project shown.
    pub project: &'a Project,
    /// Whether it is currently flagged.
    pub flagged: bool,
}

impl ProjectRow<'_> {
    /// Label of the toggle action for this row.
    #[must_use]
    pub fn action_label(&self) -> &'static str {
        if self.flagged {
            "Unflag"
        } else {
            "Flag"
        }
    }
}

/// The project panel.
#[derive(Debug)]
pub struct Panel {
    capabilities: Option<HostCapabilities>,
    state: PanelState,
    notice: Option<String>,
}

impl Panel {
    /// Create a panel that has registered but not loaded yet.
    #[must_use]
    pub fn new(capabilities: HostCapabilities) -> Self {
        Self {
            capabilities: Some(capabilities),
            state: PanelState::Loading,
            notice: None,
        }
    }

    fn failed(err: &Error) -> Self {
        Self {
            capabilities: None,
            state: PanelState::Failed {
                message: err.to_string(),
            },
            notice: None,
        }
    }

    /// Register with `host` and load.
    ///
    /// Registration failure leaves the panel in the failed state.
    pub async fn launch(host: &dyn HostRuntime) -> Self {
        match host.register().await {
            Ok(capabilities) => {
                let mut panel = Self::new(capabilities);
                panel.load().await;
                panel
            }
            Err(err) => {
                warn!(error = %err, "Panel registration failed");
                Self::failed(&err)
            }
        }
    }

    /// Fetch projects and flags concurrently and settle the state.
    pub async fn load(&mut self) {
        let Some(capabilities) = &self.capabilities else {
            return;
        };
        self.state = PanelState::Loading;
        self.notice = None;

        let reads = tokio::try_join!(
            capabilities.directory.list_projects(),
            capabilities.flags.get_flags(),
        );

        self.state = match reads {
            Ok((projects, _)) if projects.is_empty() => {
                info!("No projects found");
                PanelState::Empty
            }
            Ok((projects, flags)) => {
                info!(
                    projects = projects.len(),
                    flagged = flags.len(),
                    "Panel loaded"
                );
                PanelState::Ready { projects, flags }
            }
            Err(err) => {
                warn!(error = %err, "Panel load failed");
                PanelState::Failed {
                    message: err.to_string(),
                }
            }
        };
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Message about the last failed toggle, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// The authoritative flag set, once loaded.
    #[must_use]
    pub fn flags(&self) -> Option<&FlagSet> {
        match &self.state {
            PanelState::Ready { flags, .. } => Some(flags),
            _ => None,
        }
    }

    /// Rows to display; empty unless the panel is ready.
    #[must_use]
    pub fn rows(&self) -> Vec<ProjectRow<'_>> {
        match &self.state {
            PanelState::Ready { projects, flags } => projects
                .iter()
                .map(|project| ProjectRow {
                    project,
                    flagged: flags.contains(&project.id),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Flip the flag of `project_id` and return its new state.
    ///
    /// On failure the previous flag set stays in place and a notice is kept
    /// for display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PanelNotReady`] unless the panel is ready, or the flag
    /// service's error if the update fails.
    pub async fn toggle(&mut self, project_id: &ProjectId) -> Result<bool> {
        let (Some(capabilities), PanelState::Ready { flags, .. }) =
            (&self.capabilities, &mut self.state)
        else {
            return Err(Error::PanelNotReady);
        };

        let next = !flags.contains(project_id);
        debug!(%project_id, flagged = next, "Toggling flag");

        match capabilities.flags.set_flag(project_id, next).await {
            Ok(updated) => {
                *flags = updated;
                self.notice = None;
                Ok(next)
            }
            Err(err) => {
                warn!(%project_id, error = %err, "Flag update failed");
                self.notice = Some(format!("Could not update {project_id}: {err}"));
                Err(err)
            }
        }
    }

    /// Render the panel as plain text.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.state {
            PanelState::Loading => "Loading projects…\n".to_string(),
            PanelState::Failed { message } => format!("Error loading projects: {message}\n"),
            PanelState::Empty => "No projects found.\n".to_string(),
            PanelState::Ready { .. } => self.render_list(),
        }
    }

    fn render_list(&self) -> String {
        let mut out = String::from("Projects\n========\n");
        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "! {notice}");
        }
        for row in self.rows() {
            let marker = if row.flagged { "[*]" } else { "[ ]" };
            let project = row.project;
            let _ = writeln!(
                out,
                "{marker} {} ({})  {}  [{}]",
                project.name,
                project.id,
                project.link(),
                row.action_label()
            );
            if let Some(description) = &project.description {
                let _ = writeln!(out, "    {description}");
            }
            if let Some(icon_url) = &project.icon_url {
                let _ = writeln!(out, "    icon: {icon_url}");
            }
        }
        out
    }
}
