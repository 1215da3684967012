//! `flagboard` - CLI for the flagged-project service
//!
//! Runs the flag service, renders the project panel in the terminal, and
//! pokes the service directly.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::warn;

use flagboard::cli::{Cli, Command, ConfigCommand, FlagsCommand, PanelCommand, ServeCommand};
use flagboard::{
    init_logging, start_server, Config, FlagClient, HostRuntime, HttpHost, Panel, PanelState,
    ProjectId,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd).await,
        Command::Panel(panel_cmd) => Ok(handle_panel(config, panel_cmd).await),
        Command::Flags(flags_cmd) => handle_flags(&config, flags_cmd).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<ExitCode> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate().context("applying command-line overrides")?;

    start_server(&config).await.context("running flag service")?;
    Ok(ExitCode::SUCCESS)
}

async fn handle_panel(config: Config, cmd: PanelCommand) -> ExitCode {
    let host = HttpHost::new(config);
    let (output, succeeded) = run_panel(&host, cmd).await;

    print!("{output}");
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Load the panel, apply the requested action, and return the rendered text
/// along with whether everything asked for actually happened.
async fn run_panel(host: &dyn HostRuntime, cmd: PanelCommand) -> (String, bool) {
    let mut panel = Panel::launch(host).await;

    let toggled = match cmd {
        PanelCommand::Show => Ok(()),
        PanelCommand::Toggle { project_id } => {
            let project_id = ProjectId::new(project_id);
            panel.toggle(&project_id).await.map(|_| ()).map_err(|e| {
                warn!("Toggle of {project_id} failed: {e}");
                (project_id, e)
            })
        }
    };

    let mut output = panel.render();
    // A ready panel already shows the failure as its notice.
    if let Err((project_id, e)) = &toggled {
        if panel.notice().is_none() {
            output.push_str(&format!("Could not toggle {project_id}: {e}\n"));
        }
    }

    let loaded = !matches!(panel.state(), PanelState::Failed { .. });
    (output, loaded && toggled.is_ok())
}

async fn handle_flags(config: &Config, cmd: FlagsCommand) -> anyhow::Result<ExitCode> {
    let client = HttpHost::new(config.clone()).flag_client()?;

    let (flags, json) = match cmd {
        FlagsCommand::Get { json } => (client.get_flags().await?, json),
        FlagsCommand::Set { project_id, unflag } => {
            let project_id = ProjectId::new(project_id);
            (client.set_flag(&project_id, !unflag).await?, false)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&flags)?);
    } else if flags.is_empty() {
        println!("No flagged projects.");
    } else {
        for id in flags.iter() {
            println!("{id}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                println!("  CORS max age (s):   {}", config.server.cors_max_age_secs);
                println!();
                println!("[Host]");
                println!("  Backend URL:        {}", config.host.backend_url);
                println!(
                    "  Directory URL:      {}",
                    config.host.directory_url.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "  Token:              {}",
                    if config.host.token.is_some() { "(set)" } else { "(not set)" }
                );
                println!("  Timeout (ms):       {}", config.host.request_timeout_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use flagboard::{Error, FlagStore, HostCapabilities, Project, ProjectDirectory, Result};

    use super::*;

    struct FixedDirectory(Vec<Project>);

    #[async_trait]
    impl ProjectDirectory for FixedDirectory {
        async fn list_projects(&self) -> Result<Vec<Project>> {
            Ok(self.0.clone())
        }
    }

    struct LocalHost {
        store: Arc<FlagStore>,
        projects: Vec<Project>,
    }

    #[async_trait]
    impl HostRuntime for LocalHost {
        async fn register(&self) -> Result<HostCapabilities> {
            Ok(HostCapabilities {
                flags: Arc::clone(&self.store) as Arc<dyn FlagClient>,
                directory: Arc::new(FixedDirectory(self.projects.clone())),
            })
        }
    }

    struct NoHost;

    #[async_trait]
    impl HostRuntime for NoHost {
        async fn register(&self) -> Result<HostCapabilities> {
            Err(Error::host_unavailable("not embedded in a host"))
        }
    }

    fn host(projects: Vec<Project>) -> LocalHost {
        LocalHost {
            store: Arc::new(FlagStore::new()),
            projects,
        }
    }

    fn demo() -> Project {
        Project {
            id: ProjectId::new("0-1"),
            name: "Demo".to_string(),
            short_name: "DEMO".to_string(),
            description: None,
            icon_url: None,
        }
    }

    fn toggle(id: &str) -> PanelCommand {
        PanelCommand::Toggle {
            project_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_toggle_on_empty_panel_fails() {
        let host = host(Vec::new());
        let (output, succeeded) = run_panel(&host, toggle("0-1")).await;

        assert!(!succeeded);
        assert!(output.starts_with("No projects found."));
        assert!(output.contains("Could not toggle 0-1: panel is not ready"));
        assert!(host.store.get_flags().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_on_ready_panel_succeeds() {
        let host = host(vec![demo()]);
        let (output, succeeded) = run_panel(&host, toggle("0-1")).await;

        assert!(succeeded);
        assert!(output.contains("[*] Demo (0-1)"));
        assert!(host.store.get_flags().contains(&ProjectId::new("0-1")));
    }

    #[tokio::test]
    async fn test_show_empty_panel_succeeds() {
        let (output, succeeded) = run_panel(&host(Vec::new()), PanelCommand::Show).await;

        assert!(succeeded);
        assert_eq!(output, "No projects found.\n");
    }

    #[tokio::test]
    async fn test_failed_registration_fails() {
        let (output, succeeded) = run_panel(&NoHost, toggle("0-1")).await;

        assert!(!succeeded);
        assert!(output.starts_with("Error loading projects:"));
        assert!(output.contains("Could not toggle 0-1"));
    }
}
