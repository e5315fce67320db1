//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::ShellCacheResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager) -> ShellCacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(manager).await?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }

    Ok(())
}

async fn show_config(manager: &ConfigManager) -> ShellCacheResult<()> {
    let config = manager.load().await?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> ShellCacheResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}
