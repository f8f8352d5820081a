//! jinja-field - edit a Jinja template in a terminal form field.
//!
//! # Usage
//!
//! ```bash
//! jinja-field template.j2
//! jinja-field --readonly --theme dark template.j2
//! jinja-field --write template.j2
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use jinja_field::app::App;
use jinja_field::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, save_config_flags,
};
use jinja_field::widget::WidgetOptions;

/// Edit a Jinja template with highlighting and auto-formatting
#[derive(Parser, Debug)]
#[command(name = "jinja-field", version, about, long_about = None)]
struct Cli {
    /// Template file to edit (starts empty when missing)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Open the field read-only
    #[arg(long)]
    readonly: bool,

    /// Do not focus the field on start
    #[arg(long)]
    no_autofocus: bool,

    /// Text rows inside the field border
    #[arg(long, value_name = "N")]
    height: Option<u16>,

    /// Hide the line number gutter
    #[arg(long)]
    no_line_numbers: bool,

    /// Highlight theme background [default: auto, which reads COLORFGBG]
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,

    /// Write the final value back to FILE instead of printing it
    #[arg(long)]
    write: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            readonly: self.readonly,
            no_autofocus: self.no_autofocus,
            no_line_numbers: self.no_line_numbers,
            write: self.write,
            height: self.height.filter(|h| *h > 0),
            theme: self.theme,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let colorfgbg = std::env::var("COLORFGBG").ok();
    let background = effective
        .theme
        .unwrap_or(ThemeMode::Auto)
        .resolve(colorfgbg.as_deref());

    let defaults = WidgetOptions::default();
    let options = WidgetOptions {
        height: effective.height.unwrap_or(defaults.height),
        line_numbers: !effective.no_line_numbers,
        background,
        ..defaults
    };

    if effective.write && cli.file.is_none() {
        anyhow::bail!("--write needs a FILE argument");
    }

    let mut app = App::new(cli.file.clone())
        .with_readonly(effective.readonly)
        .with_autofocus(!effective.no_autofocus)
        .with_options(options);

    let value = app.run().context("Application error")?;

    match cli.file.filter(|_| effective.write) {
        Some(path) => std::fs::write(&path, &value)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{value}"),
    }
    Ok(())
}
