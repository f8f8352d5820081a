//! Saved defaults for the `jinja-field` binary.
//!
//! Config files hold the same flags as the command line, one or more per
//! line; `#` starts a comment line. The global file is read first, then the
//! local `.jinjafieldrc`, then the command line, each overriding the last.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ui::style::{Background, background_from_colorfgbg};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    /// Resolve to a background, consulting `COLORFGBG` for [`ThemeMode::Auto`].
    pub fn resolve(self, colorfgbg: Option<&str>) -> Background {
        match self {
            Self::Auto => background_from_colorfgbg(colorfgbg),
            Self::Light => Background::Light,
            Self::Dark => Background::Dark,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub readonly: bool,
    pub no_autofocus: bool,
    pub no_line_numbers: bool,
    pub write: bool,
    pub height: Option<u16>,
    pub theme: Option<ThemeMode>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            readonly: self.readonly || other.readonly,
            no_autofocus: self.no_autofocus || other.no_autofocus,
            no_line_numbers: self.no_line_numbers || other.no_line_numbers,
            write: self.write || other.write,
            height: other.height.or(self.height),
            theme: other.theme.or(self.theme),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("jinja-field").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("jinja-field")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("jinja-field").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("jinja-field")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".jinjafieldrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# jinja-field defaults (saved with --save)".to_string()];
    if flags.readonly {
        lines.push("--readonly".to_string());
    }
    if flags.no_autofocus {
        lines.push("--no-autofocus".to_string());
    }
    if flags.no_line_numbers {
        lines.push("--no-line-numbers".to_string());
    }
    if flags.write {
        lines.push("--write".to_string());
    }
    if let Some(height) = flags.height {
        lines.push(format!("--height {height}"));
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme.as_str()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of raw argument tokens.
///
/// Unknown tokens (the program name, the file argument, `--save`) are
/// skipped. Malformed values leave the flag unset.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--readonly" => flags.readonly = true,
            "--no-autofocus" => flags.no_autofocus = true,
            "--no-line-numbers" => flags.no_line_numbers = true,
            "--write" => flags.write = true,
            "--theme" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.theme = parse_theme(next);
                    i += 1;
                }
            }
            "--height" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.height = parse_height(next);
                    i += 1;
                }
            }
            _ => {
                if let Some(value) = token.strip_prefix("--theme=") {
                    flags.theme = parse_theme(value);
                } else if let Some(value) = token.strip_prefix("--height=") {
                    flags.height = parse_height(value);
                }
            }
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

fn parse_height(s: &str) -> Option<u16> {
    s.parse().ok().filter(|h| *h > 0)
}
