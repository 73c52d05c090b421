//! Terminal frontend: prompts, progress bar and result messages.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect};
use indicatif::{ProgressBar, ProgressStyle};
use roa_installer::components::Component;
use roa_installer::frontend::{Frontend, InstallChoices, Notice};
use roa_installer::platform::PRODUCT_NAME;

/// Answers given on the command line instead of prompting.
#[derive(Debug, Clone, Default)]
pub struct Presets {
    pub install_dir: Option<PathBuf>,
    pub components: Option<BTreeSet<Component>>,
    /// Answer yes to confirmations.
    pub assume_yes: bool,
}

/// `Frontend` for an interactive terminal.
pub struct ConsoleFrontend {
    presets: Presets,
    windows: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleFrontend {
    pub fn new(presets: Presets, windows: bool) -> Self {
        Self {
            presets,
            windows,
            bar: Mutex::new(None),
        }
    }

    /// Components offered on this host.
    fn offered(&self) -> Vec<Component> {
        Component::ALL
            .iter()
            .copied()
            .filter(|c| self.windows || !c.windows_only())
            .collect()
    }

    fn prompt_dir(&self, prompt: &str, default: Option<&Path>) -> Option<PathBuf> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme).with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default.display().to_string());
        }
        match input.interact_text() {
            Ok(text) if !text.trim().is_empty() => Some(PathBuf::from(text.trim())),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Prompt aborted");
                None
            }
        }
    }

    fn prompt_components(&self) -> Option<BTreeSet<Component>> {
        let offered = self.offered();
        let labels: Vec<&str> = offered.iter().map(Component::label).collect();
        let defaults = vec![true; offered.len()];

        let picked = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt("Additional components (space to toggle)")
            .items(&labels)
            .defaults(&defaults)
            .interact()
            .ok()?;
        Some(picked.into_iter().map(|i| offered[i]).collect())
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(mut slot) = self.bar.lock() {
            let bar = slot.get_or_insert_with(new_bar);
            f(bar);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

fn new_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>3}% {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}

/// Directory suggested for a fresh install.
pub fn default_install_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("RelicsOfAnnorath")
}

impl Frontend for ConsoleFrontend {
    fn install_choices(&self, suggested_root: Option<PathBuf>) -> Option<InstallChoices> {
        let root = match &self.presets.install_dir {
            Some(dir) => dir.clone(),
            None => {
                let suggested = suggested_root.unwrap_or_else(default_install_dir);
                self.prompt_dir("Install directory", Some(&suggested))?
            }
        };

        let components = match &self.presets.components {
            Some(components) => components
                .iter()
                .copied()
                .filter(|c| self.windows || !c.windows_only())
                .collect(),
            None if self.presets.assume_yes => self.offered().into_iter().collect(),
            None => self.prompt_components()?,
        };

        Some(InstallChoices { root, components })
    }

    fn select_install_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.presets.install_dir {
            return Some(dir.clone());
        }
        println!(
            "{}",
            style(format!("The {} installation could not be located.", PRODUCT_NAME)).yellow()
        );
        self.prompt_dir("Installation directory", None)
    }

    fn confirm_uninstall(&self, root: &Path) -> bool {
        if self.presets.assume_yes {
            return true;
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Remove the {} client and everything in {}?",
                PRODUCT_NAME,
                root.display()
            ))
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    fn progress(&self, percent: u8, current_file: &str) {
        self.with_bar(|bar| {
            bar.set_position(u64::from(percent));
            bar.set_message(current_file.to_string());
        });
    }

    fn status(&self, text: &str) {
        let printed = self
            .bar
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|bar| bar.println(text)))
            .is_some();
        if !printed {
            println!("{}", text);
        }
    }

    fn notify(&self, notice: Notice) {
        self.finish_bar();
        match notice {
            Notice::Verified => println!("{}", style("Client verified successfully").green()),
            Notice::Repaired => println!("{}", style("Client repaired successfully").green()),
            Notice::Uninstalled => {
                println!("{}", style("Client uninstalled successfully").green())
            }
            Notice::Failed { title, message } => {
                eprintln!("{} {}", style(format!("{}:", title)).red().bold(), message)
            }
        }
    }

    fn last_step(&self) {
        self.finish_bar();
        println!(
            "{}",
            style(format!("{} is ready to play.", PRODUCT_NAME)).green().bold()
        );
    }
}
