use crate::assemble::assemble;
use crate::collect::collect_assets;
use crate::config::{Action, Config, TaskDef};
use crate::dashboard::{load_theme, stage_page};
use crate::error::Result;
use crate::patches::apply_task_patches;
use crate::sass::compile;
use crate::tasks::TaskRunner;
use std::path::PathBuf;
use tracing::debug;

/// Binds the configured actions to a project root.
pub struct Pipeline<'a> {
    config: &'a Config,
    root: PathBuf,
    install_dir: Option<PathBuf>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, root: impl Into<PathBuf>, install_dir: Option<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
            install_dir,
        }
    }
}

impl TaskRunner for Pipeline<'_> {
    fn run(&mut self, task: &TaskDef) -> Result<()> {
        match task.action {
            Action::Patch => {
                let outcomes = apply_task_patches(
                    &self.config.patches,
                    &task.name,
                    &self.root,
                    self.config.patch_policy.on_missing,
                )?;
                debug!("{}: {:?}", task.name, outcomes);
            }
            Action::Compile => {
                compile(&self.config.sass, &self.root)?;
            }
            Action::Collect => {
                collect_assets(&self.config.copy, &self.root)?;
            }
            Action::Page => {
                let theme = load_theme(&self.config.page.theme, &self.root)?;
                stage_page(&self.root.join(&self.config.bundle.source), &theme)?;
            }
            Action::Assemble => {
                assemble(
                    &self.config.bundle.source,
                    &self.root,
                    self.install_dir.as_deref(),
                )?;
            }
            Action::Group => {}
        }
        Ok(())
    }
}
