///! Subcommand handlers

pub mod config;
pub mod rules;
pub mod users;

use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;

use console_common::events::Dialogs;
use console_common::session::Session;

use crate::api::ApiClient;
use crate::config::Config;
use crate::output::{self, OutputFormat};

/// Everything a handler needs from the command line and config file
pub struct Context {
    pub api: ApiClient,
    pub config: Config,
    pub display_realm: Option<String>,
    pub format: OutputFormat,
}

impl Context {
    pub fn session(&self) -> Rc<RefCell<Session>> {
        Rc::new(RefCell::new(self.config.session(self.display_realm.as_deref())))
    }
}

/// Terminal prompts standing in for the browser's modal dialogs
#[derive(Debug, Clone, Copy, Default)]
pub struct CliDialogs {
    pub assume_yes: bool,
}

#[async_trait(?Send)]
impl Dialogs for CliDialogs {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        use dialoguer::Confirm;
        Confirm::new()
            .with_prompt(format!("{}: {}", title, message))
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "confirmation prompt failed");
                false
            })
    }

    fn error(&self, message: &str) {
        output::print_error(message);
    }
}
