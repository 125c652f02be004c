//! Browser-native confirm and error dialogs

use async_trait::async_trait;
use leptos::logging;

use console_common::events::Dialogs;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDialogs;

#[async_trait(?Send)]
impl Dialogs for BrowserDialogs {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(&format!("{}\n\n{}", title, message)).ok())
            .unwrap_or(false)
    }

    fn error(&self, message: &str) {
        logging::error!("{}", message);
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}
