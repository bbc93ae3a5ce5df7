#![forbid(unsafe_code)]

//! Command enablement polling.
//!
//! Controls and tabs carry an optional command id. After a scale pass that
//! changed the shown layouts, newly visible controls need their first
//! enablement query; the host answers through a [`CommandHandler`].

/// Answers whether a command can currently run.
pub trait CommandHandler {
    fn is_enabled(&self, command_id: &str) -> bool;
}

impl<F> CommandHandler for F
where
    F: Fn(&str) -> bool,
{
    fn is_enabled(&self, command_id: &str) -> bool {
        self(command_id)
    }
}

/// Handler that enables every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllEnabled;

impl CommandHandler for AllEnabled {
    fn is_enabled(&self, _command_id: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_handlers() {
        let handler = |id: &str| id.ends_with("Paste");
        assert!(handler.is_enabled("Ribbon.Home.Paste"));
        assert!(!CommandHandler::is_enabled(&handler, "Ribbon.Home.Cut"));
        assert!(AllEnabled.is_enabled("anything"));
    }
}
