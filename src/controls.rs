//! Printer control commands and which of them the dashboard offers.

use crate::config::EndpointMap;
use crate::models::PrinterStatus;
use serde::Serialize;
use std::fmt;

/// A control action. Each maps to exactly one body-less POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    Pause,
    Preheat,
    Resume,
    Cancel,
}

impl ControlCommand {
    pub const ALL: [ControlCommand; 4] = [
        ControlCommand::Pause,
        ControlCommand::Preheat,
        ControlCommand::Resume,
        ControlCommand::Cancel,
    ];

    pub fn endpoint<'a>(&self, endpoints: &'a EndpointMap) -> &'a str {
        match self {
            ControlCommand::Pause => &endpoints.pause,
            ControlCommand::Preheat => &endpoints.preheat,
            ControlCommand::Resume => &endpoints.resume,
            ControlCommand::Cancel => &endpoints.cancel,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            ControlCommand::Pause => "pause",
            ControlCommand::Preheat => "preheat",
            ControlCommand::Resume => "resume",
            ControlCommand::Cancel => "cancel",
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Enabled/disabled state of the control buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControlAvailability {
    pub pause: bool,
    pub resume: bool,
    pub cancel: bool,
    pub preheat: bool,
}

impl ControlAvailability {
    /// Derived purely from the printer flags; nothing is enabled before the first status arrives.
    pub fn from_status(status: Option<&PrinterStatus>) -> Self {
        match status {
            Some(s) => Self::from_flags(s.printing, s.paused),
            None => Self::default(),
        }
    }

    pub fn from_flags(printing: bool, paused: bool) -> Self {
        Self {
            pause: printing && !paused,
            resume: paused,
            cancel: printing || paused,
            preheat: true,
        }
    }

    pub fn allows(&self, command: ControlCommand) -> bool {
        match command {
            ControlCommand::Pause => self.pause,
            ControlCommand::Preheat => self.preheat,
            ControlCommand::Resume => self.resume,
            ControlCommand::Cancel => self.cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrinterState;

    #[test]
    fn test_printing_not_paused() {
        let controls = ControlAvailability::from_flags(true, false);
        assert!(controls.pause);
        assert!(!controls.resume);
        assert!(controls.cancel);
        assert!(controls.preheat);
    }

    #[test]
    fn test_paused_not_printing() {
        let controls = ControlAvailability::from_flags(false, true);
        assert!(!controls.pause);
        assert!(controls.resume);
        assert!(controls.cancel);
    }

    #[test]
    fn test_idle_only_preheat() {
        let controls = ControlAvailability::from_flags(false, false);
        assert_eq!(
            controls,
            ControlAvailability {
                pause: false,
                resume: false,
                cancel: false,
                preheat: true,
            }
        );
    }

    #[test]
    fn test_nothing_enabled_without_status() {
        let controls = ControlAvailability::from_status(None);
        for command in ControlCommand::ALL {
            assert!(!controls.allows(command));
        }
        let status = PrinterStatus {
            state: PrinterState::Printing,
            nozzle_temperature: 210.0,
            bed_temperature: 60.0,
            operational: true,
            printing: true,
            paused: true,
        };
        let controls = ControlAvailability::from_status(Some(&status));
        assert!(!controls.allows(ControlCommand::Pause));
        assert!(controls.allows(ControlCommand::Resume));
    }

    #[test]
    fn test_resume_posts_to_continue() {
        let endpoints = EndpointMap::default();
        assert_eq!(ControlCommand::Resume.endpoint(&endpoints), "/dashboard/continue");
        assert_eq!(ControlCommand::Preheat.endpoint(&endpoints), "/dashboard/preheat");
    }
}
