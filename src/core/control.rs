//! Control channel for signals from other threads
//!
//! A global hotkey listener or tray icon runs on its own thread and must not
//! touch the scene. It sends a `ControlCommand` instead; the thread that owns
//! the `ComposerApp` drains the channel between events.

use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::domain::AnnotationKind;
use crate::session::messages::Msg;

/// Commands that can be sent to the running composer
#[derive(Debug, Clone)]
pub enum ControlCommand {
    /// Place these files on the canvas
    Import(Vec<PathBuf>),
    /// Export the canvas to the output directory
    Export,
    /// Toggle a drawing mode
    ToggleMode(AnnotationKind),
    /// Quit the application
    Quit,
}

impl From<ControlCommand> for Msg {
    fn from(command: ControlCommand) -> Self {
        match command {
            ControlCommand::Import(paths) => Msg::import(paths),
            ControlCommand::Export => Msg::export(),
            ControlCommand::ToggleMode(kind) => Msg::mode_toggle(kind),
            ControlCommand::Quit => Msg::quit(),
        }
    }
}

/// Sending half handed to listener threads
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Sender<ControlCommand>,
}

impl ControlHandle {
    /// Returns false once the composer has gone away
    pub fn send(&self, command: ControlCommand) -> bool {
        log::debug!("Control: {:?} command sent", command);
        self.tx.send(command).is_ok()
    }
}

/// Receiving half polled by the UI thread
#[derive(Debug)]
pub struct ControlInbox {
    rx: Receiver<ControlCommand>,
}

impl ControlInbox {
    /// Take every pending command without blocking, in send order
    pub fn drain(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => msgs.push(command.into()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("Control: all senders dropped");
                    break;
                }
            }
        }
        msgs
    }

    /// Block until the next command; `None` once every sender is dropped
    pub fn recv(&self) -> Option<Msg> {
        self.rx.recv().ok().map(Msg::from)
    }
}

pub fn control_channel() -> (ControlHandle, ControlInbox) {
    let (tx, rx) = crossbeam_channel::unbounded::<ControlCommand>();
    (ControlHandle { tx }, ControlInbox { rx })
}
