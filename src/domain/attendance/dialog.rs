//! Teacher-facing dialog state machine.
//!
//! Each teacher is either `Idle` or `ChoosingClass`. The dialog is a pure
//! value: [`TeacherDialog::handle`] consumes the current state and an event
//! and returns the next state plus the action the application must carry out.
//! Opening the round itself (store writes, fan-out) is the caller's job.

use std::fmt;

use crate::domain::foundation::{ClassName, StateMachine};

/// Phase of a teacher's dialog, without associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialogPhase {
    #[default]
    Idle,
    ChoosingClass,
}

impl StateMachine for DialogPhase {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            DialogPhase::Idle => vec![DialogPhase::ChoosingClass],
            // A repeated start restarts the choice instead of stacking.
            DialogPhase::ChoosingClass => vec![DialogPhase::ChoosingClass, DialogPhase::Idle],
        }
    }
}

impl fmt::Display for DialogPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogPhase::Idle => "Idle",
            DialogPhase::ChoosingClass => "ChoosingClass",
        };
        write!(f, "{}", s)
    }
}

/// Dialog state with the data each phase carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TeacherDialog {
    #[default]
    Idle,
    ChoosingClass { offered: Vec<ClassName> },
}

/// Inbound teacher interactions relevant to the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    /// `/start_attendance` with the classes currently known.
    Start { classes: Vec<ClassName> },
    /// Free text; a class choice while choosing.
    Reply { text: String },
    Cancel,
}

/// What the application has to do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAction {
    /// Present these classes as choices.
    OfferClasses(Vec<ClassName>),
    /// The teacher picked a known class: open a round for it.
    OpenRound(ClassName),
    /// The reply did not name an offered class; the dialog keeps waiting.
    RejectClass {
        requested: String,
        offered: Vec<ClassName>,
    },
    Cancelled,
    NothingToCancel,
    /// Text outside of a dialog.
    Fallback,
}

impl TeacherDialog {
    pub fn phase(&self) -> DialogPhase {
        match self {
            TeacherDialog::Idle => DialogPhase::Idle,
            TeacherDialog::ChoosingClass { .. } => DialogPhase::ChoosingClass,
        }
    }

    /// Applies an event, returning the next state and the resulting action.
    pub fn handle(self, event: DialogEvent) -> (TeacherDialog, DialogAction) {
        let from = self.phase();
        let (next, action) = match (self, event) {
            (_, DialogEvent::Start { classes }) => (
                TeacherDialog::ChoosingClass {
                    offered: classes.clone(),
                },
                DialogAction::OfferClasses(classes),
            ),

            (TeacherDialog::ChoosingClass { offered }, DialogEvent::Reply { text }) => {
                let chosen = offered.iter().find(|c| c.as_str() == text.trim()).cloned();
                match chosen {
                    Some(class) => (TeacherDialog::Idle, DialogAction::OpenRound(class)),
                    None => {
                        let action = DialogAction::RejectClass {
                            requested: text.trim().to_string(),
                            offered: offered.clone(),
                        };
                        (TeacherDialog::ChoosingClass { offered }, action)
                    }
                }
            }
            (TeacherDialog::Idle, DialogEvent::Reply { .. }) => {
                (TeacherDialog::Idle, DialogAction::Fallback)
            }

            (TeacherDialog::ChoosingClass { .. }, DialogEvent::Cancel) => {
                (TeacherDialog::Idle, DialogAction::Cancelled)
            }
            (TeacherDialog::Idle, DialogEvent::Cancel) => {
                (TeacherDialog::Idle, DialogAction::NothingToCancel)
            }
        };

        // Idle -> Idle is a no-op, not a transition.
        let stayed_idle = from == DialogPhase::Idle && next.phase() == DialogPhase::Idle;
        debug_assert!(
            stayed_idle || from.can_transition_to(&next.phase()),
            "illegal dialog transition {:?} -> {:?}",
            from,
            next.phase()
        );
        (next, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<ClassName> {
        vec![ClassName::new("10A").unwrap(), ClassName::new("11B").unwrap()]
    }

    fn start() -> DialogEvent {
        DialogEvent::Start { classes: classes() }
    }

    fn reply(text: &str) -> DialogEvent {
        DialogEvent::Reply {
            text: text.to_string(),
        }
    }

    #[test]
    fn idle_only_moves_to_choosing() {
        assert_eq!(
            DialogPhase::Idle.valid_transitions(),
            vec![DialogPhase::ChoosingClass]
        );
        assert!(DialogPhase::Idle.transition_to(DialogPhase::Idle).is_err());
    }

    #[test]
    fn start_offers_known_classes() {
        let (next, action) = TeacherDialog::Idle.handle(start());
        assert_eq!(next.phase(), DialogPhase::ChoosingClass);
        assert_eq!(action, DialogAction::OfferClasses(classes()));
    }

    #[test]
    fn selecting_offered_class_opens_round_and_returns_to_idle() {
        let (choosing, _) = TeacherDialog::Idle.handle(start());
        let (next, action) = choosing.handle(reply(" 10A "));
        assert_eq!(next, TeacherDialog::Idle);
        assert_eq!(action, DialogAction::OpenRound(ClassName::new("10A").unwrap()));
    }

    #[test]
    fn unknown_class_is_rejected_and_dialog_keeps_waiting() {
        let (choosing, _) = TeacherDialog::Idle.handle(start());
        let (next, action) = choosing.handle(reply("99Z"));
        assert_eq!(next.phase(), DialogPhase::ChoosingClass);
        assert!(matches!(
            action,
            DialogAction::RejectClass { ref requested, .. } if requested == "99Z"
        ));
    }

    #[test]
    fn second_start_restarts_choice() {
        let (choosing, _) = TeacherDialog::Idle.handle(DialogEvent::Start {
            classes: vec![ClassName::new("10A").unwrap()],
        });
        let (next, _) = choosing.handle(start());
        assert_eq!(next, TeacherDialog::ChoosingClass { offered: classes() });
    }

    #[test]
    fn cancel_returns_to_idle_without_action() {
        let (choosing, _) = TeacherDialog::Idle.handle(start());
        let (next, action) = choosing.handle(DialogEvent::Cancel);
        assert_eq!(next, TeacherDialog::Idle);
        assert_eq!(action, DialogAction::Cancelled);
    }

    #[test]
    fn cancel_while_idle_reports_nothing_to_cancel() {
        let (next, action) = TeacherDialog::Idle.handle(DialogEvent::Cancel);
        assert_eq!(next, TeacherDialog::Idle);
        assert_eq!(action, DialogAction::NothingToCancel);
    }

    #[test]
    fn text_while_idle_falls_back() {
        let (next, action) = TeacherDialog::Idle.handle(reply("10A"));
        assert_eq!(next, TeacherDialog::Idle);
        assert_eq!(action, DialogAction::Fallback);
    }
}
