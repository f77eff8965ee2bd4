//! Attendance round - the visible state of one roll call.
//!
//! A round is opened when a teacher picks a class and lives in the teacher's
//! chat as a single editable message. Acknowledgements are a set, so marking
//! twice never double-counts. Closing a round is the only transition.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::{
    ChatHandle, ClassName, MessageRef, StateMachine, Username, ValidationError,
};
use crate::domain::roster::{ClassRoster, Student};

/// Lifecycle status of an attendance round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoundStatus {
    #[default]
    Open,
    Closed,
}

impl StateMachine for RoundStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            RoundStatus::Open => vec![RoundStatus::Closed],
            RoundStatus::Closed => vec![],
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoundStatus::Open => "Open",
            RoundStatus::Closed => "Closed",
        };
        write!(f, "{}", s)
    }
}

/// One attendance round for a class.
///
/// # Invariants
///
/// - `acknowledged` holds each student at most once
/// - a `Closed` round accepts no further acknowledgements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRound {
    class: ClassName,
    teacher: ChatHandle,
    message: MessageRef,
    status: RoundStatus,
    acknowledged: BTreeSet<Username>,
}

impl AttendanceRound {
    /// Opens a new round with no acknowledgements.
    pub fn open(class: ClassName, teacher: ChatHandle, message: MessageRef) -> Self {
        Self {
            class,
            teacher,
            message,
            status: RoundStatus::Open,
            acknowledged: BTreeSet::new(),
        }
    }

    /// Rebuilds an open round from stored acknowledgements.
    pub fn reconstitute(
        class: ClassName,
        teacher: ChatHandle,
        message: MessageRef,
        acknowledged: BTreeSet<Username>,
    ) -> Self {
        Self {
            class,
            teacher,
            message,
            status: RoundStatus::Open,
            acknowledged,
        }
    }

    pub fn class(&self) -> &ClassName {
        &self.class
    }

    /// Chat the session message lives in.
    pub fn teacher(&self) -> ChatHandle {
        self.teacher
    }

    pub fn message(&self) -> MessageRef {
        self.message
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn acknowledged(&self) -> &BTreeSet<Username> {
        &self.acknowledged
    }

    pub fn has_acknowledged(&self, username: &Username) -> bool {
        self.acknowledged.contains(username)
    }

    /// Records a student's acknowledgement.
    ///
    /// Returns `Ok(false)` if the student had already acknowledged.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the round is closed
    pub fn acknowledge(&mut self, username: Username) -> Result<bool, ValidationError> {
        if self.status != RoundStatus::Open {
            return Err(ValidationError::invalid_format(
                "round",
                format!("attendance for {} is closed", self.class),
            ));
        }
        Ok(self.acknowledged.insert(username))
    }

    /// Closes the round.
    pub fn close(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(RoundStatus::Closed)?;
        Ok(())
    }

    /// Students of the class who have acknowledged, in roster order.
    pub fn present<'r>(&self, roster: &'r ClassRoster) -> Vec<&'r Student> {
        roster
            .students()
            .iter()
            .filter(|s| self.acknowledged.contains(s.username()))
            .collect()
    }

    /// Students of the class who have not acknowledged, in roster order.
    pub fn absent<'r>(&self, roster: &'r ClassRoster) -> Vec<&'r Student> {
        roster
            .students()
            .iter()
            .filter(|s| !self.acknowledged.contains(s.username()))
            .collect()
    }

    /// Text of the session message for the current state.
    ///
    /// Acknowledgements from usernames outside the class roster are ignored.
    pub fn render(&self, roster: &ClassRoster) -> String {
        render_session(&self.class, self.status, &self.acknowledged, roster)
    }

    /// Text of the session message of a round nobody has acknowledged yet.
    pub fn opening_text(roster: &ClassRoster) -> String {
        render_session(roster.name(), RoundStatus::Open, &BTreeSet::new(), roster)
    }
}

fn render_session(
    class: &ClassName,
    status: RoundStatus,
    acknowledged: &BTreeSet<Username>,
    roster: &ClassRoster,
) -> String {
    let (present, absent): (Vec<&Student>, Vec<&Student>) = roster
        .students()
        .iter()
        .partition(|s| acknowledged.contains(s.username()));

    let mut text = match status {
        RoundStatus::Open => format!("Attendance session for {}:\n", class),
        RoundStatus::Closed => format!("Attendance session for {} (closed):\n", class),
    };

    for student in &present {
        text.push_str(&format!("✅ {}\n", student.label()));
    }

    if status == RoundStatus::Closed {
        for student in &absent {
            text.push_str(&format!("❌ {}\n", student.label()));
        }
    }

    text.push_str(&format!("{}/{} present", present.len(), roster.len()));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster::Roster;
    use proptest::prelude::*;

    fn roster() -> Roster {
        Roster::from_json(r#"{"10A": {"Alice": "alice_u", "Bob": "bob_u"}}"#).unwrap()
    }

    fn ten_a() -> ClassName {
        ClassName::new("10A").unwrap()
    }

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn open_round() -> AttendanceRound {
        AttendanceRound::open(ten_a(), ChatHandle::new(1), MessageRef::new(7))
    }

    #[test]
    fn open_round_renders_header_and_count() {
        let roster = roster();
        let text = open_round().render(roster.class(&ten_a()).unwrap());
        assert_eq!(text, "Attendance session for 10A:\n0/2 present");
    }

    #[test]
    fn acknowledgement_is_idempotent() {
        let mut round = open_round();
        assert!(round.acknowledge(user("alice_u")).unwrap());
        assert!(!round.acknowledge(user("alice_u")).unwrap());
        assert_eq!(round.acknowledged().len(), 1);
    }

    #[test]
    fn render_lists_present_students_in_roster_order() {
        let roster = roster();
        let mut round = open_round();
        round.acknowledge(user("bob_u")).unwrap();
        round.acknowledge(user("alice_u")).unwrap();

        let text = round.render(roster.class(&ten_a()).unwrap());
        assert_eq!(
            text,
            "Attendance session for 10A:\n✅ Alice\n✅ Bob\n2/2 present"
        );
    }

    #[test]
    fn render_ignores_unknown_usernames() {
        let roster = roster();
        let mut round = open_round();
        round.acknowledge(user("mallory")).unwrap();

        let text = round.render(roster.class(&ten_a()).unwrap());
        assert!(!text.contains("mallory"));
        assert!(text.ends_with("0/2 present"));
    }

    #[test]
    fn closed_round_lists_absentees() {
        let roster = roster();
        let class = roster.class(&ten_a()).unwrap();
        let mut round = open_round();
        round.acknowledge(user("alice_u")).unwrap();
        round.close().unwrap();

        assert_eq!(round.status(), RoundStatus::Closed);
        assert_eq!(round.absent(class)[0].label(), "Bob");
        assert_eq!(
            round.render(class),
            "Attendance session for 10A (closed):\n✅ Alice\n❌ Bob\n1/2 present"
        );
    }

    #[test]
    fn closed_round_rejects_acknowledgements_and_second_close() {
        let mut round = open_round();
        round.close().unwrap();
        assert!(round.acknowledge(user("alice_u")).is_err());
        assert!(round.close().is_err());
        assert!(round.status().is_terminal());
    }

    #[test]
    fn reconstitute_keeps_stored_acknowledgements() {
        let acked: BTreeSet<_> = [user("bob_u")].into_iter().collect();
        let round =
            AttendanceRound::reconstitute(ten_a(), ChatHandle::new(1), MessageRef::new(7), acked);
        assert!(round.has_acknowledged(&user("bob_u")));
        assert!(!round.has_acknowledged(&user("alice_u")));
    }

    #[test]
    fn opening_text_matches_fresh_round() {
        let roster = roster();
        let class = roster.class(&ten_a()).unwrap();
        assert_eq!(AttendanceRound::opening_text(class), open_round().render(class));
    }

    proptest! {
        #[test]
        fn present_and_absent_partition_the_class(acks in proptest::collection::vec(
            prop_oneof![Just("alice_u"), Just("bob_u"), Just("mallory")],
            0..6,
        )) {
            let roster = roster();
            let class = roster.class(&ten_a()).unwrap();
            let mut round = open_round();
            for name in &acks {
                round.acknowledge(user(name)).unwrap();
            }

            let present = round.present(class).len();
            let absent = round.absent(class).len();
            prop_assert_eq!(present + absent, class.students().len());
            let expected_suffix = format!("{}/2 present", present);
            prop_assert!(round.render(class).ends_with(&expected_suffix));
        }
    }
}
