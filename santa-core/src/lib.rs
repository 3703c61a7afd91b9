use std::collections::HashMap;

use chrono::{Local, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod draw;

pub use draw::{draw_pairing, Pairing, MAX_DRAW_ATTEMPTS};

pub type ParticipantName = String;
pub type Score = i64;

/// How a configured deadline is reported back to callers.
pub const DEADLINE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

// `datetime-local` inputs send the first form; the rest are typed by hand.
const DEADLINE_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: ParticipantName,
    pub score: Score,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeadlineStatus {
    pub deadline: Option<String>,
    pub passed: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("participant name is required")]
    InvalidName,
    #[error("'{0}' is already a participant")]
    DuplicateParticipant(ParticipantName),
    #[error("'{0}' is not a participant")]
    UnknownParticipant(ParticipantName),
    #[error("at least 2 participants are needed for the draw")]
    InsufficientParticipants,
    #[error("could not complete the draw after {attempts} attempts; try again or add more participants")]
    DrawExhausted { attempts: usize },
    #[error("the challenge deadline has already passed")]
    DeadlinePassed,
    #[error("invalid date-time '{0}'; use YYYY-MM-DDTHH:MM or YYYY-MM-DD HH:MM")]
    InvalidDateFormat(String),
    #[error("no pairing for '{0}': the draw has not been run or their pair left the party")]
    RevealNotAvailable(ParticipantName),
}

/// One Secret Santa party: roster, pairing, challenge scores and deadline.
///
/// The presentation layer owns a `Party` and routes every operation through
/// it; there is no process-wide game.
#[derive(Debug, Clone, Default)]
pub struct Party {
    participants: Vec<ParticipantName>,
    pairing: Pairing,
    scores: HashMap<ParticipantName, Score>,
    deadline: Option<NaiveDateTime>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participants(&self) -> &[ParticipantName] {
        &self.participants
    }

    pub fn is_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }

    /// Appends `name` (trimmed) to the roster with a zero score.
    pub fn add_participant(&mut self, name: &str) -> Result<ParticipantName, GameError> {
        let name = normalize_name(name)?;
        if self.is_participant(name) {
            return Err(GameError::DuplicateParticipant(name.to_string()));
        }

        self.participants.push(name.to_string());
        self.scores.insert(name.to_string(), 0);
        Ok(name.to_string())
    }

    /// Removes `name` along with its score and any pairing rows naming it.
    pub fn remove_participant(&mut self, name: &str) -> Result<ParticipantName, GameError> {
        let name = normalize_name(name)?;
        let index = self
            .participants
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| GameError::UnknownParticipant(name.to_string()))?;

        let removed = self.participants.remove(index);
        self.scores.remove(&removed);
        self.pairing.drop_participant(&removed);
        Ok(removed)
    }

    /// Runs the draw over the current roster. A failed draw leaves no pairing.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        match draw_pairing(&self.participants, rng, MAX_DRAW_ATTEMPTS) {
            Ok(pairing) => {
                self.pairing = pairing;
                Ok(())
            }
            Err(err) => {
                self.pairing = Pairing::default();
                Err(err)
            }
        }
    }

    pub fn has_pairing(&self) -> bool {
        !self.pairing.is_empty()
    }

    /// Receiver drawn for one giver. Never exposes other rows.
    pub fn reveal(&self, giver: &str) -> Result<&str, GameError> {
        let giver = normalize_name(giver)?;
        if !self.is_participant(giver) {
            return Err(GameError::UnknownParticipant(giver.to_string()));
        }
        self.pairing
            .receiver_for(giver)
            .ok_or_else(|| GameError::RevealNotAvailable(giver.to_string()))
    }

    pub fn record_challenge(&mut self, name: &str, points: Score) -> Result<Score, GameError> {
        self.record_challenge_at(name, points, Local::now().naive_local())
    }

    /// Adds `points` to `name`'s score unless the deadline has passed at `now`.
    pub fn record_challenge_at(
        &mut self,
        name: &str,
        points: Score,
        now: NaiveDateTime,
    ) -> Result<Score, GameError> {
        let name = normalize_name(name)?;
        if !self.scores.contains_key(name) {
            return Err(GameError::UnknownParticipant(name.to_string()));
        }
        if self.deadline_passed_at(now) {
            return Err(GameError::DeadlinePassed);
        }

        let score = self
            .scores
            .get_mut(name)
            .ok_or_else(|| GameError::UnknownParticipant(name.to_string()))?;
        *score = score.saturating_add(points);
        Ok(*score)
    }

    pub fn score_of(&self, name: &str) -> Option<Score> {
        self.scores.get(name).copied()
    }

    pub fn scores(&self) -> &HashMap<ParticipantName, Score> {
        &self.scores
    }

    /// Scores from highest to lowest; ties keep roster order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .participants
            .iter()
            .filter_map(|name| {
                self.scores.get(name).map(|&score| LeaderboardEntry {
                    name: name.clone(),
                    score,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Replaces the deadline. An unparsable value keeps the previous one.
    pub fn set_deadline(&mut self, text: &str) -> Result<NaiveDateTime, GameError> {
        let deadline = parse_deadline(text)?;
        self.deadline = Some(deadline);
        Ok(deadline)
    }

    pub fn clear_deadline(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<NaiveDateTime> {
        self.deadline
    }

    pub fn deadline_passed_at(&self, now: NaiveDateTime) -> bool {
        self.deadline.is_some_and(|deadline| now > deadline)
    }

    pub fn deadline_status(&self) -> DeadlineStatus {
        self.deadline_status_at(Local::now().naive_local())
    }

    pub fn deadline_status_at(&self, now: NaiveDateTime) -> DeadlineStatus {
        DeadlineStatus {
            deadline: self.deadline.map(format_deadline),
            passed: self.deadline_passed_at(now),
        }
    }
}

pub fn parse_deadline(text: &str) -> Result<NaiveDateTime, GameError> {
    let trimmed = text.trim();
    DEADLINE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| GameError::InvalidDateFormat(text.to_string()))
}

pub fn format_deadline(deadline: NaiveDateTime) -> String {
    deadline.format(DEADLINE_DISPLAY_FORMAT).to_string()
}

fn normalize_name(name: &str) -> Result<&str, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidName);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn party(names: &[&str]) -> Party {
        let mut party = Party::new();
        for name in names {
            party.add_participant(name).unwrap();
        }
        party
    }

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn add_keeps_order_and_rejects_duplicates() {
        let mut party = party(&["alice", "bob"]);
        assert_eq!(
            party.add_participant("alice").unwrap_err(),
            GameError::DuplicateParticipant("alice".into())
        );
        // case-sensitive identity
        party.add_participant("Alice").unwrap();
        assert_eq!(party.participants(), ["alice", "bob", "Alice"]);
        assert_eq!(party.score_of("Alice"), Some(0));
    }

    #[test]
    fn names_are_trimmed_and_must_not_be_blank() {
        let mut party = Party::new();
        assert_eq!(party.add_participant("  carol "), Ok("carol".to_string()));
        assert_eq!(party.add_participant("   ").unwrap_err(), GameError::InvalidName);
        assert_eq!(
            party.add_participant("carol").unwrap_err(),
            GameError::DuplicateParticipant("carol".into())
        );
    }

    #[test]
    fn remove_drops_score_and_unknown_fails() {
        let mut party = party(&["alice", "bob"]);
        party.remove_participant("alice").unwrap();
        assert_eq!(party.participants(), ["bob"]);
        assert_eq!(party.score_of("alice"), None);
        assert_eq!(
            party.remove_participant("alice").unwrap_err(),
            GameError::UnknownParticipant("alice".into())
        );
    }

    #[test]
    fn draw_commits_a_derangement_revealed_one_row_at_a_time() {
        let names = ["alice", "bob", "carol", "dave"];
        let mut party = party(&names);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        party.draw(&mut rng).unwrap();
        assert!(party.has_pairing());

        let mut receivers: Vec<&str> = names.iter().map(|n| party.reveal(n).unwrap()).collect();
        for (giver, receiver) in names.iter().zip(&receivers) {
            assert_ne!(giver, receiver);
        }
        receivers.sort();
        assert_eq!(receivers, ["alice", "bob", "carol", "dave"]);
    }

    #[test]
    fn draw_with_too_few_clears_previous_pairing() {
        let mut party = party(&["alice", "bob"]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        party.draw(&mut rng).unwrap();
        party.remove_participant("bob").unwrap();

        assert_eq!(
            party.draw(&mut rng).unwrap_err(),
            GameError::InsufficientParticipants
        );
        assert!(!party.has_pairing());
        assert_eq!(
            party.reveal("alice").unwrap_err(),
            GameError::RevealNotAvailable("alice".into())
        );

        let mut empty = Party::new();
        assert_eq!(
            empty.draw(&mut rng).unwrap_err(),
            GameError::InsufficientParticipants
        );
    }

    #[test]
    fn removal_after_draw_drops_only_affected_rows() {
        let names = ["a", "b", "c", "d", "e"];
        let mut party = party(&names);
        party.draw(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let before: Vec<(String, String)> = names
            .iter()
            .map(|n| (n.to_string(), party.reveal(n).unwrap().to_string()))
            .collect();

        party.remove_participant("c").unwrap();

        for (giver, receiver) in &before {
            if giver == "c" {
                continue;
            }
            if receiver == "c" {
                let err = party.reveal(giver).unwrap_err();
                assert_eq!(err, GameError::RevealNotAvailable(giver.clone()));
                assert!(err.to_string().contains("their pair left the party"));
            } else {
                assert_eq!(party.reveal(giver).unwrap(), receiver);
            }
        }
        assert_eq!(
            party.reveal("c").unwrap_err(),
            GameError::UnknownParticipant("c".into())
        );
    }

    #[test]
    fn reveal_distinguishes_unknown_from_not_drawn() {
        let party = party(&["alice", "bob"]);
        assert_eq!(
            party.reveal("alice").unwrap_err(),
            GameError::RevealNotAvailable("alice".into())
        );
        assert_eq!(
            party.reveal("zed").unwrap_err(),
            GameError::UnknownParticipant("zed".into())
        );
    }

    #[test]
    fn record_unknown_participant_leaves_ledger_alone() {
        let mut party = party(&["alice"]);
        assert_eq!(
            party.record_challenge("bob", 1).unwrap_err(),
            GameError::UnknownParticipant("bob".into())
        );
        assert_eq!(party.scores().len(), 1);
        assert_eq!(party.score_of("alice"), Some(0));
    }

    #[test]
    fn record_adds_exact_points_without_deadline() {
        let mut party = party(&["alice"]);
        assert_eq!(party.record_challenge("alice", 1), Ok(1));
        assert_eq!(party.record_challenge("alice", 4), Ok(5));
        assert_eq!(party.record_challenge("alice", -2), Ok(3));
    }

    #[test]
    fn deadline_gates_recording() {
        let mut party = party(&["alice"]);
        party.set_deadline("2025-01-01T10:00").unwrap();

        assert_eq!(party.record_challenge_at("alice", 2, at(9, 59)), Ok(2));
        // the cutoff minute itself still counts
        assert_eq!(party.record_challenge_at("alice", 1, at(10, 0)), Ok(3));
        assert_eq!(
            party.record_challenge_at("alice", 1, at(10, 1)).unwrap_err(),
            GameError::DeadlinePassed
        );
        assert_eq!(party.score_of("alice"), Some(3));
    }

    #[test]
    fn leaderboard_sorts_descending_with_stable_ties() {
        let mut party = party(&["A", "B", "C"]);
        party.record_challenge("A", 3).unwrap();
        party.record_challenge("B", 5).unwrap();
        let board: Vec<(String, Score)> = party
            .leaderboard()
            .into_iter()
            .map(|e| (e.name, e.score))
            .collect();
        assert_eq!(
            board,
            vec![
                ("B".to_string(), 5),
                ("A".to_string(), 3),
                ("C".to_string(), 0)
            ]
        );

        let ties = self::party(&["x", "y", "z"]);
        let names: Vec<String> = ties.leaderboard().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["x", "y", "z"]);
    }

    #[test]
    fn deadline_status_before_and_after() {
        let mut party = Party::new();
        assert_eq!(
            party.deadline_status_at(at(12, 0)),
            DeadlineStatus {
                deadline: None,
                passed: false
            }
        );

        party.set_deadline("2025-01-01T10:00").unwrap();
        let before = party.deadline_status_at(at(9, 0));
        assert_eq!(before.deadline.as_deref(), Some("2025-01-01 10:00"));
        assert!(!before.passed);
        assert!(party.deadline_status_at(at(11, 0)).passed);
    }

    #[test]
    fn bad_deadline_keeps_previous_value() {
        let mut party = Party::new();
        assert_eq!(
            party.set_deadline("tomorrow").unwrap_err(),
            GameError::InvalidDateFormat("tomorrow".into())
        );
        assert_eq!(party.deadline(), None);

        party.set_deadline("2025-01-01 10:00").unwrap();
        assert!(party.set_deadline("2025-13-01T10:00").is_err());
        assert_eq!(party.deadline(), Some(at(10, 0)));

        party.clear_deadline();
        assert_eq!(party.deadline(), None);
    }

    #[test]
    fn parses_every_accepted_deadline_form() {
        let expected = at(10, 0);
        for text in [
            "2025-01-01T10:00",
            "2025-01-01 10:00",
            "2025-01-01T10:00:00",
            " 2025-01-01 10:00:00 ",
        ] {
            assert_eq!(parse_deadline(text), Ok(expected), "{text}");
        }
        assert!(parse_deadline("01/01/2025 10:00").is_err());
        assert!(parse_deadline("2025-01-01").is_err());
    }
}
