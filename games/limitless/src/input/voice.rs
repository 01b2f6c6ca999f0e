//! Speech grammar. English and Korean phrases map to the same commands.

use super::{Command, Direction, UiAction};
use crate::settings::{Difficulty, MovementMode};

const SELECT_WORDS: [&[&str]; 3] = [
    &["1", "one", "하나", "일번"],
    &["2", "two", "둘", "이번"],
    &["3", "three", "셋", "삼번"],
];

const MOVE_WORDS: [(Direction, &[&str]); 4] = [
    (Direction::Up, &["up", "위"]),
    (Direction::Down, &["down", "아래"]),
    (Direction::Left, &["left", "왼쪽"]),
    (Direction::Right, &["right", "오른쪽"]),
];

const STOP_WORDS: &[&str] = &["stop", "정지", "멈춰"];

const UI_WORDS: [(UiAction, &[&str]); 9] = [
    (UiAction::OpenSettings, &["settings", "설정"]),
    (UiAction::CloseSettings, &["close", "닫기"]),
    (UiAction::ToggleContrast, &["contrast", "고대비"]),
    (UiAction::ToggleScan, &["scan", "스캔"]),
    (UiAction::SetDifficulty(Difficulty::Relaxed), &["relaxed", "쉬움"]),
    (UiAction::SetDifficulty(Difficulty::Standard), &["standard", "보통"]),
    (UiAction::SetDifficulty(Difficulty::Intense), &["intense", "어려움"]),
    (UiAction::SetMovement(MovementMode::Click), &["click", "클릭"]),
    (UiAction::SetMovement(MovementMode::Follow), &["follow", "팔로우", "따라"]),
];

/// Map a final speech transcript to a command. Selections are checked first,
/// then movement, stop and settings phrases.
pub fn parse_transcript(transcript: &str) -> Option<Command> {
    let text = transcript.trim().to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|w| !w.is_empty())
        .collect();
    let has_word = |options: &[&str]| words.iter().any(|w| options.contains(w));
    let has_phrase = |options: &[&str]| options.iter().any(|o| text.contains(o));

    for (index, options) in SELECT_WORDS.iter().enumerate() {
        if has_word(options) {
            return Some(Command::Select(index));
        }
    }
    for (direction, options) in MOVE_WORDS {
        // "up" must stand alone so "pickup" or "setup" never moves the player
        let matched = match direction {
            Direction::Up => has_word(options),
            _ => has_phrase(options),
        };
        if matched {
            return Some(Command::Move(direction));
        }
    }
    if has_phrase(STOP_WORDS) {
        return Some(Command::Stop);
    }
    UI_WORDS
        .iter()
        .find(|(_, options)| has_phrase(options))
        .map(|(action, _)| Command::Ui(*action))
}
