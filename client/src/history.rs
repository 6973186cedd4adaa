//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Input command history

use std::collections::VecDeque;

/// Which way the user is walking through history.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Toward older entries.
    Up,
    /// Toward newer entries, and past the newest back to the empty prompt.
    Down,
}

/// Most-recent-first history of sent input lines.
///
/// Password input (sent while the server has suppressed local echo) is
/// recorded as a placeholder so history recall never reveals it.
#[derive(Debug)]
pub struct InputHistory {
    entries: VecDeque<String>,
    cursor: Option<usize>,
    limit: usize,
}

const REDACTED: &str = "<password removed>";

impl InputHistory {
    /// Creates a history retaining at most `limit` entries.
    pub fn new(limit: usize) -> Self {
        InputHistory {
            entries: VecDeque::new(),
            cursor: None,
            limit,
        }
    }

    /// Records one sent line.
    ///
    /// Empty lines and lines equal to the newest entry are skipped. While
    /// local echo is off the literal text is replaced by a placeholder.
    /// Any in-progress navigation resets to the prompt.
    pub fn record(&mut self, line: &str, local_echo: bool) {
        self.cursor = None;
        if line.is_empty() {
            return;
        }
        let entry = if local_echo { line } else { REDACTED };
        if self.entries.front().map(String::as_str) == Some(entry) {
            return;
        }
        self.entries.push_front(entry.to_string());
        while self.entries.len() > self.limit {
            self.entries.pop_back();
        }
    }

    /// Steps the recall cursor and returns the entry it lands on.
    ///
    /// `Up` walks toward the oldest entry and clamps there; `Down` walks
    /// back toward the newest and then off the end, returning `None` to
    /// mean the input line should be cleared.
    pub fn navigate(&mut self, direction: Direction) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = match (direction, self.cursor) {
            (Direction::Up, None) => Some(0),
            (Direction::Up, Some(i)) => Some((i + 1).min(self.entries.len() - 1)),
            (Direction::Down, None) => None,
            (Direction::Down, Some(0)) => None,
            (Direction::Down, Some(i)) => Some(i - 1),
        };
        self.cursor.map(|i| self.entries[i].as_str())
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any entries are retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first iterator over the retained entries.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_commands_collapse() {
        let mut history = InputHistory::new(100);
        history.record("look", true);
        history.record("look", true);
        history.record("north", true);
        let entries: Vec<&str> = history.iter().collect();
        assert_eq!(entries, vec!["north", "look"]);
    }

    #[test]
    fn empty_lines_are_not_recorded() {
        let mut history = InputHistory::new(100);
        history.record("", true);
        assert!(history.is_empty());
    }

    #[test]
    fn password_entry_is_redacted() {
        let mut history = InputHistory::new(100);
        history.record("hunter2", false);
        assert_eq!(history.iter().next(), Some("<password removed>"));
    }

    #[test]
    fn up_walks_to_oldest_and_clamps() {
        let mut history = InputHistory::new(100);
        history.record("first", true);
        history.record("second", true);

        assert_eq!(history.navigate(Direction::Up), Some("second"));
        assert_eq!(history.navigate(Direction::Up), Some("first"));
        assert_eq!(history.navigate(Direction::Up), Some("first"));
    }

    #[test]
    fn down_past_newest_clears_the_prompt() {
        let mut history = InputHistory::new(100);
        history.record("first", true);
        history.record("second", true);

        history.navigate(Direction::Up);
        history.navigate(Direction::Up);
        assert_eq!(history.navigate(Direction::Down), Some("second"));
        assert_eq!(history.navigate(Direction::Down), None);
        // From the prompt, Down stays at the prompt.
        assert_eq!(history.navigate(Direction::Down), None);
    }

    #[test]
    fn recording_resets_navigation() {
        let mut history = InputHistory::new(100);
        history.record("first", true);
        history.navigate(Direction::Up);
        history.record("second", true);
        // Back at the prompt; Up finds the newest entry again.
        assert_eq!(history.navigate(Direction::Up), Some("second"));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = InputHistory::new(2);
        history.record("a", true);
        history.record("b", true);
        history.record("c", true);
        let entries: Vec<&str> = history.iter().collect();
        assert_eq!(entries, vec!["c", "b"]);
    }

    #[test]
    fn navigate_on_empty_history() {
        let mut history = InputHistory::new(10);
        assert_eq!(history.navigate(Direction::Up), None);
        assert_eq!(history.navigate(Direction::Down), None);
    }
}
