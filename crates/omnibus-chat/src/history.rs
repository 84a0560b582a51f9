//! Bounded view of recent turns used to give the model conversational context.

use serde::Serialize;

use omnibus_core::types::Turn;

/// Number of prior turns included by default.
pub const DEFAULT_HISTORY_TURNS: usize = 5;

/// Selects the turns preceding the question currently being processed.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    size: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_TURNS)
    }
}

impl HistoryWindow {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The last `size` turns before the final one.
    ///
    /// The final turn is the in-flight question and is never included, so a
    /// log of length N yields indices `max(0, N-1-size) ..= N-2`, and nothing
    /// when N <= 1.
    pub fn select<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        let n = turns.len();
        if n <= 1 {
            return &[];
        }
        let end = n - 1;
        let start = end.saturating_sub(self.size);
        &turns[start..end]
    }
}

#[derive(Serialize)]
struct HistoryLine<'a> {
    role: &'a str,
    content: &'a str,
}

/// Render turns as one JSON object per line. An empty slice renders as "".
pub fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| {
            serde_json::to_string(&HistoryLine {
                role: turn.role.as_str(),
                content: &turn.content,
            })
            .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnibus_core::types::Role;

    fn log(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                Turn::new(role, format!("turn {}", i))
            })
            .collect()
    }

    fn contents(turns: &[Turn]) -> Vec<&str> {
        turns.iter().map(|t| t.content.as_str()).collect()
    }

    #[test]
    fn test_empty_and_single_turn_yield_nothing() {
        let window = HistoryWindow::default();
        assert!(window.select(&log(0)).is_empty());
        assert!(window.select(&log(1)).is_empty());
    }

    #[test]
    fn test_excludes_in_flight_question() {
        let window = HistoryWindow::default();
        let turns = log(3);
        assert_eq!(contents(window.select(&turns)), vec!["turn 0", "turn 1"]);
    }

    #[test]
    fn test_caps_at_window_size() {
        let window = HistoryWindow::default();
        let turns = log(9);
        // Indices 3..=7.
        assert_eq!(
            contents(window.select(&turns)),
            vec!["turn 3", "turn 4", "turn 5", "turn 6", "turn 7"]
        );
    }

    #[test]
    fn test_window_bounds_for_every_length() {
        let window = HistoryWindow::default();
        for n in 0..20 {
            let turns = log(n);
            let selected = window.select(&turns);
            let expected = if n <= 1 { 0 } else { (n - 1).min(5) };
            assert_eq!(selected.len(), expected, "length {}", n);
            if let Some(last) = selected.last() {
                assert_eq!(last.id, turns[n - 2].id);
            }
        }
    }

    #[test]
    fn test_custom_window_size() {
        let window = HistoryWindow::new(2);
        let turns = log(6);
        assert_eq!(contents(window.select(&turns)), vec!["turn 3", "turn 4"]);

        let none = HistoryWindow::new(0);
        assert!(none.select(&turns).is_empty());
    }

    #[test]
    fn test_render_history_json_lines() {
        let turns = vec![
            Turn::user("What is \"Rule 12\"?"),
            Turn::assistant("It covers amendments."),
        ];
        let rendered = render_history(&turns);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"role":"user","content":"What is \"Rule 12\"?"}"#
        );
        assert_eq!(
            lines[1],
            r#"{"role":"assistant","content":"It covers amendments."}"#
        );
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&[]), "");
    }
}
