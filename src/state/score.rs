use crate::types::*;
use std::cmp::Ordering;

impl Session {
    /// Cumulative scores, best first; ties keep join order
    pub fn scoreboard(&self) -> Vec<ScoreLine> {
        let mut lines: Vec<ScoreLine> = self
            .players
            .keys()
            .filter_map(|id| {
                self.scores.get(id).map(|&score| ScoreLine {
                    player_id: id.clone(),
                    display_name: self.player_name(id).to_string(),
                    score,
                })
            })
            .collect();

        lines.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        lines
    }
}

/// Render a scoreboard for the group chat, one decimal per score
pub fn format_scoreboard(lines: &[ScoreLine]) -> String {
    let mut text = String::from("🏆 Current Scores:\n");
    for line in lines {
        text.push_str(&format!("{}: {:.1}\n", line.display_name, line.score));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut session = Session::new("g".into());
        for (id, name) in [("a", Some("Alice")), ("b", None), ("c", Some("Carol"))] {
            session
                .add_player(
                    Player {
                        id: id.into(),
                        display_name: name.map(String::from),
                    },
                    8,
                )
                .unwrap();
        }
        session
    }

    #[test]
    fn test_scoreboard_sorted_descending() {
        let mut session = session();
        session.scores.insert("a".into(), 50.0);
        session.scores.insert("b".into(), 166.666);
        session.scores.insert("c".into(), 83.334);

        let board = session.scoreboard();
        let order: Vec<_> = board.iter().map(|l| l.player_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(board[0].display_name, NO_NAME);
    }

    #[test]
    fn test_scoreboard_skips_unscored_players() {
        let mut session = session();
        session.scores.insert("c".into(), 0.0);
        assert_eq!(session.scoreboard().len(), 1);
    }

    #[test]
    fn test_format_rounds_for_display() {
        let lines = vec![
            ScoreLine {
                player_id: "a".into(),
                display_name: "Alice".into(),
                score: 66.666_666,
            },
            ScoreLine {
                player_id: "b".into(),
                display_name: "Bob".into(),
                score: 33.333_333,
            },
        ];
        assert_eq!(
            format_scoreboard(&lines),
            "🏆 Current Scores:\nAlice: 66.7\nBob: 33.3\n"
        );
    }
}
