use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::diarization::SpeechTurn;

/// Keep only the turns of the `cap` speakers with the most total talk time.
///
/// With no cap (or a cap of zero) the input is returned unchanged. Speakers
/// are ranked by cumulative turn duration, descending; equal totals keep
/// first-seen order (the ranking sort is stable over insertion order). The
/// relative order of surviving turns is preserved.
pub fn select_speakers(turns: Vec<SpeechTurn>, cap: Option<usize>) -> Vec<SpeechTurn> {
    let Some(cap) = cap.filter(|&c| c > 0) else {
        return turns;
    };

    let mut totals: HashMap<&str, f64> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for turn in &turns {
        if !totals.contains_key(turn.speaker_id.as_str()) {
            first_seen.push(turn.speaker_id.as_str());
        }
        *totals.entry(turn.speaker_id.as_str()).or_insert(0.0) += turn.duration();
    }

    if first_seen.len() <= cap {
        return turns;
    }

    let mut ranked = first_seen;
    ranked.sort_by(|a, b| {
        totals[b]
            .partial_cmp(&totals[a])
            .unwrap_or(Ordering::Equal)
    });

    debug!(
        "Speaker cap {}: keeping {} of {} speakers",
        cap,
        cap.min(ranked.len()),
        totals.len()
    );

    let keep: HashSet<String> = ranked
        .into_iter()
        .take(cap)
        .map(str::to_string)
        .collect();

    turns
        .into_iter()
        .filter(|turn| keep.contains(turn.speaker_id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(speaker: &str, start: f64, end: f64) -> SpeechTurn {
        SpeechTurn::new(speaker, start, end)
    }

    #[test]
    fn no_cap_is_identity() {
        let turns = vec![turn("A", 0.0, 3.0), turn("B", 3.0, 7.0)];
        assert_eq!(select_speakers(turns.clone(), None), turns);
        assert_eq!(select_speakers(turns.clone(), Some(0)), turns);
    }

    #[test]
    fn cap_at_or_above_speaker_count_is_identity() {
        let turns = vec![
            turn("A", 0.0, 3.0),
            turn("B", 3.0, 7.0),
            turn("A", 7.0, 10.0),
        ];
        assert_eq!(select_speakers(turns.clone(), Some(2)), turns);
        assert_eq!(select_speakers(turns.clone(), Some(5)), turns);
    }

    #[test]
    fn keeps_top_talkers_and_turn_order() {
        // A: 6s, B: 4s, C: 1s
        let turns = vec![
            turn("A", 0.0, 3.0),
            turn("B", 3.0, 7.0),
            turn("C", 7.0, 8.0),
            turn("A", 8.0, 11.0),
        ];

        let selected = select_speakers(turns, Some(2));
        let speakers: Vec<&str> = selected.iter().map(|t| t.speaker_id.as_str()).collect();
        assert_eq!(speakers, vec!["A", "B", "A"]);
    }

    #[test]
    fn single_speaker_cap() {
        let turns = vec![
            turn("A", 0.0, 1.0),
            turn("B", 1.0, 5.0),
            turn("A", 5.0, 6.0),
        ];

        let selected = select_speakers(turns, Some(1));
        assert!(selected.iter().all(|t| t.speaker_id == "B"));
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn ties_break_on_first_seen_order() {
        // B and C both total 2s; B was seen first
        let turns = vec![
            turn("A", 0.0, 5.0),
            turn("B", 5.0, 7.0),
            turn("C", 7.0, 9.0),
        ];

        let selected = select_speakers(turns, Some(2));
        let speakers: Vec<&str> = selected.iter().map(|t| t.speaker_id.as_str()).collect();
        assert_eq!(speakers, vec!["A", "B"]);
    }

    #[test]
    fn durations_accumulate_across_turns() {
        // A totals 4s over two turns, B has a single 3s turn
        let turns = vec![
            turn("A", 0.0, 2.0),
            turn("B", 2.0, 5.0),
            turn("A", 5.0, 7.0),
        ];

        let selected = select_speakers(turns, Some(1));
        assert!(selected.iter().all(|t| t.speaker_id == "A"));
        assert_eq!(selected.len(), 2);
    }
}
