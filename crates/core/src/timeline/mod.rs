use serde::{Deserialize, Serialize};

use crate::{OnsetSource, SampleIndex, TrialOnset};

/// Transition of the stimulus trigger channel between consecutive rows.
///
/// The trigger idles high and drops while a stimulus is on screen, so a
/// falling edge opens a stimulus span and a rising edge closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerEdge {
    Onset,
    Offset,
}

impl TriggerEdge {
    /// Classifies the step from `previous` to `current`.
    pub fn between(previous: f64, current: f64) -> Option<Self> {
        let step = current - previous;
        if step == -1.0 {
            Some(Self::Onset)
        } else if step == 1.0 {
            Some(Self::Offset)
        } else {
            None
        }
    }
}

/// Edge per row; the first row has nothing to compare against.
pub fn edges(trigger: &[f64]) -> impl Iterator<Item = Option<TriggerEdge>> + '_ {
    std::iter::once(None).chain(
        trigger
            .windows(2)
            .map(|pair| TriggerEdge::between(pair[0], pair[1])),
    )
}

/// Row indices of every stimulus onset edge.
pub fn stimulus_onsets(trigger: &[f64]) -> Vec<SampleIndex> {
    edges(trigger)
        .enumerate()
        .filter_map(|(index, edge)| (edge == Some(TriggerEdge::Onset)).then_some(index))
        .collect()
}

/// The trial starts at the first stimulus, or at the first row when the
/// trigger never fires.
pub fn first_stimulus_onset(trigger: &[f64]) -> TrialOnset {
    match stimulus_onsets(trigger).first() {
        Some(&index) => TrialOnset {
            index,
            source: OnsetSource::Trigger,
        },
        None => TrialOnset {
            index: 0,
            source: OnsetSource::RecordStart,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unit_steps_only() {
        assert_eq!(TriggerEdge::between(1.0, 0.0), Some(TriggerEdge::Onset));
        assert_eq!(TriggerEdge::between(0.0, 1.0), Some(TriggerEdge::Offset));
        assert_eq!(TriggerEdge::between(0.0, 0.0), None);
        assert_eq!(TriggerEdge::between(0.0, 2.0), None);
        assert_eq!(TriggerEdge::between(f64::NAN, 1.0), None);
    }

    #[test]
    fn first_row_has_no_edge() {
        let trigger = [0.0, 0.0, 1.0, 1.0, 0.0];
        let collected: Vec<_> = edges(&trigger).collect();
        assert_eq!(
            collected,
            vec![
                None,
                None,
                Some(TriggerEdge::Offset),
                None,
                Some(TriggerEdge::Onset)
            ]
        );
    }

    #[test]
    fn finds_stimulus_onsets() {
        let trigger = [1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0];
        assert_eq!(stimulus_onsets(&trigger), vec![2, 5]);

        let onset = first_stimulus_onset(&trigger);
        assert_eq!(onset.index, 2);
        assert_eq!(onset.source, OnsetSource::Trigger);
    }

    #[test]
    fn silent_trigger_starts_at_record_start() {
        let onset = first_stimulus_onset(&[1.0; 10]);
        assert_eq!(onset.index, 0);
        assert!(onset.is_fallback());
    }
}
