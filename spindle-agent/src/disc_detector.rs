//! Polls configured optical drives for insertion/ejection, using the
//! ripping tool's own drive-listing probe rather than OS-specific APIs so
//! the same binary runs on any host the ripping tool supports.

use std::collections::HashMap;

use crate::makemkv::{DiscAnalysis, MakeMkv};

#[derive(Debug, Clone, PartialEq)]
pub enum DiscEvent {
    Inserted { drive: String, analysis: DiscAnalysis },
    Ejected { drive: String },
}

/// Tracks which configured drives currently hold a disc, emitting
/// `DiscEvent`s for state transitions observed between polls.
pub struct DiscDetector {
    drives: Vec<String>,
    known: HashMap<String, ()>,
}

impl DiscDetector {
    pub fn new(drives: Vec<String>) -> Self {
        Self { drives, known: HashMap::new() }
    }

    pub async fn poll(&mut self, makemkv: &MakeMkv) -> Vec<DiscEvent> {
        let mut events = Vec::new();
        for drive in self.drives.clone() {
            let has_disc = makemkv.analyze_disc(&drive).await;
            let previously_known = self.known.contains_key(&drive);

            match (has_disc, previously_known) {
                (Ok(analysis), false) if !analysis.titles.is_empty() => {
                    self.known.insert(drive.clone(), ());
                    events.push(DiscEvent::Inserted { drive, analysis });
                }
                (Ok(analysis), true) if analysis.titles.is_empty() => {
                    self.known.remove(&drive);
                    events.push(DiscEvent::Ejected { drive });
                }
                (Err(_), true) => {
                    self.known.remove(&drive);
                    events.push(DiscEvent::Ejected { drive });
                }
                _ => {}
            }
        }
        events
    }

    pub fn mark_ejected(&mut self, drive: &str) {
        self.known.remove(drive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_detector_tracks_no_known_discs() {
        let detector = DiscDetector::new(vec!["D:".to_string()]);
        assert!(detector.known.is_empty());
    }

    #[test]
    fn mark_ejected_clears_known_state() {
        let mut detector = DiscDetector::new(vec!["D:".to_string()]);
        detector.known.insert("D:".to_string(), ());
        detector.mark_ejected("D:");
        assert!(!detector.known.contains_key("D:"));
    }
}
