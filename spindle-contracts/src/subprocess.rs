//! Line-protocol contract types for the external ripping and transcoding
//! tools. Parsing lives in
//! `spindle-runtime`; these are the shapes it produces.

#[derive(Debug, Clone, PartialEq)]
pub enum RipperLine {
    /// `CINFO:idx,code,value` — disc-level info field.
    DiscInfo { index: u32, code: u32, value: String },
    /// `TINFO:title,code,value` — per-title info field.
    TitleInfo { title: u32, code: u32, value: String },
    /// `PRGV:cur,total,max` — overall progress.
    Progress { current: u64, total: u64, max: u64 },
    /// `MSG:...` — free-form log message.
    Message(String),
    /// A row of the invalid-index drive listing used to resolve a
    /// drive-letter -> index mapping.
    DriveListing { index: u32, drive_letter: String },
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RipProgress {
    pub current: u64,
    pub total: u64,
    pub max: u64,
}

impl RipProgress {
    pub fn percent(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            (self.current as f64 / self.max as f64 * 100.0).clamp(0.0, 100.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscodeProgress {
    pub percent: f64,
}
