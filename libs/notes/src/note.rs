use core::fmt;
use core::str::FromStr;

use crate::MAX_OCTAVE;


/// Chromatic note names, in scale order
pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// One of the twelve chromatic notes of an octave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl Note {
    pub const ALL: [Note; 12] = [
        Note::C, Note::CSharp, Note::D, Note::DSharp, Note::E, Note::F,
        Note::FSharp, Note::G, Note::GSharp, Note::A, Note::ASharp, Note::B,
    ];

    /// Position in the octave, 0 to 11
    pub const fn chromatic_index(self) -> u8 {
        self as u8
    }

    /// Canonical name (uppercase, ASCII sharp)
    pub const fn name(self) -> &'static str {
        NOTE_NAMES[self as usize]
    }

    /// Lookup a canonical name, already normalized
    pub fn from_name(name: &str) -> Option<Self> {
        NOTE_NAMES.iter().position(|n| *n == name).map(|i| Self::ALL[i])
    }
}


/// Reason why a note could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    /// Nothing left after trimming
    Empty,
    /// No octave digit in the input
    MissingOctave,
    /// Input starts with the octave digit
    MissingNoteName,
    /// Note name is not one of [NOTE_NAMES]
    UnknownNote(String),
    /// Octave is not an integer in `1..=MAX_OCTAVE`
    InvalidOctave(String),
}

impl fmt::Display for NoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty note"),
            Self::MissingOctave => write!(f, "missing octave digit"),
            Self::MissingNoteName => write!(f, "missing note name"),
            Self::UnknownNote(name) => write!(f, "unknown note '{name}'"),
            Self::InvalidOctave(octave) => write!(f, "octave '{octave}' not in 1..={MAX_OCTAVE}"),
        }
    }
}

impl std::error::Error for NoteError {}


/// Linear position of a note on the keyboard, `(octave - 1) * 12 + chromatic index`
///
/// Only valid (note, octave) pairs can be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScaleIndex(u8);

impl ScaleIndex {
    /// Number of distinct indexes
    pub const COUNT: u8 = 12 * MAX_OCTAVE;

    /// Build an index from a note and an octave in `1..=MAX_OCTAVE`
    pub const fn new(note: Note, octave: u8) -> Option<Self> {
        if octave < 1 || octave > MAX_OCTAVE {
            None
        } else {
            Some(Self((octave - 1) * 12 + note.chromatic_index()))
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn note(self) -> Note {
        Note::ALL[(self.0 % 12) as usize]
    }

    pub const fn octave(self) -> u8 {
        self.0 / 12 + 1
    }
}

impl fmt::Display for ScaleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note().name(), self.octave())
    }
}

impl FromStr for ScaleIndex {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_note(s)
    }
}


/// Parse a note with its octave (e.g. `C1`, `d#2`, `F♯3`)
///
/// Input is trimmed and case-insensitive; the Unicode sharp sign is accepted.
/// The first digit starts the octave, everything before it is the note name.
pub fn parse_note(input: &str) -> Result<ScaleIndex, NoteError> {
    let s = input.trim().to_uppercase().replace('♯', "#");
    if s.is_empty() {
        return Err(NoteError::Empty);
    }

    let digit = s.find(|c: char| c.is_ascii_digit()).ok_or(NoteError::MissingOctave)?;
    if digit == 0 {
        return Err(NoteError::MissingNoteName);
    }
    let (name, octave) = s.split_at(digit);

    let note = Note::from_name(name).ok_or_else(|| NoteError::UnknownNote(name.to_string()))?;
    octave
        .parse::<u8>()
        .ok()
        .and_then(|octave| ScaleIndex::new(note, octave))
        .ok_or_else(|| NoteError::InvalidOctave(octave.to_string()))
}
