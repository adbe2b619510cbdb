//! Note commands: `(NOTE1,NOTE2)` text decoding and note to angle conversion

mod note;

use core::fmt;

pub use note::{parse_note, Note, NoteError, ScaleIndex, NOTE_NAMES};


/// Highest octave reachable by the actuator
pub const MAX_OCTAVE: u8 = 5;

/// Rotation assigned to one semitone, in degrees
pub const KEY_ANGLE_DEG: f32 = 19.6;


/// Rotation needed to travel from one note to another, in degrees
///
/// Positive values are forward (clockwise) moves.
pub fn angle_delta(from: ScaleIndex, to: ScaleIndex) -> f32 {
    (to.value() as i16 - from.value() as i16) as f32 * KEY_ANGLE_DEG
}


/// Which side of a command a note comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    From,
    To,
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From => write!(f, "first"),
            Self::To => write!(f, "second"),
        }
    }
}

/// Command text does not have the `(NOTE1,NOTE2)` shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Not wrapped in parentheses
    MissingParentheses,
    /// Number of comma separated fields is not two
    FieldCount(usize),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParentheses => write!(f, "missing parentheses"),
            Self::FieldCount(n) => write!(f, "expected 2 notes, got {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is not valid UTF-8
    MalformedEncoding,
    /// Command shape is invalid
    Format(FormatError),
    /// One of the notes is invalid; raw field texts are kept for reporting
    InvalidNote {
        field: NoteField,
        from: String,
        to: String,
        reason: NoteError,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEncoding => write!(f, "payload is not valid UTF-8"),
            Self::Format(err) => write!(f, "format error ({err}), use (C1,E2)"),
            Self::InvalidNote { field, from, to, reason } => {
                write!(f, "invalid {field} note in ({from},{to}): {reason}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}


/// A decoded command: move from one note to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteCommand {
    pub from: ScaleIndex,
    pub to: ScaleIndex,
}

impl NoteCommand {
    /// Decode a raw payload, as written by the remote
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let text = core::str::from_utf8(data).map_err(|_| DecodeError::MalformedEncoding)?;
        text.parse()
    }

    /// Rotation requested by the command, in degrees
    pub fn angle_delta(&self) -> f32 {
        angle_delta(self.from, self.to)
    }
}

impl core::str::FromStr for NoteCommand {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or(DecodeError::Format(FormatError::MissingParentheses))?;

        let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
        let &[from, to] = fields.as_slice() else {
            return Err(DecodeError::Format(FormatError::FieldCount(fields.len())));
        };

        let invalid = |field, reason| DecodeError::InvalidNote {
            field,
            from: from.to_string(),
            to: to.to_string(),
            reason,
        };
        let from_index = parse_note(from).map_err(|e| invalid(NoteField::From, e))?;
        let to_index = parse_note(to).map_err(|e| invalid(NoteField::To, e))?;

        Ok(Self { from: from_index, to: to_index })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn index(s: &str) -> ScaleIndex {
        parse_note(s).unwrap()
    }

    #[test]
    fn angle_delta_same_note_is_zero() {
        for i in 0..ScaleIndex::COUNT {
            let note = ScaleIndex::new(Note::ALL[(i % 12) as usize], i / 12 + 1).unwrap();
            assert_eq!(angle_delta(note, note), 0.0);
        }
    }

    #[test]
    fn angle_delta_is_antisymmetric() {
        let notes = ["C1", "C#1", "E2", "A#3", "G4", "B5"];
        for a in notes {
            for b in notes {
                assert_eq!(angle_delta(index(a), index(b)), -angle_delta(index(b), index(a)));
            }
        }
    }

    #[test]
    fn angle_delta_values() {
        assert_eq!(angle_delta(index("C1"), index("C#1")), KEY_ANGLE_DEG);
        assert_eq!(angle_delta(index("C1"), index("D1")), 2.0 * KEY_ANGLE_DEG);
        assert_eq!(angle_delta(index("C2"), index("C1")), -12.0 * KEY_ANGLE_DEG);
    }

    #[test]
    fn decode_commands() {
        let cmd = NoteCommand::decode(b"(C1,E3)").unwrap();
        assert_eq!(cmd.from, index("C1"));
        assert_eq!(cmd.to, index("E3"));

        let cmd = NoteCommand::decode(b"  ( d#2 , c1 )\r\n").unwrap();
        assert_eq!(cmd.from, index("D#2"));
        assert_eq!(cmd.to, index("C1"));
        assert_eq!(cmd.angle_delta(), -15.0 * KEY_ANGLE_DEG);

        let cmd = NoteCommand::decode("(F♯1,A1)".as_bytes()).unwrap();
        assert_eq!(cmd.from, index("F#1"));
    }

    #[test]
    fn decode_malformed_encoding() {
        assert_eq!(NoteCommand::decode(&[b'(', 0xff, 0xfe, b')']), Err(DecodeError::MalformedEncoding));
    }

    #[test]
    fn decode_format_errors() {
        let missing = DecodeError::Format(FormatError::MissingParentheses);
        assert_eq!(NoteCommand::decode(b"C1,E3"), Err(missing.clone()));
        assert_eq!(NoteCommand::decode(b"(C1,E3"), Err(missing.clone()));
        assert_eq!(NoteCommand::decode(b"C1,E3)"), Err(missing.clone()));
        assert_eq!(NoteCommand::decode(b"("), Err(missing));

        assert_eq!(NoteCommand::decode(b"()"), Err(DecodeError::Format(FormatError::FieldCount(1))));
        assert_eq!(NoteCommand::decode(b"(C1)"), Err(DecodeError::Format(FormatError::FieldCount(1))));
        assert_eq!(NoteCommand::decode(b"(C1,E3,G4)"), Err(DecodeError::Format(FormatError::FieldCount(3))));
    }

    #[test]
    fn decode_invalid_notes() {
        assert_eq!(
            NoteCommand::decode(b"(H1, E3)"),
            Err(DecodeError::InvalidNote {
                field: NoteField::From,
                from: "H1".into(),
                to: "E3".into(),
                reason: NoteError::UnknownNote("H".into()),
            })
        );
        assert_eq!(
            NoteCommand::decode(b"(C1,E6)"),
            Err(DecodeError::InvalidNote {
                field: NoteField::To,
                from: "C1".into(),
                to: "E6".into(),
                reason: NoteError::InvalidOctave("6".into()),
            })
        );
        assert!(matches!(
            NoteCommand::decode(b"(C1,)"),
            Err(DecodeError::InvalidNote { field: NoteField::To, reason: NoteError::Empty, .. })
        ));
    }
}
