use rusqlite::{
    Result as RusqliteResult, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef},
};
use std::fmt::Display;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum FileType {
    MP3 = 1,
    M4A = 2,
    OGG = 3,
    WAV = 4,
    FLAC = 5,
    #[default]
    ERR = 0,
}

impl From<&str> for FileType {
    fn from(str: &str) -> Self {
        match str.to_ascii_lowercase().as_str() {
            "mp3" => Self::MP3,
            "m4a" => Self::M4A,
            "ogg" => Self::OGG,
            "flac" => Self::FLAC,
            "wav" => Self::WAV,
            _ => Self::ERR,
        }
    }
}

impl FromSql for FileType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(i) => Ok(FileType::from_i64(i)),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for FileType {
    fn to_sql(&self) -> RusqliteResult<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(Value::Integer(self.to_i64())))
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            FileType::MP3 => write!(f, "mp3"),
            FileType::M4A => write!(f, "m4a"),
            FileType::OGG => write!(f, "ogg"),
            FileType::WAV => write!(f, "wav"),
            FileType::FLAC => write!(f, "flac"),
            FileType::ERR => write!(f, "???"),
        }
    }
}

impl FileType {
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Self::MP3,
            2 => Self::M4A,
            3 => Self::OGG,
            4 => Self::WAV,
            5 => Self::FLAC,
            _ => Self::ERR,
        }
    }

    pub fn to_i64(&self) -> i64 {
        *self as i64
    }

    /// Hint understood by the symphonia probe behind rodio's decoder.
    pub fn decoder_hint(ext: &str) -> &str {
        match ext {
            "adif" | "adts" => "aac",
            "caf" => "audio/x-caf",
            "m4a" | "m4b" | "m4p" | "m4r" | "mp4" => "audio/mp4",
            "bit" | "mpga" => "mp3",
            "mka" | "mkv" => "audio/matroska",
            "oga" | "ogm" | "ogv" | "ogx" | "spx" => "audio/ogg",
            "wave" => "wav",
            _ => ext,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(FileType::from("FLAC"), FileType::FLAC);
        assert_eq!(FileType::from("aiff"), FileType::ERR);
    }

    #[test]
    fn i64_round_trip_covers_unknowns() {
        assert_eq!(FileType::from_i64(FileType::M4A.to_i64()), FileType::M4A);
        assert_eq!(FileType::from_i64(42), FileType::ERR);
    }

    #[test]
    fn container_extensions_map_to_hints() {
        assert_eq!(FileType::decoder_hint("m4b"), "audio/mp4");
        assert_eq!(FileType::decoder_hint("flac"), "flac");
    }
}
