//! Action tokens carried in inline button payloads.
//!
//! A token is a colon-delimited list of fields: the first field is the
//! domain, the rest are positional arguments, e.g. `duration:split:45`.
//! Tokens are the only conversation state the bot has; every screen embeds
//! whatever the next step needs into the buttons it renders.

use std::fmt;
use std::str::FromStr;

use strum::{AsRefStr, EnumString};
use thiserror::Error;

pub const DELIMITER: char = ':';

/// Telegram caps callback data at 64 bytes.
pub const MAX_PAYLOAD_BYTES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("action token has an empty domain")]
    EmptyDomain,

    #[error("'{domain}' token needs {expected} fields, got {actual}")]
    TooFewFields {
        domain: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument {index} of '{domain}' token is invalid: '{value}'")]
    InvalidArgument { domain: String, index: usize, value: String },
}

/// Callback domains the bot knows how to handle.
///
/// Anything else parses into [`Domain::Unknown`] so lookups never fail to
/// produce a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
    Workout,
    WorkoutType,
    Duration,
    Exercise,
    Set,
    Goal,
    Equipment,
    Experience,
    Settings,
    Confirm,
    Workouts,
    Exercises,
    #[strum(default)]
    Unknown(String),
}

impl Domain {
    pub fn key(&self) -> &str {
        match self {
            Domain::Unknown(raw) => raw,
            known => known.as_ref(),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionToken {
    fields: Vec<String>,
}

impl ActionToken {
    /// Splits a raw payload into fields. Only the domain is validated here;
    /// handlers declare how many fields they need through [`ActionToken::require`].
    pub fn decode(raw: &str) -> Result<Self, FormatError> {
        let fields: Vec<String> = raw.split(DELIMITER).map(str::to_string).collect();
        if fields.first().is_none_or(|domain| domain.is_empty()) {
            return Err(FormatError::EmptyDomain);
        }
        Ok(Self { fields })
    }

    /// Joins a domain and its arguments. Arguments are ids and closed-set
    /// values, none of which contain the delimiter.
    pub fn encode<I, S>(domain: &str, args: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        let mut out = domain.to_string();
        for arg in args {
            out.push(DELIMITER);
            out.push_str(&arg.to_string());
        }
        debug_assert!(out.len() <= MAX_PAYLOAD_BYTES, "callback payload too long: {}", out);
        out
    }

    pub fn domain_str(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or_default()
    }

    pub fn domain(&self) -> Domain {
        // The default variant makes this parse infallible.
        Domain::from_str(self.domain_str()).unwrap_or_else(|_| Domain::Unknown(self.domain_str().to_string()))
    }

    /// Total number of fields, domain included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fails unless the token has at least `min_fields` fields (domain included).
    pub fn require(&self, min_fields: usize) -> Result<&Self, FormatError> {
        if self.fields.len() < min_fields {
            return Err(FormatError::TooFewFields {
                domain: self.domain_str().to_string(),
                expected: min_fields,
                actual: self.fields.len(),
            });
        }
        Ok(self)
    }

    /// Argument by position; argument 0 is the field right after the domain.
    pub fn arg(&self, index: usize) -> Result<&str, FormatError> {
        self.fields
            .get(index + 1)
            .map(String::as_str)
            .ok_or_else(|| FormatError::TooFewFields {
                domain: self.domain_str().to_string(),
                expected: index + 2,
                actual: self.fields.len(),
            })
    }

    /// Parses an argument, e.g. an id or a number of minutes.
    pub fn parse_arg<T: FromStr>(&self, index: usize) -> Result<T, FormatError> {
        let raw = self.arg(index)?;
        raw.parse::<T>().map_err(|_| FormatError::InvalidArgument {
            domain: self.domain_str().to_string(),
            index,
            value: raw.to_string(),
        })
    }

    pub fn args(&self) -> &[String] {
        self.fields.get(1..).unwrap_or_default()
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(&DELIMITER.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EquipmentPreset, ExperienceLevel, Goal, WorkoutKind};
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_decode_splits_fields() {
        let token = ActionToken::decode("set:complete:12:3").unwrap();
        assert_eq!(token.domain(), Domain::Set);
        assert_eq!(token.len(), 4);
        assert_eq!(token.arg(0).unwrap(), "complete");
        assert_eq!(token.parse_arg::<i64>(1).unwrap(), 12);
        assert_eq!(token.parse_arg::<i64>(2).unwrap(), 3);
        assert_eq!(token.args(), ["complete", "12", "3"]);
    }

    #[test]
    fn test_empty_domain_is_rejected() {
        assert_eq!(ActionToken::decode(""), Err(FormatError::EmptyDomain));
        assert_eq!(ActionToken::decode(":split"), Err(FormatError::EmptyDomain));
    }

    #[test]
    fn test_require_reports_too_few_fields() {
        let token = ActionToken::decode("set:complete").unwrap();
        assert_eq!(
            token.require(4).unwrap_err(),
            FormatError::TooFewFields {
                domain: "set".to_string(),
                expected: 4,
                actual: 2
            }
        );
        assert!(token.require(2).is_ok());
    }

    #[test]
    fn test_missing_and_invalid_arguments() {
        let token = ActionToken::decode("duration:split:soon").unwrap();
        assert!(matches!(token.arg(5), Err(FormatError::TooFewFields { .. })));
        assert!(matches!(
            token.parse_arg::<u32>(1),
            Err(FormatError::InvalidArgument { index: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_domain_falls_back() {
        let token = ActionToken::decode("teleport:home").unwrap();
        assert_eq!(token.domain(), Domain::Unknown("teleport".to_string()));
        assert_eq!(token.domain().key(), "teleport");
    }

    #[test]
    fn test_domain_keys() {
        assert_eq!(Domain::WorkoutType.key(), "workout_type");
        assert_eq!("workout_type".parse::<Domain>().unwrap(), Domain::WorkoutType);
        assert_eq!("exercises".parse::<Domain>().unwrap(), Domain::Exercises);
        assert_eq!(Domain::Confirm.to_string(), "confirm");
    }

    const KNOWN_DOMAINS: [Domain; 12] = [
        Domain::Workout,
        Domain::WorkoutType,
        Domain::Duration,
        Domain::Exercise,
        Domain::Set,
        Domain::Goal,
        Domain::Equipment,
        Domain::Experience,
        Domain::Settings,
        Domain::Confirm,
        Domain::Workouts,
        Domain::Exercises,
    ];

    #[test]
    fn test_encode_decode_is_lossless() {
        let raw = ActionToken::encode("confirm", ["delete_workout", "17", "yes"]);
        assert_eq!(raw, "confirm:delete_workout:17:yes");

        let token = ActionToken::decode(&raw).unwrap();
        assert_eq!(token.to_string(), raw);
        assert_eq!(ActionToken::encode(token.domain_str(), token.args()), raw);
    }

    #[test]
    fn test_round_trip_over_domains_ids_and_enum_args() {
        let ids = [0, 1, -1, 42, i64::MAX, i64::MIN];
        let mut words: Vec<String> = ["main", "complete", "skip", "pause", "delete_workout", "yes", "no"]
            .iter()
            .map(|w| w.to_string())
            .collect();
        words.extend(WorkoutKind::iter().map(|k| k.as_ref().to_string()));
        words.extend(Goal::iter().map(|g| g.as_ref().to_string()));
        words.extend(EquipmentPreset::iter().map(|e| e.as_ref().to_string()));
        words.extend(ExperienceLevel::iter().map(|l| l.as_ref().to_string()));

        for domain in KNOWN_DOMAINS {
            for word in &words {
                for id in ids {
                    let raw = ActionToken::encode(domain.key(), [word.clone(), id.to_string()]);
                    let token = ActionToken::decode(&raw).unwrap();

                    assert_eq!(token.domain(), domain);
                    assert_eq!(token.arg(0).unwrap(), word.as_str());
                    assert_eq!(token.parse_arg::<i64>(1).unwrap(), id);
                    assert_eq!(token.to_string(), raw);
                    assert_eq!(ActionToken::encode(token.domain_str(), token.args()), raw);
                }
            }
        }
    }

    #[test]
    fn test_encode_without_args() {
        assert_eq!(ActionToken::encode::<[&str; 0], &str>("settings", []), "settings");
    }
}
