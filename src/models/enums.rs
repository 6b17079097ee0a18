use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analysis::AnalysisError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $(#[$meta])*
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = AnalysisError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(AnalysisError::UnknownIdentifier {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

str_enum!(#[derive(Default)] RoutineType {
    #[default]
    SeeThinkWonder => "see-think-wonder",
    FourC => "4c",
    CircleOfViewpoints => "circle-of-viewpoints",
    ConnectExtendChallenge => "connect-extend-challenge",
    FrayerModel => "frayer-model",
    UsedToThinkNowThink => "used-to-think-now-think",
    ThinkPuzzleExplore => "think-puzzle-explore",
});

str_enum!(ResponseSlot {
    See => "see",
    Think => "think",
    Wonder => "wonder",
    FourthStep => "fourth_step",
});

impl RoutineType {
    /// Lenient lookup: trims and lowercases, and resolves unknown identifiers
    /// to the default routine instead of failing.
    pub fn resolve(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.parse::<RoutineType>() {
            Ok(routine) => routine,
            Err(_) => {
                tracing::debug!(
                    routine = %raw,
                    fallback = %RoutineType::default(),
                    "Unknown routine type, using default schema"
                );
                RoutineType::default()
            }
        }
    }
}

impl ResponseSlot {
    /// Slot for the step at `position` in a routine's schema.
    pub fn at_position(position: usize) -> Option<Self> {
        Self::all().get(position).copied()
    }
}

impl<'de> Deserialize<'de> for RoutineType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RoutineType::resolve(&raw))
    }
}

impl<'de> Deserialize<'de> for ResponseSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn routine_type_round_trip() {
        for (variant, s) in [
            (RoutineType::SeeThinkWonder, "see-think-wonder"),
            (RoutineType::FourC, "4c"),
            (RoutineType::CircleOfViewpoints, "circle-of-viewpoints"),
            (RoutineType::ConnectExtendChallenge, "connect-extend-challenge"),
            (RoutineType::FrayerModel, "frayer-model"),
            (RoutineType::UsedToThinkNowThink, "used-to-think-now-think"),
            (RoutineType::ThinkPuzzleExplore, "think-puzzle-explore"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(RoutineType::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        let err = RoutineType::from_str("not-a-real-type").unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownIdentifier { .. }));
    }

    #[test]
    fn resolve_falls_back_to_see_think_wonder() {
        assert_eq!(RoutineType::resolve("not-a-real-type"), RoutineType::SeeThinkWonder);
        assert_eq!(RoutineType::resolve(""), RoutineType::SeeThinkWonder);
    }

    #[test]
    fn resolve_tolerates_case_and_padding() {
        assert_eq!(RoutineType::resolve("  4C "), RoutineType::FourC);
        assert_eq!(RoutineType::resolve("Frayer-Model"), RoutineType::FrayerModel);
    }

    #[test]
    fn default_routine_is_see_think_wonder() {
        assert_eq!(RoutineType::default(), RoutineType::SeeThinkWonder);
    }

    #[test]
    fn all_lists_seven_routines() {
        assert_eq!(RoutineType::all().len(), 7);
    }

    #[test]
    fn routine_type_serializes_as_identifier() {
        let json = serde_json::to_string(&RoutineType::CircleOfViewpoints).unwrap();
        assert_eq!(json, "\"circle-of-viewpoints\"");
    }

    #[test]
    fn routine_type_deserializes_unknown_to_default() {
        let routine: RoutineType = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(routine, RoutineType::SeeThinkWonder);
    }

    #[test]
    fn slot_positions() {
        assert_eq!(ResponseSlot::at_position(0), Some(ResponseSlot::See));
        assert_eq!(ResponseSlot::at_position(3), Some(ResponseSlot::FourthStep));
        assert_eq!(ResponseSlot::at_position(4), None);
    }

    #[test]
    fn slot_rejects_unknown_on_deserialize() {
        assert!(serde_json::from_str::<ResponseSlot>("\"fifth\"").is_err());
    }
}
