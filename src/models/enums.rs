use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// `Scheduled` is the sole initial status; any status may be assigned from any
// other, but assigning `Scheduled` is gated behind the reset privilege
// (see `authorization::may_reset_status`).
str_enum!(AppointmentStatus {
    Scheduled => "Scheduled",
    CheckedIn => "CheckedIn",
    Completed => "Completed",
    Cancelled => "Cancelled",
    Missed => "Missed",
});

str_enum!(AppointmentKind {
    Scheduled => "Scheduled",
    WalkIn => "WalkIn",
    Virtual => "Virtual",
});
