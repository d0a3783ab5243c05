//! Type definitions

pub mod location;
pub mod request;
pub mod schedule;
pub mod trip;

pub use location::*;
pub use request::*;
pub use schedule::*;
pub use trip::*;

/// Serialize shift clock values as HH:MM
pub(crate) mod clock {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format("%H:%M"))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}
