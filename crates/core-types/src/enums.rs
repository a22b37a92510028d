use crate::error::CoreError;
use serde::de::{Deserialize, Deserializer};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Declares a closed, backend-owned enumeration together with its wire spelling.
///
/// Variants are declared in their natural display order; the derived `Ord`
/// follows that order, which is what bucketed counts are sorted by.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// Every value of the enumeration, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The spelling used on the wire and in query parameters.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )+
                    other => Err(CoreError::InvalidInput(
                        stringify!($name).to_string(),
                        other.to_string(),
                    )),
                }
            }
        }
    };
}

wire_enum! {
    /// The direction of a trade.
    pub enum TradeAction {
        Buy => "BUY",
        Sell => "SELL",
    }
}

wire_enum! {
    /// Order lifecycle state. Transitions are owned by the backend.
    pub enum TradeStatus {
        Pending => "pending",
        Submitted => "submitted",
        PartialFilled => "partial_filled",
        Filled => "filled",
        Cancelled => "cancelled",
        Failed => "failed",
    }
}

wire_enum! {
    pub enum AccountType {
        Real => "real",
        Simulation => "simulation",
    }
}

wire_enum! {
    pub enum StrategyStatus {
        Active => "active",
        Testing => "testing",
        Paused => "paused",
        Retired => "retired",
    }
}

wire_enum! {
    pub enum ReportType {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}

wire_enum! {
    /// The six layers of the agent pipeline, in pipeline order.
    pub enum AgentType {
        Perception => "perception",
        Memory => "memory",
        Planning => "planning",
        Decision => "decision",
        Execution => "execution",
        Reflection => "reflection",
    }
}

wire_enum! {
    /// Runtime state of a single agent.
    pub enum AgentState {
        Running => "running",
        Stopped => "stopped",
        Error => "error",
        Paused => "paused",
    }
}

/// Decodes a wire value, returning `None` for anything outside the enumeration.
pub fn parse_enum<T: FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

/// Deserializes an optional field through `FromStr`, mapping anything unrecognised to `None`.
///
/// Used for every enum and timestamp field on backend records: a record whose
/// status is a value we have never seen is still a valid record, it just does
/// not land in any status bucket.
pub fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => {
            let parsed = parse_enum::<T>(&text);
            if parsed.is_none() {
                tracing::debug!(value = %text, "Unrecognised field value, treating as missing.");
            }
            parsed
        }
        Some(other) => {
            tracing::debug!(value = %other, "Non-text value for a text field, treating as missing.");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "deserialize_lenient")]
        status: Option<TradeStatus>,
    }

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for status in TradeStatus::ALL {
            assert_eq!(status.as_str().parse::<TradeStatus>().unwrap(), *status);
        }
        assert_eq!("BUY".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert!("buy".parse::<TradeAction>().is_err());
    }

    #[test]
    fn unknown_values_decode_to_none() {
        let rows: Vec<Row> = serde_json::from_str(
            r#"[{"status": "filled"}, {"status": "exploded"}, {"status": null}, {"status": 5}, {}]"#,
        )
        .unwrap();
        let statuses: Vec<_> = rows.into_iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Some(TradeStatus::Filled), None, None, None, None]);
    }

    #[test]
    fn ordering_follows_declaration() {
        assert!(AgentType::Perception < AgentType::Reflection);
        assert!(TradeStatus::Pending < TradeStatus::Failed);
    }
}
