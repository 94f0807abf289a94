//! Chain events a subscriber can follow.

use std::fmt;
use std::str::FromStr;

/// What an event attribute holds, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Account,
    /// A list of accounts.
    Accounts,
    /// A 32-byte hash, possibly inside a wrapper struct.
    Hash,
    /// A byte string, shown as text when it is UTF-8.
    Bytes,
    /// Numbers and anything else.
    Value,
}

/// Event kinds known to the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubEvent {
    NewRecord,
    NewLaunch,
    Transfer,
    TopicChanged,
    NewDevices,
    NewLiability,
    NewReport,
}

impl SubEvent {
    pub const ALL: [SubEvent; 7] = [
        SubEvent::NewRecord,
        SubEvent::NewLaunch,
        SubEvent::Transfer,
        SubEvent::TopicChanged,
        SubEvent::NewDevices,
        SubEvent::NewLiability,
        SubEvent::NewReport,
    ];

    /// Pallet emitting the event, as named in runtime metadata.
    pub fn pallet(&self) -> &'static str {
        match self {
            SubEvent::NewRecord => "Datalog",
            SubEvent::NewLaunch => "Launch",
            SubEvent::Transfer => "Balances",
            SubEvent::TopicChanged => "DigitalTwin",
            SubEvent::NewDevices => "RWS",
            SubEvent::NewLiability | SubEvent::NewReport => "Liability",
        }
    }

    /// Event variant name.
    pub fn variant(&self) -> &'static str {
        match self {
            SubEvent::NewRecord => "NewRecord",
            SubEvent::NewLaunch => "NewLaunch",
            SubEvent::Transfer => "Transfer",
            SubEvent::TopicChanged => "TopicChanged",
            SubEvent::NewDevices => "NewDevices",
            SubEvent::NewLiability => "NewLiability",
            SubEvent::NewReport => "NewReport",
        }
    }

    /// Position of the attribute compared against target addresses.
    ///
    /// Records, topics and device lists name the acting account first;
    /// launches, transfers and liabilities name the receiving side second.
    pub fn address_position(&self) -> usize {
        match self {
            SubEvent::NewRecord | SubEvent::TopicChanged | SubEvent::NewDevices => 0,
            _ => 1,
        }
    }

    /// Attribute layout of the event, in field order.
    pub fn attribute_kinds(&self) -> &'static [AttributeKind] {
        use AttributeKind::*;
        match self {
            SubEvent::NewRecord => &[Account, Value, Bytes],
            SubEvent::NewLaunch => &[Account, Account, Hash],
            SubEvent::Transfer => &[Account, Account, Value],
            SubEvent::TopicChanged => &[Account, Value, Hash, Account],
            SubEvent::NewDevices => &[Account, Accounts],
            // index, technics, economics, promisee, promisor
            SubEvent::NewLiability => &[Value, Hash, Value, Account, Account],
            SubEvent::NewReport => &[Value, Value],
        }
    }

    /// Kind of the attribute at `position`; positions past the layout are plain values.
    pub fn attribute_kind(&self, position: usize) -> AttributeKind {
        self.attribute_kinds()
            .get(position)
            .copied()
            .unwrap_or(AttributeKind::Value)
    }

    /// Kind for a `(pallet, variant)` pair, if it is one of ours.
    pub fn from_event(pallet: &str, variant: &str) -> Option<SubEvent> {
        SubEvent::ALL
            .into_iter()
            .find(|kind| kind.pallet() == pallet && kind.variant() == variant)
    }
}

impl fmt::Display for SubEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variant())
    }
}

impl FromStr for SubEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubEvent::ALL
            .into_iter()
            .find(|kind| kind.variant().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown event kind '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_event() {
        assert_eq!(SubEvent::from_event("Datalog", "NewRecord"), Some(SubEvent::NewRecord));
        assert_eq!(SubEvent::from_event("Liability", "NewReport"), Some(SubEvent::NewReport));
        assert_eq!(SubEvent::from_event("Balances", "NewRecord"), None);
        assert_eq!(SubEvent::from_event("System", "ExtrinsicSuccess"), None);
    }

    #[test]
    fn test_address_positions() {
        assert_eq!(SubEvent::NewRecord.address_position(), 0);
        assert_eq!(SubEvent::TopicChanged.address_position(), 0);
        assert_eq!(SubEvent::NewDevices.address_position(), 0);
        assert_eq!(SubEvent::NewLaunch.address_position(), 1);
        assert_eq!(SubEvent::Transfer.address_position(), 1);
        assert_eq!(SubEvent::NewLiability.address_position(), 1);
    }

    #[test]
    fn test_liability_layout() {
        assert_eq!(SubEvent::NewLiability.attribute_kind(0), AttributeKind::Value);
        assert_eq!(SubEvent::NewLiability.attribute_kind(1), AttributeKind::Hash);
        assert_eq!(SubEvent::NewLiability.attribute_kind(3), AttributeKind::Account);
        assert_eq!(SubEvent::NewReport.attribute_kind(1), AttributeKind::Value);
        assert_eq!(SubEvent::NewRecord.attribute_kind(9), AttributeKind::Value);
    }

    #[test]
    fn test_parse_round_trip() {
        for kind in SubEvent::ALL {
            assert_eq!(kind.to_string().parse::<SubEvent>().unwrap(), kind);
        }
        assert!("Unknown".parse::<SubEvent>().is_err());
    }
}
