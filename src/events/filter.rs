//! Event filtering by kind and target address.

use subxt::ext::scale_value::Composite;

use crate::chain::decode;
use crate::events::kinds::SubEvent;

/// Match a `(pallet, variant)` pair against the subscribed kinds.
pub fn subscribed_kind(kinds: &[SubEvent], pallet: &str, variant: &str) -> Option<SubEvent> {
    SubEvent::from_event(pallet, variant).filter(|kind| kinds.contains(kind))
}

/// Whether the event's address attribute is one of `targets`.
///
/// An empty target list matches everything.
pub fn targets_match(kind: SubEvent, attributes: &Composite<u32>, targets: &[[u8; 32]]) -> bool {
    if targets.is_empty() {
        return true;
    }
    attributes
        .values()
        .nth(kind.address_position())
        .and_then(decode::as_array32)
        .map(|account| targets.contains(&account))
        .unwrap_or(false)
}
