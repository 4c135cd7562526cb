//! Notification events emitted through `Runtime.Notify`.

use script_types::Address;

use crate::item::StackItem;

/// One buffered notification.
///
/// The payload is snapshotted at emission, so later mutation of a shared
/// container does not rewrite history.
#[derive(Debug, Clone)]
pub struct NotifyEvent {
    /// Contract that emitted the notification.
    pub contract: Address,
    /// Notification payload.
    pub states: StackItem,
}
