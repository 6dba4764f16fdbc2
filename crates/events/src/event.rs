/// A notification describing something that already happened.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **named** (listeners subscribe by `event_type`)
/// - delivered **synchronously**, before the triggering call returns
pub trait Event: Clone + core::fmt::Debug + Send + 'static {
    /// Stable event name (e.g. "inventory.item.added").
    fn event_type(&self) -> &'static str;
}
