//! The outbound side of the event channel.

use crate::error::WsError;
use crate::ws::MessageOut;

/// Anything the feed can emit events through.
///
/// Inbound traffic does not go through this trait: transports push
/// [`WsEvent`](crate::ws::WsEvent)s into [`ChartFeed::handle_event`](super::ChartFeed::handle_event).
pub trait Channel {
    fn emit(&self, msg: MessageOut) -> Result<(), WsError>;
}

impl<T: Channel + ?Sized> Channel for &T {
    fn emit(&self, msg: MessageOut) -> Result<(), WsError> {
        (**self).emit(msg)
    }
}

impl<T: Channel + ?Sized> Channel for std::rc::Rc<T> {
    fn emit(&self, msg: MessageOut) -> Result<(), WsError> {
        (**self).emit(msg)
    }
}

impl<T: Channel + ?Sized> Channel for std::sync::Arc<T> {
    fn emit(&self, msg: MessageOut) -> Result<(), WsError> {
        (**self).emit(msg)
    }
}
