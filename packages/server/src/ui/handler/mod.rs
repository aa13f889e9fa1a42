//! Request handlers.

mod http;
mod token;
mod websocket;

pub use http::{create_session, delete_session, get_room_detail, get_rooms, health_check};
pub use token::extract_token;
pub use websocket::{
    CLOSE_DUPLICATE_SESSION, CLOSE_FORBIDDEN, CLOSE_ROOM_NOT_FOUND, CLOSE_SERVER_ERROR,
    CLOSE_UNAUTHENTICATED, room_websocket_handler, websocket_handler,
};
