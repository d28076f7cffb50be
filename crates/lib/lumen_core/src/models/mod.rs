//! Data types shared between the chat client and the relay server.

pub mod chat;
