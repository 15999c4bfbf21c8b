pub mod codec;
pub mod port;
pub mod protocol;
pub mod result_server;
pub mod session;
