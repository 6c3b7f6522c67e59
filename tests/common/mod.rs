//! Helpers shared by the integration tests.

use std::net::TcpListener;

/// Address of a port that was just released, so connecting is refused.
pub fn closed_port_uri() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
