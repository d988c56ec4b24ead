//! The persisted shape of one active session, as written to the run-state
//! registry.

use serde::{Deserialize, Serialize};

/// One worker's entry in the run-state registry, keyed by `pid`.
///
/// Round-tripping this through the registry file must yield the same user,
/// server IP, and server port another worker reads back for admission
/// counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The worker process id.
    pub pid: u32,
    /// The virtual server's listening IP address.
    pub server_ip: String,
    /// The virtual server's listening port.
    pub server_port: u16,
    /// The authenticated user name, or `None` before login completes.
    pub user: Option<String>,
    /// The formatted peer (client) address.
    pub peer_addr: String,
}
