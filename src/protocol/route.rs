//! Route registry for control operations.
//!
//! Each control operation owns one code. Receivers check the control flag, then switch on
//! the route byte. Code 0 is reserved.

use std::fmt;

use crate::error::ClusterwireError;

/// Control operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Route {
    /// Link liveness probe.
    Heartbeat = 1,
    /// Bind a user to a gateway connection.
    BindGate = 2,
    /// Unbind a user from its gateway.
    UnbindGate = 3,
    /// Bind a user to the calling node.
    BindNode = 4,
    /// Unbind a user from its node.
    UnbindNode = 5,
    /// Force or gracefully close a session.
    Disconnect = 6,
    /// Count sessions of a kind.
    Stat = 7,
    /// Look up a session's remote address.
    GetIp = 8,
}

impl Route {
    /// Every registered route, in code order.
    pub const ALL: [Route; 8] = [
        Route::Heartbeat,
        Route::BindGate,
        Route::UnbindGate,
        Route::BindNode,
        Route::UnbindNode,
        Route::Disconnect,
        Route::Stat,
        Route::GetIp,
    ];

    /// Wire code of this route.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Route::Heartbeat => "heartbeat",
            Route::BindGate => "bind_gate",
            Route::UnbindGate => "unbind_gate",
            Route::BindNode => "bind_node",
            Route::UnbindNode => "unbind_node",
            Route::Disconnect => "disconnect",
            Route::Stat => "stat",
            Route::GetIp => "get_ip",
        }
    }
}

impl TryFrom<u8> for Route {
    type Error = ClusterwireError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Route::ALL
            .into_iter()
            .find(|route| route.code() == code)
            .ok_or(ClusterwireError::UnknownRoute(code))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
