//! Connection lifecycle state.

/// Transport connection state.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum ConnectionState {
	/// No socket. Initial state, and the state after any fatal I/O error.
	#[default]
	Disconnected,
	/// Connect attempt in progress.
	Connecting,
	/// Socket open and usable.
	Connected,
}

impl ConnectionState {
	/// Returns true for [`ConnectionState::Connected`].
	pub fn is_connected(self) -> bool {
		self == Self::Connected
	}
}
