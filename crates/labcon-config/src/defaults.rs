use camino::Utf8PathBuf;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Default TCP port the registry daemon listens on.
pub const DEFAULT_TCP_PORT: u16 = 5000;

/// Default host the registry daemon binds to.
pub const DEFAULT_TCP_HOST: &str = "127.0.0.1";

/// Default location of the driver database, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "labcon.db";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default socket endpoint for the daemon.
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_TCP_HOST, DEFAULT_TCP_PORT)
}

/// Default path of the driver database.
pub fn default_database_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_DATABASE_PATH)
}
