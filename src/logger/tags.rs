/// Log tags identifying the subsystem that produced a line
///
/// Each tag maps to a --debug-<key> command-line flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Hub,
    Websocket,
    Stream,
    Scheduler,
    Webserver,
}

impl LogTag {
    /// Key used in --debug-<key> flags
    pub fn to_debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Hub => "hub",
            LogTag::Websocket => "websocket",
            LogTag::Stream => "stream",
            LogTag::Scheduler => "scheduler",
            LogTag::Webserver => "webserver",
        }
    }

    /// Fixed-width label for console output
    pub fn label(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Hub => "HUB",
            LogTag::Websocket => "WS",
            LogTag::Stream => "SSE",
            LogTag::Scheduler => "SCHED",
            LogTag::Webserver => "WEBSERVER",
        }
    }

    /// Every tag, in display order
    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::System,
            LogTag::Config,
            LogTag::Hub,
            LogTag::Websocket,
            LogTag::Stream,
            LogTag::Scheduler,
            LogTag::Webserver,
        ]
    }
}
