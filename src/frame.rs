use std::fmt;

pub const IAC: u8 = 255;
pub const SB: u8 = 250;
pub const SE: u8 = 240;

/// TELNET command bytes (RFC 854), the byte following IAC.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    SubnegotiationEnd,
    NoOperation,
    DataMark,
    Break,
    InterruptProcess,
    AbortOutput,
    AreYouThere,
    EraseCharacter,
    EraseLine,
    GoAhead,
    SubnegotiationBegin,
    Will,
    Wont,
    Do,
    Dont,
    InterpretAsCommand,
    Unknown(u8),
}

impl From<u8> for Command {
    fn from(value: u8) -> Self {
        match value {
            240 => Command::SubnegotiationEnd,
            241 => Command::NoOperation,
            242 => Command::DataMark,
            243 => Command::Break,
            244 => Command::InterruptProcess,
            245 => Command::AbortOutput,
            246 => Command::AreYouThere,
            247 => Command::EraseCharacter,
            248 => Command::EraseLine,
            249 => Command::GoAhead,
            250 => Command::SubnegotiationBegin,
            251 => Command::Will,
            252 => Command::Wont,
            253 => Command::Do,
            254 => Command::Dont,
            255 => Command::InterpretAsCommand,
            v => Command::Unknown(v),
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        match command {
            Command::SubnegotiationEnd => 240,
            Command::NoOperation => 241,
            Command::DataMark => 242,
            Command::Break => 243,
            Command::InterruptProcess => 244,
            Command::AbortOutput => 245,
            Command::AreYouThere => 246,
            Command::EraseCharacter => 247,
            Command::EraseLine => 248,
            Command::GoAhead => 249,
            Command::SubnegotiationBegin => 250,
            Command::Will => 251,
            Command::Wont => 252,
            Command::Do => 253,
            Command::Dont => 254,
            Command::InterpretAsCommand => 255,
            Command::Unknown(v) => v,
        }
    }
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::SubnegotiationEnd => "SE",
            Command::NoOperation => "NOP",
            Command::DataMark => "DATA",
            Command::Break => "BREAK",
            Command::InterruptProcess => "IP",
            Command::AbortOutput => "ABORT",
            Command::AreYouThere => "AYT",
            Command::EraseCharacter => "ERASE_CHARACTER",
            Command::EraseLine => "ERASE_LINE",
            Command::GoAhead => "GO",
            Command::SubnegotiationBegin => "SB",
            Command::Will => "WILL",
            Command::Wont => "WONT",
            Command::Do => "DO",
            Command::Dont => "DONT",
            Command::InterpretAsCommand => "IAC",
            Command::Unknown(_) => "UNK",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

macro_rules! telnet_options {
    ($($variant:ident = $value:literal => $label:literal,)*) => {
        /// TELNET option codes as assigned by IANA.
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub enum TelnetOption {
            $($variant,)*
            Unknown(u8),
        }

        impl From<u8> for TelnetOption {
            fn from(value: u8) -> Self {
                match value {
                    $($value => TelnetOption::$variant,)*
                    v => TelnetOption::Unknown(v),
                }
            }
        }

        impl From<TelnetOption> for u8 {
            fn from(option: TelnetOption) -> u8 {
                match option {
                    $(TelnetOption::$variant => $value,)*
                    TelnetOption::Unknown(v) => v,
                }
            }
        }

        impl TelnetOption {
            pub fn label(&self) -> &'static str {
                match self {
                    $(TelnetOption::$variant => $label,)*
                    TelnetOption::Unknown(_) => "UNK",
                }
            }
        }
    };
}

telnet_options! {
    Binary = 0 => "BINARY",
    Echo = 1 => "ECHO",
    Reconnection = 2 => "RECONNECTION",
    SuppressGoAhead = 3 => "SUPPRESS_GO_AHEAD",
    ApproxMessageSize = 4 => "APPROX_MESSAGE_SIZE",
    Status = 5 => "STATUS",
    TimingMark = 6 => "TIMING_MARK",
    RemoteControlled = 7 => "REMOTE_CONTROLLED",
    LineWidth = 8 => "LINE_WIDTH",
    PageSize = 9 => "PAGE_SIZE",
    CarriageReturn = 10 => "CARRIAGE_RETURN",
    HorizontalTabs = 11 => "HORIZ_TABS",
    HorizontalTabDisposition = 12 => "HORIZ_TAB_DISP",
    FormfeedDisposition = 13 => "FORMFEED_DISP",
    VerticalTabs = 14 => "VERT_TABS",
    VerticalTabDisposition = 15 => "VERT_TAB_DISP",
    LinefeedDisposition = 16 => "LINEFEED_DISP",
    ExtendedAscii = 17 => "EXTENDED_ASCII",
    Logout = 18 => "LOGOUT",
    ByteMacro = 19 => "BYTE_MACRO",
    DataEntry = 20 => "DATA_ENTRY",
    Supdup = 21 => "SUPDUP",
    SupdupOutput = 22 => "SUPDUP_OUTPUT",
    SendLocation = 23 => "SEND_LOCATION",
    TerminalType = 24 => "TERMINAL_TYPE",
    EndOfRecord = 25 => "END_OF_RECORD",
    Tacacs = 26 => "TACACS",
    OutputMarking = 27 => "OUTPUT_MARKING",
    TerminalLocation = 28 => "TERMINAL",
    Telnet3270 = 29 => "TELNET_3270",
    X3Pad = 30 => "X3_PAD",
    WindowSize = 31 => "WINDOW_SIZE",
    TerminalSpeed = 32 => "TERMINAL_SPEED",
    RemoteFlowControl = 33 => "REMOTE_FLOW_CONTROL",
    Linemode = 34 => "LINEMODE",
    XDisplayLocation = 35 => "X_DISPLAY_LOCATION",
    Environment = 36 => "ENVIRONMENT",
    Authentication = 37 => "AUTHENTICATION",
    Encryption = 38 => "ENCRYPTION",
    NewEnvironment = 39 => "NEW_ENVIRONMENT",
    Tn3270e = 40 => "TN3270E",
    Xauth = 41 => "XAUTH",
    Charset = 42 => "CHARSET",
    RemoteSerialPort = 43 => "RSP",
    ComPortControl = 44 => "COM_PORT_CONTROL",
    SuppressLocalEcho = 45 => "SUPPRESS_LOCAL_ECHO",
    StartTls = 46 => "START_TLS",
    Kermit = 47 => "KERMIT",
    SendUrl = 48 => "SEND_URL",
    ForwardX = 49 => "FORWARD_X",
    PragmaLogon = 138 => "PRAGMA_LOGON",
    SspiLogon = 139 => "SSPI_LOGON",
    PragmaHeartbeat = 140 => "PRAGMA_HEARTBEAT",
    Extended = 255 => "EXTENDED",
}

impl fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unit exchanged with a [`crate::codec::DreamerCodec`].
///
/// The decoder only ever yields `Literal`, `LineTerminator`, `Command` and
/// `Subnegotiation`; `Data` exists for writing raw bytes (echo, escapes,
/// prompts) through the encoder.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TelnetFrame {
    Data(Vec<u8>),
    Literal(u8),
    LineTerminator(u8),
    Command {
        command: Command,
        option: TelnetOption,
    },
    Subnegotiation {
        option: TelnetOption,
        payload: Vec<u8>,
    },
}

impl TelnetFrame {
    pub fn command(command: Command, option: TelnetOption) -> Self {
        TelnetFrame::Command { command, option }
    }
}

impl fmt::Display for TelnetFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelnetFrame::Data(data) => write!(f, "data: {:?}", data),
            TelnetFrame::Literal(byte) => write!(f, "literal: {}", byte),
            TelnetFrame::LineTerminator(byte) => write!(f, "terminator: {}", byte),
            TelnetFrame::Command { command, option } => write!(f, "cmd: {} {}", command, option),
            TelnetFrame::Subnegotiation { option, payload } => {
                write!(f, "SUBNEG: {} {:?}", option, payload)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::from(255), Command::InterpretAsCommand);
        assert_eq!(Command::from(250), Command::SubnegotiationBegin);
        assert_eq!(u8::from(Command::Dont), 254);
        assert_eq!(Command::from(17), Command::Unknown(17));
        assert_eq!(u8::from(Command::Unknown(17)), 17);
    }

    #[test]
    fn test_command_labels() {
        assert_eq!(Command::Will.to_string(), "WILL");
        assert_eq!(Command::SubnegotiationEnd.to_string(), "SE");
        assert_eq!(Command::Unknown(3).to_string(), "UNK");
    }

    #[test]
    fn test_option_bytes() {
        assert_eq!(TelnetOption::from(1), TelnetOption::Echo);
        assert_eq!(TelnetOption::from(34), TelnetOption::Linemode);
        assert_eq!(TelnetOption::from(45), TelnetOption::SuppressLocalEcho);
        assert_eq!(TelnetOption::from(138), TelnetOption::PragmaLogon);
        assert_eq!(TelnetOption::from(99), TelnetOption::Unknown(99));
        assert_eq!(u8::from(TelnetOption::TerminalSpeed), 32);
        assert_eq!(u8::from(TelnetOption::Extended), 255);
    }

    #[test]
    fn test_frame_display() {
        assert_eq!(
            TelnetFrame::command(Command::Do, TelnetOption::Echo).to_string(),
            "cmd: DO ECHO"
        );
        assert_eq!(
            TelnetFrame::Subnegotiation {
                option: TelnetOption::TerminalType,
                payload: vec![1],
            }
            .to_string(),
            "SUBNEG: TERMINAL_TYPE [1]"
        );
    }

    #[test]
    fn test_option_labels() {
        assert_eq!(TelnetOption::SuppressGoAhead.to_string(), "SUPPRESS_GO_AHEAD");
        assert_eq!(TelnetOption::WindowSize.to_string(), "WINDOW_SIZE");
        assert_eq!(TelnetOption::Unknown(200).to_string(), "UNK");
    }
}
