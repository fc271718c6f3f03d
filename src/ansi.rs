//! ANSI/VT100 escape sequences written to the client.

pub const ESC: u8 = 0x1b;
pub const CSI: u8 = b'[';
pub const OSC: u8 = b']';
pub const BEL: u8 = 0x07;

/// Line break used for every server-side newline: CR LF NUL.
pub const NEWLINE: &[u8] = b"\r\n\0";

/// Rainbow foreground, indexed by line length.
pub const RAINBOW_FG: [u8; 6] = [15, 0, 0, 0, 15, 15];
/// Rainbow background, indexed by line length.
pub const RAINBOW_BG: [u8; 6] = [196, 214, 226, 34, 20, 91];

pub const ALARM_FG: u8 = 11;
pub const ALARM_BG: u8 = 9;

/// `ESC [ 38;5;<color> m`
pub fn foreground(color: u8) -> Vec<u8> {
    sgr(&format!("38;5;{}", color))
}

/// `ESC [ 48;5;<color> m`
pub fn background(color: u8) -> Vec<u8> {
    sgr(&format!("48;5;{}", color))
}

/// `ESC [ 0 m`
pub fn reset() -> Vec<u8> {
    sgr("0")
}

/// Foreground followed by background.
pub fn colors(fg: u8, bg: u8) -> Vec<u8> {
    let mut seq = foreground(fg);
    seq.extend(background(bg));
    seq
}

/// The rainbow pair for a line of `len` bytes.
pub fn rainbow(len: usize) -> Vec<u8> {
    colors(
        RAINBOW_FG[len % RAINBOW_FG.len()],
        RAINBOW_BG[len % RAINBOW_BG.len()],
    )
}

/// `ESC ] 0 ; <title> BEL`
pub fn title(title: &str) -> Vec<u8> {
    let mut seq = vec![ESC, OSC, b'0', b';'];
    seq.extend_from_slice(title.as_bytes());
    seq.push(BEL);
    seq
}

fn sgr(params: &str) -> Vec<u8> {
    let mut seq = vec![ESC, CSI];
    seq.extend_from_slice(params.as_bytes());
    seq.push(b'm');
    seq
}
