//! Removal of terminal control sequences from PTY output.
//!
//! Recognized forms (ECMA-48):
//!
//! - CSI: `ESC [` params/intermediates, final byte `0x40..=0x7E`
//! - OSC: `ESC ]` … terminated by BEL or ST (`ESC \`)
//! - DCS, SOS, PM, APC: `ESC P|X|^|_` … terminated by ST
//! - nF/Fp/Fe/Fs escapes: `ESC` intermediates (`0x20..=0x2F`) then one final byte
//!
//! Everything else, including `\r`, `\n` and `\t`, passes through untouched.

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1a;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Escape,
    EscapeIntermediate,
    Csi,
    /// OSC body; `true` after an ESC that may start ST.
    Osc(bool),
    /// DCS/SOS/PM/APC body; `true` after an ESC that may start ST.
    ControlString(bool),
}

/// Streaming stripper that keeps its parse state between chunks,
/// so a sequence split across two reads is still removed whole.
#[derive(Debug, Clone)]
pub struct AnsiStripper {
    state: State,
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self { state: State::Text }
    }

    /// True when no sequence is partially consumed.
    pub fn is_idle(&self) -> bool {
        self.state == State::Text
    }

    /// Filter `input`, appending printable bytes to `out`.
    pub fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Text, ESC) => State::Escape,
                (State::Text, b) => {
                    out.push(b);
                    State::Text
                }

                (State::Escape, b'[') => State::Csi,
                (State::Escape, b']') => State::Osc(false),
                (State::Escape, b'P' | b'X' | b'^' | b'_') => State::ControlString(false),
                (State::Escape | State::EscapeIntermediate, 0x20..=0x2f) => {
                    State::EscapeIntermediate
                }
                (State::Escape | State::EscapeIntermediate, ESC) => State::Escape,
                (State::Escape | State::EscapeIntermediate, _) => State::Text,

                (State::Csi, ESC) => State::Escape,
                (State::Csi, CAN | SUB) => State::Text,
                (State::Csi, 0x40..=0x7e) => State::Text,
                (State::Csi, _) => State::Csi,

                (State::Osc(_), BEL) => State::Text,
                (State::Osc(true), b'\\') => State::Text,
                (State::Osc(_), ESC) => State::Osc(true),
                (State::Osc(_), _) => State::Osc(false),

                (State::ControlString(true), b'\\') => State::Text,
                (State::ControlString(_), ESC) => State::ControlString(true),
                (State::ControlString(_), _) => State::ControlString(false),
            };
        }
    }
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip control sequences from a complete buffer.
pub fn strip_ansi(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    AnsiStripper::new().feed(input, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_str(input: &str) -> String {
        String::from_utf8(strip_ansi(input.as_bytes())).unwrap()
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_str("hello\r\nworld\t!"), "hello\r\nworld\t!");
    }

    #[test]
    fn removes_sgr_colors() {
        assert_eq!(strip_str("\x1b[1;31mred\x1b[0m and \x1b[38;5;208mamber\x1b[m"), "red and amber");
    }

    #[test]
    fn removes_cursor_movement_and_clears() {
        let input = "\x1b[2J\x1b[H\x1b[?25lspin\x1b[4D\x1b[Kdone\x1b[?25h\x1b[10;20H!";
        assert_eq!(strip_str(input), "spindone!");
    }

    #[test]
    fn removes_osc_with_bel_and_st() {
        assert_eq!(strip_str("\x1b]0;title\x07a\x1b]8;;http://x\x1b\\link\x1b]8;;\x1b\\b"), "alinkb");
    }

    #[test]
    fn removes_dcs_and_apc() {
        assert_eq!(strip_str("x\x1bP1$r0m\x1b\\y\x1b_payload\x1b\\z"), "xyz");
    }

    #[test]
    fn removes_charset_designation_whole() {
        assert_eq!(strip_str("\x1b(Babc\x1b)0"), "abc");
    }

    #[test]
    fn removes_two_byte_escapes() {
        assert_eq!(strip_str("\x1b7saved\x1b8\x1b=\x1b>"), "saved");
    }

    #[test]
    fn keeps_utf8_intact() {
        assert_eq!(strip_str("\x1b[32m✓ café\x1b[0m"), "✓ café");
    }

    #[test]
    fn sequence_split_across_chunks() {
        let input = b"a\x1b[38;2;10;20;30mb\x1b]0;t\x1b\\c\x1b(Bd";
        let whole = strip_ansi(input);
        assert_eq!(whole, b"abcd");

        for split in 0..=input.len() {
            let mut stripper = AnsiStripper::new();
            let mut out = Vec::new();
            stripper.feed(&input[..split], &mut out);
            stripper.feed(&input[split..], &mut out);
            assert_eq!(out, whole, "split at {split}");
            assert!(stripper.is_idle());
        }
    }

    #[test]
    fn byte_at_a_time() {
        let input = b"\x1b[1mbold\x1b[22m \x1b]2;x\x07plain";
        let mut stripper = AnsiStripper::new();
        let mut out = Vec::new();
        for byte in input {
            stripper.feed(std::slice::from_ref(byte), &mut out);
        }
        assert_eq!(out, b"bold plain");
    }

    #[test]
    fn unterminated_sequence_is_dropped_not_leaked() {
        let mut stripper = AnsiStripper::new();
        let mut out = Vec::new();
        stripper.feed(b"ok\x1b[12", &mut out);
        assert_eq!(out, b"ok");
        assert!(!stripper.is_idle());
    }

    #[test]
    fn esc_inside_csi_restarts_sequence() {
        assert_eq!(strip_str("\x1b[12\x1b[0mx"), "x");
    }
}
