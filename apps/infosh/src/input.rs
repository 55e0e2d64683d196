// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Decode raw terminal input bytes into shell key events.
// Author: Lukas Bower

//! Raw byte to [`KeyEvent`] decoding.
//!
//! Input arrives in arbitrary chunks, so escape sequences and UTF-8
//! characters may be split across reads; the decoder keeps partial state
//! between calls to [`KeyDecoder::feed`].

use infosh_core::{Key, KeyEvent, Modifiers};
use log::debug;

const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;
const BS: u8 = 0x08;
const TAB: u8 = 0x09;
const CR: u8 = b'\r';
const LF: u8 = b'\n';

#[derive(Debug, Default)]
enum Pending {
    #[default]
    None,
    Escape,
    Csi(Vec<u8>),
    Ss3,
    Utf8 { bytes: Vec<u8>, needed: usize },
}

/// Incremental decoder for VT-style keyboard input.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Pending,
    after_cr: bool,
}

impl KeyDecoder {
    /// Create a decoder with no partial input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, returning every complete key event.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        for &byte in bytes {
            self.push(byte, &mut events);
        }
        events
    }

    /// Flush partial input at end of stream. A dangling ESC becomes Escape.
    pub fn finish(&mut self) -> Vec<KeyEvent> {
        match std::mem::take(&mut self.pending) {
            Pending::Escape => vec![KeyEvent::plain(Key::Escape)],
            Pending::None => Vec::new(),
            other => {
                debug!("dropping incomplete input sequence {other:?}");
                Vec::new()
            }
        }
    }

    fn push(&mut self, byte: u8, events: &mut Vec<KeyEvent>) {
        let after_cr = std::mem::replace(&mut self.after_cr, false);
        match std::mem::take(&mut self.pending) {
            Pending::None => self.plain(byte, after_cr, events),
            Pending::Escape => match byte {
                b'[' => self.pending = Pending::Csi(Vec::new()),
                b'O' => self.pending = Pending::Ss3,
                ESC => {
                    events.push(KeyEvent::plain(Key::Escape));
                    self.pending = Pending::Escape;
                }
                0x20..=0x7e => {
                    events.push(KeyEvent::new(Key::Char(char::from(byte)), Modifiers::ALT));
                }
                _ => {
                    events.push(KeyEvent::plain(Key::Escape));
                    self.plain(byte, false, events);
                }
            },
            Pending::Csi(mut params) => match byte {
                0x40..=0x7e => {
                    if let Some(key) = csi_key(&params, byte) {
                        events.push(KeyEvent::plain(key));
                    } else {
                        debug!("ignoring unsupported CSI sequence {params:?} {byte:#x}");
                    }
                }
                0x20..=0x3f if params.len() < 16 => {
                    params.push(byte);
                    self.pending = Pending::Csi(params);
                }
                _ => debug!("discarding malformed CSI sequence"),
            },
            Pending::Ss3 => {
                if let Some(key) = cursor_key(byte) {
                    events.push(KeyEvent::plain(key));
                }
            }
            Pending::Utf8 { mut bytes, needed } => {
                if byte & 0xc0 != 0x80 {
                    debug!("truncated UTF-8 sequence {bytes:?}");
                    self.plain(byte, false, events);
                    return;
                }
                bytes.push(byte);
                if bytes.len() < needed {
                    self.pending = Pending::Utf8 { bytes, needed };
                    return;
                }
                match std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) {
                    Some(ch) => events.push(KeyEvent::char(ch)),
                    None => debug!("invalid UTF-8 sequence {bytes:?}"),
                }
            }
        }
    }

    fn plain(&mut self, byte: u8, after_cr: bool, events: &mut Vec<KeyEvent>) {
        match byte {
            CR => {
                events.push(KeyEvent::plain(Key::Enter));
                self.after_cr = true;
            }
            LF if after_cr => {}
            LF => events.push(KeyEvent::plain(Key::Enter)),
            DEL | BS => events.push(KeyEvent::plain(Key::Backspace)),
            TAB => events.push(KeyEvent::plain(Key::Tab)),
            ESC => self.pending = Pending::Escape,
            0x01..=0x1a => events.push(KeyEvent::ctrl(char::from(b'a' + byte - 1))),
            0x20..=0x7e => events.push(KeyEvent::char(char::from(byte))),
            0xc0..=0xf7 => {
                let needed = match byte {
                    0xc0..=0xdf => 2,
                    0xe0..=0xef => 3,
                    _ => 4,
                };
                self.pending = Pending::Utf8 {
                    bytes: vec![byte],
                    needed,
                };
            }
            _ => debug!("ignoring input byte {byte:#04x}"),
        }
    }
}

fn cursor_key(byte: u8) -> Option<Key> {
    match byte {
        b'A' => Some(Key::ArrowUp),
        b'B' => Some(Key::ArrowDown),
        b'C' => Some(Key::ArrowRight),
        b'D' => Some(Key::ArrowLeft),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        _ => None,
    }
}

fn csi_key(params: &[u8], final_byte: u8) -> Option<Key> {
    if final_byte != b'~' {
        return if params.is_empty() {
            cursor_key(final_byte)
        } else {
            None
        };
    }
    match params {
        b"1" | b"7" => Some(Key::Home),
        b"3" => Some(Key::Delete),
        b"4" | b"8" => Some(Key::End),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_line_with_crlf_yields_one_enter() {
        let mut decoder = KeyDecoder::new();
        let events = decoder.feed(b"ls\r\n");
        assert_eq!(
            events,
            [
                KeyEvent::char('l'),
                KeyEvent::char('s'),
                KeyEvent::plain(Key::Enter)
            ]
        );
        assert_eq!(decoder.feed(b"\n"), [KeyEvent::plain(Key::Enter)]);
    }

    #[test]
    fn control_bytes_map_to_ctrl_chords() {
        let mut decoder = KeyDecoder::new();
        let events = decoder.feed(&[0x03, 0x04, 0x0c, DEL, BS, TAB]);
        assert_eq!(
            events,
            [
                KeyEvent::ctrl('c'),
                KeyEvent::ctrl('d'),
                KeyEvent::ctrl('l'),
                KeyEvent::plain(Key::Backspace),
                KeyEvent::plain(Key::Backspace),
                KeyEvent::plain(Key::Tab),
            ]
        );
    }

    #[test]
    fn escape_sequences_survive_split_reads() {
        let mut decoder = KeyDecoder::new();
        assert!(decoder.feed(b"\x1b").is_empty());
        assert!(decoder.feed(b"[").is_empty());
        assert_eq!(decoder.feed(b"A"), [KeyEvent::plain(Key::ArrowUp)]);
        assert_eq!(
            decoder.feed(b"\x1b[B\x1bOC\x1b[3~"),
            [
                KeyEvent::plain(Key::ArrowDown),
                KeyEvent::plain(Key::ArrowRight),
                KeyEvent::plain(Key::Delete),
            ]
        );
    }

    #[test]
    fn lone_escape_is_flushed_at_end_of_input() {
        let mut decoder = KeyDecoder::new();
        assert!(decoder.feed(b"\x1b").is_empty());
        assert_eq!(decoder.finish(), [KeyEvent::plain(Key::Escape)]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn multibyte_characters_across_reads() {
        let mut decoder = KeyDecoder::new();
        let bytes = "wörld €".as_bytes();
        let mut events = decoder.feed(&bytes[..2]);
        events.extend(decoder.feed(&bytes[2..7]));
        events.extend(decoder.feed(&bytes[7..]));
        let text: String = events
            .iter()
            .filter_map(KeyEvent::printable)
            .collect();
        assert_eq!(text, "wörld €");
    }
}
