//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! MUD Sound Protocol (MSP)
//!
//! Once the option is negotiated the server embeds trigger lines in the
//! ordinary text stream:
//!
//! ```text
//! !!SOUND(ding.wav V=100 L=1 P=50 T=event U=http://example.com/sounds/)
//! !!MUSIC(battle.mid V=60 L=-1 C=1)
//! ```
//!
//! A trigger must start at the first byte of a line. The handler gags every
//! recognized trigger and, when a `U=` parameter names a download location,
//! emits [`EngineAction::QueueDownload`] for the session's transfer queue.
//! Playback itself is the embedding application's concern.

use crate::event::EngineAction;
use crate::handlers::{EngineOutput, LineDisposition, OptionHandler};
use crate::options::TelnetOption;
use tracing::debug;

const SOUND_PREFIX: &[u8] = b"!!SOUND(";
const MUSIC_PREFIX: &[u8] = b"!!MUSIC(";

/// Scans completed lines for MSP sound and music triggers.
pub struct MspHandler;

#[derive(Debug, Eq, PartialEq)]
enum TriggerKind {
    Sound,
    Music,
}

#[derive(Debug, Eq, PartialEq)]
struct Trigger {
    kind: TriggerKind,
    file_name: String,
    url_base: Option<String>,
}

/// Parses one line as an MSP trigger, if it is one.
///
/// The first token inside the parentheses is the file name; the remainder
/// are `K=V` parameters with case-insensitive single-letter keys. Only the
/// `U` (URL) parameter matters for downloading; volume, loop count, and the
/// other playback parameters are for the audio layer and are skipped here.
fn parse_trigger(line: &[u8]) -> Option<Trigger> {
    let (kind, rest) = if line.starts_with(SOUND_PREFIX) {
        (TriggerKind::Sound, &line[SOUND_PREFIX.len()..])
    } else if line.starts_with(MUSIC_PREFIX) {
        (TriggerKind::Music, &line[MUSIC_PREFIX.len()..])
    } else {
        return None;
    };

    // An unclosed trigger is treated as ordinary text.
    let close = rest.iter().position(|byte| *byte == b')')?;
    let body = String::from_utf8_lossy(&rest[..close]);

    let mut tokens = body.split_whitespace();
    let file_name = tokens.next()?.to_owned();

    let mut url_base = None;
    for token in tokens {
        if let Some((key, value)) = token.split_once('=') {
            if key.eq_ignore_ascii_case("U") {
                url_base = Some(value.to_owned());
            }
        }
    }

    Some(Trigger {
        kind,
        file_name,
        url_base,
    })
}

impl OptionHandler for MspHandler {
    fn option(&self) -> TelnetOption {
        TelnetOption::MSP
    }

    fn scan_line(&mut self, line: &[u8], output: &mut EngineOutput) -> LineDisposition {
        let Some(trigger) = parse_trigger(line) else {
            return LineDisposition::Show;
        };
        debug!("msp: {:?} trigger for {}", trigger.kind, trigger.file_name);

        // `Off` stops playback; nothing to fetch.
        if trigger.file_name.eq_ignore_ascii_case("off") {
            return LineDisposition::Gag;
        }

        if let Some(base) = trigger.url_base {
            // Servers either give a bare prefix to append the file name to
            // or repeat the full location outright.
            let url = if base.ends_with(trigger.file_name.as_str()) {
                base
            } else {
                format!("{}{}", base, trigger.file_name)
            };
            output.push_action(EngineAction::QueueDownload {
                url,
                file_name: trigger.file_name,
            });
        }

        LineDisposition::Gag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Trigger parsing
    // ============================================================================

    #[test]
    fn parses_sound_trigger_with_url() {
        let trigger =
            parse_trigger(b"!!SOUND(ding.wav V=100 L=1 U=http://example.com/snd/)").unwrap();
        assert_eq!(trigger.kind, TriggerKind::Sound);
        assert_eq!(trigger.file_name, "ding.wav");
        assert_eq!(trigger.url_base.as_deref(), Some("http://example.com/snd/"));
    }

    #[test]
    fn parses_music_trigger_without_url() {
        let trigger = parse_trigger(b"!!MUSIC(battle.mid V=60 L=-1 C=1)").unwrap();
        assert_eq!(trigger.kind, TriggerKind::Music);
        assert_eq!(trigger.file_name, "battle.mid");
        assert_eq!(trigger.url_base, None);
    }

    #[test]
    fn trigger_must_start_the_line() {
        assert_eq!(parse_trigger(b"You hear !!SOUND(ding.wav)"), None);
    }

    #[test]
    fn unclosed_trigger_is_not_a_trigger() {
        assert_eq!(parse_trigger(b"!!SOUND(ding.wav V=100"), None);
    }

    #[test]
    fn url_key_is_case_insensitive() {
        let trigger = parse_trigger(b"!!SOUND(ding.wav u=http://example.com/)").unwrap();
        assert_eq!(trigger.url_base.as_deref(), Some("http://example.com/"));
    }

    // ============================================================================
    // Line scanning
    // ============================================================================

    #[test]
    fn trigger_with_url_gags_and_queues_download() {
        let mut handler = MspHandler;
        let mut output = EngineOutput::new();
        let disposition = handler.scan_line(
            b"!!SOUND(ding.wav U=http://example.com/snd/)",
            &mut output,
        );
        assert_eq!(disposition, LineDisposition::Gag);
        assert_eq!(
            output.actions,
            vec![EngineAction::QueueDownload {
                url: "http://example.com/snd/ding.wav".into(),
                file_name: "ding.wav".into(),
            }]
        );
    }

    #[test]
    fn url_already_naming_the_file_is_used_verbatim() {
        let mut handler = MspHandler;
        let mut output = EngineOutput::new();
        handler.scan_line(
            b"!!SOUND(ding.wav U=http://example.com/snd/ding.wav)",
            &mut output,
        );
        assert_eq!(
            output.actions,
            vec![EngineAction::QueueDownload {
                url: "http://example.com/snd/ding.wav".into(),
                file_name: "ding.wav".into(),
            }]
        );
    }

    #[test]
    fn trigger_without_url_gags_without_queueing() {
        let mut handler = MspHandler;
        let mut output = EngineOutput::new();
        let disposition = handler.scan_line(b"!!MUSIC(battle.mid L=-1)", &mut output);
        assert_eq!(disposition, LineDisposition::Gag);
        assert!(output.actions.is_empty());
    }

    #[test]
    fn off_trigger_gags_without_queueing() {
        let mut handler = MspHandler;
        let mut output = EngineOutput::new();
        let disposition = handler.scan_line(b"!!SOUND(Off)", &mut output);
        assert_eq!(disposition, LineDisposition::Gag);
        assert!(output.actions.is_empty());
    }

    #[test]
    fn ordinary_text_is_shown() {
        let mut handler = MspHandler;
        let mut output = EngineOutput::new();
        let disposition = handler.scan_line(b"The orc strikes you.", &mut output);
        assert_eq!(disposition, LineDisposition::Show);
        assert!(output.actions.is_empty());
    }
}
