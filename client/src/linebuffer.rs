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

//! Line assembly for the inbound text stream
//!
//! MUD servers interleave complete lines with unterminated prompts
//! ("By what name do you wish to be known? "). The buffer emits completed
//! lines as they terminate and surfaces the unterminated tail as a partial
//! line so prompts render immediately instead of waiting for a newline
//! that may never come.

use bytes::BytesMut;

/// Terminator that ended a buffered line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineEnding {
    /// Bare line feed.
    Lf,
    /// Carriage return + line feed.
    CrLf,
}

impl LineEnding {
    /// The terminator bytes as they appeared on the wire.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

/// One completed line, terminator stripped.
#[derive(Debug, Eq, PartialEq)]
pub struct BufferedLine {
    /// Line content without its terminator.
    pub text: BytesMut,
    /// The terminator that ended it, retained so raw bytes can be
    /// reconstructed for logging.
    pub ending: LineEnding,
    /// Whether a handler claimed this line and it should not be displayed.
    pub gag: bool,
}

/// The unterminated tail of the buffer after a scan.
#[derive(Debug, Eq, PartialEq)]
pub struct PartialLine {
    /// Everything received since the last terminator.
    pub text: BytesMut,
    /// True when a partial for this same line was already emitted; the
    /// display should replace it rather than append.
    pub supersedes_previous: bool,
}

/// Everything one `add_data` call produced.
#[derive(Debug, Default)]
pub struct LineBufferBatch {
    /// Lines completed by this chunk, in arrival order.
    pub lines: Vec<BufferedLine>,
    /// The unterminated remainder, if any bytes are pending.
    pub partial: Option<PartialLine>,
}

/// Accumulates decoded inbound bytes and splits them into lines.
///
/// LF terminates a line; a CR immediately before the LF belongs to the
/// terminator. A bare CR is ordinary data (some servers use it for
/// overstrike tricks) and stays in the line text.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: BytesMut,
    partial_shown: bool,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        LineBuffer {
            pending: BytesMut::new(),
            partial_shown: false,
        }
    }

    /// Appends a chunk and returns the lines it completed plus the
    /// unterminated remainder.
    ///
    /// Every input byte lands in exactly one output: either inside a
    /// completed line (content or terminator) or in the partial tail
    /// carried to the next call.
    pub fn add_data(&mut self, data: &[u8]) -> LineBufferBatch {
        self.pending.extend_from_slice(data);

        let mut batch = LineBufferBatch::default();
        while let Some(lf) = self.pending.iter().position(|&b| b == b'\n') {
            let mut text = self.pending.split_to(lf + 1);
            text.truncate(lf);
            let ending = if text.last() == Some(&b'\r') {
                text.truncate(text.len() - 1);
                LineEnding::CrLf
            } else {
                LineEnding::Lf
            };
            batch.lines.push(BufferedLine {
                text,
                ending,
                gag: false,
            });
            self.partial_shown = false;
        }

        if !self.pending.is_empty() {
            batch.partial = Some(PartialLine {
                text: self.pending.clone(),
                supersedes_previous: self.partial_shown,
            });
            self.partial_shown = true;
        }
        batch
    }

    /// Whether unterminated bytes are pending.
    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Discards all pending bytes, as on disconnect.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.partial_shown = false;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(batch: &LineBufferBatch) -> Vec<&[u8]> {
        batch.lines.iter().map(|l| &l.text[..]).collect()
    }

    #[test]
    fn crlf_terminates_one_line() {
        let mut buffer = LineBuffer::new();
        let batch = buffer.add_data(b"Welcome to Midgaard\r\n");
        assert_eq!(texts(&batch), vec![b"Welcome to Midgaard" as &[u8]]);
        assert_eq!(batch.lines[0].ending, LineEnding::CrLf);
        assert!(batch.partial.is_none());
    }

    #[test]
    fn bare_lf_terminates_too() {
        let mut buffer = LineBuffer::new();
        let batch = buffer.add_data(b"one\ntwo\n");
        assert_eq!(texts(&batch), vec![b"one" as &[u8], b"two"]);
        assert!(batch.lines.iter().all(|l| l.ending == LineEnding::Lf));
    }

    #[test]
    fn bare_cr_is_data() {
        let mut buffer = LineBuffer::new();
        let batch = buffer.add_data(b"progress\rbar\n");
        assert_eq!(texts(&batch), vec![b"progress\rbar" as &[u8]]);
        assert_eq!(batch.lines[0].ending, LineEnding::Lf);
    }

    #[test]
    fn prompt_surfaces_as_partial() {
        let mut buffer = LineBuffer::new();
        let batch = buffer.add_data(b"Password: ");
        assert!(batch.lines.is_empty());
        let partial = batch.partial.unwrap();
        assert_eq!(&partial.text[..], b"Password: ");
        assert!(!partial.supersedes_previous);
    }

    #[test]
    fn growing_partial_supersedes_the_previous_one() {
        let mut buffer = LineBuffer::new();
        let first = buffer.add_data(b"Pass").partial.unwrap();
        assert!(!first.supersedes_previous);

        let second = buffer.add_data(b"word: ").partial.unwrap();
        assert_eq!(&second.text[..], b"Password: ");
        assert!(second.supersedes_previous);
    }

    #[test]
    fn terminator_promotes_the_partial_exactly_once() {
        let mut buffer = LineBuffer::new();
        buffer.add_data(b"look");
        let batch = buffer.add_data(b"\r\n");
        assert_eq!(texts(&batch), vec![b"look" as &[u8]]);
        assert!(batch.partial.is_none());
        assert!(!buffer.has_partial());
    }

    #[test]
    fn crlf_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        let first = buffer.add_data(b"hello\r");
        // The CR may yet pair with an LF; until then it is partial data.
        assert!(first.lines.is_empty());
        assert_eq!(&first.partial.unwrap().text[..], b"hello\r");

        let second = buffer.add_data(b"\nworld");
        assert_eq!(texts(&second), vec![b"hello" as &[u8]]);
        assert_eq!(second.lines[0].ending, LineEnding::CrLf);
        assert_eq!(&second.partial.unwrap().text[..], b"world");
    }

    #[test]
    fn clear_discards_pending() {
        let mut buffer = LineBuffer::new();
        buffer.add_data(b"half a line");
        buffer.clear();
        assert!(!buffer.has_partial());
        let batch = buffer.add_data(b"fresh\n");
        assert_eq!(texts(&batch), vec![b"fresh" as &[u8]]);
    }

    #[test]
    fn empty_chunk_produces_nothing_new() {
        let mut buffer = LineBuffer::new();
        buffer.add_data(b"pending");
        let batch = buffer.add_data(b"");
        assert!(batch.lines.is_empty());
        // Still pending, still the same bytes.
        assert_eq!(&batch.partial.unwrap().text[..], b"pending");
    }

    #[test]
    fn byte_conservation_over_arbitrary_chunking() {
        use proptest::prelude::*;

        proptest!(|(data in proptest::collection::vec(any::<u8>(), 0..512),
                    splits in proptest::collection::vec(1usize..16, 0..64))| {
            let mut buffer = LineBuffer::new();
            let mut reconstructed = Vec::new();
            let mut offset = 0;

            let mut feed = |buffer: &mut LineBuffer, chunk: &[u8], out: &mut Vec<u8>| {
                let batch = buffer.add_data(chunk);
                for line in &batch.lines {
                    out.extend_from_slice(&line.text);
                    out.extend_from_slice(line.ending.as_bytes());
                }
            };

            for split in splits {
                let end = (offset + split).min(data.len());
                feed(&mut buffer, &data[offset..end], &mut reconstructed);
                offset = end;
                if offset == data.len() {
                    break;
                }
            }
            feed(&mut buffer, &data[offset..], &mut reconstructed);

            // Completed lines plus the pending tail must reproduce the
            // input byte for byte.
            reconstructed.extend_from_slice(&buffer.pending);
            prop_assert_eq!(reconstructed, data);
        });
    }
}
