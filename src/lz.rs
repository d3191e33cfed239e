use std::io::{Read, Write};

use log::{debug, trace};

use crate::config::Config;
use crate::error::{LzError, Result};
use crate::matcher::{find_longest_match, MatchLimits};
use crate::token::{Token, TokenReader, MAX_FIELD, TOKEN_SIZE};
use crate::window::WindowBuffer;

/// Decoded bytes are handed to the writer in chunks of this size.
const FLUSH_THRESHOLD: usize = 8192;

/// Phase of an encoding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Filling the lookahead before the first token.
    Seeding,
    /// Input still has bytes to feed the lookahead.
    Matching,
    /// Input exhausted; the lookahead shrinks toward empty.
    Draining,
    Done,
}

/// Positions into the full input. `search_begin..look_begin` is the search
/// window and `look_begin..look_end` the lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursors {
    pub search_begin: usize,
    pub look_begin: usize,
    pub look_end: usize,
    pub bytes_remaining: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub input_bytes: u64,
    pub tokens: u64,
    pub output_bytes: u64,
}

impl EncodeStats {
    /// Compressed size over original size; 0.0 for empty input.
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            self.output_bytes as f64 / self.input_bytes as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub input_bytes: u64,
    pub tokens: u64,
    pub output_bytes: u64,
}

/// Produces tokens for an in-memory input.
#[derive(Debug, Clone)]
pub struct Encoder {
    config: Config,
}

impl Encoder {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a session over `input`. The session yields one token per step.
    pub fn session<'a>(&self, input: &'a [u8]) -> EncodeSession<'a> {
        EncodeSession::new(input, &self.config)
    }

    /// Encodes `input` and writes the token stream to `writer`.
    pub fn encode_slice(&self, input: &[u8], writer: &mut impl Write) -> Result<EncodeStats> {
        let mut stats = EncodeStats {
            input_bytes: input.len() as u64,
            ..EncodeStats::default()
        };

        for token in self.session(input) {
            token?.write_to(writer)?;
            stats.tokens += 1;
        }
        writer.flush()?;

        stats.output_bytes = stats.tokens * TOKEN_SIZE as u64;
        debug!(
            "encoded {} bytes into {} tokens ({} bytes)",
            stats.input_bytes, stats.tokens, stats.output_bytes
        );
        Ok(stats)
    }
}

/// One pass of the encoder over an input.
///
/// The search and lookahead windows live here and are lent to the match
/// finder on every step; nothing outlives the session.
pub struct EncodeSession<'a> {
    input: &'a [u8],
    search: WindowBuffer<u8>,
    lookahead: WindowBuffer<u8>,
    cursors: Cursors,
    min_match_length: usize,
    state: EncoderState,
}

impl<'a> EncodeSession<'a> {
    fn new(input: &'a [u8], config: &Config) -> Self {
        Self {
            input,
            search: WindowBuffer::new(config.search_capacity),
            lookahead: WindowBuffer::new(config.lookahead_capacity),
            cursors: Cursors {
                search_begin: 0,
                look_begin: 0,
                look_end: 0,
                bytes_remaining: input.len(),
            },
            min_match_length: config.min_match_length,
            state: EncoderState::Seeding,
        }
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn cursors(&self) -> Cursors {
        self.cursors
    }

    pub fn search_window(&self) -> &WindowBuffer<u8> {
        &self.search
    }

    pub fn lookahead_window(&self) -> &WindowBuffer<u8> {
        &self.lookahead
    }

    /// Runs one step of the state machine.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if self.state == EncoderState::Seeding {
            self.seed()?;
        }
        if self.state == EncoderState::Done {
            return Ok(None);
        }

        // Leave at least one lookahead byte for the literal.
        let max_length = self
            .lookahead
            .len()
            .checked_sub(1)
            .ok_or_else(|| violation("lookahead is empty while input remains"))?
            .min(MAX_FIELD);
        let limits = MatchLimits::new(self.min_match_length, max_length);
        let found = find_longest_match(&self.search, &self.lookahead, limits);

        let literal = self
            .lookahead
            .at(found.length)
            .map_err(|e| violation(&e.to_string()))?;
        let token = Token::new(found.offset, found.length, literal)?;
        trace!(
            "token at {}: offset={} length={} literal={:#04x}",
            self.cursors.look_begin,
            token.offset,
            token.length,
            token.literal
        );

        self.advance(found.length + 1)?;
        Ok(Some(token))
    }

    fn seed(&mut self) -> Result<()> {
        while !self.lookahead.is_full() && self.cursors.bytes_remaining > 0 {
            self.fetch()?;
        }
        let next = if self.cursors.look_begin == self.cursors.look_end {
            EncoderState::Done
        } else if self.cursors.bytes_remaining == 0 {
            EncoderState::Draining
        } else {
            EncoderState::Matching
        };
        self.transition(next);
        self.check_invariants()
    }

    /// Moves `consumed` bytes from the lookahead into the search window,
    /// refilling the lookahead while input remains.
    fn advance(&mut self, consumed: usize) -> Result<()> {
        for _ in 0..consumed {
            let byte = self
                .lookahead
                .pop_front()
                .ok_or_else(|| violation("advanced past the end of the lookahead"))?;
            if self.search.push_back(byte).is_some() {
                self.cursors.search_begin += 1;
            }
            self.cursors.look_begin += 1;
            // look_end stops at end-of-input.
            if self.cursors.bytes_remaining > 0 {
                self.fetch()?;
            }
        }

        if self.cursors.look_begin == self.cursors.look_end {
            self.transition(EncoderState::Done);
        } else if self.cursors.bytes_remaining == 0 && self.state == EncoderState::Matching {
            self.transition(EncoderState::Draining);
        }
        self.check_invariants()
    }

    fn fetch(&mut self) -> Result<()> {
        let byte = *self
            .input
            .get(self.cursors.look_end)
            .ok_or_else(|| violation("read past the end of input"))?;
        self.lookahead.push_back(byte);
        self.cursors.look_end += 1;
        self.cursors.bytes_remaining -= 1;
        Ok(())
    }

    fn transition(&mut self, next: EncoderState) {
        if self.state != next {
            trace!("encoder {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn check_invariants(&self) -> Result<()> {
        let c = &self.cursors;
        if c.search_begin > c.look_begin || c.look_begin > c.look_end {
            return Err(violation(&format!("cursor order broken: {:?}", c)));
        }
        if c.look_end - c.look_begin != self.lookahead.len()
            || self.lookahead.len() > self.lookahead.capacity()
        {
            return Err(violation(&format!(
                "lookahead span {} does not match window of {}",
                c.look_end - c.look_begin,
                self.lookahead.len()
            )));
        }
        if c.look_begin - c.search_begin != self.search.len()
            || self.search.len() > self.search.capacity()
        {
            return Err(violation(&format!(
                "search span {} does not match window of {}",
                c.look_begin - c.search_begin,
                self.search.len()
            )));
        }
        if c.look_end + c.bytes_remaining != self.input.len() {
            return Err(violation("remaining byte count out of step with input"));
        }
        Ok(())
    }
}

impl Iterator for EncodeSession<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.state = EncoderState::Done;
                Some(Err(e))
            }
        }
    }
}

fn violation(message: &str) -> LzError {
    LzError::WindowInvariantViolation(message.to_string())
}

/// Rebuilds the original bytes from tokens.
///
/// The output buffer is also the history that back-references read from.
#[derive(Debug, Default)]
pub struct Decoder {
    output: Vec<u8>,
    flushed: usize,
    tokens: u64,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the bytes described by `token`.
    pub fn apply(&mut self, token: Token) -> Result<()> {
        let offset = token.offset as usize;
        let length = token.length as usize;

        if length > 0 {
            if offset == 0 || offset > self.output.len() {
                return Err(LzError::InvalidBackReference {
                    offset,
                    length,
                    available: self.output.len(),
                });
            }
            let start = self.output.len() - offset;
            self.output.reserve(length + 1);
            // Byte by byte: when length > offset the copy reads bytes it
            // has just written.
            for i in 0..length {
                let byte = self.output[start + i];
                self.output.push(byte);
            }
        }

        self.output.push(token.literal);
        self.tokens += 1;
        Ok(())
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// Decodes a complete in-memory token stream.
    pub fn decode_slice(data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = Decoder::new();
        for token in TokenReader::new(data) {
            decoder.apply(token?)?;
        }
        Ok(decoder.into_output())
    }

    fn flush_pending(&mut self, writer: &mut impl Write, force: bool) -> Result<()> {
        let pending = self.output.len() - self.flushed;
        if pending > 0 && (force || pending >= FLUSH_THRESHOLD) {
            writer.write_all(&self.output[self.flushed..])?;
            self.flushed = self.output.len();
        }
        Ok(())
    }
}

/// Compresses everything `reader` yields into `writer` using LZ77
///
/// # Arguments
/// * `reader` - The uncompressed source; it is read to the end before encoding
/// * `writer` - Receives the 3-byte token stream
/// * `config` - Window sizes and minimum match length
///
/// # Returns
/// Byte and token counts for the session
///
/// # Errors
/// * `LzError::InvalidConfig` if `config` does not fit the token format
/// * `LzError::Io` if reading `reader` or writing `writer` fails
/// * `LzError::WindowInvariantViolation` if the encoder's bookkeeping breaks (a bug)
pub fn encode(
    reader: &mut impl Read,
    writer: &mut impl Write,
    config: &Config,
) -> Result<EncodeStats> {
    let encoder = Encoder::new(*config)?;
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    encoder.encode_slice(&input, writer)
}

/// Decompresses an LZ77 token stream from `reader` into `writer`
///
/// # Arguments
/// * `reader` - A stream of 3-byte tokens, possibly empty
/// * `writer` - Receives the reconstructed bytes
///
/// # Returns
/// Byte and token counts for the session
///
/// # Errors
/// * `LzError::TruncatedStream` if the stream ends 1 or 2 bytes into a token
/// * `LzError::InvalidBackReference` if a token copies from before the start of the output
/// * `LzError::Io` if reading `reader` or writing `writer` fails
pub fn decode(reader: &mut impl Read, writer: &mut impl Write) -> Result<DecodeStats> {
    let mut tokens = TokenReader::new(reader);
    let mut decoder = Decoder::new();

    while let Some(token) = tokens.read_token()? {
        decoder.apply(token)?;
        decoder.flush_pending(writer, false)?;
    }
    decoder.flush_pending(writer, true)?;
    writer.flush()?;

    let stats = DecodeStats {
        input_bytes: tokens.bytes_read(),
        tokens: decoder.tokens(),
        output_bytes: decoder.output().len() as u64,
    };
    debug!(
        "decoded {} tokens into {} bytes",
        stats.tokens, stats.output_bytes
    );
    Ok(stats)
}
