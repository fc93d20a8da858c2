//! Time-ordered 128-bit identifiers (ULIDs) and their generator.
//!
//! Layout: 48-bit millisecond timestamp in the high bits, 80 random bits in
//! the low bits. The text form is 26 Crockford base-32 characters and the
//! byte form is 16 big-endian bytes; both sort the same way the numbers do.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::clock::{Clock, SystemClock};
use crate::error::{DecodeError, GenerateError};

/// Length of the text form.
pub const ENCODED_LEN: usize = 26;

/// Length of the byte form.
pub const BYTE_LEN: usize = 16;

const TIME_BITS: u32 = 48;
const RANDOM_BITS: u32 = 80;
const MAX_TIME: u64 = (1 << TIME_BITS) - 1;
const RANDOM_MASK: u128 = (1 << RANDOM_BITS) - 1;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const INVALID: u8 = 0xff;

const DECODE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// A 128-bit lexicographically sortable identifier.
///
/// # Examples
///
/// ```
/// # use pool_logger::Ulid;
/// let id = Ulid::from_parts(1_700_000_000_000, 42);
/// let text = id.to_string();
/// assert_eq!(text.len(), 26);
/// assert_eq!(text.parse::<Ulid>().unwrap(), id);
/// assert_eq!(Ulid::from_bytes(&id.to_bytes()).unwrap(), id);
/// assert_eq!(id.timestamp_ms(), 1_700_000_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ulid(u128);

impl Ulid {
    pub const fn nil() -> Self {
        Ulid(0)
    }

    /// Combines a millisecond timestamp and a random component. Bits beyond
    /// 48 and 80 respectively are discarded.
    pub const fn from_parts(timestamp_ms: u64, random: u128) -> Self {
        let time = (timestamp_ms & MAX_TIME) as u128;
        Ulid((time << RANDOM_BITS) | (random & RANDOM_MASK))
    }

    pub const fn timestamp_ms(self) -> u64 {
        (self.0 >> RANDOM_BITS) as u64
    }

    pub const fn random(self) -> u128 {
        self.0 & RANDOM_MASK
    }

    pub const fn to_bytes(self) -> [u8; BYTE_LEN] {
        self.0.to_be_bytes()
    }

    /// Rebuilds an identifier from exactly 16 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let bytes: [u8; BYTE_LEN] =
            bytes.try_into().map_err(|_| DecodeError::InvalidLength(bytes.len()))?;
        Ok(Ulid(u128::from_be_bytes(bytes)))
    }

    /// Text form as ASCII bytes, most significant character first.
    pub fn encode(self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        let mut value = self.0;
        for slot in out.iter_mut().rev() {
            *slot = ALPHABET[(value & 0x1f) as usize];
            value >>= 5;
        }
        out
    }

    /// Parses the 26-character text form. Lower-case letters are rejected.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let bytes = text.as_bytes();
        if bytes.len() != ENCODED_LEN {
            return Err(DecodeError::InvalidLength(bytes.len()));
        }

        let mut value: u128 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let digit = DECODE[b as usize];
            if digit == INVALID {
                let bad = text[i..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(DecodeError::InvalidChar(bad));
            }
            // 26 * 5 = 130 bits; the top two must be zero.
            if i == 0 && digit > 7 {
                return Err(DecodeError::Overflow);
            }
            value = (value << 5) | digit as u128;
        }
        Ok(Ulid(value))
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.encode();
        let text = std::str::from_utf8(&encoded).map_err(|_| fmt::Error)?;
        f.write_str(text)
    }
}

impl FromStr for Ulid {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::decode(s)
    }
}

impl From<u128> for Ulid {
    fn from(value: u128) -> Self {
        Ulid(value)
    }
}

impl From<Ulid> for u128 {
    fn from(id: Ulid) -> Self {
        id.0
    }
}

/// Where a generator reads the current time from.
enum TimeSource {
    Clock(Arc<dyn Clock>),
    Millis(Box<dyn Fn() -> i64 + Send + Sync>),
}

impl TimeSource {
    fn now_ms(&self) -> i64 {
        match self {
            TimeSource::Clock(clock) => clock.now_nanos().div_euclid(1_000_000),
            TimeSource::Millis(millis) => millis(),
        }
    }
}

/// Produces strictly increasing ULIDs.
///
/// Within one millisecond each id is the previous one plus one; a new
/// millisecond draws fresh randomness. The generator is not synchronized:
/// `next` takes `&mut self`, so sharing one across threads needs a lock
/// around it.
///
/// # Examples
///
/// ```
/// # use pool_logger::ulid::Generator;
/// let mut generator = Generator::new();
/// let a = generator.next().unwrap();
/// let b = generator.next().unwrap();
/// assert!(b > a);
/// ```
pub struct Generator<R = StdRng> {
    time: TimeSource,
    rng: R,
    last: Option<Ulid>,
}

impl Generator<StdRng> {
    /// Generator on the system clock, seeded from the OS.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(clock, StdRng::from_os_rng())
    }
}

impl Default for Generator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> Generator<R> {
    pub fn with_rng(clock: Arc<dyn Clock>, rng: R) -> Self {
        Self { time: TimeSource::Clock(clock), rng, last: None }
    }

    /// Generator reading milliseconds since the epoch straight from `millis`.
    ///
    /// A [`Clock`] reports `i64` nanoseconds, which run out in the year 2262,
    /// long before the 48-bit timestamp does. A millisecond source covers the
    /// whole range, including times past it.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pool_logger::ulid::Generator;
    /// # use pool_logger::GenerateError;
    /// # use rand::{rngs::StdRng, SeedableRng};
    /// let mut generator = Generator::with_millis(|| 1i64 << 48, StdRng::seed_from_u64(0));
    /// assert_eq!(generator.next(), Err(GenerateError::TimeOverflow));
    /// ```
    pub fn with_millis(millis: impl Fn() -> i64 + Send + Sync + 'static, rng: R) -> Self {
        Self { time: TimeSource::Millis(Box::new(millis)), rng, last: None }
    }

    /// The most recent identifier handed out.
    pub fn last(&self) -> Option<Ulid> {
        self.last
    }

    /// Next identifier, strictly greater than the previous one while time
    /// does not move backwards.
    ///
    /// # Returns
    ///
    /// * `TimeRegression` when the time source is before the epoch
    /// * `TimeOverflow` when its millisecond count needs more than 48 bits
    /// * `RandomOverflow` when a millisecond has used up its random space
    pub fn next(&mut self) -> Result<Ulid, GenerateError> {
        let ms = self.time.now_ms();
        if ms < 0 {
            return Err(GenerateError::TimeRegression);
        }
        let ms = ms as u64;
        if ms > MAX_TIME {
            return Err(GenerateError::TimeOverflow);
        }

        let id = match self.last {
            Some(last) if last.timestamp_ms() == ms => {
                let random = last.random();
                if random == RANDOM_MASK {
                    return Err(GenerateError::RandomOverflow);
                }
                Ulid::from_parts(ms, random + 1)
            }
            _ => Ulid::from_parts(ms, self.rng.random::<u128>()),
        };
        self.last = Some(id);
        Ok(id)
    }
}
