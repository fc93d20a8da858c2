use pool_logger::clock::{Clock, SimulatedClock};
use pool_logger::ulid::{Generator, BYTE_LEN, ENCODED_LEN};
use pool_logger::{DecodeError, GenerateError, Ulid};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Rng that always returns all ones, to drive the random component to its
/// maximum.
struct Saturated;

impl RngCore for Saturated {
    fn next_u32(&mut self) -> u32 {
        u32::MAX
    }

    fn next_u64(&mut self) -> u64 {
        u64::MAX
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(0xff);
    }
}

const START_NS: i64 = 1_700_000_000_000_000_000;

fn seeded(clock: Arc<SimulatedClock>) -> Generator<StdRng> {
    Generator::with_rng(clock, StdRng::seed_from_u64(7))
}

#[test]
fn test_same_millisecond_increments_random_by_one() {
    let clock = Arc::new(SimulatedClock::new(START_NS));
    let mut generator = seeded(clock.clone());

    let first = generator.next().unwrap();
    clock.advance(Duration::from_micros(300));
    let second = generator.next().unwrap();

    assert_eq!(first.timestamp_ms(), second.timestamp_ms());
    assert_eq!(second.random(), first.random() + 1);
    assert_eq!(first.to_string()[..10], second.to_string()[..10]);
    assert!(second > first);
}

#[test]
fn test_new_millisecond_resamples() {
    let clock = Arc::new(SimulatedClock::new(START_NS));
    let mut generator = seeded(clock.clone());

    let first = generator.next().unwrap();
    clock.advance(Duration::from_millis(1));
    let second = generator.next().unwrap();

    assert_eq!(second.timestamp_ms(), first.timestamp_ms() + 1);
    assert!(second > first);
    assert_eq!(generator.last(), Some(second));
}

#[test]
fn test_ordering_over_many_ids() {
    let clock = Arc::new(SimulatedClock::new(START_NS));
    let mut generator = seeded(clock.clone());
    let mut previous = generator.next().unwrap();

    for i in 0..5_000 {
        if i % 7 == 0 {
            clock.advance(Duration::from_micros(450));
        }
        let id = generator.next().unwrap();
        assert!(id > previous);
        assert!(id.to_string() > previous.to_string());
        assert!(id.to_bytes() > previous.to_bytes());
        previous = id;
    }
}

#[test]
fn test_system_clock_generator_is_monotonic() {
    let mut generator = Generator::new();
    let mut previous = generator.next().unwrap();
    for _ in 0..10_000 {
        let id = generator.next().unwrap();
        assert!(id > previous);
        previous = id;
    }
}

#[test]
fn test_random_overflow() {
    let clock = Arc::new(SimulatedClock::new(START_NS));
    let mut generator = Generator::with_rng(clock.clone(), Saturated);

    let max = generator.next().unwrap();
    assert_eq!(max.random(), (1u128 << 80) - 1);
    assert_eq!(generator.next(), Err(GenerateError::RandomOverflow));

    clock.advance(Duration::from_millis(1));
    assert!(generator.next().is_ok(), "a new millisecond recovers");
}

#[test]
fn test_time_before_epoch_is_rejected() {
    let clock = Arc::new(SimulatedClock::new(-1));
    let mut generator = seeded(clock.clone());
    assert_eq!(generator.next(), Err(GenerateError::TimeRegression));

    clock.set(0);
    assert_eq!(generator.next().unwrap().timestamp_ms(), 0);
}

#[test]
fn test_nanosecond_clock_range_fits_timestamp() {
    let clock = Arc::new(SimulatedClock::new(i64::MAX));
    let mut generator = seeded(clock);
    let id = generator.next().unwrap();
    assert_eq!(id.timestamp_ms(), (i64::MAX / 1_000_000) as u64);
}

#[test]
fn test_time_overflow() {
    let now = Arc::new(AtomicI64::new(1i64 << 48));
    let source = now.clone();
    let mut generator =
        Generator::with_millis(move || source.load(Ordering::SeqCst), StdRng::seed_from_u64(3));
    assert_eq!(generator.next(), Err(GenerateError::TimeOverflow));

    now.store(i64::MAX, Ordering::SeqCst);
    assert_eq!(generator.next(), Err(GenerateError::TimeOverflow));

    now.store((1i64 << 48) - 1, Ordering::SeqCst);
    let id = generator.next().unwrap();
    assert_eq!(id.timestamp_ms(), (1u64 << 48) - 1);
    assert_eq!(&id.to_string()[..10], "7ZZZZZZZZZ");

    now.store(-5, Ordering::SeqCst);
    assert_eq!(generator.next(), Err(GenerateError::TimeRegression));
}

#[test]
fn test_closure_clock() {
    let clock: Arc<dyn Clock> = Arc::new(|| 42_000_000i64);
    let mut generator = Generator::with_rng(clock, StdRng::seed_from_u64(1));
    assert_eq!(generator.next().unwrap().timestamp_ms(), 42);
}

#[test]
fn test_round_trips() {
    let mut generator = Generator::new();
    for _ in 0..1_000 {
        let id = generator.next().unwrap();
        let text = id.to_string();
        assert_eq!(text.len(), ENCODED_LEN);
        assert_eq!(Ulid::decode(&text), Ok(id));
        let bytes = id.to_bytes();
        assert_eq!(bytes.len(), BYTE_LEN);
        assert_eq!(Ulid::from_bytes(&bytes), Ok(id));
        assert_eq!(u128::from(id), u128::from_be_bytes(bytes));
    }
}

#[test]
fn test_matches_reference_encoding() {
    let mut generator = Generator::new();
    for _ in 0..100 {
        let id = generator.next().unwrap();
        let reference = ulid::Ulid::from(u128::from(id));
        assert_eq!(id.to_string(), reference.to_string());
        assert_eq!(id.timestamp_ms(), reference.timestamp_ms());
    }
}

#[test]
fn test_decode_rejects_bad_input() {
    assert_eq!(Ulid::decode(""), Err(DecodeError::InvalidLength(0)));
    assert_eq!(
        Ulid::decode("01ARZ3NDEKTSV4RRFFQ69G5FAVX"),
        Err(DecodeError::InvalidLength(27))
    );
    for bad in ['I', 'L', 'O', 'U', 'i', '-', ' '] {
        let mut text = String::from("01ARZ3NDEKTSV4RRFFQ69G5FA");
        text.push(bad);
        assert_eq!(Ulid::decode(&text), Err(DecodeError::InvalidChar(bad)), "{:?}", text);
    }
    assert!(Ulid::decode("01ARZ3NDEKTSV4RRFFQ69G5FAV").is_ok());
}

#[test]
fn test_from_bytes_rejects_wrong_length() {
    assert_eq!(Ulid::from_bytes(&[0u8; 15]), Err(DecodeError::InvalidLength(15)));
    assert_eq!(Ulid::from_bytes(&[0u8; 17]), Err(DecodeError::InvalidLength(17)));
    assert_eq!(Ulid::from_bytes(&[0u8; 16]), Ok(Ulid::nil()));
}
