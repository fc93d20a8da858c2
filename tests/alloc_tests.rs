use pool_logger::clock::SimulatedClock;
use pool_logger::{Config, Format, Level, Output, Pool, Ulid};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::io;
use std::sync::Arc;

/// System allocator that counts allocations made by the current thread while
/// counting is switched on.
struct CountingAlloc;

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

thread_local! {
    static COUNTING: Cell<bool> = const { Cell::new(false) };
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn record() {
    let _ = COUNTING.try_with(|on| {
        if on.get() {
            let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        }
    });
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record();
        System.alloc(layout)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        record();
        System.alloc_zeroed(layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record();
        System.realloc(ptr, layout, new_size)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

fn allocations_during(f: impl FnOnce()) -> usize {
    ALLOCATIONS.with(|n| n.set(0));
    COUNTING.with(|on| on.set(true));
    f();
    COUNTING.with(|on| on.set(false));
    ALLOCATIONS.with(|n| n.get())
}

fn pool(level: Level, format: Format) -> Pool {
    let config = Config::new()
        .level(level)
        .format(format)
        .output(Output::writer(io::sink()))
        .clock(Arc::new(SimulatedClock::new(1_700_000_000_000_000_000)));
    Pool::new(config).unwrap()
}

#[test]
fn test_filtered_levels_never_allocate() {
    let pool = pool(Level::Info, Format::Json);
    let logger = pool.logger("quiet");

    let count = allocations_during(|| {
        for i in 0..100 {
            logger.debug().str("k", "v").int("n", i).log();
            logger.fine().msg("dropped").boolean("b", true).log();
            drop(logger.debug().str("unlogged", "x"));
        }
    });
    assert_eq!(count, 0);
}

fn log_steady_line(logger: &pool_logger::Logger, i: u64, id: Ulid) {
    logger
        .info()
        .msg("request done")
        .str("path", "/api/orders")
        .int("status", 200)
        .int("bytes", i)
        .intx("flags", 0xbeef)
        .float("ratio", 0.25)
        .boolean("cached", i % 2 == 0)
        .int("missing", None::<u32>)
        .ulid("request", id)
        .log();
}

#[test]
fn test_reused_entries_do_not_allocate() {
    let id = Ulid::from_parts(1_700_000_000_000, 99);
    for format in [Format::Json, Format::Text] {
        let pool = pool(Level::Info, format);
        let logger = pool.logger("steady");

        // The first round builds the entry and grows the level's pool.
        log_steady_line(&logger, 0, id);
        log_steady_line(&logger, 1, id);
        assert_eq!(logger.idle_entries(Level::Info), 1);

        let count = allocations_during(|| {
            for i in 0..100 {
                log_steady_line(&logger, i, id);
            }
        });
        assert_eq!(count, 0, "{} entries allocated once warm", format);
    }
}

#[test]
fn test_counter_sees_allocations() {
    let count = allocations_during(|| {
        let v: Vec<u64> = Vec::with_capacity(16);
        drop(std::hint::black_box(v));
    });
    assert_eq!(count, 1);
}
