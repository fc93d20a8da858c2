use std::io;

use pool_logger::ulid::Generator;
use pool_logger::{src, Config, Format, Level, Output, Pool};

fn main() -> io::Result<()> {
    let mut ids = Generator::new();
    let request_id = ids.next().map_err(io::Error::other)?;

    let json = Pool::new(Config::new().level(Level::Debug).format(Format::Json).output(Output::Stdout))
        .map_err(io::Error::other)?;
    let http = json.logger("http");
    http.info()
        .msg("request served")
        .ulid("request", request_id)
        .str("method", "GET")
        .int("status", 200)
        .float("elapsed_ms", 3.25)
        .src(src!())
        .log();
    http.fine().str("dropped", "below threshold").log();
    json.deinit();

    let text = Pool::new(Config::new().level(Level::Info).format(Format::Text).output(Output::Stdout))
        .map_err(io::Error::other)?;
    let db = text.logger("db");
    db.warn()
        .msg("slow query")
        .ulid("request", request_id)
        .int("rows", None::<u64>)
        .binary("digest", &[0xde_u8, 0xad, 0xbe, 0xef][..])
        .log();
    text.deinit();

    Ok(())
}
