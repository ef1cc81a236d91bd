//! `tidewater [config.json]`
//!
//! Without an argument the config path is read from `TIDEWATER_CONFIG`; with
//! neither, defaults apply.

fn main() {
    let _ = env_logger::try_init();
    let options = tidewater::Options::from_env_or_args(std::env::args());
    if let Err(e) = tidewater::run(options) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
