//! # Font Catalog CLI
//!
//! Usage:
//!   font-catalog
//!   font-catalog --workdir /var/cache/fonts --fontbranch main -j 8
//!   RUST_LOG=debug font-catalog --no-report --manifest out/fonts.json

use std::io;

use clap::Parser as _;
use font_catalog::Config;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let stdout = io::stdout();
    if let Err(e) = font_catalog::run(&config, &mut stdout.lock()) {
        eprintln!("font-catalog: {}", e);
        std::process::exit(1);
    }
}
