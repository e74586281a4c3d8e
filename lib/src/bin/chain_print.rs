use chrono::DateTime;
use powlib::compact;
use powlib::types::Blockchain;
use powlib::util::{to_hex, Savable};
use std::env;
use std::process::exit;

fn main() {
    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("Usage: chain_print <chain_file>");
            exit(1);
        }
    };
    let chain = match Blockchain::load_from_file(&path) {
        Ok(chain) => chain,
        Err(e) => {
            eprintln!("failed to read {path}: {e}");
            exit(1);
        }
    };

    let mut previous_time: Option<u32> = None;
    for block in chain.blocks() {
        let time = DateTime::from_timestamp(i64::from(block.time), 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| block.time.to_string());
        let gap = previous_time
            .map(|prev| (i64::from(block.time) - i64::from(prev)).to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>8}  {}  +{:>5}s  {:08x}  {}",
            block.height,
            time,
            gap,
            block.bits,
            to_hex(compact::decode(block.bits).target)
        );
        previous_time = Some(block.time);
    }
}
