use chrono::Utc;
use powlib::params::{ConsensusConfig, Network};
use powlib::types::{BlockRecord, Blockchain};
use powlib::util::Savable;
use rand::Rng;
use std::env;
use std::process::exit;

// 실제 채굴 없이 간격만 흉내 낸 체인을 만든다. 각 블록의 bits는 엔진이 계산한 값을 그대로 쓴다
fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: chain_gen <chain_file> <blocks> [network] [mean_spacing_secs]");
        exit(1);
    }

    let path = &args[1];
    let blocks: u64 = args[2].parse().unwrap_or_else(|_| {
        eprintln!("blocks must be a number");
        exit(1);
    });
    let network: Network = match args.get(3) {
        Some(name) => name.parse().unwrap_or_else(|e| {
            eprintln!("{e}");
            exit(1);
        }),
        None => Network::Regtest,
    };
    let config = ConsensusConfig::for_network(network);
    let mean_spacing = match args.get(4) {
        Some(secs) => secs.parse().unwrap_or_else(|_| {
            eprintln!("mean_spacing_secs must be a number");
            exit(1);
        }),
        None => config.target_spacing as u32,
    };

    let mut rng = rand::thread_rng();
    let mut chain = Blockchain::new();
    let mut time = Utc::now().timestamp() as u32;

    for height in 0..blocks {
        // 평균 간격의 절반 ~ 1.5배 사이로 흔든다
        let jitter = rng.gen_range(mean_spacing / 2..=mean_spacing + mean_spacing / 2);
        let candidate_time = if height == 0 { time } else { time + jitter.max(1) };
        let bits = match chain.next_target(candidate_time, &config) {
            Ok(bits) => bits,
            Err(e) => {
                eprintln!("failed to compute target at height {height}: {e}");
                exit(1);
            }
        };
        time = candidate_time;
        chain
            .add_block(BlockRecord::new(height, time, bits))
            .expect("BUG: heights are generated in order");
    }

    if let Err(e) = chain.save_to_file(path) {
        eprintln!("failed to write {path}: {e}");
        exit(1);
    }
    println!("wrote {} {network} blocks to {path}", chain.block_height());
}
