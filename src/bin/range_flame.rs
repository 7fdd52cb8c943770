use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rangecoder::{Codec, CodecConfig, FrequencyTable};
use tracing::{error, info};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Pattern {
    Constant,
    Ramp,
    Noise,
}

/// Encode and decode a synthetic buffer in a loop, for profiling.
#[derive(Parser)]
#[command(name = "range_flame")]
struct Args {
    /// Input length in bytes
    #[arg(long, default_value_t = 640 * 480)]
    len: usize,

    /// Bits per symbol (1, 2, 4 or 8)
    #[arg(long, default_value_t = 8)]
    width: u32,

    /// Minimum range width before forced renormalization
    #[arg(long, default_value_t = 1 << 16)]
    threshold: u32,

    /// Encode/decode passes
    #[arg(long, default_value_t = 20)]
    iterations: usize,

    /// Synthetic input shape
    #[arg(long, value_enum, default_value_t = Pattern::Ramp)]
    pattern: Pattern,
}

fn synthesize(pattern: Pattern, len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    match pattern {
        Pattern::Constant => vec![7; len],
        Pattern::Ramp => {
            let mut value = 128i32;
            (0..len)
                .map(|_| {
                    value = (value + rng.gen_range(-2..=2)).clamp(0, 255);
                    value as u8
                })
                .collect()
        }
        Pattern::Noise => (0..len).map(|_| rng.gen()).collect(),
    }
}

fn main() {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }

    let args = Args::parse();
    let config = CodecConfig::default()
        .with_symbol_bits(args.width)
        .with_adjustment_threshold(args.threshold);
    let codec = match Codec::new(config) {
        Ok(codec) => codec,
        Err(e) => {
            error!(error = %e, "rejected parameters");
            std::process::exit(2);
        }
    };

    let input = synthesize(args.pattern, args.len);
    let entropy = FrequencyTable::build(&input, 256).entropy();

    for pass in 0..args.iterations {
        let encoded = match codec.encode(&input) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(error = %e, "encode failed");
                std::process::exit(1);
            }
        };
        match codec.decode(&encoded.bytes, encoded.bit_count, input.len()) {
            Ok(decoded) if decoded == input => {}
            Ok(_) => {
                error!(pass, "round trip mismatch");
                std::process::exit(1);
            }
            Err(e) => {
                error!(error = %e, "decode failed");
                std::process::exit(1);
            }
        }
        if pass == 0 {
            info!(
                bytes = input.len(),
                bits = encoded.bit_count,
                bits_per_byte = encoded.bit_count as f64 / input.len() as f64,
                order0_bits_per_byte = entropy,
                "first pass"
            );
        }
    }
}
