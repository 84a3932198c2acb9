use core::hash::BuildHasher;

use chain_hash::HashMap;
use clap::Parser;
use siphasher::sip::SipHasher;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "entries", default_value_t = 100_000)]
    entries: usize,
}

struct SipBuilder;

impl BuildHasher for SipBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

fn main() {
    let args = Args::parse();

    println!("Creating HashMap for {} entries", args.entries);

    let mut map: HashMap<u64, u64, _> = HashMap::with_hasher(SipBuilder);

    let mut num_failures = 0;
    for i in 0..args.entries as u64 {
        if map.try_insert(i, i).is_err() {
            num_failures += 1;
            map.insert(i, i);
        }
    }

    println!("Inserted {} entries", map.len());
    println!("Buckets: {}", map.capacity());
    println!();

    map.chain_stats().print();
    println!();

    print_chain_histogram(&map);
    println!(
        "Number of failed try_insert attempts: {} ({:.02}%)",
        num_failures,
        num_failures as f64 / args.entries as f64 * 100.0
    );
}

/// Horizontal bar chart of the chain-length distribution. Each row is a
/// chain length; the count is the number of buckets with a chain that long.
fn print_chain_histogram(map: &HashMap<u64, u64, SipBuilder>) {
    let hist = map.chain_histogram();
    let max = *hist.iter().max().unwrap_or(&0);
    if max == 0 {
        println!("chain histogram: empty");
        return;
    }

    let max_bar = 60usize;
    let total_units = max_bar * 8;
    println!("chain histogram ({} buckets):", map.capacity());

    let make_bar = |count: usize| -> String {
        if count == 0 {
            return String::new();
        }
        let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
        let full = units / 8;
        let rem = units % 8;
        let mut bar = "█".repeat(full);
        if rem > 0 {
            let ch = match rem {
                1 => '▏',
                2 => '▎',
                3 => '▍',
                4 => '▌',
                5 => '▋',
                6 => '▊',
                7 => '▉',
                _ => unreachable!(),
            };
            bar.push(ch);
        }
        bar
    };

    for (length, &count) in hist.iter().enumerate() {
        let label = format!("{:>2}", length);
        let bar = make_bar(count);
        println!("{} | {} ({})", label, bar, count);
    }
}
