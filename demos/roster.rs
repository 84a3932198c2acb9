use core::hash::BuildHasher;
use core::hash::Hasher;

use chain_hash::HashMap;

/// Folds input bytes into a single word, then finishes with the splitmix64
/// mixer so nearby keys land in distant buckets.
struct MixHasher {
    state: u64,
}

impl Hasher for MixHasher {
    fn finish(&self) -> u64 {
        let mut x = self.state.wrapping_add(0x9E3779B97F4A7C15);
        x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
        x ^ (x >> 31)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.rotate_left(8) ^ u64::from(byte);
        }
    }
}

struct MixBuild;

impl BuildHasher for MixBuild {
    type Hasher = MixHasher;

    fn build_hasher(&self) -> Self::Hasher {
        MixHasher { state: 0 }
    }
}

fn main() {
    // The hint of 20 rounds up to 32 buckets.
    let mut roster: HashMap<u32, String, _> = HashMap::with_capacity_and_hasher(20, MixBuild);
    println!(
        "Roster starts empty: {} players, {} buckets",
        roster.len(),
        roster.capacity()
    );

    roster.insert(10, "Ana Flores".to_string());
    roster.insert(7, "Kim Novak".to_string());
    roster.insert(11, "Leo Brandt".to_string());
    println!("After signings: {} players", roster.len());

    if let Some(previous) = roster.insert(10, "Mia Okafor".to_string()) {
        println!("Number 10 reassigned from {} to Mia Okafor", previous);
    }

    match roster.get(&7) {
        Some(name) => println!("Number 7 belongs to {}", name),
        None => println!("Number 7 is free"),
    }

    if let Some(name) = roster.remove(&11) {
        println!("{} left the club, number 11 is free again", name);
    }

    println!("Final roster:");
    for (number, name) in roster.iter() {
        println!("  #{:<2} {}", number, name);
    }
    println!("{} players, {} buckets", roster.len(), roster.capacity());
}
