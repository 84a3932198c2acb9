use core::hash::BuildHasher;
use core::hash::Hasher;
use std::io;
use std::io::Write as _;

use chain_hash::Entry;
use chain_hash::HashMap;

/// The djb2 string hash: `hash * 33 + byte`, seeded with 5381.
struct Djb2Hasher {
    state: u64,
}

impl Hasher for Djb2Hasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = (self.state << 5)
                .wrapping_add(self.state)
                .wrapping_add(u64::from(byte));
        }
    }
}

struct Djb2Build;

impl BuildHasher for Djb2Build {
    type Hasher = Djb2Hasher;

    fn build_hasher(&self) -> Self::Hasher {
        Djb2Hasher { state: 5381 }
    }
}

fn prompt(line: &mut String, message: &str) -> io::Result<()> {
    print!("{message}");
    io::stdout().flush()?;
    line.clear();
    io::stdin().read_line(line)?;
    Ok(())
}

/// Toy account store driven from stdin. Accounts live only as long as the
/// process.
fn main() -> io::Result<()> {
    let mut accounts: HashMap<String, String, _> = HashMap::with_hasher(Djb2Build);
    let mut line = String::new();

    loop {
        println!();
        println!("1) sign up");
        println!("2) sign in");
        println!("3) quit");
        prompt(&mut line, "> ")?;
        let choice = line.trim().to_string();

        match choice.as_str() {
            "1" => {
                prompt(&mut line, "username: ")?;
                let username = line.trim().to_string();
                match accounts.entry(username) {
                    Entry::Occupied(entry) => {
                        println!("{} is already taken", entry.key());
                    }
                    Entry::Vacant(entry) => {
                        let mut password = String::new();
                        prompt(&mut password, "password: ")?;
                        entry.insert(password.trim().to_string());
                        println!("account created");
                    }
                }
            }
            "2" => {
                prompt(&mut line, "username: ")?;
                let username = line.trim().to_string();
                let mut password = String::new();
                prompt(&mut password, "password: ")?;
                let attempt = password.trim();
                match accounts.get(&username) {
                    Some(stored) if stored.as_str() == attempt => {
                        println!("welcome back, {username}");
                    }
                    Some(_) => println!("wrong password"),
                    None => println!("no such account"),
                }
            }
            "3" => return Ok(()),
            other => println!("unknown choice: {other:?}"),
        }
    }
}
