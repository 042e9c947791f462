use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use jyutping_dict::{DEFAULT_TABLE_PATH, JyutpingDict, LoadMode};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let table = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TABLE_PATH));
    let lookup = args.next();

    let dict = JyutpingDict::load_with_mode(&table, LoadMode::Mmap)
        .with_context(|| format!("loading Jyutping table from {}", table.display()))?;

    println!("Table: {}", table.display());
    println!("Keys : {}", dict.key_count());
    println!("Words: {}", dict.word_count());

    let mut prefixes: Vec<_> = dict.prefix_freq().iter().collect();
    prefixes.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    println!("Words by initial:");
    for (initial, count) in prefixes {
        println!("  {initial}: {count}");
    }

    if let Some(key) = lookup {
        match dict.suggested_characters(&key) {
            Ok(words) => println!("{key}: {}", words.join(" ")),
            Err(err) => println!("{err}"),
        }
    }

    Ok(())
}
