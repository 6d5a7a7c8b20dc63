use apkmeta::dex::descriptors::DEX_MAGIC_PREFIX;
use apkmeta::{extract_class_descriptors, parse_manifest};
use std::env;
use std::error::Error;
use std::fs;

// Dumps what apkmeta can read from an extracted AndroidManifest.xml or classes.dex.

//Usage: dump_manifest <AndroidManifest.xml|classes.dex>
fn main() {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        println!("Usage: dump_manifest <AndroidManifest.xml|classes.dex>");
        return;
    };

    if let Err(e) = dump(path) {
        println!("Aborted due to error: {:?}", e);
    }
}

fn dump(path: &str) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(path)?;

    if bytes.starts_with(&DEX_MAGIC_PREFIX) {
        let classes = extract_class_descriptors(&bytes);
        for class in &classes {
            println!("{class}");
        }
        println!("{} classes", classes.len());
        return Ok(());
    }

    match parse_manifest(&bytes) {
        Some(info) => {
            println!("{:#?}", info);
            for link in &info.deep_links {
                println!("deep link: {link}");
            }
        }
        None => println!("Nothing recovered from {path}"),
    }
    Ok(())
}
