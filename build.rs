use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src");

    // Delete stale log file if it exists
    if Path::new("outreach.log").exists() {
        fs::remove_file("outreach.log").expect("Failed to delete log file");
        println!("cargo:warning=Deleted outreach.log");
    }
}
