//! rsqa CLI binary
//!
//! All logic is in the library; main.rs only invokes cli::run().

fn main() {
    // cli::run() handles all output including errors
    if let Err(code) = rsqa::cli::run() {
        std::process::exit(code.as_i32());
    }
}
